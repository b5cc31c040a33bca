//! Top headlines from a NewsAPI-compatible provider.
//!
//! Raw provider articles are normalized into [`Headline`]s for display:
//! descriptions are cut to their first sentence, dates become `Mon DD, YYYY`,
//! and missing fields get readable placeholders.

use crate::config::HeadlineConfig;
use crate::models::Headline;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Supported country codes and their display names.
pub const COUNTRIES: [(&str, &str); 7] = [
    ("us", "USA"),
    ("in", "India"),
    ("gb", "UK"),
    ("au", "Australia"),
    ("jp", "Japan"),
    ("de", "Germany"),
    ("cn", "China"),
];

pub const CATEGORIES: [&str; 7] = [
    "general",
    "business",
    "technology",
    "science",
    "health",
    "sports",
    "entertainment",
];

const NO_DESCRIPTION: &str = "Click to read the full article.";

#[derive(Debug, Error)]
pub enum HeadlineError {
    #[error("unsupported country code {0:?}")]
    UnsupportedCountry(String),
    #[error("unsupported category {0:?}")]
    UnsupportedCategory(String),
    #[error("no headline API key configured")]
    MissingApiKey,
    #[error("headline request timed out")]
    Timeout,
    #[error("network failure fetching headlines: {0}")]
    Network(#[source] reqwest::Error),
    #[error("headline provider returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed headline response: {0}")]
    Malformed(String),
}

impl HeadlineError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TopHeadlinesResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    source: Option<RawSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// Headlines plus the filters that produced them, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineListing {
    pub count: usize,
    pub filters: HeadlineFilters,
    pub articles: Vec<Headline>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlineFilters {
    /// Upper-cased country code
    pub country: String,
    /// Title-cased category
    pub category: String,
}

impl HeadlineListing {
    pub fn new(country: &str, category: &str, articles: Vec<Headline>) -> Self {
        let message = articles
            .is_empty()
            .then(|| "No headlines found for these filters.".to_string());
        Self {
            count: articles.len(),
            filters: HeadlineFilters {
                country: country.to_uppercase(),
                category: title_case(category),
            },
            articles,
            message,
        }
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Lower-case and validate a country code.
pub fn validate_country(country: &str) -> Result<String, HeadlineError> {
    let code = country.trim().to_lowercase();
    if COUNTRIES.iter().any(|(c, _)| *c == code) {
        Ok(code)
    } else {
        Err(HeadlineError::UnsupportedCountry(country.to_string()))
    }
}

/// Lower-case and validate a category.
pub fn validate_category(category: &str) -> Result<String, HeadlineError> {
    let name = category.trim().to_lowercase();
    if CATEGORIES.contains(&name.as_str()) {
        Ok(name)
    } else {
        Err(HeadlineError::UnsupportedCategory(category.to_string()))
    }
}

/// Text before the first `.`, trimmed, plus `...`.
pub fn first_sentence(description: Option<&str>) -> String {
    match description.filter(|d| !d.is_empty()) {
        Some(d) => {
            let head = d.split('.').next().unwrap_or_default();
            format!("{}...", head.trim())
        }
        None => NO_DESCRIPTION.to_string(),
    }
}

/// `2025-03-07T12:00:00Z` → `Mar 07, 2025`; anything unparseable → `Recent`.
pub fn format_published(published_at: Option<&str>) -> String {
    published_at
        .and_then(|raw| raw.get(..10))
        .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
        .map(|date| date.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "Recent".to_string())
}

fn non_empty(value: Option<String>, placeholder: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

fn normalize(raw: RawArticle) -> Headline {
    Headline {
        description: first_sentence(raw.description.as_deref()),
        published: format_published(raw.published_at.as_deref()),
        title: non_empty(raw.title, "No Title"),
        source: non_empty(raw.source.and_then(|s| s.name), "Unknown"),
        url: raw.url,
        image: raw.url_to_image,
    }
}

/// Client for the `/top-headlines` endpoint.
#[derive(Clone)]
pub struct HeadlineClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    page_size: u32,
}

impl std::fmt::Debug for HeadlineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlineClient")
            .field("endpoint", &self.endpoint)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl HeadlineClient {
    pub fn new(config: &HeadlineConfig, api_key: Option<String>) -> Result<Self, HeadlineError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(HeadlineError::Network)?;
        Ok(Self {
            client,
            endpoint: format!("{}/top-headlines", config.base_url.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            page_size: config.page_size,
        })
    }

    /// Fetch and normalize English-language top headlines.
    ///
    /// Descriptions are cut to their first sentence and publish dates are
    /// reformatted to `Mon DD, YYYY`. Provider order is preserved.
    ///
    /// # Arguments
    ///
    /// * `country` - Two-letter code from [`COUNTRIES`], any case
    /// * `category` - One of [`CATEGORIES`], any case
    ///
    /// # Returns
    ///
    /// The headlines, or a [`HeadlineError`] for an unsupported filter, a
    /// missing API key, a timeout, an error status or an unparseable body.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let client = HeadlineClient::new(&config.headlines, Some(key))?;
    /// for headline in client.top_headlines("gb", "technology").await? {
    ///     println!("{} ({})", headline.title, headline.published);
    /// }
    /// ```
    #[instrument(level = "info", skip(self))]
    pub async fn top_headlines(
        &self,
        country: &str,
        category: &str,
    ) -> Result<Vec<Headline>, HeadlineError> {
        let country = validate_country(country)?;
        let category = validate_category(category)?;
        let api_key = self.api_key.as_deref().ok_or(HeadlineError::MissingApiKey)?;
        let page_size = self.page_size.to_string();

        let t0 = Instant::now();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("country", country.as_str()),
                ("category", category.as_str()),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await
            .map_err(HeadlineError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(HeadlineError::from_reqwest)?;
        if !status.is_success() {
            let message = serde_json::from_str::<ProviderErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or_default();
            warn!(status = status.as_u16(), %message, "Headline request failed");
            return Err(HeadlineError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: TopHeadlinesResponse =
            serde_json::from_str(&body).map_err(|e| HeadlineError::Malformed(e.to_string()))?;
        let headlines = parsed.articles.into_iter().map(normalize).collect::<Vec<_>>();

        info!(
            count = headlines.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched headlines"
        );
        Ok(headlines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, key: Option<&str>) -> HeadlineClient {
        let config = HeadlineConfig {
            base_url: server.uri(),
            ..HeadlineConfig::default()
        };
        HeadlineClient::new(&config, key.map(str::to_string)).unwrap()
    }

    #[test]
    fn test_first_sentence() {
        assert_eq!(
            first_sentence(Some(" Markets rallied today. Analysts cheered.")),
            "Markets rallied today..."
        );
        assert_eq!(first_sentence(Some("No period at all")), "No period at all...");
        assert_eq!(first_sentence(Some("")), NO_DESCRIPTION);
        assert_eq!(first_sentence(None), NO_DESCRIPTION);
    }

    #[test]
    fn test_format_published() {
        assert_eq!(format_published(Some("2025-03-07T12:30:00Z")), "Mar 07, 2025");
        assert_eq!(format_published(Some("yesterday")), "Recent");
        assert_eq!(format_published(Some("2025-13-01T00:00:00Z")), "Recent");
        assert_eq!(format_published(None), "Recent");
    }

    #[test]
    fn test_validation() {
        assert_eq!(validate_country(" GB ").unwrap(), "gb");
        assert_eq!(validate_category("Technology").unwrap(), "technology");
        assert!(matches!(
            validate_country("fr"),
            Err(HeadlineError::UnsupportedCountry(_))
        ));
        assert!(matches!(
            validate_category("politics"),
            Err(HeadlineError::UnsupportedCategory(_))
        ));
    }

    #[test]
    fn test_listing_filters_and_empty_message() {
        let listing = HeadlineListing::new("us", "technology", Vec::new());
        assert_eq!(listing.filters.country, "US");
        assert_eq!(listing.filters.category, "Technology");
        assert_eq!(listing.count, 0);
        assert!(listing.message.is_some());
    }

    #[tokio::test]
    async fn test_top_headlines_normalizes_articles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/top-headlines"))
            .and(query_param("country", "us"))
            .and(query_param("category", "business"))
            .and(query_param("language", "en"))
            .and(query_param("pageSize", "20"))
            .and(query_param("apiKey", "news-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "totalResults": 2,
                "articles": [
                    {
                        "source": {"id": null, "name": "Example Wire"},
                        "title": "Stocks climb",
                        "description": "Shares rose sharply. More later.",
                        "url": "https://example.com/stocks",
                        "urlToImage": "https://example.com/stocks.jpg",
                        "publishedAt": "2025-01-15T08:00:00Z"
                    },
                    {
                        "source": {"id": null, "name": null},
                        "title": null,
                        "description": null,
                        "url": null,
                        "publishedAt": "soon"
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let headlines = client(&server, Some("news-key"))
            .top_headlines("US", "Business")
            .await
            .unwrap();

        assert_eq!(
            headlines[0],
            Headline {
                title: "Stocks climb".into(),
                source: "Example Wire".into(),
                description: "Shares rose sharply...".into(),
                url: Some("https://example.com/stocks".into()),
                image: Some("https://example.com/stocks.jpg".into()),
                published: "Jan 15, 2025".into(),
            }
        );
        assert_eq!(headlines[1].title, "No Title");
        assert_eq!(headlines[1].source, "Unknown");
        assert_eq!(headlines[1].description, NO_DESCRIPTION);
        assert_eq!(headlines[1].published, "Recent");
        assert_eq!(headlines[1].url, None);
    }

    #[tokio::test]
    async fn test_provider_error_message_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": "error",
                "code": "apiKeyInvalid",
                "message": "Your API key is invalid."
            })))
            .mount(&server)
            .await;

        let err = client(&server, Some("bad"))
            .top_headlines("us", "general")
            .await
            .unwrap_err();
        match err {
            HeadlineError::Status { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Your API key is invalid.");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_validation_and_key_checked_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let keyed = client(&server, Some("k"));
        assert!(keyed.top_headlines("xx", "general").await.is_err());
        assert!(keyed.top_headlines("us", "weather").await.is_err());
        assert!(matches!(
            client(&server, None).top_headlines("us", "general").await,
            Err(HeadlineError::MissingApiKey)
        ));
    }
}
