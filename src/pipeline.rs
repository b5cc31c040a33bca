//! End-to-end request pipelines: fetch → extract → synthesize.
//!
//! Each call runs strictly in sequence and shares nothing with other calls,
//! so the `digest` command can drive many of them concurrently.

use crate::completion::CompletionProvider;
use crate::config::AppConfig;
use crate::extractor::{ContentExtractor, ExtractionFailure, InvalidSelector};
use crate::fetcher::{FetchError, Fetcher};
use crate::models::{ArticleSummary, DigestEntry, ExtractionMethod, ExtractionResult, Headline, Quiz};
use crate::quiz::{QuizGenerationFailure, QuizSynthesizer};
use crate::summarizer::SummarySynthesizer;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),
    #[error(transparent)]
    Quiz(#[from] QuizGenerationFailure),
}

impl PipelineError {
    /// Reader-facing explanation of the failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Fetch(FetchError::Timeout { .. }) => {
                "The article took too long to load. Please try again later."
            }
            Self::Fetch(FetchError::InvalidUrl { .. }) => "The article URL is not valid.",
            Self::Fetch(_) => {
                "Unable to download this article. The site may be blocking automated access."
            }
            Self::Extraction(_) => {
                "Unable to extract content from this article. It may require authentication or have access restrictions."
            }
            Self::Quiz(_) => "Unable to extract sufficient content from this article",
        }
    }
}

/// A pipeline could not be built from its configuration.
#[derive(Debug, Error)]
pub enum PipelineBuildError {
    #[error("fetcher setup failed: {0}")]
    Fetcher(#[from] FetchError),
    #[error("extractor setup failed: {0}")]
    Extractor(#[from] InvalidSelector),
}

/// Text shown in place of a summary that could not be produced.
pub fn fallback_summary(url: &str) -> String {
    format!("Unable to generate AI summary for this article. Please visit the source to read: {url}")
}

/// A quiz together with the article it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleQuiz {
    pub url: String,
    pub method: ExtractionMethod,
    pub word_count: usize,
    pub quiz: Quiz,
}

#[derive(Debug)]
pub struct Pipeline<C> {
    fetcher: Fetcher,
    extractor: ContentExtractor,
    provider: C,
}

impl<C: CompletionProvider> Pipeline<C> {
    pub fn new(fetcher: Fetcher, extractor: ContentExtractor, provider: C) -> Self {
        Self {
            fetcher,
            extractor,
            provider,
        }
    }

    /// Build the fetcher and extractor from `config`.
    pub fn from_config(config: &AppConfig, provider: C) -> Result<Self, PipelineBuildError> {
        Ok(Self::new(
            Fetcher::new(&config.fetch)?,
            ContentExtractor::new(&config.extraction)?,
            provider,
        ))
    }

    pub fn provider(&self) -> &C {
        &self.provider
    }

    /// Fetch `url` and extract its text, capped to `max_words`.
    pub async fn extract_url(
        &self,
        url: &str,
        max_words: usize,
    ) -> Result<ExtractionResult, PipelineError> {
        let document = self.fetcher.fetch(url).await?;
        Ok(self.extractor.extract_or_fail(&document, max_words)?)
    }

    #[instrument(level = "info", skip(self))]
    pub async fn summarize_url(&self, url: &str, title: &str) -> Result<ArticleSummary, PipelineError> {
        let max_words = self.extractor.config().summary_max_words;
        let extracted = self.extract_url(url, max_words).await?;
        let summary = SummarySynthesizer::new(&self.provider)
            .summarize(&extracted.text, title, url)
            .await;
        Ok(ArticleSummary {
            url: url.to_string(),
            title: title.to_string(),
            method: extracted.method,
            word_count: extracted.word_count,
            summary,
        })
    }

    #[instrument(level = "info", skip(self))]
    pub async fn quiz_url(&self, url: &str, title: &str) -> Result<ArticleQuiz, PipelineError> {
        let max_words = self.extractor.config().quiz_max_words;
        let extracted = self.extract_url(url, max_words).await?;
        let quiz = QuizSynthesizer::new(&self.provider)
            .generate(&extracted.text, title)
            .await?;
        Ok(ArticleQuiz {
            url: url.to_string(),
            method: extracted.method,
            word_count: extracted.word_count,
            quiz,
        })
    }

    /// Summarize one headline for a digest, recording any failure in the entry.
    pub async fn digest_entry(&self, headline: Headline) -> DigestEntry {
        let Some(url) = headline.url.clone() else {
            return DigestEntry {
                headline,
                summary: None,
                error: Some("No URL provided".to_string()),
                fallback: None,
            };
        };

        match self.summarize_url(&url, &headline.title).await {
            Ok(summary) => {
                info!(%url, method = %summary.method, "Digest entry summarized");
                DigestEntry {
                    headline,
                    summary: Some(summary),
                    error: None,
                    fallback: None,
                }
            }
            Err(e) => {
                warn!(%url, error = %e, "Digest entry failed");
                DigestEntry {
                    headline,
                    summary: None,
                    error: Some(e.user_message().to_string()),
                    fallback: Some(fallback_summary(&url)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionError;
    use crate::completion::testing::ScriptedProvider;
    use crate::extractor::fixtures::{page, prose};
    use crate::models::SummarySource;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pipeline(provider: ScriptedProvider) -> Pipeline<ScriptedProvider> {
        Pipeline::from_config(&AppConfig::default(), provider).unwrap()
    }

    async fn serve(server: &MockServer, route: &str, status: u16, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    fn headline(url: Option<String>) -> Headline {
        Headline {
            title: "Storm hits coast".into(),
            source: "Wire".into(),
            description: "A storm...".into(),
            url,
            image: None,
            published: "Recent".into(),
        }
    }

    #[test]
    fn test_bad_selector_fails_build() {
        let mut config = AppConfig::default();
        config.extraction.container_selectors.push("div[".to_string());
        let err = Pipeline::from_config(&config, ScriptedProvider::default()).unwrap_err();
        assert!(matches!(err, PipelineBuildError::Extractor(_)));
    }

    #[tokio::test]
    async fn test_summarize_url_falls_back_locally() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/story",
            200,
            page(&format!("<article>{}</article>", prose(150, "w"))),
        )
        .await;

        let url = format!("{}/story", server.uri());
        let summary = pipeline(ScriptedProvider::failing(CompletionError::RateLimited))
            .summarize_url(&url, "Storm hits coast")
            .await
            .unwrap();

        assert_eq!(summary.method, ExtractionMethod::ArticleTag);
        assert_eq!(summary.word_count, 150);
        assert_eq!(summary.summary.source, SummarySource::Extractive);
        assert!(summary.summary.summary.ends_with(&format!("\n\n[Source: {url}]")));
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces() {
        let server = MockServer::start().await;
        serve(&server, "/gone", 404, String::new()).await;

        let err = pipeline(ScriptedProvider::default())
            .summarize_url(&format!("{}/gone", server.uri()), "t")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(FetchError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_extraction_failure_surfaces() {
        let server = MockServer::start().await;
        serve(&server, "/paywall", 200, page("<p>Subscribe to read.</p>")).await;

        let provider = ScriptedProvider::default();
        let p = pipeline(provider);
        let err = p
            .summarize_url(&format!("{}/paywall", server.uri()), "t")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Extraction(_)));
        assert!(err.user_message().contains("authentication"));
        assert!(p.provider().requests().is_empty());
    }

    #[tokio::test]
    async fn test_quiz_url_needs_fifty_words() {
        let server = MockServer::start().await;
        let html = format!(
            r#"<html><head><meta name="description" content="{}"></head><body></body></html>"#,
            prose(40, "meta")
        );
        serve(&server, "/brief", 200, html).await;

        let err = pipeline(ScriptedProvider::default())
            .quiz_url(&format!("{}/brief", server.uri()), "t")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Quiz(QuizGenerationFailure::InsufficientContent { words: 40, .. })
        ));
    }

    #[tokio::test]
    async fn test_quiz_url_uses_quiz_cap() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/long",
            200,
            page(&format!("<article>{}</article>", prose(1200, "w"))),
        )
        .await;

        let quiz = pipeline(ScriptedProvider::failing(CompletionError::Timeout))
            .quiz_url(&format!("{}/long", server.uri()), "t")
            .await
            .unwrap();
        assert_eq!(quiz.word_count, 1000);
        assert_eq!(quiz.quiz.questions().len(), 3);
    }

    #[tokio::test]
    async fn test_digest_entries() {
        let server = MockServer::start().await;
        serve(&server, "/gone", 500, String::new()).await;
        let p = pipeline(ScriptedProvider::default());

        let missing = p.digest_entry(headline(None)).await;
        assert_eq!(missing.error.as_deref(), Some("No URL provided"));
        assert!(missing.summary.is_none());

        let url = format!("{}/gone", server.uri());
        let failed = p.digest_entry(headline(Some(url.clone()))).await;
        assert!(failed.summary.is_none());
        assert_eq!(failed.fallback, Some(fallback_summary(&url)));
    }
}
