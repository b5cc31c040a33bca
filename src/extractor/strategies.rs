//! The five extraction strategies, highest priority first.
//!
//! | Priority | Strategy | Signal |
//! |----------|----------|--------|
//! | 1 | [`JsonLdStrategy`] | `articleBody` in a JSON-LD block |
//! | 2 | [`ArticleTagStrategy`] | first `<article>` over the word threshold |
//! | 3 | [`ContentContainerStrategy`] | best-scoring known content container |
//! | 4 | [`SmartParagraphStrategy`] | filtered, aggregated `<p>` elements |
//! | 5 | [`MetaDescriptionStrategy`] | `<meta name="description">` |
//!
//! Each strategy returns `None` on any internal failure (unparseable JSON,
//! nothing over threshold) so the cascade can move on.

use super::clean::{direct_paragraph_count, visible_text, visible_word_count};
use super::scoring::{ContainerCandidate, ContainerScoring};
use crate::config::ExtractionConfig;
use crate::models::ExtractionMethod;
use crate::utils::word_count;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

static JSON_LD: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("static JSON-LD selector")
});
static ARTICLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article").expect("static article selector"));
static PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static paragraph selector"));
static META_DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="description"]"#).expect("static meta selector")
});

/// One heuristic procedure for locating article text.
pub trait ExtractionStrategy: Send + Sync {
    /// The method recorded when this strategy wins.
    fn method(&self) -> ExtractionMethod;

    /// Candidate text, or `None` if this strategy found nothing usable.
    fn try_extract(&self, document: &Html) -> Option<String>;
}

/// Uses the publisher's own `articleBody` from embedded JSON-LD.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLdStrategy;

impl ExtractionStrategy for JsonLdStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::JsonLd
    }

    fn try_extract(&self, document: &Html) -> Option<String> {
        document.select(&JSON_LD).find_map(|script| {
            let raw = script.text().collect::<String>();
            match serde_json::from_str::<Value>(raw.trim()) {
                Ok(value) => find_article_body(&value).map(str::to_string),
                Err(e) => {
                    debug!(error = %e, "Skipping unparseable JSON-LD block");
                    None
                }
            }
        })
    }
}

/// First non-blank string `articleBody`, searching arrays and `@graph` containers.
fn find_article_body(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(body)) = map.get("articleBody") {
                if !body.trim().is_empty() {
                    return Some(body);
                }
            }
            map.get("@graph").and_then(find_article_body)
        }
        Value::Array(items) => items.iter().find_map(find_article_body),
        _ => None,
    }
}

/// First `<article>` in document order with more than `min_words` words.
///
/// Document order is the tie-break: the first qualifying article wins, not
/// the longest.
#[derive(Debug, Clone, Copy)]
pub struct ArticleTagStrategy {
    pub min_words: usize,
}

impl ExtractionStrategy for ArticleTagStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::ArticleTag
    }

    fn try_extract(&self, document: &Html) -> Option<String> {
        document
            .select(&ARTICLE)
            .find(|article| visible_word_count(*article) > self.min_words)
            .map(visible_text)
    }
}

/// Highest-scoring match across a fixed list of content-container selectors.
#[derive(Debug, Clone)]
pub struct ContentContainerStrategy {
    selectors: Vec<Selector>,
    scoring: ContainerScoring,
}

impl ContentContainerStrategy {
    pub fn new(selectors: Vec<Selector>, scoring: ContainerScoring) -> Self {
        Self { selectors, scoring }
    }
}

impl ExtractionStrategy for ContentContainerStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::ContentContainer
    }

    fn try_extract(&self, document: &Html) -> Option<String> {
        let matches = self
            .selectors
            .iter()
            .flat_map(|selector| document.select(selector))
            .collect::<Vec<ElementRef<'_>>>();

        let best = self.scoring.best(matches.iter().map(|element| ContainerCandidate {
            word_count: visible_word_count(*element),
            paragraph_count: direct_paragraph_count(*element),
        }))?;

        debug!(
            candidates = matches.len(),
            score = best.score,
            "Selected content container"
        );
        Some(visible_text(matches[best.index]))
    }
}

/// Aggregates mid-length paragraphs that carry no boilerplate markers.
#[derive(Debug, Clone)]
pub struct SmartParagraphStrategy {
    /// Paragraphs need strictly more words than this
    pub min_words: usize,
    /// Paragraphs need strictly fewer words than this
    pub max_words: usize,
    pub min_paragraphs: usize,
    markers: Vec<String>,
}

impl SmartParagraphStrategy {
    pub fn new(
        min_words: usize,
        max_words: usize,
        min_paragraphs: usize,
        markers: &[String],
    ) -> Self {
        Self {
            min_words,
            max_words,
            min_paragraphs,
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(
            config.paragraph_min_words,
            config.paragraph_max_words,
            config.min_paragraphs,
            &config.boilerplate_markers,
        )
    }

    fn is_boilerplate(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.markers.iter().any(|marker| lower.contains(marker.as_str()))
    }

    fn keeps(&self, text: &str) -> bool {
        let words = word_count(text);
        words > self.min_words && words < self.max_words && !self.is_boilerplate(text)
    }
}

impl ExtractionStrategy for SmartParagraphStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::SmartParagraphs
    }

    fn try_extract(&self, document: &Html) -> Option<String> {
        let kept = document
            .select(&PARAGRAPH)
            .map(visible_text)
            .filter(|text| self.keeps(text))
            .collect::<Vec<_>>();

        if kept.len() < self.min_paragraphs {
            debug!(kept = kept.len(), "Too few qualifying paragraphs");
            return None;
        }
        Some(kept.join(" "))
    }
}

/// Last resort: the page's meta description, verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaDescriptionStrategy;

impl ExtractionStrategy for MetaDescriptionStrategy {
    fn method(&self) -> ExtractionMethod {
        ExtractionMethod::MetaDescription
    }

    fn try_extract(&self, document: &Html) -> Option<String> {
        document
            .select(&META_DESCRIPTION)
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    }
}
