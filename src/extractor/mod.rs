//! Article text extraction: an ordered cascade of strategies over a cleaned DOM.
//!
//! The page is parsed once, non-content elements are detached, and each
//! strategy runs in priority order. A strategy's output only wins if it also
//! survives [`Normalizer`]; otherwise the cascade moves on to the next one.
//! When every strategy fails the result is `None` and the caller decides how
//! to report it (see [`ExtractionFailure`]).
//!
//! Parsing is synchronous and the DOM never crosses an `.await`, so callers can
//! run extraction inside async tasks without holding a non-`Send` tree.

pub mod clean;
pub mod scoring;
pub mod strategies;

use crate::config::ExtractionConfig;
use crate::models::{Document, ExtractionResult};
use crate::normalizer::Normalizer;
use crate::utils::word_count;
use scraper::{Html, Selector};
use std::fmt;
use strategies::{
    ArticleTagStrategy, ContentContainerStrategy, ExtractionStrategy, JsonLdStrategy,
    MetaDescriptionStrategy, SmartParagraphStrategy,
};
use scoring::ContainerScoring;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Every strategy failed to produce enough text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not extract at least {min_words} words of article text from {url}")]
pub struct ExtractionFailure {
    pub url: String,
    pub min_words: usize,
}

/// A configured CSS selector failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector {selector:?}: {reason}")]
pub struct InvalidSelector {
    pub selector: String,
    pub reason: String,
}

fn parse_selectors(raw: &[String]) -> Result<Vec<Selector>, InvalidSelector> {
    raw.iter()
        .map(|s| {
            Selector::parse(s).map_err(|e| InvalidSelector {
                selector: s.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Runs the strategy cascade. Build once and reuse across pages.
pub struct ContentExtractor {
    strip: Vec<Selector>,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
    config: ExtractionConfig,
}

impl fmt::Debug for ContentExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentExtractor")
            .field("strip", &self.strip.len())
            .field(
                "strategies",
                &self.strategies.iter().map(|s| s.method()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ContentExtractor {
    /// The default five-strategy cascade.
    pub fn new(config: &ExtractionConfig) -> Result<Self, InvalidSelector> {
        let containers = parse_selectors(&config.container_selectors)?;
        let strategies: Vec<Box<dyn ExtractionStrategy>> = vec![
            Box::new(JsonLdStrategy),
            Box::new(ArticleTagStrategy {
                min_words: config.article_min_words,
            }),
            Box::new(ContentContainerStrategy::new(
                containers,
                ContainerScoring {
                    min_words: config.container_min_words,
                    paragraph_weight: config.container_paragraph_weight,
                },
            )),
            Box::new(SmartParagraphStrategy::from_config(config)),
            Box::new(MetaDescriptionStrategy),
        ];
        Self::with_strategies(config, strategies)
    }

    /// A cascade with a caller-chosen strategy list, tried in the given order.
    pub fn with_strategies(
        config: &ExtractionConfig,
        strategies: Vec<Box<dyn ExtractionStrategy>>,
    ) -> Result<Self, InvalidSelector> {
        Ok(Self {
            strip: parse_selectors(&config.strip_selectors)?,
            strategies,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn normalizer(&self, max_words: usize) -> Normalizer {
        Normalizer::from_config(&self.config, max_words)
    }

    /// Extract normalized article text, capped to `max_words` words.
    ///
    /// Non-content regions are detached first, then each strategy runs in
    /// order. Every candidate is normalized; the first one that survives wins
    /// and later strategies never run.
    ///
    /// # Arguments
    ///
    /// * `document` - Fetched page and the URL it came from
    /// * `max_words` - Word cap applied during normalization
    ///
    /// # Returns
    ///
    /// The text with the winning
    /// [`ExtractionMethod`](crate::models::ExtractionMethod) and its word
    /// count, or `None` when no strategy yields text that survives
    /// normalization.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let extractor = ContentExtractor::new(&ExtractionConfig::default())?;
    /// let page = Document::new(url, html);
    /// if let Some(result) = extractor.extract(&page, 1500) {
    ///     println!("{} words via {}", result.word_count, result.method);
    /// }
    /// ```
    #[instrument(level = "info", skip_all, fields(url = document.url()))]
    pub fn extract(&self, document: &Document, max_words: usize) -> Option<ExtractionResult> {
        let mut html = Html::parse_document(document.html());
        let removed = clean::strip_non_content(&mut html, &self.strip);
        debug!(removed, "Stripped non-content elements");

        let normalizer = self.normalizer(max_words);
        for strategy in &self.strategies {
            let method = strategy.method();
            let Some(raw) = strategy.try_extract(&html) else {
                debug!(%method, "Strategy found nothing");
                continue;
            };
            match normalizer.normalize(&raw) {
                Ok(text) => {
                    let words = word_count(&text);
                    info!(%method, words, "Extracted article text");
                    return Some(ExtractionResult {
                        text,
                        method,
                        word_count: words,
                    });
                }
                Err(e) => debug!(%method, error = %e, "Strategy output rejected"),
            }
        }

        warn!("All extraction strategies failed");
        None
    }

    /// [`extract`](Self::extract), with the failure as an error value.
    pub fn extract_or_fail(
        &self,
        document: &Document,
        max_words: usize,
    ) -> Result<ExtractionResult, ExtractionFailure> {
        self.extract(document, max_words)
            .ok_or_else(|| ExtractionFailure {
                url: document.url().to_string(),
                min_words: self.config.min_words,
            })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use itertools::Itertools;

    /// `count` distinct words `{stem}0 {stem}1 ...`, a period after every tenth.
    pub fn prose(count: usize, stem: &str) -> String {
        (0..count)
            .map(|i| {
                if (i + 1) % 10 == 0 {
                    format!("{stem}{i}.")
                } else {
                    format!("{stem}{i}")
                }
            })
            .join(" ")
    }

    pub fn paragraph(count: usize, stem: &str) -> String {
        format!("<p>{}</p>", prose(count, stem))
    }

    pub fn page(body: &str) -> String {
        format!("<html><head><title>t</title></head><body>{body}</body></html>")
    }
}
