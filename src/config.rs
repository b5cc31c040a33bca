//! Runtime configuration loaded from an optional YAML file.
//!
//! Every section is `#[serde(default)]`, so a file only needs to name the
//! values it overrides:
//!
//! ```yaml
//! extraction:
//!   article_min_words: 80
//! completion:
//!   model: "meta-llama/llama-3.1-8b-instruct:free"
//! ```
//!
//! API keys never live in the file; they come from the command line or the
//! environment (see [`crate::cli::Cli`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub extraction: ExtractionConfig,
    pub completion: CompletionConfig,
    pub headlines: HeadlineConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration");
        Ok(config)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file is a valid "use every default" config.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

/// Settings for fetching article pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds (default: 15)
    pub timeout_secs: u64,
    /// Browser User-Agent sent with every page request
    pub user_agent: String,
    /// `Accept` header value
    pub accept: String,
    /// `Accept-Language` header value
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Thresholds and selector lists driving the extraction cascade.
///
/// The numbers are empirically tuned heuristics. They are kept as named
/// values so deployments can override them without touching code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Elements removed before any strategy runs
    pub strip_selectors: Vec<String>,
    /// An `<article>` must exceed this many words to be accepted
    pub article_min_words: usize,
    /// Content-container selectors, probed in order
    pub container_selectors: Vec<String>,
    /// A container must exceed this many words to be accepted
    pub container_min_words: usize,
    /// Score bonus per direct-child `<p>` of a container
    pub container_paragraph_weight: usize,
    /// A paragraph must have more than this many words to be kept
    pub paragraph_min_words: usize,
    /// A paragraph must have fewer than this many words to be kept
    pub paragraph_max_words: usize,
    /// Minimum surviving paragraphs for paragraph aggregation
    pub min_paragraphs: usize,
    /// Case-insensitive substrings that disqualify a paragraph
    pub boilerplate_markers: Vec<String>,
    /// Sentence fragments of this many characters or fewer are dropped
    pub min_fragment_chars: usize,
    /// Extracted text below this many words is rejected
    pub min_words: usize,
    /// Word cap applied to text headed for the summarizer
    pub summary_max_words: usize,
    /// Word cap applied to text headed for the quiz generator
    pub quiz_max_words: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            strip_selectors: owned(&[
                // JSON-LD blocks are kept for the structured-data strategy
                r#"script:not([type="application/ld+json"])"#,
                "style",
                "nav",
                "header",
                "footer",
                "aside",
                "iframe",
                "noscript",
                "button",
                "form",
                "input",
                "select",
                ".ad",
                ".ads",
                ".advertisement",
                ".social",
                ".share",
                ".comments",
                ".newsletter",
                ".popup",
                ".modal",
                ".menu",
                ".sidebar",
                ".breadcrumb",
                ".pagination",
                ".related",
                ".recommended",
                ".trending",
            ]),
            article_min_words: 100,
            container_selectors: owned(&[
                "main",
                r#"[role="main"]"#,
                ".content",
                ".post-content",
                ".article-content",
                ".entry-content",
                ".story-content",
                ".post-body",
                ".article-body",
                ".story-body",
                ".content-body",
                r#"[itemprop="articleBody"]"#,
                ".article__body",
                ".article-text",
            ]),
            container_min_words: 50,
            container_paragraph_weight: 10,
            paragraph_min_words: 15,
            paragraph_max_words: 200,
            min_paragraphs: 3,
            boilerplate_markers: owned(&[
                "login",
                "sign up",
                "subscribe",
                "read more",
                "click here",
            ]),
            min_fragment_chars: 20,
            min_words: 30,
            summary_max_words: 1500,
            quiz_max_words: 1000,
        }
    }
}

/// Settings for the OpenAI-compatible completion service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    pub model: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "google/gemini-2.0-flash-exp:free".to_string(),
            timeout_secs: 30,
        }
    }
}

impl CompletionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the NewsAPI-compatible headline provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlineConfig {
    /// Base URL; `/top-headlines` is appended
    pub base_url: String,
    /// Number of headlines requested per call (default: 20)
    pub page_size: u32,
    pub timeout_secs: u64,
}

impl Default for HeadlineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2".to_string(),
            page_size: 20,
            timeout_secs: 15,
        }
    }
}

impl HeadlineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_extraction_thresholds() {
        let config = ExtractionConfig::default();
        assert_eq!(config.article_min_words, 100);
        assert_eq!(config.container_min_words, 50);
        assert_eq!(config.container_paragraph_weight, 10);
        assert_eq!(config.paragraph_min_words, 15);
        assert_eq!(config.paragraph_max_words, 200);
        assert_eq!(config.min_words, 30);
        assert_eq!(config.summary_max_words, 1500);
        assert_eq!(config.quiz_max_words, 1000);
        assert_eq!(config.container_selectors.len(), 14);
        assert_eq!(config.container_selectors[0], "main");
    }

    #[test]
    fn test_default_timeouts() {
        let config = AppConfig::default();
        assert_eq!(config.fetch.timeout(), Duration::from_secs(15));
        assert_eq!(config.completion.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
extraction:
  article_min_words: 80
completion:
  model: "some/other-model"
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.extraction.article_min_words, 80);
        assert_eq!(config.extraction.container_min_words, 50);
        assert_eq!(config.completion.model, "some/other-model");
        assert_eq!(config.completion.timeout_secs, 30);
        assert_eq!(config.fetch, FetchConfig::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(AppConfig::from_yaml("").unwrap(), AppConfig::default());
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_rejected() {
        assert!(AppConfig::from_yaml("extraction: [1, 2").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }
}
