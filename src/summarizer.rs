//! Summary synthesis: one remote attempt, then a local fallback that cannot fail.
//!
//! The remote attempt is accepted only if it returns at least
//! [`MIN_REMOTE_WORDS`] words. Otherwise the first few substantive sentences
//! of the article are used (`extractive`), or a templated sentence naming the
//! title when the text has too few of them (`generic`). Every summary ends with
//! the source URL.

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::models::{SummaryResult, SummarySource};
use crate::utils::{char_prefix, word_count};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, instrument, warn};

/// Characters of article text included in the remote prompt.
pub const PROMPT_CHARS: usize = 2500;
/// Remote summaries shorter than this are discarded.
pub const MIN_REMOTE_WORDS: usize = 15;
/// Fallback sentences must be longer than this many characters.
const MIN_SENTENCE_CHARS: usize = 30;

static SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").unwrap());

pub struct SummarySynthesizer<C> {
    provider: C,
}

impl<C: CompletionProvider> SummarySynthesizer<C> {
    pub fn new(provider: C) -> Self {
        Self { provider }
    }

    /// Summarize `text`. Always returns a non-empty summary ending in
    /// `"\n\n[Source: <url>]"`.
    ///
    /// One remote attempt is made with the first [`PROMPT_CHARS`] characters.
    /// A failed call (rate limits included) or a reply under
    /// [`MIN_REMOTE_WORDS`] words falls back to [`local_summary`].
    ///
    /// # Arguments
    ///
    /// * `text` - Extracted article text
    /// * `title` - Article title, used in the prompt and the generic fallback
    /// * `url` - Source URL appended to the summary
    ///
    /// # Returns
    ///
    /// The summary and which path produced it ([`SummarySource`]).
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let result = SummarySynthesizer::new(&client)
    ///     .summarize(&extracted.text, "Storm hits coast", url)
    ///     .await;
    /// assert!(result.summary.ends_with(&format!("[Source: {url}]")));
    /// ```
    #[instrument(level = "info", skip_all, fields(title = %title))]
    pub async fn summarize(&self, text: &str, title: &str, url: &str) -> SummaryResult {
        let (body, source) = match self.remote_summary(text, title).await {
            Some(summary) => (summary, SummarySource::Remote),
            None => local_summary(text, title),
        };
        info!(?source, words = word_count(&body), "Summary ready");
        SummaryResult {
            summary: with_source(&body, url),
            source,
        }
    }

    async fn remote_summary(&self, text: &str, title: &str) -> Option<String> {
        let prompt = format!(
            "Summarize this news article in 3-4 sentences. Focus on the main facts.\n\n\
             Title: {title}\n\n\
             Content: {}\n\n\
             Summary:",
            char_prefix(text, PROMPT_CHARS)
        );
        match self
            .provider
            .complete(&CompletionRequest::new(prompt, 0.1, 300))
            .await
        {
            Ok(summary) if word_count(&summary) >= MIN_REMOTE_WORDS => Some(summary),
            Ok(summary) => {
                warn!(words = word_count(&summary), "Remote summary too short, using fallback");
                None
            }
            Err(e) => {
                warn!(error = %e, "Remote summary failed, using fallback");
                None
            }
        }
    }
}

/// Summary built from the article itself, without any remote call.
pub fn local_summary(text: &str, title: &str) -> (String, SummarySource) {
    let sentences = SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .collect::<Vec<_>>();

    if sentences.len() >= 2 {
        let joined = sentences.iter().take(3).join(". ");
        (format!("{joined}."), SummarySource::Extractive)
    } else {
        (
            format!(
                "This article titled '{title}' discusses current news events. \
                 For the full details, please visit the original source."
            ),
            SummarySource::Generic,
        )
    }
}

fn with_source(summary: &str, url: &str) -> String {
    format!("{summary}\n\n[Source: {url}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionError;
    use crate::completion::testing::ScriptedProvider;

    const URL: &str = "https://news.example/story";

    const ARTICLE: &str = "The city council approved the new transit budget on Monday night. \
        Officials said the plan adds three bus routes across the east side! \
        Construction is expected to begin early next spring? \
        Critics argued the cost estimates were far too optimistic overall.";

    #[tokio::test]
    async fn test_remote_summary_used_when_long_enough() {
        let reply = "The council approved a transit budget adding three bus routes. \
                     Work starts next spring, though critics question the cost estimates.";
        let provider = ScriptedProvider::replying(reply);
        let result = SummarySynthesizer::new(&provider)
            .summarize(ARTICLE, "Transit budget", URL)
            .await;

        assert_eq!(result.source, SummarySource::Remote);
        assert_eq!(result.summary, format!("{reply}\n\n[Source: {URL}]"));

        let sent = &provider.requests()[0];
        assert!(sent.prompt.contains("Title: Transit budget"));
        assert!(sent.prompt.ends_with("Summary:"));
        assert_eq!(sent.temperature, 0.1);
        assert_eq!(sent.max_tokens, 300);
    }

    #[tokio::test]
    async fn test_prompt_truncates_content() {
        let provider = ScriptedProvider::failing(CompletionError::Empty);
        let long = "é".repeat(PROMPT_CHARS + 500);
        SummarySynthesizer::new(&provider)
            .summarize(&long, "t", URL)
            .await;
        let prompt = &provider.requests()[0].prompt;
        assert!(prompt.contains(&"é".repeat(PROMPT_CHARS)));
        assert!(!prompt.contains(&"é".repeat(PROMPT_CHARS + 1)));
    }

    #[tokio::test]
    async fn test_rate_limit_falls_back_to_extractive() {
        let provider = ScriptedProvider::failing(CompletionError::RateLimited);
        let result = SummarySynthesizer::new(&provider)
            .summarize(ARTICLE, "Transit budget", URL)
            .await;

        assert_eq!(result.source, SummarySource::Extractive);
        assert_eq!(
            result.summary,
            "The city council approved the new transit budget on Monday night. \
             Officials said the plan adds three bus routes across the east side. \
             Construction is expected to begin early next spring.\n\n\
             [Source: https://news.example/story]"
        );
    }

    #[tokio::test]
    async fn test_short_remote_reply_rejected() {
        let provider = ScriptedProvider::replying("Council approves budget.");
        let result = SummarySynthesizer::new(&provider)
            .summarize(ARTICLE, "Transit budget", URL)
            .await;
        assert_eq!(result.source, SummarySource::Extractive);
    }

    #[tokio::test]
    async fn test_generic_summary_for_thin_text() {
        let provider = ScriptedProvider::failing(CompletionError::Timeout);
        let result = SummarySynthesizer::new(&provider)
            .summarize("Short. Also short. Only one sentence here is long enough to count.", "Budget vote", URL)
            .await;

        assert_eq!(result.source, SummarySource::Generic);
        assert_eq!(
            result.summary,
            "This article titled 'Budget vote' discusses current news events. \
             For the full details, please visit the original source.\n\n\
             [Source: https://news.example/story]"
        );
    }

    #[test]
    fn test_local_summary_two_sentences_suffice() {
        let text = "First sentence that is comfortably over thirty characters. \
                    Second sentence that also clears the thirty character bar";
        let (summary, source) = local_summary(text, "t");
        assert_eq!(source, SummarySource::Extractive);
        assert_eq!(
            summary,
            "First sentence that is comfortably over thirty characters. \
             Second sentence that also clears the thirty character bar."
        );
    }

    #[test]
    fn test_local_summary_empty_text() {
        let (summary, source) = local_summary("", "Empty");
        assert_eq!(source, SummarySource::Generic);
        assert!(summary.contains("'Empty'"));
    }
}
