//! Comprehension quiz synthesis.
//!
//! A quiz is only attempted for articles of at least [`MIN_CONTENT_WORDS`]
//! words. The remote reply must parse as `{"questions": [...]}` with at least
//! three entries, and the first three must be well-formed (later entries are
//! ignored); anything else yields
//! the fixed template quiz, so once content is sufficient generation never
//! fails.

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::models::{QUIZ_LENGTH, Quiz, QuizItem, QuizItemWire, QuizShapeError};
use crate::utils::{char_prefix, looks_truncated, truncate_for_log, word_count};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Articles shorter than this get no quiz at all.
pub const MIN_CONTENT_WORDS: usize = 50;
/// Characters of article text included in the prompt.
pub const PROMPT_CHARS: usize = 2000;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:json)?\s*|\s*```").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizGenerationFailure {
    #[error("article has {words} words; at least {required} are needed for a quiz")]
    InsufficientContent { words: usize, required: usize },
}

/// Why a remote quiz reply was rejected. Only ever logged.
#[derive(Debug, Error)]
enum RemoteQuizError {
    #[error(transparent)]
    Completion(#[from] crate::completion::CompletionError),
    #[error("reply is not quiz JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reply has {0} questions, need at least 3")]
    TooFew(usize),
    #[error(transparent)]
    Shape(#[from] QuizShapeError),
}

#[derive(Debug, Deserialize)]
struct QuizReply {
    questions: Vec<serde_json::Value>,
}

pub struct QuizSynthesizer<C> {
    provider: C,
}

impl<C: CompletionProvider> QuizSynthesizer<C> {
    pub fn new(provider: C) -> Self {
        Self { provider }
    }

    /// Build a three-question quiz about `content`.
    ///
    /// The remote reply is used when its first three questions are well
    /// formed; otherwise the fixed [`template_quiz`] is returned.
    ///
    /// # Arguments
    ///
    /// * `content` - Extracted article text; the first [`PROMPT_CHARS`]
    ///   characters go into the prompt
    /// * `title` - Article title
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let quiz = QuizSynthesizer::new(&client).generate(&text, "Budget vote").await?;
    /// assert_eq!(quiz.questions().len(), 3);
    /// ```
    ///
    /// # Errors
    ///
    /// [`QuizGenerationFailure::InsufficientContent`] when `content` has fewer
    /// than [`MIN_CONTENT_WORDS`] words. No degraded quiz is produced.
    #[instrument(level = "info", skip_all, fields(title = %title))]
    pub async fn generate(&self, content: &str, title: &str) -> Result<Quiz, QuizGenerationFailure> {
        let words = word_count(content);
        if words < MIN_CONTENT_WORDS {
            return Err(QuizGenerationFailure::InsufficientContent {
                words,
                required: MIN_CONTENT_WORDS,
            });
        }

        match self.remote_quiz(content, title).await {
            Ok(quiz) => {
                info!("Quiz generated remotely");
                Ok(quiz)
            }
            Err(e) => {
                warn!(error = %e, "Remote quiz rejected, using template");
                Ok(template_quiz(title))
            }
        }
    }

    async fn remote_quiz(&self, content: &str, title: &str) -> Result<Quiz, RemoteQuizError> {
        let request = CompletionRequest::new(quiz_prompt(content, title), 0.3, 800);
        let reply = self.provider.complete(&request).await?;
        parse_quiz_reply(&reply)
    }
}

fn quiz_prompt(content: &str, title: &str) -> String {
    format!(
        r#"Based on the following article, create exactly 3 multiple-choice questions to test comprehension.

Article Title: {title}
Content: {content}

Return ONLY a valid JSON object in this exact format with no additional text:
{{
  "questions": [
    {{
      "question": "Question text here?",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correct": 0,
      "explanation": "Brief explanation why this is correct"
    }}
  ]
}}

Rules:
- Create exactly 3 questions
- Each question must have 4 options
- "correct" is the index (0-3) of the correct answer
- Questions should test understanding of key facts from the article
- Make questions clear and unambiguous"#,
        content = char_prefix(content, PROMPT_CHARS)
    )
}

fn parse_quiz_reply(reply: &str) -> Result<Quiz, RemoteQuizError> {
    let cleaned = CODE_FENCE.replace_all(reply, "");
    let parsed: QuizReply = serde_json::from_str(cleaned.trim()).map_err(|e| {
        if looks_truncated(&e) {
            warn!("Quiz reply looks truncated by the token limit");
        }
        debug!(reply = %truncate_for_log(reply, 400), "Unparseable quiz reply");
        e
    })?;

    if parsed.questions.len() < QUIZ_LENGTH {
        return Err(RemoteQuizError::TooFew(parsed.questions.len()));
    }
    // Items past the first three are never inspected.
    let mut items = Vec::with_capacity(QUIZ_LENGTH);
    for (index, value) in parsed.questions.into_iter().take(QUIZ_LENGTH).enumerate() {
        let wire: QuizItemWire = serde_json::from_value(value)?;
        let item = QuizItem::try_from(wire).map_err(|e| QuizShapeError::Item {
            index,
            source: Box::new(e),
        })?;
        items.push(item);
    }
    Ok(Quiz::new(items)?)
}

fn template_item(question: String, options: [&str; 4], explanation: &str) -> QuizItem {
    QuizItem {
        question,
        options: options.map(str::to_string),
        correct_index: 0,
        explanation: explanation.to_string(),
    }
}

/// The fixed fallback quiz. Every item's correct answer is option 0.
pub fn template_quiz(title: &str) -> Quiz {
    let questions = vec![
        template_item(
            format!("What is the main topic discussed in this article about '{title}'?"),
            [
                "The primary subject matter of the article",
                "Unrelated technical details",
                "Historical background information",
                "Future predictions and speculation",
            ],
            "The question focuses on identifying the core subject discussed in the news article.",
        ),
        template_item(
            "Which of the following best describes the key information presented?".to_string(),
            [
                "Factual reporting of recent events or developments",
                "Opinion-based commentary without evidence",
                "Entertainment-focused content",
                "Advertisement or promotional material",
            ],
            "News articles typically present factual information about recent events.",
        ),
        template_item(
            "What is the primary purpose of this news article?".to_string(),
            [
                "To inform readers about current events",
                "To entertain with fictional stories",
                "To sell products or services",
                "To provide personal opinions only",
            ],
            "The main purpose of news articles is to inform readers about current affairs.",
        ),
    ];
    Quiz::fixed(questions)
}
