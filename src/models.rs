//! Data models shared across the pipeline.
//!
//! - [`Document`]: a fetched page, immutable once built
//! - [`ExtractionResult`]: the winning strategy's normalized text
//! - [`SummaryResult`] / [`ArticleSummary`]: summarizer output
//! - [`QuizItem`] / [`Quiz`]: validated comprehension quiz
//! - [`Headline`] / [`Digest`]: headline listings and the digest artifact
//!
//! Every value here lives for a single request; nothing is cached.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Raw HTML of a fetched page together with its source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    url: String,
    html: String,
}

impl Document {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

/// The extraction strategy that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    JsonLd,
    ArticleTag,
    ContentContainer,
    SmartParagraphs,
    MetaDescription,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonLd => "json_ld",
            Self::ArticleTag => "article_tag",
            Self::ContentContainer => "content_container",
            Self::SmartParagraphs => "smart_paragraphs",
            Self::MetaDescription => "meta_description",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clean article text produced by the content extractor.
///
/// `method` is diagnostic only; no consumer branches on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub method: ExtractionMethod,
    pub word_count: usize,
}

/// Where a summary came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    /// Generated by the remote completion service
    Remote,
    /// Literal sentences selected from the article
    Extractive,
    /// Templated sentence referencing the title
    Generic,
}

/// A summary with its source attribution already appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: String,
    pub source: SummarySource,
}

/// Everything the pipeline knows about one summarized article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub url: String,
    pub title: String,
    pub method: ExtractionMethod,
    pub word_count: usize,
    #[serde(flatten)]
    pub summary: SummaryResult,
}

/// Number of options every quiz question carries.
pub const QUIZ_OPTIONS: usize = 4;

/// Number of questions in a quiz.
pub const QUIZ_LENGTH: usize = 3;

/// Reasons a quiz or quiz item fails validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizShapeError {
    #[error("expected 4 options, got {0}")]
    OptionCount(usize),
    #[error("correct index {0} does not point at one of the 4 options")]
    CorrectIndex(i64),
    #[error("expected 3 questions, got {0}")]
    QuestionCount(usize),
    #[error("question {index}: {source}")]
    Item {
        index: usize,
        #[source]
        source: Box<QuizShapeError>,
    },
}

/// One multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizItemWire")]
pub struct QuizItem {
    pub question: String,
    pub options: [String; QUIZ_OPTIONS],
    #[serde(rename = "correct")]
    pub correct_index: usize,
    pub explanation: String,
}

/// Loosely typed question as it arrives over the wire.
#[derive(Debug, Deserialize)]
pub struct QuizItemWire {
    pub question: String,
    pub options: Vec<String>,
    pub correct: i64,
    #[serde(default)]
    pub explanation: String,
}

impl TryFrom<QuizItemWire> for QuizItem {
    type Error = QuizShapeError;

    fn try_from(wire: QuizItemWire) -> Result<Self, Self::Error> {
        let count = wire.options.len();
        let options: [String; QUIZ_OPTIONS] = wire
            .options
            .try_into()
            .map_err(|_| QuizShapeError::OptionCount(count))?;
        let correct_index = usize::try_from(wire.correct)
            .ok()
            .filter(|i| *i < QUIZ_OPTIONS)
            .ok_or(QuizShapeError::CorrectIndex(wire.correct))?;
        Ok(Self {
            question: wire.question,
            options,
            correct_index,
            explanation: wire.explanation,
        })
    }
}

impl QuizItem {
    /// The text of the correct option.
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }
}

/// Exactly [`QUIZ_LENGTH`] validated questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizWire")]
pub struct Quiz {
    questions: Vec<QuizItem>,
}

#[derive(Debug, Deserialize)]
struct QuizWire {
    questions: Vec<QuizItem>,
}

impl TryFrom<QuizWire> for Quiz {
    type Error = QuizShapeError;

    fn try_from(wire: QuizWire) -> Result<Self, Self::Error> {
        Quiz::new(wire.questions)
    }
}

impl Quiz {
    /// Build a quiz, rejecting anything but exactly three well-formed items.
    pub fn new(questions: Vec<QuizItem>) -> Result<Self, QuizShapeError> {
        if questions.len() != QUIZ_LENGTH {
            return Err(QuizShapeError::QuestionCount(questions.len()));
        }
        for (index, item) in questions.iter().enumerate() {
            if item.correct_index >= item.options.len() {
                return Err(QuizShapeError::Item {
                    index,
                    source: Box::new(QuizShapeError::CorrectIndex(item.correct_index as i64)),
                });
            }
        }
        Ok(Self { questions })
    }

    /// Wrap questions that are well-formed by construction.
    pub(crate) fn fixed(questions: Vec<QuizItem>) -> Self {
        debug_assert_eq!(questions.len(), QUIZ_LENGTH);
        Self { questions }
    }

    pub fn questions(&self) -> &[QuizItem] {
        &self.questions
    }
}

/// A headline as shown to readers, already normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub source: String,
    pub description: String,
    pub url: Option<String>,
    pub image: Option<String>,
    /// `Mon DD, YYYY`, or `Recent` when the provider date is unusable
    pub published: String,
}

/// One headline in a digest, with either its summary or the failure shown instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestEntry {
    pub headline: Headline,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ArticleSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

/// A batch of summarized headlines for one country and category.
///
/// The `time_of_day` field categorizes editions as:
/// - `"morning"`: 00:00 - 08:00
/// - `"afternoon"`: 08:00 - 16:00
/// - `"evening"`: 16:00 - 24:00
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    /// The date of publication in `YYYY-MM-DD` format.
    pub local_date: String,
    pub time_of_day: String,
    pub local_time: String,
    pub country: String,
    pub category: String,
    pub entries: Vec<DigestEntry>,
}
