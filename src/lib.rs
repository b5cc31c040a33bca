//! # Headline Digest
//!
//! Aggregates news headlines, extracts readable article text from arbitrary
//! web pages, and produces AI-assisted summaries and comprehension quizzes.
//!
//! ## Architecture
//!
//! Every request runs one sequential pipeline:
//!
//! 1. **Fetching**: download raw HTML with browser-like headers ([`fetcher`])
//! 2. **Extraction**: run the ordered strategy cascade over the page ([`extractor`])
//! 3. **Normalization**: collapse whitespace, drop noise fragments, cap length ([`normalizer`])
//! 4. **Synthesis**: summarize ([`summarizer`]) or build a quiz ([`quiz`]) through
//!    an OpenAI-compatible completion service ([`completion`]), falling back to
//!    local output when the remote call fails
//!
//! Headlines come from a NewsAPI-compatible provider ([`headlines`]). Nothing is
//! cached or shared between requests; the only cross-call state (the chat
//! assistant's rate-limit knowledge in [`chat`]) is an immutable snapshot passed
//! in and returned.

pub mod chat;
pub mod cli;
pub mod completion;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod headlines;
pub mod models;
pub mod normalizer;
pub mod outputs;
pub mod pipeline;
pub mod quiz;
pub mod summarizer;
pub mod utils;
