//! Command-line interface definitions for Headline Digest.
//!
//! API keys can be given as flags or through the environment. Every command
//! prints JSON to stdout; logs go to stderr.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Headline Digest application.
///
/// # Examples
///
/// ```sh
/// # Today's US technology headlines
/// headline_digest headlines --country us --category technology
///
/// # Summarize one article
/// headline_digest summarize https://example.com/story --title "Storm hits coast"
///
/// # Summarize every headline and write the digest JSON
/// headline_digest digest -j ./json --country gb
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API key for the OpenAI-compatible completion service
    #[arg(long, env = "OPENROUTER_API_KEY", global = true, hide_env_values = true)]
    pub completion_api_key: Option<String>,

    /// API key for the headline provider
    #[arg(long, env = "NEWS_API_KEY", global = true, hide_env_values = true)]
    pub news_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List top headlines
    Headlines {
        #[arg(long, default_value = "us")]
        country: String,
        #[arg(long, default_value = "general")]
        category: String,
    },
    /// Extract readable text from an article page
    Extract {
        url: String,
        /// Word cap applied to the extracted text
        #[arg(long, default_value_t = 1500)]
        max_words: usize,
    },
    /// Summarize an article page
    Summarize {
        url: String,
        #[arg(long, default_value = "Article")]
        title: String,
    },
    /// Build a three-question comprehension quiz for an article page
    Quiz {
        url: String,
        #[arg(long, default_value = "Current News Article")]
        title: String,
    },
    /// Ask the chat assistant a question
    Chat {
        message: String,
        /// File holding rate-limit state between invocations
        #[arg(long, default_value = ".headline_digest/chat_state.json")]
        state: PathBuf,
    },
    /// Check that the completion API key works
    CheckKey,
    /// Summarize every top headline and write the digest JSON
    Digest {
        /// Output directory for the digest JSON file
        #[arg(short, long)]
        json_output_dir: String,
        #[arg(long, default_value = "us")]
        country: String,
        #[arg(long, default_value = "general")]
        category: String,
        /// Articles summarized concurrently
        #[arg(long, default_value_t = 4)]
        concurrency: usize,
    },
}
