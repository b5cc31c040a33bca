//! # Headline Digest
//!
//! Command-line front end: list headlines, extract and summarize articles,
//! build comprehension quizzes, chat, and write whole-edition digests.
//!
//! ## Usage
//!
//! ```sh
//! headline_digest digest -j ./json --country us --category technology
//! ```
//!
//! ## Digest pipeline
//!
//! 1. **Headlines**: fetch top headlines for the country and category
//! 2. **Summaries**: fetch, extract and summarize each article (bounded concurrency)
//! 3. **Output**: write `{json_output_dir}/{date}/{time_of_day}.json`

use chrono::{Local, Utc};
use clap::Parser;
use futures::stream::{self, StreamExt};
use headline_digest::chat::{self, RateLimitSnapshot};
use headline_digest::cli::{Cli, Command};
use headline_digest::completion::{ChatCompletionsClient, check_api_key};
use headline_digest::config::AppConfig;
use headline_digest::headlines::{HeadlineClient, HeadlineListing, validate_category, validate_country};
use headline_digest::models::Digest;
use headline_digest::outputs::json;
use headline_digest::pipeline::{Pipeline, PipelineError, fallback_summary};
use headline_digest::utils::{ensure_writable_dir, time_of_day};
use serde::Serialize;
use serde_json::json;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the reader-facing error object, then hand the error back to `main`.
fn report(err: PipelineError, url: &str, with_fallback: bool) -> Result<(), Box<dyn Error>> {
    let mut body = json!({ "status": "error", "message": err.user_message() });
    if with_fallback {
        body["fallback_summary"] = json!(fallback_summary(url));
    }
    print_json(&body)?;
    Err(err.into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr; stdout carries JSON) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    debug!(command = ?args.command, "Parsed CLI arguments");

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let provider = ChatCompletionsClient::new(&config.completion, args.completion_api_key.clone())?;
    if !provider.has_api_key() {
        info!("No completion API key configured; remote calls will use local fallbacks");
    }

    match args.command {
        Command::Headlines { country, category } => {
            let client = HeadlineClient::new(&config.headlines, args.news_api_key.clone())?;
            let articles = client.top_headlines(&country, &category).await?;
            print_json(&HeadlineListing::new(&country, &category, articles))?;
        }
        Command::Extract { url, max_words } => {
            let pipeline = Pipeline::from_config(&config, provider)?;
            match pipeline.extract_url(&url, max_words).await {
                Ok(extracted) => print_json(&extracted)?,
                Err(e) => return report(e, &url, false),
            }
        }
        Command::Summarize { url, title } => {
            let pipeline = Pipeline::from_config(&config, provider)?;
            match pipeline.summarize_url(&url, &title).await {
                Ok(summary) => print_json(&summary)?,
                Err(e) => return report(e, &url, true),
            }
        }
        Command::Quiz { url, title } => {
            let pipeline = Pipeline::from_config(&config, provider)?;
            match pipeline.quiz_url(&url, &title).await {
                Ok(article_quiz) => print_json(&article_quiz)?,
                Err(e) => return report(e, &url, false),
            }
        }
        Command::Chat { message, state } => {
            let snapshot = chat::load_snapshot(&state).await?;
            let (response, next): (String, RateLimitSnapshot) =
                chat::respond(&provider, &snapshot, &message, Utc::now()).await;
            chat::save_snapshot(&state, &next).await?;
            print_json(&json!({
                "response": response,
                "rate_limited": next.rate_limited,
                "request_count": next.request_count,
            }))?;
        }
        Command::CheckKey => match check_api_key(&provider).await {
            Ok(_) => print_json(&json!({ "status": "ok", "message": "API key is working!" }))?,
            Err(e) => {
                print_json(&json!({ "status": "error", "message": e.to_string() }))?;
                return Err(e.into());
            }
        },
        Command::Digest {
            json_output_dir,
            country,
            category,
            concurrency,
        } => {
            // Early check: ensure JSON output dir is writable
            if let Err(e) = ensure_writable_dir(&json_output_dir).await {
                error!(
                    path = %json_output_dir,
                    error = %e,
                    "JSON output directory is not writable (fix perms or choose a different path)"
                );
                return Err(e);
            }

            let country = validate_country(&country)?;
            let category = validate_category(&category)?;
            let client = HeadlineClient::new(&config.headlines, args.news_api_key.clone())?;
            let headlines = client.top_headlines(&country, &category).await?;
            let pipeline = Pipeline::from_config(&config, provider)?;

            let now = Local::now();
            let mut digest = Digest {
                local_date: now.date_naive().to_string(),
                time_of_day: time_of_day(now.time()).to_string(),
                local_time: now.time().format("%H:%M:%S").to_string(),
                country,
                category,
                entries: Vec::new(),
            };
            info!(
                time_of_day = %digest.time_of_day,
                local_date = %digest.local_date,
                headlines = headlines.len(),
                "Digest initialized"
            );

            let concurrency = concurrency.max(1);
            let mut entries = stream::iter(headlines.into_iter().enumerate())
                .map(|(i, headline)| {
                    let pipeline = &pipeline;
                    async move { (i, pipeline.digest_entry(headline).await) }
                })
                .buffer_unordered(concurrency)
                .collect::<Vec<_>>()
                .await;
            entries.sort_by_key(|(i, _)| *i);
            digest.entries = entries.into_iter().map(|(_, entry)| entry).collect();

            let summarized = digest.entries.iter().filter(|e| e.summary.is_some()).count();
            info!(
                total = digest.entries.len(),
                summarized,
                failed = digest.entries.len() - summarized,
                "Completed digest processing"
            );

            let path = json::write_digest(&digest, &json_output_dir).await?;
            print_json(&json!({
                "status": "ok",
                "path": path,
                "entries": digest.entries.len(),
                "summarized": summarized,
            }))?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
