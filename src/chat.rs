//! Rate-limit-aware chat assistant.
//!
//! The assistant holds no state of its own. Each turn takes the previous
//! [`RateLimitSnapshot`] and returns the reply together with the next
//! snapshot, so callers decide where (and whether) the snapshot lives. The
//! CLI persists it as JSON between invocations.

use crate::completion::{CompletionProvider, CompletionRequest};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Seconds remote calls stay suspended after a 429.
pub const RATE_LIMIT_COOLDOWN_SECS: i64 = 3600;

const WELCOME: &str = "Hello! I'm your AI assistant. What would you like to know?";

const HELP: &str = "How I can help:

I can answer questions on any topic, explain concepts and ideas, and help \
with learning and research.

Note about API limits: the free tier has daily request limits. If you see \
rate limit messages, the service will resume after the reset period.";

const RATE_LIMITED_STATUS: &str = "Rate limit status: free daily limit exceeded.

All free API requests for today have been used. Limits reset daily; add \
credits to your OpenRouter account for a higher allowance, or try again later.";

const RATE_LIMITED_REPLY: &str = "Rate limit exceeded.

I'd love to answer your question, but the free daily API limit has been \
reached. Limits refresh every 24 hours. In the meantime you can ask about \
\"status\" or try again later.";

const FAILURE_REPLY: &str = "Temporary issue.

I'm having trouble connecting to the AI service right now. This could be a \
network problem, service maintenance, or API key configuration. Please try \
again in a few minutes.";

/// What the assistant remembers about the completion service between turns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub rate_limited: bool,
    pub last_call_at: Option<DateTime<Utc>>,
    pub request_count: u64,
}

impl RateLimitSnapshot {
    /// True while a recent 429 still suspends remote calls.
    pub fn cooling_down(&self, now: DateTime<Utc>) -> bool {
        let cooldown = Duration::seconds(RATE_LIMIT_COOLDOWN_SECS);
        self.rate_limited
            && self
                .last_call_at
                .is_some_and(|last| now.signed_duration_since(last) < cooldown)
    }
}

fn greeting(snapshot: &RateLimitSnapshot) -> String {
    let status = if snapshot.rate_limited {
        "RATE LIMITED"
    } else {
        "READY"
    };
    format!(
        "Hello! I'm your AI assistant! ({status})\n\n\
         I can help you with questions, but note: free API limits may apply.\n\n\
         What would you like to know?"
    )
}

fn status(snapshot: &RateLimitSnapshot) -> String {
    if snapshot.rate_limited {
        RATE_LIMITED_STATUS.to_string()
    } else {
        format!(
            "Status: API is available\nRequests so far: {}",
            snapshot.request_count
        )
    }
}

/// Reply to `message`, returning the reply and the updated snapshot.
///
/// Greetings, help and status queries are answered locally and leave the
/// snapshot untouched. Every remote attempt bumps `request_count` and
/// `last_call_at`; a 429 sets `rate_limited` and a success clears it.
#[instrument(level = "info", skip_all, fields(request_count = snapshot.request_count))]
pub async fn respond<C: CompletionProvider>(
    provider: &C,
    snapshot: &RateLimitSnapshot,
    message: &str,
    now: DateTime<Utc>,
) -> (String, RateLimitSnapshot) {
    let normalized = message.trim().to_lowercase();
    let canned = match normalized.as_str() {
        "" => Some(WELCOME.to_string()),
        "hello" | "hi" | "hey" => Some(greeting(snapshot)),
        "help" | "what can you do" => Some(HELP.to_string()),
        "status" | "limit" | "rate limit" => Some(status(snapshot)),
        _ => None,
    };
    if let Some(reply) = canned {
        return (reply, snapshot.clone());
    }

    if snapshot.cooling_down(now) {
        info!("Skipping remote call during rate-limit cooldown");
        return (RATE_LIMITED_REPLY.to_string(), snapshot.clone());
    }

    let mut next = RateLimitSnapshot {
        rate_limited: snapshot.rate_limited,
        last_call_at: Some(now),
        request_count: snapshot.request_count.saturating_add(1),
    };
    let request = CompletionRequest::new(message.trim(), 0.7, 800);
    match provider.complete(&request).await {
        Ok(reply) => {
            next.rate_limited = false;
            (reply, next)
        }
        Err(e) if e.is_rate_limited() => {
            warn!("Completion service rate limit hit");
            next.rate_limited = true;
            (RATE_LIMITED_REPLY.to_string(), next)
        }
        Err(e) => {
            warn!(error = %e, "Chat completion failed");
            let reply = if next.rate_limited {
                RATE_LIMITED_REPLY
            } else {
                FAILURE_REPLY
            };
            (reply.to_string(), next)
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatStateError {
    #[error("failed to access chat state {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt chat state {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read a snapshot; a missing file is a fresh snapshot.
pub async fn load_snapshot(path: &Path) -> Result<RateLimitSnapshot, ChatStateError> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => serde_json::from_str(&raw).map_err(|source| ChatStateError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(RateLimitSnapshot::default()),
        Err(source) => Err(ChatStateError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub async fn save_snapshot(path: &Path, snapshot: &RateLimitSnapshot) -> Result<(), ChatStateError> {
    let io_err = |source| ChatStateError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(snapshot).map_err(|source| ChatStateError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, json).await.map_err(io_err)
}
