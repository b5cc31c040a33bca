//! Text completion against an OpenAI-compatible chat-completions endpoint.
//!
//! # Architecture
//!
//! - [`CompletionProvider`]: core trait the synthesizers and chat assistant
//!   are generic over
//! - [`ChatCompletionsClient`]: HTTP implementation (OpenRouter by default)
//!
//! Calls are never retried. The free tier this targets rate-limits
//! aggressively, and every caller already has a local fallback, so a failure
//! (including HTTP 429) is returned immediately as a [`CompletionError`].

use crate::config::CompletionConfig;
use crate::utils::truncate_for_log;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// One single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            max_tokens,
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion service rate limit exceeded")]
    RateLimited,
    #[error("completion service returned HTTP {0}")]
    Status(u16),
    #[error("completion request timed out")]
    Timeout,
    #[error("network failure calling completion service: {0}")]
    Network(#[source] reqwest::Error),
    #[error("malformed completion response: {0}")]
    Malformed(String),
    #[error("completion service returned no content")]
    Empty,
    #[error("no completion API key configured")]
    MissingApiKey,
}

impl CompletionError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }

    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}

/// Trait for async text completion.
///
/// Implementors send one prompt and return the model's text. The synthesizers
/// only ever see this trait, so tests substitute in-memory fakes.
pub trait CompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

impl<T> CompletionProvider for &T
where
    T: CompletionProvider + ?Sized,
{
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request).await
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`CompletionProvider`] backed by a `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionsClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl std::fmt::Debug for ChatCompletionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ChatCompletionsClient {
    /// Build a client. A missing key is allowed; every call then fails with
    /// [`CompletionError::MissingApiKey`] without touching the network.
    pub fn new(config: &CompletionConfig, api_key: Option<String>) -> Result<Self, CompletionError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(CompletionError::Network)?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl CompletionProvider for ChatCompletionsClient {
    #[instrument(level = "info", skip_all, fields(model = %self.model, max_tokens = request.max_tokens))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingApiKey)?;

        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let t0 = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(CompletionError::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(elapsed_ms = t0.elapsed().as_millis() as u64, "Completion rate limited");
            return Err(CompletionError::RateLimited);
        }
        if status != StatusCode::OK {
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Completion request failed"
            );
            return Err(CompletionError::Status(status.as_u16()));
        }

        let raw = response.text().await.map_err(CompletionError::from_reqwest)?;
        let parsed: ChatResponse = serde_json::from_str(&raw).map_err(|e| {
            debug!(body = %truncate_for_log(&raw, 400), "Unparseable completion body");
            CompletionError::Malformed(e.to_string())
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(CompletionError::Empty)?;

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            chars = content.chars().count(),
            "Completion received"
        );
        Ok(content)
    }
}

/// Send a minimal prompt to confirm the configured key works.
pub async fn check_api_key<C: CompletionProvider>(provider: &C) -> Result<String, CompletionError> {
    provider
        .complete(&CompletionRequest::new("Say hello in one word", 0.0, 10))
        .await
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ChatCompletionsClient {
        let config = CompletionConfig {
            base_url: format!("{}/api/v1/", server.uri()),
            model: "test/model".to_string(),
            timeout_secs: 1,
        };
        ChatCompletionsClient::new(&config, Some("sk-test".to_string())).unwrap()
    }

    fn reply(content: &str) -> serde_json::Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[tokio::test]
    async fn test_complete_sends_chat_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test/model",
                "messages": [{"role": "user", "content": "Summarize this"}],
                "max_tokens": 300
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("  A summary.  ")))
            .expect(1)
            .mount(&server)
            .await;

        let text = client(&server)
            .complete(&CompletionRequest::new("Summarize this", 0.1, 300))
            .await
            .unwrap();
        assert_eq!(text, "A summary.");
    }

    #[tokio::test]
    async fn test_rate_limit_is_distinguished() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server)
            .complete(&CompletionRequest::new("x", 0.1, 10))
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server)
            .complete(&CompletionRequest::new("x", 0.1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Status(503)));
    }

    #[tokio::test]
    async fn test_non_200_success_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = client(&server)
            .complete(&CompletionRequest::new("x", 0.1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Status(204)));
    }

    #[tokio::test]
    async fn test_malformed_and_empty_bodies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let c = client(&server);
        let req = CompletionRequest::new("x", 0.1, 10);
        assert!(matches!(
            c.complete(&req).await,
            Err(CompletionError::Malformed(_))
        ));
        assert!(matches!(c.complete(&req).await, Err(CompletionError::Empty)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(reply("late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .complete(&CompletionRequest::new("x", 0.1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::Timeout), "got {err:?}");
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("hi")))
            .expect(0)
            .mount(&server)
            .await;

        let config = CompletionConfig {
            base_url: server.uri(),
            ..CompletionConfig::default()
        };
        let c = ChatCompletionsClient::new(&config, Some("   ".to_string())).unwrap();
        assert!(!c.has_api_key());
        let err = c
            .complete(&CompletionRequest::new("x", 0.1, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_check_api_key_prompt() {
        let provider = testing::ScriptedProvider::replying("Hello");
        assert_eq!(check_api_key(&provider).await.unwrap(), "Hello");
        let sent = provider.requests();
        assert_eq!(sent[0].prompt, "Say hello in one word");
        assert_eq!(sent[0].max_tokens, 10);
    }

    #[test]
    fn test_debug_redacts_key() {
        let c = ChatCompletionsClient::new(&CompletionConfig::default(), Some("sk-secret".into()))
            .unwrap();
        let shown = format!("{c:?}");
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("<redacted>"));
    }
}
