use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::conversation::Message;
use crate::error::RelayError;
use crate::Result;

pub const DEFAULT_RETRIES: u32 = 2;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

const GENERIC_FAILURE: &str = "Failed to get a response. Please try again later.";

/// The only error shape that ever crosses into the UI layer: a fixed,
/// user-facing sentence with no transport detail attached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DisplayError {
    pub message: String,
}

impl DisplayError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

enum Failure {
    Timeout,
    NoResponse,
    Status { code: u16, body: Value },
}

impl Failure {
    // Only transient failures are worth another attempt; auth, rate-limit and
    // malformed-request responses will not improve on retry.
    fn retryable(&self) -> bool {
        match self {
            Failure::Timeout | Failure::NoResponse => true,
            Failure::Status { code, .. } => *code >= 500,
        }
    }

    fn translate(&self) -> DisplayError {
        match self {
            Failure::Timeout => {
                DisplayError::new("Request timed out. The server took too long to respond.")
            }
            Failure::NoResponse => DisplayError::new(GENERIC_FAILURE),
            Failure::Status { code, body } => match code {
                401 => DisplayError::new(
                    "Authentication error. Please check API key configuration.",
                ),
                403 => DisplayError::new("Access forbidden. Please check permissions."),
                429 => DisplayError::new("Rate limit exceeded. Please try again later."),
                500 => DisplayError::new(
                    "Server error. The API encountered an unexpected condition.",
                ),
                _ => body
                    .get("error")
                    .and_then(|error| error.as_str())
                    .map(DisplayError::new)
                    .unwrap_or_else(|| DisplayError::new(GENERIC_FAILURE)),
            },
        }
    }
}

/// Thin client for the relay's `/api/chat` endpoint with the fixed retry
/// policy: transient failures get up to `retries` additional attempts, one
/// second apart; everything else surfaces immediately as a [`DisplayError`].
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_CLIENT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Runtime(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Sends the conversation to the relay, returning the upstream completion
    /// payload or the translated user-facing failure.
    pub async fn send_conversation(
        &self,
        messages: &[Message],
        model_id: &str,
        retries: u32,
    ) -> std::result::Result<Value, DisplayError> {
        let url = format!("{}/api/chat", self.base_url.trim_end_matches('/'));
        let request = json!({"messages": messages, "modelId": model_id});
        let mut remaining = retries;

        loop {
            let failure = match self.http.post(&url).json(&request).send().await {
                Ok(response) if response.status().is_success() => {
                    return response
                        .json::<Value>()
                        .await
                        .map_err(|_| DisplayError::new(GENERIC_FAILURE));
                }
                Ok(response) => {
                    let code = response.status().as_u16();
                    let body = response.json::<Value>().await.unwrap_or(Value::Null);
                    Failure::Status { code, body }
                }
                Err(err) if err.is_timeout() => Failure::Timeout,
                Err(_) => Failure::NoResponse,
            };

            if remaining > 0 && failure.retryable() {
                debug!(model_id, remaining, "retrying chat request");
                tokio::time::sleep(RETRY_DELAY).await;
                remaining -= 1;
                continue;
            }

            let translated = failure.translate();
            warn!(model_id, "chat request failed: {}", translated.message);
            return Err(translated);
        }
    }
}
