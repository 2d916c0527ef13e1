use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info};

use crate::client::{ChatClient, DEFAULT_RETRIES};
use crate::conversation::{Conversation, Message};
use crate::error::RelayError;
use crate::models::{self, ModelInfo};
use crate::quota::QuotaGate;
use crate::runtime_paths;
use crate::Result;

const MISSING_CONTENT_APOLOGY: &str = "I apologize, but I couldn't generate a response.";

/// Session-scoped chat state: the conversation, the selected model, the daily
/// quota gate and the relay client, owned together instead of living as
/// ambient globals. One instance per UI session.
pub struct SessionContext {
    conversation: Conversation,
    selected_model: &'static ModelInfo,
    quota: QuotaGate,
    client: ChatClient,
    in_flight: bool,
}

impl SessionContext {
    pub fn new(relay_url: impl Into<String>) -> Result<Self> {
        Self::with_quota_path(relay_url, runtime_paths::default_quota_path())
    }

    pub fn with_quota_path(
        relay_url: impl Into<String>,
        quota_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            conversation: Conversation::new(),
            selected_model: models::default_model(),
            quota: QuotaGate::load(quota_path)?,
            client: ChatClient::new(relay_url)?,
            in_flight: false,
        })
    }

    pub fn with_client(relay_client: ChatClient, quota_path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            conversation: Conversation::new(),
            selected_model: models::default_model(),
            quota: QuotaGate::load(quota_path)?,
            client: relay_client,
            in_flight: false,
        })
    }

    pub fn messages(&self) -> &[Message] {
        self.conversation.messages()
    }

    pub fn selected_model(&self) -> &'static ModelInfo {
        self.selected_model
    }

    pub fn quota(&self) -> &QuotaGate {
        &self.quota
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Switches the model used for subsequent sends. A round-trip already in
    /// flight keeps the model it was issued with.
    pub fn select_model(&mut self, model_id: &str) -> Result<()> {
        let model = models::find(model_id)
            .ok_or_else(|| RelayError::BadRequest(format!("unknown model id: {model_id}")))?;
        self.selected_model = model;
        debug!(model_id, "model selected");
        Ok(())
    }

    pub fn new_chat(&mut self) {
        self.conversation.reset();
    }

    /// Submits one user prompt. The quota gate is consulted before anything
    /// reaches the relay; a blocked prompt leaves the conversation untouched.
    /// Relay failures surface as an error-flagged assistant message, never as
    /// a session-fatal error.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if self.in_flight {
            return Err(RelayError::BadRequest(
                "a request is already in flight".to_string(),
            ));
        }
        if !self.quota.try_acquire()? {
            info!("daily prompt limit reached; send rejected");
            return Err(RelayError::RateLimited(
                "daily prompt limit reached".to_string(),
            ));
        }

        let user_message = Message::user(text).timestamped();
        let outbound = self.conversation.outbound_with(&user_message);
        let model_id = self.selected_model.id;

        self.conversation.push(user_message);
        self.conversation.push(Message::loading_placeholder());
        self.in_flight = true;

        let result = self
            .client
            .send_conversation(&outbound, model_id, DEFAULT_RETRIES)
            .await;
        self.in_flight = false;

        match result {
            Ok(payload) => {
                let content = extract_assistant_content(&payload)
                    .unwrap_or_else(|| MISSING_CONTENT_APOLOGY.to_string());
                self.conversation
                    .resolve_pending(Message::assistant(content).timestamped());
            }
            Err(display) => {
                self.conversation
                    .resolve_pending(Message::error(display.message));
            }
        }
        Ok(())
    }
}

fn extract_assistant_content(payload: &Value) -> Option<String> {
    payload
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
}
