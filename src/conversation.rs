use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged entry in a conversation. The optional flags mirror what the
/// chat UI renders: `is_error` marks a translated failure, `is_loading` marks
/// the transient placeholder that is replaced wholesale once the round-trip
/// resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(
        rename = "isError",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_error: bool,
    #[serde(
        rename = "isLoading",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_loading: bool,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
            is_error: false,
            is_loading: false,
        }
    }

    pub fn timestamped(mut self) -> Self {
        self.timestamp = Some(Utc::now());
        self
    }

    pub fn loading_placeholder() -> Self {
        let mut message = Message::assistant("").timestamped();
        message.is_loading = true;
        message
    }

    pub fn error(content: impl Into<String>) -> Self {
        let mut message = Message::assistant(content).timestamped();
        message.is_error = true;
        message
    }
}

/// Ordered message sequence owned by a single session. Messages are append
/// only; the sole exception is the loading placeholder, which
/// [`Conversation::resolve_pending`] replaces in place.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn reset(&mut self) {
        self.messages.clear();
    }

    /// Messages to forward upstream for a new user prompt: the history plus
    /// the prompt, with a synthetic system message prepended only when the
    /// conversation was empty.
    pub fn outbound_with(&self, user_message: &Message) -> Vec<Message> {
        let mut outbound = if self.messages.is_empty() {
            vec![Message::system(DEFAULT_SYSTEM_PROMPT)]
        } else {
            self.messages.clone()
        };
        outbound.push(user_message.clone());
        outbound
    }

    /// Replaces the trailing loading placeholder with the resolved message.
    /// A no-op when no placeholder is pending.
    pub fn resolve_pending(&mut self, resolved: Message) {
        if let Some(last) = self.messages.last_mut() {
            if last.is_loading {
                *last = resolved;
            }
        }
    }
}
