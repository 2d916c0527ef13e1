use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("authentication error: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("storage error: {0}")]
    Storage(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl RelayError {
    /// HTTP status the error surfaces as at the relay boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            RelayError::BadRequest(_) => 400,
            RelayError::Auth(_) => 401,
            RelayError::RateLimited(_) => 429,
            RelayError::Timeout(_) => 504,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Config(_) | RelayError::Storage(_) | RelayError::Runtime(_) => 500,
        }
    }

    /// Message carried in the `error` field of a relay response body.
    pub fn public_message(&self) -> &str {
        match self {
            RelayError::BadRequest(message)
            | RelayError::Config(message)
            | RelayError::Auth(message)
            | RelayError::RateLimited(message)
            | RelayError::Timeout(message)
            | RelayError::Storage(message)
            | RelayError::Runtime(message) => message,
            RelayError::Upstream { message, .. } => message,
        }
    }
}

pub use crate::Result;
