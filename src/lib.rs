pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod logging;
pub mod models;
pub mod quota;
pub mod relay;
pub mod runtime_paths;
pub mod session;

pub use error::RelayError;

pub type Result<T> = std::result::Result<T, RelayError>;
