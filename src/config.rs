use std::fmt;
use std::time::Duration;

pub const DEFAULT_UPSTREAM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Server-side relay configuration, sourced from the environment.
///
/// The upstream credential is deliberately optional here: a missing key is a
/// per-request configuration error, not a startup failure, so the relay can
/// boot and report the problem through its own error taxonomy.
#[derive(Clone)]
pub struct Config {
    api_key: Option<String>,
    pub upstream_base_url: String,
    pub request_timeout: Duration,
    pub verbose_errors: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let upstream_base_url = std::env::var("CHAT_RELAY_UPSTREAM_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE_URL.to_string());

        let request_timeout = std::env::var("CHAT_RELAY_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        let verbose_errors = std::env::var("CHAT_RELAY_VERBOSE_ERRORS")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Self {
            api_key,
            upstream_base_url,
            request_timeout,
            verbose_errors,
        }
    }

    pub fn new(api_key: Option<String>, upstream_base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            upstream_base_url: upstream_base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            verbose_errors: false,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_verbose_errors(mut self, verbose: bool) -> Self {
        self.verbose_errors = verbose;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

// The credential must never leak through debug formatting.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("upstream_base_url", &self.upstream_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("verbose_errors", &self.verbose_errors)
            .finish()
    }
}
