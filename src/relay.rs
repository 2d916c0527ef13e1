use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Json, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::RelayError;
use crate::models::DEFAULT_MODEL_ID;
use crate::Result;

const UPSTREAM_TEMPERATURE: f64 = 0.7;
const UPSTREAM_MAX_TOKENS: u32 = 1000;

const ALLOW_METHODS: &str = "GET,OPTIONS,PATCH,DELETE,POST,PUT";
const ALLOW_HEADERS: &str = "X-CSRF-Token, X-Requested-With, Accept, Accept-Version, \
     Content-Length, Content-MD5, Content-Type, Date, X-Api-Version";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/chat",
            post(chat).options(preflight).fallback(method_not_allowed),
        )
        .layer(middleware::from_fn(with_cors_headers))
        .with_state(state)
}

async fn health() -> axum::Json<HealthResponse> {
    axum::Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse {
            error: "Method not allowed".to_string(),
            details: None,
        }),
    )
}

// The browser client is served from arbitrary origins, so every response on
// the chat path carries permissive CORS headers, error responses included.
async fn with_cors_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "access-control-allow-credentials",
        HeaderValue::from_static("true"),
    );
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    response
}

async fn chat(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    match forward_chat(&state, &body).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err((err, details)) => error_response(&state, err, details),
    }
}

fn error_response(state: &AppState, err: RelayError, details: Option<String>) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let details = if state.config.verbose_errors {
        details
    } else {
        None
    };
    (
        status,
        Json(ErrorResponse {
            error: err.public_message().to_string(),
            details,
        }),
    )
        .into_response()
}

/// Validates the request, attaches the server-held credential, and issues a
/// single upstream call. All failure classes are normalized into the
/// [`RelayError`] taxonomy; retries are the caller's concern, not the relay's.
async fn forward_chat(
    state: &AppState,
    body: &Value,
) -> std::result::Result<Value, (RelayError, Option<String>)> {
    let messages = body
        .get("messages")
        .and_then(|value| value.as_array())
        .filter(|messages| !messages.is_empty())
        .ok_or_else(|| {
            (
                RelayError::BadRequest("Valid messages array is required".to_string()),
                None,
            )
        })?;

    let model = body
        .get("modelId")
        .and_then(|value| value.as_str())
        .unwrap_or(DEFAULT_MODEL_ID);

    let Some(api_key) = state.config.api_key() else {
        error!("OPENAI_API_KEY environment variable is not configured");
        return Err((
            RelayError::Config("API key not configured".to_string()),
            None,
        ));
    };

    info!(model, message_count = messages.len(), "forwarding chat completion request");

    let url = format!(
        "{}/chat/completions",
        state.config.upstream_base_url.trim_end_matches('/')
    );
    let request = json!({
        "model": model,
        "messages": messages,
        "temperature": UPSTREAM_TEMPERATURE,
        "max_tokens": UPSTREAM_MAX_TOKENS,
    });

    let response = state
        .http
        .post(url)
        .bearer_auth(api_key)
        .timeout(state.config.request_timeout)
        .json(&request)
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(err) if err.is_timeout() => {
            warn!(model, "upstream chat completion timed out");
            return Err((
                RelayError::Timeout("Request to OpenAI timed out".to_string()),
                Some(err.to_string()),
            ));
        }
        Err(err) => {
            // No response at all: connection refused, DNS failure, reset.
            error!(model, "upstream chat completion transport failure: {err}");
            return Err((
                RelayError::Upstream {
                    status: 500,
                    message: "Failed to get a response from OpenAI".to_string(),
                },
                Some(err.to_string()),
            ));
        }
    };

    let status = response.status();
    if status.is_success() {
        let payload = response.json::<Value>().await.map_err(|err| {
            (
                RelayError::Upstream {
                    status: 500,
                    message: "Failed to get a response from OpenAI".to_string(),
                },
                Some(err.to_string()),
            )
        })?;
        info!(model, "upstream chat completion succeeded");
        return Ok(payload);
    }

    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    warn!(model, status = status.as_u16(), "upstream chat completion failed");

    let err = match status.as_u16() {
        401 => RelayError::Auth("Invalid API key or authentication error".to_string()),
        429 => RelayError::RateLimited("Rate limit exceeded with OpenAI API".to_string()),
        code => {
            let message = body
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| "Failed to get a response from OpenAI".to_string());
            RelayError::Upstream {
                status: code,
                message,
            }
        }
    };
    Err((err, None))
}

pub async fn run(host: &str, port: u16, config: Config) -> Result<()> {
    run_with_shutdown(host, port, config, futures::future::pending::<()>()).await
}

pub async fn run_with_shutdown<F>(host: &str, port: u16, config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if !config.has_api_key() {
        warn!("starting without OPENAI_API_KEY; chat requests will fail until it is set");
    }

    let app = build_router(AppState::new(config));
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RelayError::Runtime(e.to_string()))?;
    info!(%addr, "chat relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RelayError::Runtime(e.to_string()))?;

    Ok(())
}
