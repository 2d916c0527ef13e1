use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::json;

use chat_relay::client::ChatClient;
use chat_relay::conversation::Message;

fn prompt() -> Vec<Message> {
    vec![Message::system("You are a helpful assistant."), Message::user("hi")]
}

#[tokio::test]
async fn success_returns_relay_payload() {
    let server = MockServer::start_async().await;
    let payload = json!({
        "choices": [{"message": {"role": "assistant", "content": "hello"}}]
    });
    let relay = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/chat")
                .json_body_includes(r#"{"modelId": "gpt-4o"}"#);
            then.status(200).json_body(payload.clone());
        })
        .await;

    let client = ChatClient::new(server.base_url()).unwrap();
    let result = client.send_conversation(&prompt(), "gpt-4o", 2).await;

    assert_eq!(result.unwrap(), payload);
    relay.assert_calls(1);
}

#[tokio::test]
async fn rate_limit_is_not_retried() {
    let server = MockServer::start_async().await;
    let relay = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(429).json_body(json!({"error": "slow down"}));
        })
        .await;

    let client = ChatClient::new(server.base_url()).unwrap();
    let err = client
        .send_conversation(&prompt(), "gpt-4o", 2)
        .await
        .unwrap_err();

    assert_eq!(err.message, "Rate limit exceeded. Please try again later.");
    relay.assert_calls(1);
}

#[tokio::test]
async fn auth_failure_is_not_retried() {
    let server = MockServer::start_async().await;
    let relay = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(401).json_body(json!({"error": "nope"}));
        })
        .await;

    let client = ChatClient::new(server.base_url()).unwrap();
    let err = client
        .send_conversation(&prompt(), "gpt-4o", 2)
        .await
        .unwrap_err();

    assert_eq!(
        err.message,
        "Authentication error. Please check API key configuration."
    );
    relay.assert_calls(1);
}

#[tokio::test]
async fn server_errors_exhaust_the_retry_budget() {
    let server = MockServer::start_async().await;
    let relay = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(500).json_body(json!({"error": "boom"}));
        })
        .await;

    let client = ChatClient::new(server.base_url()).unwrap();
    let err = client
        .send_conversation(&prompt(), "gpt-4o", 2)
        .await
        .unwrap_err();

    assert_eq!(
        err.message,
        "Server error. The API encountered an unexpected condition."
    );
    relay.assert_calls(3);
}

#[tokio::test]
async fn recovers_when_a_retry_succeeds() {
    // httpmock cannot vary a response across calls, so this uses a small
    // counting handler: two 500s, then a normal completion.
    let calls = Arc::new(AtomicUsize::new(0));
    let handler_calls = calls.clone();
    let app = Router::new().route(
        "/api/chat",
        post(move || {
            let n = handler_calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"error": "flaky"})),
                    )
                } else {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "choices": [{"message": {"role": "assistant", "content": "finally"}}]
                        })),
                    )
                }
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = ChatClient::new(format!("http://{addr}")).unwrap();
    let payload = client
        .send_conversation(&prompt(), "gpt-4o", 2)
        .await
        .unwrap();

    assert_eq!(
        payload["choices"][0]["message"]["content"],
        json!("finally")
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn timeout_translates_to_the_fixed_sentence() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(200)
                .json_body(json!({"choices": []}))
                .delay(Duration::from_secs(2));
        })
        .await;

    let client = ChatClient::with_timeout(server.base_url(), Duration::from_millis(200)).unwrap();
    let err = client
        .send_conversation(&prompt(), "gpt-4o", 0)
        .await
        .unwrap_err();

    assert_eq!(
        err.message,
        "Request timed out. The server took too long to respond."
    );
}

#[tokio::test]
async fn unlisted_status_surfaces_the_relay_error_string() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/chat");
            then.status(502).json_body(json!({"error": "model overloaded"}));
        })
        .await;

    let client = ChatClient::new(server.base_url()).unwrap();
    let err = client
        .send_conversation(&prompt(), "gpt-4o", 0)
        .await
        .unwrap_err();

    assert_eq!(err.message, "model overloaded");
}

#[tokio::test]
async fn connection_failure_uses_the_generic_sentence() {
    let client = ChatClient::new("http://127.0.0.1:9").unwrap();
    let err = client
        .send_conversation(&prompt(), "gpt-4o", 0)
        .await
        .unwrap_err();

    assert_eq!(err.message, "Failed to get a response. Please try again later.");
}
