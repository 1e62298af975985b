//! Wire-contract tests for the agent-facing components, run against an
//! in-process mock agent. The contract is fail-closed on both endpoints:
//! nothing short of an explicit `success: true` / `connected: true` counts.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use taskdeck_common::types::NormalizedAddress;
use taskdeck_notify::channels::agent::AgentChannel;
use taskdeck_notify::error::NotifyError;
use taskdeck_notify::health::AgentHealthProbe;
use taskdeck_notify::{HealthCheck, PrimaryChannel};

/// Requests the mock agent saw on `/send`, for asserting the wire shape.
type SeenRequests = Arc<Mutex<Vec<serde_json::Value>>>;

fn init_tracing() {
    static TRACING_INIT: OnceLock<()> = OnceLock::new();
    TRACING_INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

async fn spawn_agent(
    health_body: &'static str,
    send_response: (StatusCode, &'static str),
) -> (String, SeenRequests) {
    init_tracing();
    let seen: SeenRequests = Arc::new(Mutex::new(Vec::new()));
    let seen_handle = seen.clone();

    let app = Router::new()
        .route(
            "/health",
            get(move || async move {
                (
                    [(axum::http::header::CONTENT_TYPE, "application/json")],
                    health_body,
                )
            }),
        )
        .route(
            "/send",
            post(
                move |State(seen): State<SeenRequests>, Json(body): Json<serde_json::Value>| async move {
                    seen.lock().unwrap().push(body);
                    (
                        send_response.0,
                        [(axum::http::header::CONTENT_TYPE, "application/json")],
                        send_response.1,
                    )
                },
            ),
        )
        .with_state(seen_handle);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), seen)
}

fn address() -> NormalizedAddress {
    NormalizedAddress::new_unchecked("919876543210")
}

const TIMEOUT: Duration = Duration::from_secs(2);

// ── Health probe ──

#[tokio::test]
async fn connected_true_is_reachable() {
    let (base, _) = spawn_agent(
        r#"{"connected": true, "uptime": 12.5, "agentAddress": "918800000000"}"#,
        (StatusCode::OK, r#"{"success": true}"#),
    )
    .await;
    let probe = AgentHealthProbe::new(&base);
    assert!(probe.check(TIMEOUT).await.reachable);
}

#[tokio::test]
async fn connected_false_is_unreachable() {
    let (base, _) = spawn_agent(
        r#"{"connected": false, "uptime": 0}"#,
        (StatusCode::OK, r#"{"success": true}"#),
    )
    .await;
    let probe = AgentHealthProbe::new(&base);
    assert!(!probe.check(TIMEOUT).await.reachable);
}

#[tokio::test]
async fn missing_connected_field_is_unreachable() {
    let (base, _) = spawn_agent(r#"{"status": "ok"}"#, (StatusCode::OK, "{}")).await;
    let probe = AgentHealthProbe::new(&base);
    assert!(!probe.check(TIMEOUT).await.reachable);
}

#[tokio::test]
async fn malformed_health_body_is_unreachable() {
    let (base, _) = spawn_agent("not json at all", (StatusCode::OK, "{}")).await;
    let probe = AgentHealthProbe::new(&base);
    assert!(!probe.check(TIMEOUT).await.reachable);
}

#[tokio::test]
async fn no_agent_at_all_is_unreachable_within_timeout() {
    // Nothing listens on the discard port.
    let probe = AgentHealthProbe::new("http://127.0.0.1:9");
    let started = std::time::Instant::now();
    let state = probe.check(Duration::from_millis(500)).await;
    assert!(!state.reachable);
    assert!(started.elapsed() < Duration::from_secs(5));
}

// ── Primary send ──

#[tokio::test]
async fn explicit_success_true_delivers() {
    let (base, seen) = spawn_agent(
        r#"{"connected": true}"#,
        (StatusCode::OK, r#"{"success": true}"#),
    )
    .await;
    let channel = AgentChannel::new(&base, Some("918800000000".to_string()), TIMEOUT);

    channel.send(&address(), "hello Dana").await.unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["to"], "919876543210");
    assert_eq!(seen[0]["message"], "hello Dana");
    assert_eq!(seen[0]["from"], "918800000000");
}

#[tokio::test]
async fn from_field_is_omitted_without_sender_address() {
    let (base, seen) = spawn_agent(
        r#"{"connected": true}"#,
        (StatusCode::OK, r#"{"success": true}"#),
    )
    .await;
    let channel = AgentChannel::new(&base, None, TIMEOUT);

    channel.send(&address(), "hello").await.unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen[0].get("from").is_none());
}

#[tokio::test]
async fn success_false_is_a_failure() {
    let (base, _) = spawn_agent(
        r#"{"connected": true}"#,
        (StatusCode::OK, r#"{"success": false, "error": "number not on channel"}"#),
    )
    .await;
    let channel = AgentChannel::new(&base, None, TIMEOUT);

    let err = channel.send(&address(), "hello").await.unwrap_err();
    assert!(matches!(
        err,
        NotifyError::PrimaryDeliveryFailed(ref reason) if reason.contains("number not on channel")
    ));
}

#[tokio::test]
async fn missing_success_field_is_a_failure() {
    let (base, _) = spawn_agent(
        r#"{"connected": true}"#,
        (StatusCode::OK, r#"{"queued": true}"#),
    )
    .await;
    let channel = AgentChannel::new(&base, None, TIMEOUT);
    assert!(matches!(
        channel.send(&address(), "hello").await,
        Err(NotifyError::PrimaryDeliveryFailed(_))
    ));
}

#[tokio::test]
async fn malformed_send_body_is_a_failure() {
    let (base, _) = spawn_agent(r#"{"connected": true}"#, (StatusCode::OK, "<html>ok</html>")).await;
    let channel = AgentChannel::new(&base, None, TIMEOUT);
    assert!(matches!(
        channel.send(&address(), "hello").await,
        Err(NotifyError::PrimaryDeliveryFailed(_))
    ));
}

#[tokio::test]
async fn transport_failure_surfaces_as_http_error() {
    // Nothing listens on the discard port, so the request never reaches an
    // agent at all; that is a transport error, not an agent rejection.
    let channel = AgentChannel::new("http://127.0.0.1:9", None, TIMEOUT);
    assert!(matches!(
        channel.send(&address(), "hello").await,
        Err(NotifyError::HttpError(_))
    ));
}

#[tokio::test]
async fn http_error_status_is_a_failure() {
    let (base, _) = spawn_agent(
        r#"{"connected": true}"#,
        (StatusCode::INTERNAL_SERVER_ERROR, r#"{"success": true}"#),
    )
    .await;
    let channel = AgentChannel::new(&base, None, TIMEOUT);
    assert!(matches!(
        channel.send(&address(), "hello").await,
        Err(NotifyError::PrimaryDeliveryFailed(_))
    ));
}
