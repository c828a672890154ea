// crates/pack-identity-engine/src/revocation/tests.rs
// ============================================================================
// Module: Revocation Authority Tests
// Description: Unit tests for HTTP revocation checks.
// Purpose: Validate URL building, header injection, and status mapping.
// Dependencies: pack-identity-engine, axum
// ============================================================================

//! ## Overview
//! Exercises the HTTP revocation authority against in-memory axum servers and
//! checks that the revocation-checked verifier fails closed.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::use_debug,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::routing::get;
use pack_identity_config::RevocationConfig;
use pack_identity_config::RevocationMode;
use pack_identity_core::PackAllocation;
use tokio::sync::oneshot;

use super::HttpRevocationAuthority;
use super::NoopRevocationAuthority;
use super::RevocationAuthority;
use super::RevocationCheckedVerifier;
use super::RevocationError;
use super::RevocationStatus;
use crate::verifier::AllocationVerifier;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

#[derive(Default)]
struct RequestCapture {
    authorization: Option<String>,
    label: Option<String>,
}

struct TestServerState {
    status: StatusCode,
    capture: Arc<Mutex<RequestCapture>>,
}

async fn revocation_handler(
    State(state): State<Arc<TestServerState>>,
    headers: HeaderMap,
    Path(label): Path<String>,
) -> StatusCode {
    let mut guard = state.capture.lock().expect("capture lock");
    guard.authorization =
        headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).map(str::to_string);
    guard.label = Some(label);
    state.status
}

async fn spawn_revocation_server(
    status: StatusCode,
) -> (String, Arc<Mutex<RequestCapture>>, oneshot::Sender<()>) {
    let capture = Arc::new(Mutex::new(RequestCapture::default()));
    let state = Arc::new(TestServerState {
        status,
        capture: Arc::clone(&capture),
    });
    let app = Router::new()
        .route("/v1/allocations/revocations/{label}", get(revocation_handler))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });
    (format!("http://{addr}"), capture, shutdown_tx)
}

fn authority(base_url: &str, auth_token: Option<&str>) -> HttpRevocationAuthority {
    HttpRevocationAuthority::new(
        base_url,
        auth_token,
        Duration::from_millis(250),
        Duration::from_millis(500),
    )
    .expect("authority")
}

struct FixedVerifier(bool);

#[async_trait]
impl AllocationVerifier for FixedVerifier {
    async fn verify(&self, _allocation: &PackAllocation) -> bool {
        self.0
    }
}

struct FixedAuthority(Result<RevocationStatus, ()>);

#[async_trait]
impl RevocationAuthority for FixedAuthority {
    async fn status(&self, _label: &str) -> Result<RevocationStatus, RevocationError> {
        self.0.map_err(|()| RevocationError::Unavailable("offline".to_string()))
    }
}

fn allocation() -> PackAllocation {
    PackAllocation::new("mod1", 10_000, 20_000, vec![1; 64])
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn revocation_url_encodes_label_and_tolerates_trailing_slash() {
    let authority = authority("https://allocations.example/api/", None);
    let url = authority.revocation_url("my pack/1").expect("url");
    assert_eq!(
        url.as_str(),
        "https://allocations.example/api/v1/allocations/revocations/my%20pack%2F1"
    );
}

#[test]
fn invalid_construction_inputs_are_rejected() {
    let err = HttpRevocationAuthority::new(
        "not a url",
        None,
        Duration::from_millis(10),
        Duration::from_millis(10),
    )
    .err()
    .expect("invalid url");
    assert!(matches!(err, RevocationError::InvalidConfig(_)));

    let err = HttpRevocationAuthority::new(
        "https://allocations.example",
        Some("bad\ntoken"),
        Duration::from_millis(10),
        Duration::from_millis(10),
    )
    .err()
    .expect("invalid token");
    assert!(matches!(err, RevocationError::InvalidConfig(_)));
}

#[test]
fn disabled_config_builds_no_authority() {
    let config = RevocationConfig::default();
    assert!(HttpRevocationAuthority::from_config(&config).expect("config").is_none());
    let config = RevocationConfig {
        mode: RevocationMode::Http,
        base_url: Some("https://allocations.example".to_string()),
        ..RevocationConfig::default()
    };
    assert!(HttpRevocationAuthority::from_config(&config).expect("config").is_some());
}

#[tokio::test]
async fn status_mappings_are_consistent() {
    for (status, expected) in [
        (StatusCode::OK, Some(RevocationStatus::Revoked)),
        (StatusCode::NOT_FOUND, Some(RevocationStatus::Active)),
        (StatusCode::UNAUTHORIZED, None),
        (StatusCode::BAD_GATEWAY, None),
    ] {
        let (base_url, _capture, shutdown_tx) = spawn_revocation_server(status).await;
        let result = authority(&base_url, None).status("mod1").await;
        match (result, expected) {
            (Ok(actual), Some(expected)) => assert_eq!(actual, expected),
            (Err(RevocationError::Unavailable(_)), None) => {}
            (actual, expected) => panic!("status {status}: unexpected {actual:?} vs {expected:?}"),
        }
        let _ = shutdown_tx.send(());
    }
}

#[tokio::test]
async fn bearer_token_and_label_reach_the_authority() {
    let (base_url, capture, shutdown_tx) = spawn_revocation_server(StatusCode::NOT_FOUND).await;
    let status = authority(&base_url, Some("token-123")).status("mod1").await.expect("status");
    assert_eq!(status, RevocationStatus::Active);
    let captured = capture.lock().expect("capture lock");
    assert_eq!(captured.authorization.as_deref(), Some("Bearer token-123"));
    assert_eq!(captured.label.as_deref(), Some("mod1"));
    drop(captured);
    let _ = shutdown_tx.send(());
}

#[tokio::test]
async fn unreachable_authority_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let result = authority(&format!("http://{addr}"), None).status("mod1").await;
    assert!(matches!(result, Err(RevocationError::Unavailable(_))));
}

#[tokio::test]
async fn checked_verifier_fails_closed() {
    let cases = [
        (true, Ok(RevocationStatus::Active), true),
        (true, Ok(RevocationStatus::Revoked), false),
        (true, Err(()), false),
        (false, Ok(RevocationStatus::Active), false),
    ];
    for (signature_ok, authority_result, expected) in cases {
        let verifier = RevocationCheckedVerifier::new(
            Arc::new(FixedVerifier(signature_ok)),
            Arc::new(FixedAuthority(authority_result)),
        );
        assert_eq!(verifier.verify(&allocation()).await, expected);
    }
}

#[tokio::test]
async fn noop_authority_never_revokes() {
    let status = NoopRevocationAuthority.status("anything").await.expect("status");
    assert_eq!(status, RevocationStatus::Active);
}
