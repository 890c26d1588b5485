//! Simulated clinic upstream shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use healthco_mcp::clinic::{upstream_client, PatientForwarder, SecretSource};
use healthco_mcp::config::DEFAULT_TIMEOUT_SECS;

/// A running fake upstream and the payloads it has received.
pub struct Upstream {
    /// Full URL of the create-patient route.
    pub url: String,
    /// JSON bodies received, in order.
    pub received: Arc<Mutex<Vec<Value>>>,
}

impl Upstream {
    /// Returns a copy of the received payloads.
    pub fn payloads(&self) -> Vec<Value> {
        self.received.lock().expect("lock poisoned").clone()
    }

    /// Builds a forwarder pointed at this upstream with the default timeout.
    pub fn forwarder(&self, secret: SecretSource) -> PatientForwarder {
        self.forwarder_with_timeout(secret, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Builds a forwarder pointed at this upstream with the given timeout.
    pub fn forwarder_with_timeout(&self, secret: SecretSource, timeout: Duration) -> PatientForwarder {
        let client = upstream_client(timeout).expect("Failed to build upstream client");
        PatientForwarder::with_client(client, self.url.clone(), secret)
    }
}

/// Starts an upstream answering every POST with `status` and `body`.
pub async fn spawn_upstream(status: StatusCode, body: &'static str) -> Upstream {
    spawn_upstream_with_delay(status, body, Duration::ZERO).await
}

/// Starts an upstream that records each POST, then waits `delay` before answering.
pub async fn spawn_upstream_with_delay(
    status: StatusCode,
    body: &'static str,
    delay: Duration,
) -> Upstream {
    let received: Arc<Mutex<Vec<Value>>> = Arc::default();
    let seen = Arc::clone(&received);

    let app = Router::new().route(
        "/api/mcp/tools/create-patient",
        post(move |Json(payload): Json<Value>| {
            let seen = Arc::clone(&seen);
            async move {
                seen.lock().expect("lock poisoned").push(payload);
                tokio::time::sleep(delay).await;
                (status, body)
            }
        }),
    );

    serve_upstream(app, received).await
}

/// Starts an upstream whose create-patient route answers `302 Found`
/// pointing at a GET-only route.
pub async fn spawn_redirecting_upstream() -> Upstream {
    let received: Arc<Mutex<Vec<Value>>> = Arc::default();
    let seen = Arc::clone(&received);

    let app = Router::new()
        .route(
            "/api/mcp/tools/create-patient",
            post(move |Json(payload): Json<Value>| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().expect("lock poisoned").push(payload);
                    (StatusCode::FOUND, [(header::LOCATION, "/elsewhere")], "moved")
                }
            }),
        )
        .route("/elsewhere", get(|| async { "GOT-VIA-GET" }));

    serve_upstream(app, received).await
}

async fn serve_upstream(app: Router, received: Arc<Mutex<Vec<Value>>>) -> Upstream {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind upstream");
    let addr = listener.local_addr().expect("Failed to read upstream address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Upstream server failed");
    });

    Upstream {
        url: format!("http://{addr}/api/mcp/tools/create-patient"),
        received,
    }
}

/// Returns a URL on a local port nothing is listening on.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind scratch listener");
    let addr = listener.local_addr().expect("Failed to read scratch address");
    drop(listener);
    format!("http://{addr}/api/mcp/tools/create-patient")
}
