//! Integration tests for the streamable HTTP transport.
//!
//! Requests go through the full router, CORS layer included, via `oneshot`.

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use healthco_mcp::clinic::SecretSource;
use healthco_mcp::config::{Config, HttpConfig};
use healthco_mcp::mcp::http::router;
use healthco_mcp::mcp::ToolHandler;

use common::spawn_upstream;

async fn app(config: &HttpConfig) -> (Router, common::Upstream) {
    let upstream = spawn_upstream(StatusCode::OK, "patient-123").await;
    let tools = ToolHandler::new(upstream.forwarder(SecretSource::Configured("server".into())));
    (router(Arc::new(tools), config), upstream)
}

fn post_mcp(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/mcp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// =============================================================================
// Informational Routes
// =============================================================================

#[tokio::test]
async fn test_health() {
    let (app, _upstream) = app(&HttpConfig::default()).await;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"status": "ok", "name": "healthco-mcp"})
    );
}

#[tokio::test]
async fn test_ready_and_index() {
    let (app, _upstream) = app(&HttpConfig::default()).await;

    let response = app
        .clone()
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(response).await["status"], "ready");

    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(response).await,
        b"MCP server is running. Streamable HTTP endpoint: /mcp"
    );
}

// =============================================================================
// MCP Endpoint
// =============================================================================

#[tokio::test]
async fn test_tool_call_without_handshake() {
    let (app, upstream) = app(&HttpConfig::default()).await;

    let response = app
        .oneshot(post_mcp(
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"create_patient","arguments":{"name":"Ada","phone":"555","email":"ada@example.com"}}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], 7);
    assert_eq!(
        body["result"]["content"][0]["text"],
        "Successfully created patient: patient-123"
    );
    assert_eq!(
        upstream.payloads(),
        vec![json!({"name": "Ada", "phone": "555", "secretKey": "server", "email": "ada@example.com"})]
    );
}

#[tokio::test]
async fn test_tools_list_hides_configured_secret() {
    let (app, _upstream) = app(&HttpConfig::default()).await;

    let response = app
        .oneshot(post_mcp(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#))
        .await
        .unwrap();

    let body = body_json(response).await;
    let schema = &body["result"]["tools"][0]["inputSchema"];
    assert!(schema["properties"].get("secretKey").is_none());
    assert_eq!(schema["required"], json!(["name", "phone"]));
}

#[tokio::test]
async fn test_notification_accepted() {
    let (app, _upstream) = app(&HttpConfig::default()).await;

    let response = app
        .oneshot(post_mcp(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_malformed_body() {
    let (app, _upstream) = app(&HttpConfig::default()).await;

    let response = app.oneshot(post_mcp("{oops")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], -32700);
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn test_cors_wildcard_by_default() {
    let (app, _upstream) = app(&HttpConfig::default()).await;

    let response = app
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "https://anywhere.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_credentialed_allow_list() {
    let config = HttpConfig {
        cors_origins: vec!["https://app.example".to_string()],
        cors_allow_credentials: true,
        ..HttpConfig::default()
    };
    let (app, _upstream) = app(&config).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/mcp")
                .header(header::ORIGIN, "https://app.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let response = app
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_cors_blank_origin_list_allows_none() {
    let mut config = Config::default();
    config
        .apply_env(|key| (key == "MCP_CORS_ORIGINS").then(|| " , ".to_string()))
        .unwrap();
    config.validate().unwrap();
    let (app, _upstream) = app(&config.http).await;

    let response = app
        .oneshot(
            Request::get("/health")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_cors_credentialed_wildcard_echoes_origin() {
    let config = HttpConfig {
        cors_allow_credentials: true,
        ..HttpConfig::default()
    };
    let (app, _upstream) = app(&config).await;

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/mcp")
                .header(header::ORIGIN, "https://app.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
}
