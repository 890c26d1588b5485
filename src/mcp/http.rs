//! Streamable HTTP transport.
//!
//! Routes:
//!
//! - `POST /mcp`: one JSON-RPC message per request body
//! - `GET /health`: liveness, `{"status": "ok", "name": ...}`
//! - `GET /ready`: readiness
//! - `GET /`: plain-text banner
//!
//! The transport is stateless: every request is dispatched on its own, so
//! tool calls do not wait for an `initialize` handshake.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::config::HttpConfig;
use crate::error::ServerError;
use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcReply, JsonRpcRequest, JsonRpcResponse,
    SERVER_NAME,
};
use crate::mcp::server::shutdown_signal;
use crate::mcp::tools::ToolHandler;

/// Path of the MCP endpoint.
pub const MCP_ENDPOINT: &str = "/mcp";

/// Builds the HTTP router with CORS applied.
pub fn router(tools: Arc<ToolHandler>, config: &HttpConfig) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route(MCP_ENDPOINT, post(mcp_endpoint))
        .with_state(tools)
        .layer(cors_layer(config))
}

/// Builds the CORS policy.
///
/// `*` allows any origin and an empty list allows none. With credentials
/// enabled, a `*` entry echoes the request origin, and methods and headers
/// mirror the preflight request.
#[must_use]
pub fn cors_layer(config: &HttpConfig) -> CorsLayer {
    let allow_origin = if config.allows_any_origin() {
        if config.cors_allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        }
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        AllowOrigin::list(origins)
    };

    let layer = CorsLayer::new().allow_origin(allow_origin);
    if config.cors_allow_credentials {
        layer
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        layer.allow_methods(Any).allow_headers(Any)
    }
}

/// Binds the listener and serves until SIGINT/SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be parsed or bound, or if serving fails.
pub async fn serve(tools: Arc<ToolHandler>, config: &HttpConfig) -> Result<(), ServerError> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid listen address {}:{}", config.host, config.port),
            )
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!(%addr, endpoint = MCP_ENDPOINT, "Starting MCP server (streamable-http)");

    axum::serve(listener, router(tools, config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn index() -> &'static str {
    "MCP server is running. Streamable HTTP endpoint: /mcp"
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "name": SERVER_NAME }))
}

async fn ready() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}

/// Dispatches one JSON-RPC message.
async fn mcp_endpoint(State(tools): State<Arc<ToolHandler>>, body: String) -> Response {
    match parse_message(&body) {
        Ok(IncomingMessage::Request(req)) => {
            let reply = JsonRpcReply::from(dispatch(&tools, &req).await);
            (StatusCode::OK, Json(reply)).into_response()
        }
        Ok(IncomingMessage::Notification(notif)) => {
            tracing::debug!(method = %notif.method, "Notification received");
            StatusCode::ACCEPTED.into_response()
        }
        Err(error) => {
            warn!(code = error.error.code, "Rejected malformed MCP message");
            (StatusCode::BAD_REQUEST, Json(error)).into_response()
        }
    }
}

async fn dispatch(
    tools: &ToolHandler,
    req: &JsonRpcRequest,
) -> Result<JsonRpcResponse, JsonRpcError> {
    match req.method.as_str() {
        "initialize" => ToolHandler::handle_initialize(req),
        "ping" => Ok(ToolHandler::handle_ping(req)),
        "tools/list" => Ok(tools.handle_tools_list(req)),
        "tools/call" => tools.handle_tools_call(req).await,
        _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
    }
}
