//! stdio MCP server.
//!
//! This module implements the MCP server lifecycle over the stdio transport:
//!
//! 1. **Initialisation**: `initialize` request, then `notifications/initialized`
//! 2. **Operation**: tool listing and tool calls
//! 3. **Shutdown**: EOF on stdin, SIGINT or SIGTERM

use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::mcp::protocol::{
    parse_message, IncomingMessage, JsonRpcError, JsonRpcNotification, JsonRpcReply,
    JsonRpcRequest, JsonRpcResponse, RequestId,
};
use crate::mcp::tools::ToolHandler;
use crate::mcp::transport::StdioTransport;

/// Server state in the MCP lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Waiting for initialize request.
    AwaitingInit,
    /// Initialize received, waiting for initialized notification.
    Initialising,
    /// Ready for normal operation.
    Running,
    /// Shutdown in progress.
    ShuttingDown,
}

/// The stdio MCP server.
pub struct McpServer<R = tokio::io::Stdin, W = tokio::io::Stdout> {
    /// Current server state.
    state: ServerState,
    /// The transport layer.
    transport: StdioTransport<R, W>,
    /// Tool dispatch.
    tools: ToolHandler,
}

impl McpServer {
    /// Creates a server speaking over the process stdin and stdout.
    #[must_use]
    pub fn new(tools: ToolHandler) -> Self {
        Self::with_transport(tools, StdioTransport::new())
    }
}

impl<R, W> McpServer<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a server over the given transport.
    pub const fn with_transport(tools: ToolHandler, transport: StdioTransport<R, W>) -> Self {
        Self {
            state: ServerState::AwaitingInit,
            transport,
            tools,
        }
    }

    /// Returns the current server state.
    #[must_use]
    pub const fn state(&self) -> ServerState {
        self.state
    }

    /// Runs the MCP server main loop until EOF, SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Runs the main loop until EOF or until `shutdown` completes.
    ///
    /// `shutdown` is raced against both reading and handling a message, so
    /// a tool call stalled on the upstream does not delay shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run_until<F>(&mut self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            let line_result = tokio::select! {
                () = &mut shutdown => break,
                line_result = self.transport.read_line() => line_result,
            };

            let done = tokio::select! {
                () = &mut shutdown => break,
                done = self.handle_transport_result(line_result) => done?,
            };

            if done {
                return Ok(());
            }
        }

        self.state = ServerState::ShuttingDown;
        Ok(())
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<String>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            tracing::debug!("stdin closed");
            self.state = ServerState::ShuttingDown;
            return Ok(true);
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        match parse_message(&line) {
            Ok(IncomingMessage::Request(req)) => {
                let reply = JsonRpcReply::from(self.handle_request(&req).await);
                self.transport.write_message(&reply).await?;
            }
            Ok(IncomingMessage::Notification(notif)) => self.handle_notification(&notif),
            Err(error) => self.transport.write_message(&error).await?,
        }

        Ok(self.state == ServerState::ShuttingDown)
    }

    /// Handles an incoming request.
    async fn handle_request(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        tracing::debug!(id = %req.id, method = %req.method, "Request received");

        match req.method.as_str() {
            "initialize" => self.handle_initialize(req),
            "ping" => Ok(ToolHandler::handle_ping(req)),
            "tools/list" => {
                self.require_running(&req.id)?;
                Ok(self.tools.handle_tools_list(req))
            }
            "tools/call" => {
                self.require_running(&req.id)?;
                self.tools.handle_tools_call(req).await
            }
            _ => Err(JsonRpcError::method_not_found(req.id.clone(), &req.method)),
        }
    }

    /// Handles an incoming notification.
    fn handle_notification(&mut self, notif: &JsonRpcNotification) {
        if notif.method == "notifications/initialized" && self.state == ServerState::Initialising {
            info!("Client initialised, server running");
            self.state = ServerState::Running;
        }
    }

    /// Handles the initialize request.
    fn handle_initialize(&mut self, req: &JsonRpcRequest) -> Result<JsonRpcResponse, JsonRpcError> {
        if self.state != ServerState::AwaitingInit {
            return Err(JsonRpcError::invalid_request_with(
                req.id.clone(),
                "Server already initialised",
            ));
        }

        let response = ToolHandler::handle_initialize(req)?;
        self.state = ServerState::Initialising;
        Ok(response)
    }

    /// Ensures the server is in the Running state.
    fn require_running(&self, id: &RequestId) -> Result<(), JsonRpcError> {
        if self.state != ServerState::Running {
            return Err(JsonRpcError::invalid_request_with(
                id.clone(),
                "Server not initialised",
            ));
        }
        Ok(())
    }
}

/// Completes on SIGINT or SIGTERM (Ctrl+C on Windows).
///
/// Never completes if the handlers cannot be installed.
#[cfg(unix)]
pub(crate) async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigint), Ok(mut sigterm)) = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) else {
        warn!("Failed to install signal handlers, shutdown only by process kill");
        return std::future::pending().await;
    };

    tokio::select! {
        _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
        _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

/// Completes on Ctrl+C.
#[cfg(windows)]
pub(crate) async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, initiating graceful shutdown");
    } else {
        warn!("Failed to listen for Ctrl+C, shutdown only by process kill");
        std::future::pending::<()>().await;
    }
}
