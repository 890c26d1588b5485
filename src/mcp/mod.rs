//! Model Context Protocol (MCP) server implementation.
//!
//! This module exposes the clinic tools to AI assistants over JSON-RPC 2.0,
//! on either of two transports sharing one dispatcher.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐                                            │
//! │   │   stdio     │──┐                                         │
//! │   │ (lifecycle) │  │    ┌─────────────┐    ┌─────────────┐   │
//! │   └─────────────┘  ├───▶│ ToolHandler │───▶│  Forwarder  │───┼──▶ clinic API
//! │   ┌─────────────┐  │    └─────────────┘    └─────────────┘   │
//! │   │    HTTP     │──┘                                         │
//! │   │ (stateless) │                                            │
//! │   └─────────────┘                                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod http;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use server::McpServer;
pub use tools::ToolHandler;
pub use transport::StdioTransport;
