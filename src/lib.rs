//! healthco-mcp: MCP server for clinic patient creation
//!
//! Exposes a single `create_patient` tool to AI assistants. Calls are
//! forwarded as JSON to the clinic system's HTTP API and the outcome is
//! reported back as text.
//!
//! # Modules
//!
//! - [`clinic`] — Outbound payload and upstream forwarding
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`mcp`] — MCP protocol, stdio and HTTP transports

pub mod clinic;
pub mod config;
pub mod error;
pub mod mcp;
