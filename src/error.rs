//! Error types for healthco-mcp.
//!
//! # Security Note
//!
//! Error messages never include the configured secret key. Variants that
//! could carry sensitive data use generic descriptions instead.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors that stop the server from starting or keep it from running.
#[derive(Error, Debug)]
pub enum ServerError {
    /// The shared upstream HTTP client could not be built.
    #[error("failed to build upstream HTTP client")]
    HttpClient(#[source] reqwest::Error),

    /// The HTTP transport could not bind its listening socket.
    #[error("failed to bind HTTP listener on {addr}")]
    Bind {
        /// Address the listener tried to bind.
        addr: SocketAddr,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Transport I/O failed while serving.
    #[error("transport I/O error")]
    Io(#[from] std::io::Error),
}
