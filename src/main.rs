//! healthco-mcp: MCP server for clinic patient creation
//!
//! Serves the `create_patient` tool over stdio for locally spawned clients,
//! or over streamable HTTP for hosted deployments.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use healthco_mcp::clinic::PatientForwarder;
use healthco_mcp::config::{self, Config};
use healthco_mcp::error::ServerError;
use healthco_mcp::mcp::{http, McpServer, ToolHandler};

/// MCP server for clinic patient creation.
///
/// Forwards `create_patient` tool calls to the clinic system's HTTP API.
#[derive(Parser, Debug)]
#[command(name = "healthco-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Transport to serve MCP over
    #[arg(value_enum, default_value_t = Transport::Http, ignore_case = true)]
    transport: Transport,

    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Transport selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    /// Newline-delimited JSON-RPC on stdin/stdout, for locally spawned clients.
    Stdio,
    /// Streamable HTTP at `/mcp`, for remote deployments.
    Http,
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
///
/// Logs go to stderr so stdout stays reserved for the stdio transport.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(transport: Transport, cfg: Config) -> Result<(), ServerError> {
    let forwarder = PatientForwarder::new(&cfg.upstream)?;
    let tools = ToolHandler::new(forwarder);

    match transport {
        Transport::Stdio => {
            let mut server = McpServer::new(tools);
            info!("MCP server ready, waiting for client connection...");
            server.run().await?;
        }
        Transport::Http => http::serve(Arc::new(tools), &cfg.http).await?,
    }

    Ok(())
}

/// Entry point for the healthco-mcp server.
fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let cfg = match config::load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            if config_path.is_none() {
                if let Some(default_path) = config::default_config_path() {
                    eprintln!("\nConfig file location: {}", default_path.display());
                }
            }
            return ExitCode::FAILURE;
        }
    };

    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        transport = ?args.transport,
        upstream = %cfg.upstream.url,
        server_secret = cfg.upstream.secret().is_some(),
        "Starting healthco-mcp server"
    );

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args.transport, cfg)) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}
