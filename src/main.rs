//! storybook-mcp - MCP server for Storybook component documentation
//!
//! This binary exposes a configured Storybook instance's component catalog
//! and per-component props documentation to MCP clients.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storybook_mcp::McpServer;

/// MCP server for Storybook component documentation.
#[derive(Parser, Debug)]
#[command(name = "storybook-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Run in stdio mode (standard MCP transport).
    #[arg(long, default_value = "true")]
    stdio: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // Log to stderr (not stdout, which is used for MCP protocol)
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!(
        "Starting {} v{}",
        storybook_mcp::server::SERVER_NAME,
        storybook_mcp::server::SERVER_VERSION
    );

    // Configuration problems are the one fatal error class; nothing has
    // touched the network or a browser yet.
    let server = match McpServer::from_env() {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start Storybook MCP server: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.stdio {
        match server.run_stdio().await {
            Ok(()) => {
                tracing::info!("Server exited cleanly");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!("Server error: {}", e);
                ExitCode::FAILURE
            }
        }
    } else {
        tracing::error!("Only stdio mode is currently supported");
        ExitCode::FAILURE
    }
}
