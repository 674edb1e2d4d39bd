//! SSE Bridge CLI.
//!
//! Runs one discovery or tool call against a remote MCP server and prints the
//! JSON result to stdout. Logs go to stderr.

// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use clap::Parser;
use cli::Cli;
use ssebridge_core::mcp::operation::Connector;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    // No subscriber is installed yet, so report on stderr directly.
    if let Err(e) = logging::init(args.verbose) {
        eprintln!("ssebridge: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(args: Cli) -> Result<()> {
    match args.command.operation()? {
        None => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        }
        Some(operation) => {
            let config = args.connection.resolve()?;
            let result = Connector::new().run(&config, operation).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
