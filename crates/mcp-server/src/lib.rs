use anyhow::{Context as AnyhowContext, Result};
use rmcp::transport::stdio;
use rmcp::ServiceExt;

mod config;
mod tools;

pub use config::{ServerConfig, HISTORY_ENV, IGNORE_ENV, ROOT_ENV, STATE_DIR_NAME};
pub use tools::{PatternToolsService, ToolServer};

pub async fn main_entry() -> Result<()> {
    // Logging goes to stderr only; stdout carries the MCP protocol.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = ServerConfig::from_env()?;
    log::info!(
        "Starting pattern-tools MCP server (root {}, history {})",
        config.root.display(),
        config.history_path.display()
    );

    let service = PatternToolsService::open(&config).context("Failed to open tool server")?;
    let server = service.serve(stdio()).await?;

    server.waiting().await?;

    log::info!("pattern-tools MCP server stopped");
    Ok(())
}
