use async_trait::async_trait;
use rmcp::model::CallToolRequestParam;
use rmcp::service::{RoleClient, RunningService, ServiceExt};
use rmcp::transport::TokioChildProcess;
use serde_json::{Map, Value};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::process::Command;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};

/// One entry of the remote tool catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

/// Remote tool collaborator.
#[async_trait]
pub trait ToolChannel: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolInfo>>;

    /// Returns the text parts of the tool result joined by newlines.
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<String>;
}

/// Spawns the tool server as a child process and talks MCP to it over stdio.
pub struct McpToolExecutor {
    service: RunningService<RoleClient, ()>,
    timeout: Duration,
}

impl McpToolExecutor {
    pub async fn spawn(config: &AgentConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.tool_timeout_secs);
        let mut cmd = Command::new(&config.server_command);
        cmd.args(&config.server_args);

        let transport = TokioChildProcess::new(cmd).map_err(|e| {
            AgentError::ToolChannel(format!(
                "failed to spawn {}: {e}",
                config.server_command
            ))
        })?;
        let service = bounded("MCP handshake", timeout, ().serve(transport)).await?;
        log::info!("Connected to tool server '{}'", config.server_command);
        Ok(Self { service, timeout })
    }

    pub async fn shutdown(self) -> Result<()> {
        self.service
            .cancel()
            .await
            .map_err(|e| AgentError::ToolChannel(format!("shutdown failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl ToolChannel for McpToolExecutor {
    async fn list_tools(&self) -> Result<Vec<ToolInfo>> {
        let listed = bounded(
            "list_tools",
            self.timeout,
            self.service.list_tools(Default::default()),
        )
        .await?;
        Ok(listed
            .tools
            .into_iter()
            .map(|tool| ToolInfo {
                name: tool.name.to_string(),
                description: tool
                    .description
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                schema: Value::Object((*tool.input_schema).clone()),
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> Result<String> {
        log::debug!("Calling tool {name} with {}", Value::Object(arguments.clone()));
        let result = bounded(
            name,
            self.timeout,
            self.service.call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments: Some(arguments),
            }),
        )
        .await?;
        if result.is_error == Some(true) {
            log::warn!("Tool {name} reported an error");
        }
        let texts: Vec<&str> = result
            .content
            .iter()
            .filter_map(|c| c.as_text())
            .map(|t| t.text.as_str())
            .collect();
        Ok(texts.join("\n"))
    }
}

/// No retry: a timed-out edit may already have been applied.
async fn bounded<T, E, F>(operation: &str, timeout: Duration, fut: F) -> Result<T>
where
    E: Display,
    F: Future<Output = std::result::Result<T, E>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AgentError::ToolChannel(format!("{operation}: {e}"))),
        Err(_) => Err(AgentError::Timeout {
            operation: operation.to_string(),
            secs: timeout.as_secs(),
        }),
    }
}
