//! MCP tool surface for pattern-tools.
//!
//! The rmcp layer validates arguments against each tool's schema and serializes access to the
//! [`ToolServer`] core; all behaviour lives in the core.

mod server;

use anyhow::Result;
use pattern_protocol::{
    ClassifyPatternRequest, EditDependencyRequest, FindFileRequest, IgnorePathRequest,
    TOOL_CATALOG,
};
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::ServerConfig;

pub use server::ToolServer;

/// Pattern Tools MCP Service
#[derive(Clone)]
pub struct PatternToolsService {
    /// Tool router
    tool_router: ToolRouter<Self>,
    /// One request at a time touches the index, the files and the history.
    state: Arc<Mutex<ToolServer>>,
}

impl PatternToolsService {
    pub fn open(config: &ServerConfig) -> Result<Self> {
        Ok(Self::with_server(ToolServer::open(config)?))
    }

    pub fn with_server(server: ToolServer) -> Self {
        Self {
            tool_router: Self::tool_router(),
            state: Arc::new(Mutex::new(server)),
        }
    }
}

/// Failures become an error result the caller can read; the server keeps serving.
fn into_call_result(tool: &str, outcome: Result<String>) -> CallToolResult {
    match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => {
            log::warn!("{tool} failed: {e:#}");
            CallToolResult::error(vec![Content::text(format!("Error: {e}"))])
        }
    }
}

#[tool_handler]
impl ServerHandler for PatternToolsService {
    fn get_info(&self) -> ServerInfo {
        let tools: Vec<String> = TOOL_CATALOG
            .iter()
            .map(|tool| format!("'{}' ({})", tool.name, tool.summary))
            .collect();
        ServerInfo {
            instructions: Some(format!(
                "Pattern Tools searches, classifies and edits literal text patterns across one project. Tools: {}",
                tools.join("; ")
            )),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }
}

#[tool_router]
impl PatternToolsService {
    /// Exact bare-name lookup in the current index
    #[tool(description = "Find full file path by name")]
    pub async fn find_file(
        &self,
        Parameters(request): Parameters<FindFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        let server = self.state.lock().await;
        Ok(CallToolResult::success(vec![Content::text(
            server.find_file(&request),
        )]))
    }

    #[tool(description = "Find and classify any line containing a literal pattern")]
    pub async fn classify_pattern(
        &self,
        Parameters(request): Parameters<ClassifyPatternRequest>,
    ) -> Result<CallToolResult, McpError> {
        let server = self.state.lock().await;
        Ok(into_call_result(
            "classify_pattern",
            server.classify_pattern(&request),
        ))
    }

    /// Dry run without `files`, real edit with them
    #[tool(
        description = "Edit lines containing a literal pattern. Without `files` this only lists the matches and candidate files; call again with `files` to apply the replacement."
    )]
    pub async fn edit_dependency(
        &self,
        Parameters(request): Parameters<EditDependencyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut server = self.state.lock().await;
        Ok(into_call_result(
            "edit_dependency",
            server.edit_dependency(&request),
        ))
    }

    #[tool(description = "Ignore every file or folder whose path contains the given text")]
    pub async fn ignore_path(
        &self,
        Parameters(request): Parameters<IgnorePathRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut server = self.state.lock().await;
        Ok(into_call_result("ignore_path", server.ignore_path(&request)))
    }

    #[tool(description = "Reset all ignored paths")]
    pub async fn reset_ignore(&self) -> Result<CallToolResult, McpError> {
        let mut server = self.state.lock().await;
        Ok(into_call_result("reset_ignore", server.reset_ignore()))
    }
}
