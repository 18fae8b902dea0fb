//! Pattern Tools MCP Server
//!
//! Line-oriented search, classification and history-tracked bulk edits over one project tree.
//!
//! ## Tools
//!
//! - `find_file` - Full path for a bare file name
//! - `classify_pattern` - Matching lines with a syntactic tag each
//! - `edit_dependency` - Literal replacement (dry run until `files` is given)
//! - `ignore_path` / `reset_ignore` - Manage the ignore keywords
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "pattern-tools": {
//!       "command": "pattern-tools-mcp",
//!       "env": { "PATTERN_TOOLS_ROOT": "/path/to/project" }
//!     }
//!   }
//! }
//! ```

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    pattern_mcp::main_entry().await
}
