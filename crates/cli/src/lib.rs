//! Conversational front end for pattern-tools.
//!
//! Each turn asks the model to pick one tool (or none), routes the plan to the tool server over
//! MCP, and falls back to plain chat otherwise.
//!
//! ```text
//! input ──▶ Planner ──▶ Plan::Tool ──▶ EditMemory ──▶ ToolChannel ──▶ output
//!              │
//!              └──────▶ Plan::Chat / Unparsed ──▶ ModelProvider ──▶ output
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod flow;
pub mod llm;
pub mod planner;

pub use config::{AgentConfig, ConfigOverrides};
pub use error::{AgentError, Result};
pub use executor::{McpToolExecutor, ToolChannel, ToolInfo};
pub use flow::{Flow, Route, TurnOutput};
pub use llm::{Message, ModelProvider, OpenAIProvider};
pub use planner::{EditMemory, Plan, Planner, Session, ToolCallPlan};
