use pattern_protocol::EDIT_DEPENDENCY;

use crate::error::Result;
use crate::executor::ToolChannel;
use crate::llm::{Message, ModelProvider};
use crate::planner::{Plan, Planner, Reconciliation, Session};

/// Marker the tool server puts at the start of a real edit that changed something.
const EDITS_APPLIED: &str = "Edits applied";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Tool,
    Chat,
    /// The planner reply could not be parsed; answered through chat.
    PlanFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutput {
    pub route: Route,
    pub output: String,
}

/// One request in, one textual answer out.
pub struct Flow<M, T> {
    planner: Planner,
    model: M,
    tools: T,
}

impl<M: ModelProvider, T: ToolChannel> Flow<M, T> {
    pub fn new(planner: Planner, model: M, tools: T) -> Self {
        Self {
            planner,
            model,
            tools,
        }
    }

    pub fn tools(&self) -> &T {
        &self.tools
    }

    pub fn into_tools(self) -> T {
        self.tools
    }

    /// Only model failures escape; tool-side failures become the turn's output.
    pub async fn run_turn(&self, session: &mut Session, input: &str) -> Result<TurnOutput> {
        let reply = self
            .model
            .chat(&[Message::user(self.planner.prompt(input))])
            .await?;

        match self.planner.parse(&reply) {
            Plan::Tool(plan) => {
                log::info!("Planned tool: {}", plan.tool_name);
                let output = self
                    .call_tool(session, &plan.tool_name, plan.arguments)
                    .await;
                Ok(TurnOutput {
                    route: Route::Tool,
                    output,
                })
            }
            Plan::Chat => {
                log::info!("No tool selected; answering as chat");
                Ok(TurnOutput {
                    route: Route::Chat,
                    output: self.chat(input).await?,
                })
            }
            Plan::Unparsed { error, raw } => {
                log::warn!("Planner reply is not a tool call: {error}");
                let answer = self.chat(input).await?;
                Ok(TurnOutput {
                    route: Route::PlanFailed,
                    output: format!(
                        "Failed to parse tool call: {error}\nRaw response: {raw}\n\n{answer}"
                    ),
                })
            }
        }
    }

    async fn chat(&self, input: &str) -> Result<String> {
        self.model.chat(&[Message::user(input)]).await
    }

    async fn call_tool(
        &self,
        session: &mut Session,
        tool_name: &str,
        mut arguments: serde_json::Map<String, serde_json::Value>,
    ) -> String {
        let available = match self.tools.list_tools().await {
            Ok(tools) => tools.into_iter().map(|t| t.name).collect::<Vec<_>>(),
            Err(e) => return format!("MCP call failed: {e}"),
        };
        if !available.iter().any(|name| name == tool_name) {
            let listed: Vec<String> = available.iter().map(|n| format!("'{n}'")).collect();
            return format!(
                "Unknown tool selected: '{tool_name}'. Available tools: [{}]",
                listed.join(", ")
            );
        }

        match session.memory.reconcile(tool_name, &mut arguments) {
            Reconciliation::Remembered => log::info!(
                "Remembered edit '{}' -> '{}'",
                session.memory.pattern,
                session.memory.replacement
            ),
            Reconciliation::Injected => log::info!(
                "Using remembered edit '{}' -> '{}'",
                session.memory.pattern,
                session.memory.replacement
            ),
            Reconciliation::Unchanged => {}
        }

        match self.tools.call_tool(tool_name, arguments.clone()).await {
            Ok(output) => {
                if tool_name == EDIT_DEPENDENCY && output.contains(EDITS_APPLIED) {
                    session.memory.remember_files(&arguments);
                }
                output
            }
            Err(e) => {
                log::warn!("Tool {tool_name} failed: {e}");
                format!("MCP call failed: {e}")
            }
        }
    }
}
