//! Turns one user request into a tool-call plan.
//!
//! The model sees the request embedded in the tool-selection template and is expected to
//! answer `{"tool_name": ..., "arguments": {...}}`, possibly inside a fenced code block.
//! [`EditMemory`] completes the two-turn edit dialog: the first turn names the pattern and
//! replacement, the second only names the files.

use pattern_protocol::{EDIT_DEPENDENCY, NO_TOOL};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::INPUT_PLACEHOLDER;

const PATTERN: &str = "pattern";
const REPLACEMENT: &str = "replacement";
const FILES: &str = "files";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCallPlan {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Tool(ToolCallPlan),
    /// The model chose not to use a tool.
    Chat,
    /// The reply was not a plan at all.
    Unparsed { error: String, raw: String },
}

#[derive(Debug, Clone)]
pub struct Planner {
    template: String,
}

impl Planner {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn prompt(&self, input: &str) -> String {
        self.template.replace(INPUT_PLACEHOLDER, input)
    }

    pub fn parse(&self, reply: &str) -> Plan {
        match serde_json::from_str::<ToolCallPlan>(strip_fence(reply)) {
            Ok(plan) if plan.tool_name.is_empty() || plan.tool_name == NO_TOOL => Plan::Chat,
            Ok(plan) => Plan::Tool(plan),
            Err(err) => Plan::Unparsed {
                error: err.to_string(),
                raw: reply.to_string(),
            },
        }
    }
}

/// Body of the first fenced code block, or the trimmed reply when there is none.
pub fn strip_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[start + 3..];
    // The opening line may carry one info word (`json`, `JSON`, ...) and nothing else.
    let Some((info, body)) = after_fence.split_once('\n') else {
        return trimmed;
    };
    let info = info.trim();
    if info.contains(char::is_whitespace) || info.contains('`') {
        return trimmed;
    }
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => trimmed,
    }
}

/// Last edit the user asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditMemory {
    pub pattern: String,
    pub replacement: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Planned arguments carried pattern and replacement; memory now holds them.
    Remembered,
    /// Remembered pattern and replacement were added to a files-only call.
    Injected,
    Unchanged,
}

impl EditMemory {
    /// Only meaningful for `edit_dependency` calls; any other tool is left alone.
    pub fn reconcile(
        &mut self,
        tool_name: &str,
        arguments: &mut Map<String, Value>,
    ) -> Reconciliation {
        if tool_name != EDIT_DEPENDENCY {
            return Reconciliation::Unchanged;
        }

        let pattern = string_arg(arguments, PATTERN);
        let replacement = string_arg(arguments, REPLACEMENT);
        if let (Some(pattern), Some(replacement)) = (pattern, replacement) {
            self.pattern = pattern.to_string();
            self.replacement = replacement.to_string();
            self.files = files_arg(arguments);
            return Reconciliation::Remembered;
        }

        let has_pattern = pattern.is_some_and(|p| !p.is_empty());
        if !files_arg(arguments).is_empty() && !has_pattern {
            if self.pattern.is_empty() {
                log::warn!("Files given without a pattern and nothing remembered");
                return Reconciliation::Unchanged;
            }
            arguments.insert(PATTERN.to_string(), Value::String(self.pattern.clone()));
            arguments.insert(
                REPLACEMENT.to_string(),
                Value::String(self.replacement.clone()),
            );
            return Reconciliation::Injected;
        }

        Reconciliation::Unchanged
    }

    /// Called after a real edit reported applied changes.
    pub fn remember_files(&mut self, arguments: &Map<String, Value>) {
        let files = files_arg(arguments);
        if !files.is_empty() {
            self.files = files;
        }
    }
}

/// Per-conversation state, passed explicitly into every turn.
#[derive(Debug, Default)]
pub struct Session {
    pub memory: EditMemory,
}

fn string_arg<'a>(arguments: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    arguments.get(key).and_then(Value::as_str)
}

fn files_arg(arguments: &Map<String, Value>) -> Vec<String> {
    arguments
        .get(FILES)
        .and_then(Value::as_array)
        .map(|files| {
            files
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
