//! Types shared by the pattern-tools server and the agent that drives it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod paths;

pub const FIND_FILE: &str = "find_file";
pub const CLASSIFY_PATTERN: &str = "classify_pattern";
pub const EDIT_DEPENDENCY: &str = "edit_dependency";
pub const IGNORE_PATH: &str = "ignore_path";
pub const RESET_IGNORE: &str = "reset_ignore";

/// Planner sentinel meaning "answer conversationally, call nothing".
pub const NO_TOOL: &str = "none";

#[derive(Clone, Copy, Debug)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub summary: &'static str,
}

pub const TOOL_CATALOG: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: FIND_FILE,
        summary: "Find the full path of a file by its bare name.",
    },
    ToolDescriptor {
        name: CLASSIFY_PATTERN,
        summary: "Find every line containing a literal pattern and classify it.",
    },
    ToolDescriptor {
        name: EDIT_DEPENDENCY,
        summary: "Replace a literal pattern in matching lines (dry run until `files` is given).",
    },
    ToolDescriptor {
        name: IGNORE_PATH,
        summary: "Exclude every path containing a keyword from the index.",
    },
    ToolDescriptor {
        name: RESET_IGNORE,
        summary: "Clear all ignore keywords and rebuild the index.",
    },
];

/// Coarse syntactic category of a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Annotation,
    Import,
    Class,
    Constructor,
    Function,
    /// Build-tool dependency declaration (`implementation "g:a:v"` and friends).
    BuildDependency,
    Property,
    Generic,
}

impl Tag {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Annotation => "[Annotation]",
            Self::Import => "[Import]",
            Self::Class => "[Class]",
            Self::Constructor => "[Constructor]",
            Self::Function => "[Function]",
            Self::BuildDependency => "[Gradle]",
            Self::Property => "[Property]",
            Self::Generic => "[Generic]",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One line that contains a searched pattern. Recomputed on every search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Match {
    pub file: String,
    /// 1-based.
    pub line_number: usize,
    /// Trimmed line text.
    pub line_content: String,
    pub tag: Tag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    Updated,
    Skipped,
}

/// A handled line, as stored in the update history document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub file: String,
    pub line_number: usize,
    pub line_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_content: Option<String>,
}

// ============================================================================
// Tool input schemas
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FindFileRequest {
    /// Bare file name, e.g. `build.gradle`
    #[schemars(description = "Bare file name to look up in the index")]
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClassifyPatternRequest {
    #[schemars(description = "Literal text to search for (not a regex)")]
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EditDependencyRequest {
    #[schemars(description = "Literal text to replace (not a regex)")]
    pub pattern: String,

    #[schemars(description = "Replacement text")]
    pub replacement: String,

    /// Files to edit. Empty means dry run: list candidates, change nothing.
    #[serde(default)]
    #[schemars(
        description = "Files to edit. Leave empty for a dry run that lists the matching files."
    )]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct IgnorePathRequest {
    #[schemars(description = "Keyword; every path containing it is excluded from the index")]
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn catalog_lists_the_five_tools() {
        let names: Vec<&str> = TOOL_CATALOG.iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "find_file",
                "classify_pattern",
                "edit_dependency",
                "ignore_path",
                "reset_ignore"
            ]
        );
    }

    #[test]
    fn edit_request_defaults_files_and_rejects_extras() {
        let req: EditDependencyRequest =
            serde_json::from_value(json!({"pattern": "a", "replacement": "b"})).unwrap();
        assert!(req.files.is_empty());

        let err = serde_json::from_value::<EditDependencyRequest>(
            json!({"pattern": "a", "replacement": "b", "force": true}),
        );
        assert!(err.is_err());
    }

    #[test]
    fn history_entry_omits_missing_new_content() {
        let entry = HistoryEntry {
            file: "a.txt".into(),
            line_number: 3,
            line_content: "x".into(),
            new_content: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({"file": "a.txt", "line_number": 3, "line_content": "x"}));
    }

    #[test]
    fn tag_labels() {
        assert_eq!(Tag::BuildDependency.to_string(), "[Gradle]");
        assert_eq!(Tag::Generic.label(), "[Generic]");
    }
}
