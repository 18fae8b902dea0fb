use anyhow::{Context as AnyhowContext, Result};
use std::env;
use std::path::{Path, PathBuf};

pub const ROOT_ENV: &str = "PATTERN_TOOLS_ROOT";
pub const HISTORY_ENV: &str = "PATTERN_TOOLS_HISTORY";
pub const IGNORE_ENV: &str = "PATTERN_TOOLS_IGNORE";

/// Directory under the root where the server keeps its own files. Never indexed.
pub const STATE_DIR_NAME: &str = ".pattern-tools";
pub const HISTORY_FILE_NAME: &str = "update_history.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub root: PathBuf,
    pub history_path: PathBuf,
    pub ignore: Vec<String>,
}

impl ServerConfig {
    /// Defaults for `root`: history in the state dir, no ignore keywords.
    pub fn for_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let history_path = root.join(STATE_DIR_NAME).join(HISTORY_FILE_NAME);
        Self {
            root,
            history_path,
            ignore: Vec::new(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let root = match non_empty_var(ROOT_ENV) {
            Some(value) => PathBuf::from(value),
            None => env::current_dir().context("current directory unavailable")?,
        };
        let root = root
            .canonicalize()
            .with_context(|| format!("Invalid project root {}", root.display()))?;

        let mut config = Self::for_root(root);
        if let Some(value) = non_empty_var(HISTORY_ENV) {
            config.history_path = PathBuf::from(value);
        }
        if let Some(value) = non_empty_var(IGNORE_ENV) {
            config.ignore = parse_keywords(&value);
        }
        Ok(config)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR_NAME)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    let value = env::var(key).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn history_defaults_into_state_dir() {
        let config = ServerConfig::for_root("/repo");
        assert_eq!(
            config.history_path,
            PathBuf::from("/repo/.pattern-tools/update_history.json")
        );
        assert_eq!(config.state_dir(), PathBuf::from("/repo/.pattern-tools"));
    }

    #[test]
    fn keyword_list_is_comma_separated() {
        assert_eq!(
            parse_keywords(" build, ,node_modules,"),
            vec!["build".to_string(), "node_modules".to_string()]
        );
    }
}
