use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AgentError, Result};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "pattern-agent.toml";

/// Built-in tool-selection template. Must contain [`INPUT_PLACEHOLDER`].
pub const DEFAULT_TEMPLATE: &str = include_str!("../prompts/tool_selector.txt");
pub const INPUT_PLACEHOLDER: &str = "{input}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    pub model: String,
    pub api_base: String,
    /// Name of the environment variable holding the API key, never the key itself.
    pub api_key_env: String,
    pub temperature: f32,
    pub model_timeout_secs: u64,
    /// Extra attempts after the first failed model call.
    pub model_retries: u32,
    pub tool_timeout_secs: u64,
    pub server_command: String,
    pub server_args: Vec<String>,
    pub prompt_path: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.3,
            model_timeout_secs: 120,
            model_retries: 2,
            tool_timeout_secs: 60,
            server_command: "pattern-tools-mcp".to_string(),
            server_args: Vec::new(),
            prompt_path: None,
        }
    }
}

/// Values supplied on the command line or through the environment; `None` keeps the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub temperature: Option<f32>,
    pub server_command: Option<String>,
    pub server_args: Option<Vec<String>>,
    pub prompt_path: Option<PathBuf>,
}

impl AgentConfig {
    /// An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw).map_err(|source| AgentError::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded agent config from {}", path.display());
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(api_base) = overrides.api_base {
            self.api_base = api_base;
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = temperature;
        }
        if let Some(command) = overrides.server_command {
            self.server_command = command;
        }
        if let Some(args) = overrides.server_args {
            self.server_args = args;
        }
        if let Some(path) = overrides.prompt_path {
            self.prompt_path = Some(path);
        }
    }

    pub fn api_key(&self) -> Result<String> {
        match env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(AgentError::Config(format!(
                "API key variable {} is not set",
                self.api_key_env
            ))),
        }
    }

    pub fn prompt_template(&self) -> Result<String> {
        let template = match &self.prompt_path {
            Some(path) => fs::read_to_string(path)?,
            None => DEFAULT_TEMPLATE.to_string(),
        };
        if !template.contains(INPUT_PLACEHOLDER) {
            return Err(AgentError::Config(format!(
                "Prompt template has no {INPUT_PLACEHOLDER} placeholder"
            )));
        }
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn partial_file_keeps_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("agent.toml");
        fs::write(
            &path,
            "model = \"gpt-4o-mini\"\nserver_args = [\"--flag\"]\n",
        )
        .unwrap();

        let config = AgentConfig::load(Some(&path)).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.server_args, vec!["--flag".to_string()]);
        assert_eq!(config.tool_timeout_secs, 60);
        assert_eq!(config.api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn unknown_keys_and_missing_explicit_file_are_errors() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("agent.toml");
        fs::write(&path, "modle = \"typo\"\n").unwrap();
        assert!(matches!(
            AgentConfig::load(Some(&path)),
            Err(AgentError::ConfigFormat { .. })
        ));
        assert!(matches!(
            AgentConfig::load(Some(&temp.path().join("absent.toml"))),
            Err(AgentError::IoError(_))
        ));
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut config = AgentConfig::default();
        config.apply(ConfigOverrides {
            model: Some("local-model".into()),
            server_args: Some(vec!["run".into()]),
            ..ConfigOverrides::default()
        });
        assert_eq!(config.model, "local-model");
        assert_eq!(config.server_args, vec!["run".to_string()]);
        assert_eq!(config.server_command, "pattern-tools-mcp");
    }

    #[test]
    fn builtin_template_has_placeholder() {
        let template = AgentConfig::default().prompt_template().unwrap();
        assert!(template.contains(INPUT_PLACEHOLDER));
    }

    #[test]
    fn custom_template_without_placeholder_is_rejected() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("prompt.txt");
        fs::write(&path, "no slot here").unwrap();
        let config = AgentConfig {
            prompt_path: Some(path),
            ..AgentConfig::default()
        };
        assert!(matches!(
            config.prompt_template(),
            Err(AgentError::Config(_))
        ));
    }
}
