use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config {}: {}", .path.display(), .source)]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Model request failed: {0}")]
    ModelTransport(#[from] reqwest::Error),

    #[error("Model API error: {status} - {body}")]
    ModelApi { status: u16, body: String },

    #[error("Invalid model response: {0}")]
    ModelResponse(String),

    #[error("Tool channel error: {0}")]
    ToolChannel(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },
}

impl AgentError {
    /// Transport failures and server-side API errors are worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ModelTransport(_) => true,
            Self::ModelApi { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
