use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("History document {path} is not valid JSON: {source}")]
    HistoryFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to persist history to {path}: {reason}")]
    HistoryPersist { path: String, reason: String },

    #[error("Empty pattern")]
    EmptyPattern,

    #[error("{0}")]
    Other(String),
}
