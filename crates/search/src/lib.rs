mod error;
mod history;
mod manager;

pub use error::{Result, SearchError};
pub use history::{HistoryDocument, UpdateHistory};
pub use manager::{AppliedEdit, DependencyManager, EditFailure, EditReport, FailureKind};
