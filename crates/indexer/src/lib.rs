//! # Pattern Indexer
//!
//! Everything search and edit need to know about a project tree before reading file contents.
//!
//! ```text
//! Root directory
//!     │
//!     ├──> FileIndexer (ignore keywords prune whole subtrees)
//!     │      └─> FileIndex: bare file name -> full path
//!     │
//!     └──> LineClassifier (ordered rules, first match wins)
//!            └─> Tag per matched line
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use pattern_indexer::{FileIndexer, IgnoreKeywords, LineClassifier};
//!
//! fn main() -> pattern_indexer::Result<()> {
//!     let index = FileIndexer::new(".").build(&IgnoreKeywords::default())?;
//!     println!("{} files", index.len());
//!     println!("{}", LineClassifier::standard().classify("import java.util.List;"));
//!     Ok(())
//! }
//! ```

mod classifier;
mod error;
mod scanner;

pub use classifier::LineClassifier;
pub use error::{IndexerError, Result};
pub use scanner::{FileIndex, FileIndexer, IgnoreKeywords};
