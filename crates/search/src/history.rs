use pattern_protocol::{HistoryEntry, HistoryStatus};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SearchError};

/// On-disk shape: two ordered lists in one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryDocument {
    #[serde(default)]
    pub updated: Vec<HistoryEntry>,
    #[serde(default)]
    pub skipped: Vec<HistoryEntry>,
}

impl HistoryDocument {
    fn list_mut(&mut self, status: HistoryStatus) -> &mut Vec<HistoryEntry> {
        match status {
            HistoryStatus::Updated => &mut self.updated,
            HistoryStatus::Skipped => &mut self.skipped,
        }
    }

    fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.updated.iter().chain(self.skipped.iter())
    }
}

/// Append-only ledger of handled lines. Every append rewrites the whole document.
#[derive(Debug)]
pub struct UpdateHistory {
    path: PathBuf,
    document: HistoryDocument,
}

impl UpdateHistory {
    /// Load `path`, or start empty if it does not exist yet. Nothing is written until the first
    /// record.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let document = Self::load(&path)?;
        log::debug!(
            "Loaded history {} ({} updated, {} skipped)",
            path.display(),
            document.updated.len(),
            document.skipped.len()
        );
        Ok(Self { path, document })
    }

    pub fn load(path: &Path) -> Result<HistoryDocument> {
        if !path.exists() {
            return Ok(HistoryDocument::default());
        }
        let raw = std::fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(HistoryDocument::default());
        }
        serde_json::from_str(&raw).map_err(|source| SearchError::HistoryFormat {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &HistoryDocument {
        &self.document
    }

    /// Append and persist. If the write fails the entry is dropped again, so memory never claims
    /// more than the disk holds.
    pub fn record(&mut self, status: HistoryStatus, entry: HistoryEntry) -> Result<()> {
        self.document.list_mut(status).push(entry);
        if let Err(err) = self.save() {
            self.document.list_mut(status).pop();
            return Err(err);
        }
        Ok(())
    }

    /// Exact `(file, line_content)` lookup over both lists.
    pub fn already_handled(&self, file: &str, line_content: &str) -> bool {
        self.document
            .entries()
            .any(|entry| entry.file == file && entry.line_content == line_content)
    }

    /// Whether applying `pattern -> replacement` to a recorded original in `file` yields
    /// `content`, i.e. the line is the output of this very edit.
    pub fn produced_by(
        &self,
        file: &str,
        content: &str,
        pattern: &str,
        replacement: &str,
    ) -> bool {
        self.document.updated.iter().any(|entry| {
            entry.file == file && entry.line_content.replace(pattern, replacement) == content
        })
    }

    fn save(&self) -> Result<()> {
        let persist_err = |reason: String| SearchError::HistoryPersist {
            path: self.path.display().to_string(),
            reason,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| persist_err(e.to_string()))?;
        }
        let bytes =
            serde_json::to_vec_pretty(&self.document).map_err(|e| persist_err(e.to_string()))?;
        write_atomic(&self.path, &bytes).map_err(|e| persist_err(e.to_string()))
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("history");
    let tmp = path.with_file_name(format!(".{file_name}.tmp-{}", std::process::id()));

    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    std::fs::rename(&tmp, path)
}
