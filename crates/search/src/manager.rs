use pattern_indexer::{FileIndex, LineClassifier};
use pattern_protocol::{paths, HistoryEntry, HistoryStatus, Match};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, SearchError};
use crate::history::UpdateHistory;

/// One line rewritten on disk and recorded in the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedEdit {
    pub file: String,
    pub line_number: usize,
    pub original: String,
    pub updated: String,
}

impl AppliedEdit {
    pub fn confirmation(&self) -> String {
        format!(
            "Replaced in {}, line {}\n  '{}'\n  -> '{}'",
            self.file, self.line_number, self.original, self.updated
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The file was left as it was.
    NotWritten,
    /// The file was rewritten but the history log could not be updated.
    NotRecorded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFailure {
    pub file: String,
    pub line_number: usize,
    pub kind: FailureKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditReport {
    pub applied: Vec<AppliedEdit>,
    pub failed: Vec<EditFailure>,
}

impl EditReport {
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty() && self.failed.is_empty()
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.applied.iter().map(AppliedEdit::confirmation).collect()
    }
}

/// Search and edit over an indexed tree, with the history log as the dedup authority.
pub struct DependencyManager {
    index: FileIndex,
    history: UpdateHistory,
    classifier: &'static LineClassifier,
}

impl DependencyManager {
    pub fn new(index: FileIndex, history: UpdateHistory) -> Self {
        Self {
            index,
            history,
            classifier: LineClassifier::standard(),
        }
    }

    pub fn index(&self) -> &FileIndex {
        &self.index
    }

    pub fn set_index(&mut self, index: FileIndex) {
        self.index = index;
    }

    pub fn history(&self) -> &UpdateHistory {
        &self.history
    }

    /// Every line containing `pattern` literally, in index order then line order.
    ///
    /// Unreadable files (binary, permissions, vanished) are skipped.
    pub fn search(&self, pattern: &str) -> Result<Vec<Match>> {
        if pattern.is_empty() {
            return Err(SearchError::EmptyPattern);
        }

        let mut matches = Vec::new();
        for (_, path) in self.index.iter() {
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    log::debug!("Skipping unreadable {}: {e}", path.display());
                    continue;
                }
            };
            let file = path.to_string_lossy();
            for (idx, line) in content.lines().enumerate() {
                if line.contains(pattern) {
                    matches.push(Match {
                        file: file.to_string(),
                        line_number: idx + 1,
                        line_content: line.trim().to_string(),
                        tag: self.classifier.classify(line),
                    });
                }
            }
        }
        Ok(matches)
    }

    /// Replace `pattern` with `replacement` on each matching line, one line at a time.
    ///
    /// Matches are recomputed here, never taken from the caller. With `only_files`, matches in
    /// other files are left alone. A line already in the history, or one this same edit already
    /// produced, is not touched again. A failure in one file never stops the others; it lands in
    /// [`EditReport::failed`], including a rewrite that could not be recorded in the history.
    pub fn edit(
        &mut self,
        pattern: &str,
        replacement: &str,
        only_files: Option<&[String]>,
    ) -> Result<EditReport> {
        let matches = self.search(pattern)?;
        let allowed: Option<HashSet<PathBuf>> =
            only_files.map(|files| files.iter().map(paths::normalize).collect());

        let mut report = EditReport::default();
        for m in matches {
            if let Some(allowed) = &allowed {
                if !allowed.contains(&paths::normalize(&m.file)) {
                    continue;
                }
            }
            let edited = self.edit_line(Path::new(&m.file), m.line_number, pattern, replacement);
            let applied = match edited {
                Ok(Some(applied)) => applied,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("Edit of {} line {} failed: {e}", m.file, m.line_number);
                    report.failed.push(EditFailure {
                        file: m.file,
                        line_number: m.line_number,
                        kind: FailureKind::NotWritten,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let entry = HistoryEntry {
                file: applied.file.clone(),
                line_number: applied.line_number,
                line_content: applied.original.clone(),
                new_content: Some(applied.updated.clone()),
            };
            match self.history.record(HistoryStatus::Updated, entry) {
                Ok(()) => {
                    log::info!("Edited {} line {}", applied.file, applied.line_number);
                    report.applied.push(applied);
                }
                Err(e) => {
                    log::error!(
                        "Edited {} line {} but history was not updated: {e}",
                        applied.file,
                        applied.line_number
                    );
                    report.failed.push(EditFailure {
                        file: applied.file,
                        line_number: applied.line_number,
                        kind: FailureKind::NotRecorded,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Rewrites one line on disk; recording it is left to the caller.
    fn edit_line(
        &self,
        path: &Path,
        line_number: usize,
        pattern: &str,
        replacement: &str,
    ) -> Result<Option<AppliedEdit>> {
        let file = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path)?;
        let mut lines: Vec<&str> = content.split_inclusive('\n').collect();

        let Some(current) = lines.get(line_number - 1).copied() else {
            return Err(SearchError::Other(format!(
                "line {line_number} no longer exists"
            )));
        };
        let original = current.trim();
        if self.history.already_handled(&file, original)
            || self.history.produced_by(&file, original, pattern, replacement)
        {
            log::debug!("Already handled {file} line {line_number}");
            return Ok(None);
        }
        if !current.contains(pattern) {
            log::debug!("{file} line {line_number} changed since search, leaving it");
            return Ok(None);
        }

        let rewritten = current.replace(pattern, replacement);
        lines[line_number - 1] = &rewritten;
        std::fs::write(path, lines.concat())?;

        Ok(Some(AppliedEdit {
            file,
            line_number,
            original: original.to_string(),
            updated: rewritten.trim().to_string(),
        }))
    }
}
