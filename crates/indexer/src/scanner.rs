use ignore::WalkBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{IndexerError, Result};

/// Substring keywords; any path containing one of them is left out of the index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreKeywords {
    keywords: Vec<String>,
}

impl IgnoreKeywords {
    pub fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        let mut out = Self::default();
        for keyword in keywords {
            out.push(keyword);
        }
        out
    }

    /// Empty keywords are dropped: every path contains the empty string.
    pub fn push(&mut self, keyword: impl Into<String>) {
        let keyword = keyword.into();
        if keyword.is_empty() {
            return;
        }
        self.keywords.push(keyword);
    }

    pub fn clear(&mut self) {
        self.keywords.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keywords
    }

    pub fn matches(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.keywords
            .iter()
            .any(|keyword| path.contains(keyword.as_str()))
    }
}

/// Bare file name -> full path, in walk order.
///
/// A name seen twice keeps its original position and takes the later path.
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    entries: Vec<(String, PathBuf)>,
    positions: HashMap<String, usize>,
}

impl FileIndex {
    pub fn insert(&mut self, name: String, path: PathBuf) {
        if let Some(&pos) = self.positions.get(&name) {
            self.entries[pos].1 = path;
            return;
        }
        self.positions.insert(name.clone(), self.entries.len());
        self.entries.push((name, path));
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.positions
            .get(name)
            .map(|&pos| self.entries[pos].1.as_path())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walks a project root into a [`FileIndex`]
pub struct FileIndexer {
    root: PathBuf,
    state_dir: Option<PathBuf>,
}

impl FileIndexer {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            state_dir: None,
        }
    }

    /// Never index `dir` (where the server keeps its own files).
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.state_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full walk. An ignored directory is pruned, its children are never visited.
    pub fn build(&self, ignore: &IgnoreKeywords) -> Result<FileIndex> {
        if !self.root.is_dir() {
            return Err(IndexerError::InvalidPath(self.root.display().to_string()));
        }

        let keywords = ignore.clone();
        let state_dir = self.state_dir.clone();
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));
        builder.filter_entry(move |entry| {
            let path = entry.path();
            if state_dir.as_deref() == Some(path) {
                return false;
            }
            !keywords.matches(path)
        });

        let mut index = FileIndex::default();
        for result in builder.build() {
            match result {
                Ok(entry) => {
                    if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                        continue;
                    }
                    let Some(name) = entry.file_name().to_str() else {
                        log::debug!("Skipping non UTF-8 file name {}", entry.path().display());
                        continue;
                    };
                    index.insert(name.to_string(), entry.path().to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        log::info!(
            "Indexed {} files under {} (ignoring {:?})",
            index.len(),
            self.root.display(),
            ignore.as_slice()
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::{FileIndexer, IgnoreKeywords, IndexerError};
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn maps_bare_names_to_paths() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("app")).unwrap();
        fs::write(temp.path().join("app").join("build.gradle"), "x").unwrap();
        fs::write(temp.path().join("settings.gradle"), "y").unwrap();

        let index = FileIndexer::new(temp.path())
            .build(&IgnoreKeywords::default())
            .unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(
            index.get("build.gradle"),
            Some(temp.path().join("app").join("build.gradle").as_path())
        );
        assert!(index.get("missing.txt").is_none());
    }

    #[test]
    fn duplicate_names_keep_last_path_in_first_slot() {
        let temp = tempdir().unwrap();
        for dir in ["a", "b"] {
            fs::create_dir_all(temp.path().join(dir)).unwrap();
            fs::write(temp.path().join(dir).join("pom.xml"), dir).unwrap();
        }
        fs::write(temp.path().join("z.txt"), "z").unwrap();

        let index = FileIndexer::new(temp.path())
            .build(&IgnoreKeywords::default())
            .unwrap();

        let names: Vec<&str> = index.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["pom.xml", "z.txt"]);
        assert_eq!(
            index.get("pom.xml"),
            Some(temp.path().join("b").join("pom.xml").as_path())
        );
    }

    #[test]
    fn ignored_keywords_prune_directories() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("generated").join("deep")).unwrap();
        fs::write(temp.path().join("generated").join("deep").join("a.txt"), "a").unwrap();
        fs::write(temp.path().join("b.txt"), "b").unwrap();

        let mut ignore = IgnoreKeywords::default();
        ignore.push("generated");
        let index = FileIndexer::new(temp.path()).build(&ignore).unwrap();

        assert!(index.get("a.txt").is_none());
        assert!(index
            .iter()
            .all(|(_, path)| !path.to_string_lossy().contains("generated")));
        assert!(index.get("b.txt").is_some());
    }

    #[test]
    fn state_dir_is_never_indexed() {
        let temp = tempdir().unwrap();
        let state = temp.path().join(".pattern-tools");
        fs::create_dir_all(&state).unwrap();
        fs::write(state.join("update_history.json"), "{}").unwrap();
        fs::write(temp.path().join("a.txt"), "a").unwrap();

        let index = FileIndexer::new(temp.path())
            .with_state_dir(&state)
            .build(&IgnoreKeywords::default())
            .unwrap();

        assert!(index.get("update_history.json").is_none());
        assert!(index.get("a.txt").is_some());
    }

    #[test]
    fn empty_keywords_are_dropped() {
        let ignore = IgnoreKeywords::new(vec![String::new(), "x".to_string()]);
        assert_eq!(ignore.as_slice(), &["x".to_string()]);
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().unwrap();
        let result = FileIndexer::new(temp.path().join("nope")).build(&IgnoreKeywords::default());
        assert!(matches!(result, Err(IndexerError::InvalidPath(_))));
    }
}
