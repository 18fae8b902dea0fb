use anyhow::{Context as AnyhowContext, Result};
use pattern_indexer::{FileIndexer, IgnoreKeywords};
use pattern_protocol::{
    ClassifyPatternRequest, EditDependencyRequest, FindFileRequest, IgnorePathRequest, Match,
    EDIT_DEPENDENCY,
};
use pattern_search::{DependencyManager, EditReport, FailureKind, UpdateHistory};
use std::collections::BTreeSet;

use crate::config::ServerConfig;

/// Transport-independent tool core. Owns every file-system mutation and the history log.
pub struct ToolServer {
    indexer: FileIndexer,
    ignore: IgnoreKeywords,
    manager: DependencyManager,
}

impl ToolServer {
    pub fn open(config: &ServerConfig) -> Result<Self> {
        let indexer = FileIndexer::new(&config.root).with_state_dir(config.state_dir());
        let ignore = IgnoreKeywords::new(config.ignore.iter().cloned());
        let index = indexer.build(&ignore).context("Failed to index project root")?;
        let history = UpdateHistory::open(&config.history_path).with_context(|| {
            format!("Failed to load history {}", config.history_path.display())
        })?;
        Ok(Self {
            indexer,
            ignore,
            manager: DependencyManager::new(index, history),
        })
    }

    pub fn manager(&self) -> &DependencyManager {
        &self.manager
    }

    pub fn find_file(&self, request: &FindFileRequest) -> String {
        match self.manager.index().get(&request.filename) {
            Some(path) => format!("{} -> {}", request.filename, path.display()),
            None => format!("File '{}' not found.", request.filename),
        }
    }

    pub fn classify_pattern(&self, request: &ClassifyPatternRequest) -> Result<String> {
        let matches = self.manager.search(&request.pattern)?;
        if matches.is_empty() {
            return Ok(no_matches(&request.pattern));
        }
        let rows: Vec<String> = matches
            .iter()
            .map(|m| {
                format!(
                    "{} in {}, line {}: {}",
                    m.tag, m.file, m.line_number, m.line_content
                )
            })
            .collect();
        Ok(format!(
            "Found {} matches for '{}':\n{}",
            rows.len(),
            request.pattern,
            rows.join("\n")
        ))
    }

    /// Empty `files` is a dry run: report candidates, write nothing.
    pub fn edit_dependency(&mut self, request: &EditDependencyRequest) -> Result<String> {
        let matches = self.manager.search(&request.pattern)?;
        if matches.is_empty() {
            return Ok(no_matches(&request.pattern));
        }
        if request.files.is_empty() {
            return Ok(render_dry_run(&request.pattern, &matches));
        }

        // Relative entries name files under the project root, not the server's cwd.
        let files: Vec<String> = request
            .files
            .iter()
            .map(|file| self.indexer.root().join(file).to_string_lossy().to_string())
            .collect();
        let report = self
            .manager
            .edit(&request.pattern, &request.replacement, Some(&files))?;
        Ok(render_edit_report(&report))
    }

    pub fn ignore_path(&mut self, request: &IgnorePathRequest) -> Result<String> {
        self.ignore.push(request.path.clone());
        let files = self.rebuild_index()?;
        Ok(format!("Ignored path: {} ({files} files indexed)", request.path))
    }

    pub fn reset_ignore(&mut self) -> Result<String> {
        self.ignore.clear();
        let files = self.rebuild_index()?;
        Ok(format!("Ignore list has been reset. ({files} files indexed)"))
    }

    /// Full re-walk; the index is never patched incrementally.
    fn rebuild_index(&mut self) -> Result<usize> {
        let index = self
            .indexer
            .build(&self.ignore)
            .context("Failed to rebuild index")?;
        let files = index.len();
        self.manager.set_index(index);
        Ok(files)
    }
}

fn no_matches(pattern: &str) -> String {
    format!("No matches found for '{pattern}'")
}

fn render_dry_run(pattern: &str, matches: &[Match]) -> String {
    let rows: Vec<String> = matches
        .iter()
        .map(|m| {
            format!(
                "{}, line {} {}: {}",
                m.file, m.line_number, m.tag, m.line_content
            )
        })
        .collect();
    let files: BTreeSet<&str> = matches.iter().map(|m| m.file.as_str()).collect();
    let files: Vec<&str> = files.into_iter().collect();

    format!(
        "Found {} matches for '{}':\n\n{}\n\nPlease call `{EDIT_DEPENDENCY}` again with the `files` field set to one or more of these files:\n{}",
        rows.len(),
        pattern,
        rows.join("\n"),
        files.join("\n")
    )
}

fn render_edit_report(report: &EditReport) -> String {
    if report.is_empty() {
        return "No edits made. Files may already be updated or skipped.".to_string();
    }

    let mut sections = Vec::new();
    if report.applied.is_empty() {
        sections.push("No edits made.".to_string());
    } else {
        sections.push(format!(
            "Edits applied:\n{}",
            report.confirmations().join("\n\n")
        ));
    }
    if !report.failed.is_empty() {
        let failures: Vec<String> = report
            .failed
            .iter()
            .map(|f| match f.kind {
                FailureKind::NotWritten => format!(
                    "Failed to edit {} (line {}): {}",
                    f.file, f.line_number, f.reason
                ),
                FailureKind::NotRecorded => format!(
                    "Edited {} line {} but could not record it in history: {}",
                    f.file, f.line_number, f.reason
                ),
            })
            .collect();
        sections.push(failures.join("\n"));
    }
    sections.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn project() -> (TempDir, ToolServer) {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("app")).unwrap();
        fs::create_dir_all(temp.path().join("lib")).unwrap();
        fs::write(
            temp.path().join("app").join("build.gradle"),
            "dependencies {\n    implementation \"com.foo:bar:1.0\"\n}\n",
        )
        .unwrap();
        fs::write(
            temp.path().join("lib").join("deps.gradle"),
            "implementation 'com.foo:bar:1.0'\n",
        )
        .unwrap();
        let server = ToolServer::open(&ServerConfig::for_root(temp.path())).unwrap();
        (temp, server)
    }

    fn edit(pattern: &str, replacement: &str, files: Vec<String>) -> EditDependencyRequest {
        EditDependencyRequest {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            files,
        }
    }

    #[test]
    fn find_file_hit_and_miss_are_plain_text() {
        let (temp, server) = project();
        let hit = server.find_file(&FindFileRequest {
            filename: "build.gradle".into(),
        });
        assert_eq!(
            hit,
            format!(
                "build.gradle -> {}",
                temp.path().join("app").join("build.gradle").display()
            )
        );
        let miss = server.find_file(&FindFileRequest {
            filename: "pom.xml".into(),
        });
        assert_eq!(miss, "File 'pom.xml' not found.");
    }

    #[test]
    fn classify_renders_tag_location_and_content() {
        let (temp, server) = project();
        let text = server
            .classify_pattern(&ClassifyPatternRequest {
                pattern: "com.foo:bar".into(),
            })
            .unwrap();
        let build = temp.path().join("app").join("build.gradle");
        assert!(text.starts_with("Found 2 matches for 'com.foo:bar':\n"));
        assert!(text.contains(&format!(
            "[Gradle] in {}, line 2: implementation \"com.foo:bar:1.0\"",
            build.display()
        )));

        let none = server
            .classify_pattern(&ClassifyPatternRequest {
                pattern: "absent".into(),
            })
            .unwrap();
        assert_eq!(none, "No matches found for 'absent'");
    }

    #[test]
    fn dry_run_never_writes_and_lists_sorted_files() {
        let (temp, mut server) = project();
        let build = temp.path().join("app").join("build.gradle");
        let deps = temp.path().join("lib").join("deps.gradle");
        let before = (
            fs::read_to_string(&build).unwrap(),
            fs::read_to_string(&deps).unwrap(),
        );

        let text = server
            .edit_dependency(&edit("com.foo:bar:1.0", "com.foo:bar:2.0", vec![]))
            .unwrap();

        assert_eq!(
            (
                fs::read_to_string(&build).unwrap(),
                fs::read_to_string(&deps).unwrap()
            ),
            before
        );
        assert!(server.manager().history().document().updated.is_empty());
        let tail = format!("{}\n{}", build.display(), deps.display());
        assert!(text.ends_with(&tail), "unexpected dry run text:\n{text}");
        assert!(text.contains("`edit_dependency` again with the `files` field"));
    }

    #[test]
    fn real_edit_is_restricted_to_files() {
        let (temp, mut server) = project();
        let build = temp.path().join("app").join("build.gradle");
        let deps = temp.path().join("lib").join("deps.gradle");

        let text = server
            .edit_dependency(&edit(
                "com.foo:bar:1.0",
                "com.foo:bar:2.0",
                vec![deps.to_string_lossy().to_string()],
            ))
            .unwrap();

        assert!(text.starts_with("Edits applied:\n"));
        assert_eq!(
            fs::read_to_string(&deps).unwrap(),
            "implementation 'com.foo:bar:2.0'\n"
        );
        assert!(fs::read_to_string(&build).unwrap().contains("com.foo:bar:1.0"));

        let again = server
            .edit_dependency(&edit(
                "com.foo:bar:1.0",
                "com.foo:bar:2.0",
                vec![deps.to_string_lossy().to_string()],
            ))
            .unwrap();
        assert_eq!(
            again,
            "No edits made. Files may already be updated or skipped."
        );
    }

    #[test]
    fn relative_files_resolve_against_the_root() {
        let (temp, mut server) = project();
        let text = server
            .edit_dependency(&edit(
                "com.foo:bar:1.0",
                "com.foo:bar:2.0",
                vec!["lib/deps.gradle".to_string()],
            ))
            .unwrap();

        assert!(text.starts_with("Edits applied:\n"), "{text}");
        assert_eq!(
            fs::read_to_string(temp.path().join("lib").join("deps.gradle")).unwrap(),
            "implementation 'com.foo:bar:2.0'\n"
        );
    }

    #[test]
    fn unrecorded_edit_is_reported_as_edited_but_not_logged() {
        let temp = tempdir().unwrap();
        let build = temp.path().join("build.gradle");
        fs::write(&build, "implementation \"com.foo:bar:1.0\"\n").unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let config = ServerConfig {
            history_path: blocker.join("history.json"),
            ..ServerConfig::for_root(temp.path())
        };
        let mut server = ToolServer::open(&config).unwrap();

        let text = server
            .edit_dependency(&edit(
                "com.foo:bar:1.0",
                "com.foo:bar:2.0",
                vec![build.to_string_lossy().to_string()],
            ))
            .unwrap();

        assert!(!text.contains("Edits applied"), "{text}");
        assert!(text.starts_with(&format!(
            "No edits made.\n\nEdited {} line 1 but could not record it in history: ",
            build.display()
        )));
        assert_eq!(
            fs::read_to_string(&build).unwrap(),
            "implementation \"com.foo:bar:2.0\"\n"
        );
    }

    #[test]
    fn ignore_and_reset_rebuild_the_index() {
        let (_temp, mut server) = project();

        server
            .ignore_path(&IgnorePathRequest { path: "lib".into() })
            .unwrap();
        assert!(server
            .manager()
            .index()
            .iter()
            .all(|(_, path)| !path.to_string_lossy().contains("lib")));
        let text = server
            .find_file(&FindFileRequest {
                filename: "deps.gradle".into(),
            });
        assert_eq!(text, "File 'deps.gradle' not found.");

        let reset = server.reset_ignore().unwrap();
        assert!(reset.starts_with("Ignore list has been reset."));
        assert!(server.manager().index().get("deps.gradle").is_some());
    }

    #[test]
    fn empty_pattern_is_an_error_result() {
        let (_temp, server) = project();
        let err = server
            .classify_pattern(&ClassifyPatternRequest { pattern: "".into() })
            .unwrap_err();
        assert_eq!(err.to_string(), "Empty pattern");
    }
}
