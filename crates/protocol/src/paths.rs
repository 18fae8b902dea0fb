use std::path::{Component, Path, PathBuf};

/// Absolute, lexically normalized form of `path` (`.` and `..` folded, symlinks untouched).
///
/// Relative paths are resolved against the current directory. Two spellings of the same file
/// compare equal after this, which is what edit restriction by file list relies on.
pub fn normalize(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
