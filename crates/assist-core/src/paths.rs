use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ASSIST_DIR: &str = ".assist";
pub const CONFIG_FILE: &str = ".assist/config.yaml";

pub const CONTEXT_FILE: &str = "context/context.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Resolve a configured path against the project root. Absolute paths win.
pub fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_under_assist_dir() {
        let root = Path::new("/tmp/proj");
        let path = config_path(root);
        assert_eq!(path, PathBuf::from("/tmp/proj/.assist/config.yaml"));
        assert!(path.starts_with(root.join(ASSIST_DIR)));
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            resolve(root, Path::new("/etc/ctx.md")),
            PathBuf::from("/etc/ctx.md")
        );
        assert_eq!(
            resolve(root, Path::new("docs/ctx.md")),
            PathBuf::from("/tmp/proj/docs/ctx.md")
        );
    }
}
