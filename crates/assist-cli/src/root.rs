use assist_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the project root directory.
///
/// Priority:
/// 1. `--root` flag / `ASSIST_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.assist/` or `context/context.md`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd).unwrap_or(cwd)
}

fn find_root_from(start: &Path) -> Option<PathBuf> {
    let is_project = |dir: &Path| {
        dir.join(paths::ASSIST_DIR).is_dir() || dir.join(paths::CONTEXT_FILE).is_file()
    };
    start
        .ancestors()
        .find(|&d| is_project(d))
        .or_else(|| start.ancestors().find(|d| d.join(".git").is_dir()))
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_assist_dir_above_start() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".assist")).unwrap();
        let subdir = dir.path().join("src/deep");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(find_root_from(&subdir).as_deref(), Some(dir.path()));
    }

    #[test]
    fn context_document_marks_project_before_git() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let project = dir.path().join("app");
        std::fs::create_dir_all(project.join("context")).unwrap();
        std::fs::write(project.join("context/context.md"), "# Projet : A\n").unwrap();
        let deep = project.join("docs");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_root_from(&deep), Some(project));
    }

    #[test]
    fn falls_back_to_git_root() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let deep = dir.path().join("a/b");
        std::fs::create_dir_all(&deep).unwrap();
        assert_eq!(find_root_from(&deep).as_deref(), Some(dir.path()));
    }
}
