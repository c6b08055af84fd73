use crate::error::{AssistError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// A failed write leaves any previous content in place.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let wrap = |source: std::io::Error| AssistError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(data).map_err(wrap)?;
    tmp.persist(path).map_err(|e| wrap(e.error))?;
    Ok(())
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Read a UTF-8 document. A missing file is reported as
/// [`AssistError::ContextNotFound`], any other failure as [`AssistError::Read`].
pub fn read_document(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AssistError::ContextNotFound(path.to_path_buf()))
        }
        Err(source) => Err(AssistError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
