use crate::error::{HarnessError, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::debug;

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| HarnessError::io(path, e))
}

/// Removes a directory tree; a missing path is not an error.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    debug!(path = %path.display(), "removing directory");
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(HarnessError::io(path, e)),
    }
}

pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(HarnessError::io(path, e)),
    }
}

pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    debug!(src = %src.display(), dst = %dst.display(), "copying file");
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|e| HarnessError::io(src, e))
}

pub fn rename(src: &Path, dst: &Path) -> Result<()> {
    debug!(src = %src.display(), dst = %dst.display(), "renaming file");
    fs::rename(src, dst).map_err(|e| HarnessError::io(src, e))
}

/// Copies `src` into a new tree rooted at `dst`.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    debug!(src = %src.display(), dst = %dst.display(), "copying directory");
    for entry in walkdir::WalkDir::new(src) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            HarnessError::io(path, e.into())
        })?;
        let rel = entry.path().strip_prefix(src).unwrap_or(entry.path());
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                ensure_dir(parent)?;
            }
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Names of the regular files directly inside `dir`, in enumeration order.
pub fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))? {
        let entry = entry.map_err(|e| HarnessError::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| HarnessError::io(entry.path(), e))?;
        if file_type.is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    Ok(names)
}

pub fn read_to_string_if_exists(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(HarnessError::io(path, e)),
    }
}

pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| HarnessError::io(path, e))
}

pub fn append_string(path: &Path, contents: &str) -> Result<()> {
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| HarnessError::io(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| HarnessError::io(path, e))
}

/// Empties an existing file in place; does nothing if it is absent.
pub fn truncate_if_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    fs::OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| HarnessError::io(path, e))
}
