//! Atomic file operations for the file-backed store and cache

use noticeboard_core::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Write data to a file atomically by writing to a temporary file and renaming
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let temp_path = write_temp(path, content)?;
    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::file_system(path, "atomic rename", e)
    })
}

/// Create a file only if nothing exists at `path`
///
/// Returns `Ok(false)` when the file already exists. The content is written
/// to a temporary file first and then hard-linked into place, so the file
/// appears complete or not at all, and two processes racing on the same path
/// cannot both succeed.
pub fn create_exclusive(path: &Path, content: &[u8]) -> Result<bool> {
    let temp_path = write_temp(path, content)?;
    let linked = match fs::hard_link(&temp_path, path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(Error::file_system(path, "link exclusive file", e)),
    };
    let _ = fs::remove_file(&temp_path);
    linked
}

/// Write `content` to a synced temporary file next to `path`
fn write_temp(path: &Path, content: &[u8]) -> Result<PathBuf> {
    let parent = path.parent().ok_or_else(|| {
        Error::configuration(format!("invalid file path '{}': no parent", path.display()))
    })?;

    fs::create_dir_all(parent)
        .map_err(|e| Error::file_system(parent, "create parent directory", e))?;

    // Temporary files start with '.' so directory scans can skip them
    let temp_path = parent.join(format!(".{}.tmp", Uuid::new_v4()));

    let result = (|| -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| Error::file_system(&temp_path, "create temporary file", e))?;
        file.write_all(content)
            .map_err(|e| Error::file_system(&temp_path, "write temporary file", e))?;
        file.sync_all()
            .map_err(|e| Error::file_system(&temp_path, "sync temporary file", e))?;
        Ok(())
    })();

    match result {
        Ok(()) => Ok(temp_path),
        Err(e) => {
            let _ = fs::remove_file(&temp_path);
            Err(e)
        }
    }
}

/// Read a file to a string, mapping "not found" to `None`
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::file_system(path, "read", e)),
    }
}

/// Remove a file, reporting whether it existed
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::file_system(path, "remove", e)),
    }
}
