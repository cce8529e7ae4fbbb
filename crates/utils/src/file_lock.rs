//! Advisory file locks for check-then-write sequences shared between processes

use fs2::FileExt;
use noticeboard_core::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock on a guard file, held until dropped
#[derive(Debug)]
pub struct FileGuard {
    file: File,
    path: PathBuf,
}

impl FileGuard {
    /// Block until the exclusive lock on `path` is held
    ///
    /// The guard file is created when missing and never removed, so every
    /// process locks the same inode.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::file_system(parent, "create parent directory", e))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| Error::file_system(path, "open guard file", e))?;
        file.lock_exclusive()
            .map_err(|e| Error::file_system(path, "lock guard file", e))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock as well
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::debug!(path = %self.path.display(), error = %e, "failed to unlock guard file");
        }
    }
}
