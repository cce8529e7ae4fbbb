//! Directory-backed durable store and shared cache
//!
//! Each key is one file. Writes go through a temporary file and a rename, so
//! a reader never observes a half-written value. Lock acquisition in
//! [`FileCache`] holds an advisory guard lock around check, reclaim and
//! exclusive creation.

use crate::traits::{DurableStore, SharedCache};
use async_trait::async_trait;
use noticeboard_core::{Error, Result, ResultExt};
use noticeboard_utils::atomic_file::{
    create_exclusive, read_optional, remove_if_exists, write_atomic,
};
use noticeboard_utils::FileGuard;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Map a key to a portable file name; anything outside `[A-Za-z0-9_-]` is
/// percent-encoded
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

/// Durable store persisting one file per key under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| Error::file_system(&dir, "create store directory", e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(encode_key(key))
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        read_optional(&self.path(key)).store_context("get", key)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        write_atomic(&self.path(key), value.as_bytes()).store_context("set", key)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        remove_if_exists(&self.path(key)).store_context("delete", key)
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| Error::file_system(&self.dir, "list store directory", e))?;
        let mut found = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| Error::file_system(&self.dir, "list store directory", e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Temporary files from in-flight writes start with '.'
            if name.starts_with('.') {
                continue;
            }
            let Some(key) = decode_key(name) else { continue };
            if !key.starts_with(prefix) {
                continue;
            }
            // A concurrent delete between listing and reading just drops the key
            if let Some(value) = read_optional(&entry.path())? {
                found.push((key, value));
            }
        }
        found.sort();
        Ok(found)
    }
}

/// On-disk representation of a cache entry
#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    value: String,
    expires_at_ms: u128,
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

impl FileEntry {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at_ms: now_ms() + ttl.as_millis(),
        }
    }

    fn is_live(&self) -> bool {
        now_ms() < self.expires_at_ms
    }
}

/// What sits at a cache entry's path
enum Existing {
    Missing,
    Live(FileEntry),
    Lapsed,
    /// Present but not parseable; `age` is the time since it was last written
    Unreadable { age: Duration },
}

/// Shared cache persisting one JSON file per key under a directory
///
/// Expiry is an absolute wall-clock time so that every process agrees on it.
/// Expired and unreadable entries read as absent. Every check-then-write on
/// an entry runs under that entry's [`FileGuard`], so `add_if_absent` and
/// `delete` are atomic across processes.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| Error::file_system(&dir, "create cache directory", e))?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(encode_key(key))
    }

    fn guard(&self, key: &str) -> Result<FileGuard> {
        FileGuard::acquire(&self.dir.join(format!(".{}.guard", encode_key(key))))
    }

    fn inspect(path: &Path) -> Result<Existing> {
        let Some(raw) = read_optional(path)? else {
            return Ok(Existing::Missing);
        };
        match serde_json::from_str::<FileEntry>(&raw) {
            Ok(entry) if entry.is_live() => Ok(Existing::Live(entry)),
            Ok(_) => Ok(Existing::Lapsed),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "unreadable cache entry"
                );
                let modified = match fs::metadata(path).and_then(|meta| meta.modified()) {
                    Ok(modified) => modified,
                    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Existing::Missing),
                    Err(e) => return Err(Error::file_system(path, "inspect cache entry", e)),
                };
                let age = SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or_default();
                Ok(Existing::Unreadable { age })
            }
        }
    }

    fn encode(value: &str, ttl: Duration) -> Result<String> {
        serde_json::to_string(&FileEntry::new(value, ttl))
            .map_err(|e| Error::json("encode cache entry", e))
    }
}

#[async_trait]
impl SharedCache for FileCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        // Lapsed files are left for the next guarded write to replace
        match Self::inspect(&self.path(key))? {
            Existing::Live(entry) => Ok(Some(entry.value)),
            _ => Ok(None),
        }
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        write_atomic(&self.path(key), Self::encode(value, ttl)?.as_bytes())
            .cache_context("set", key)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.path(key);
        let _guard = self.guard(key)?;
        let live = matches!(Self::inspect(&path)?, Existing::Live(_));
        Ok(remove_if_exists(&path)? && live)
    }

    async fn add_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let path = self.path(key);
        let encoded = Self::encode(value, ttl)?;
        let _guard = self.guard(key)?;

        match Self::inspect(&path)? {
            Existing::Missing => {}
            Existing::Live(_) => return Ok(false),
            Existing::Lapsed => {
                tracing::debug!(key, "reclaiming lapsed cache entry");
                remove_if_exists(&path)?;
            }
            // A damaged entry still counts as held for one full TTL
            Existing::Unreadable { age } if age < ttl => return Ok(false),
            Existing::Unreadable { .. } => {
                tracing::warn!(key, "replacing unreadable cache entry");
                remove_if_exists(&path)?;
            }
        }
        create_exclusive(&path, encoded.as_bytes()).cache_context("add", key)
    }
}
