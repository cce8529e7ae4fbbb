use noticeboard_core::NOTICEBOARD_DATA_DIR_VAR;
use std::env;
use std::path::PathBuf;

/// XDG Base Directory paths for noticeboard
pub struct XdgPaths;

impl XdgPaths {
    /// Get XDG_STATE_HOME/noticeboard or fallback
    pub fn state_dir() -> PathBuf {
        env::var("XDG_STATE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".local/state"))
                    .unwrap_or_else(|| PathBuf::from(".local/state"))
            })
            .join("noticeboard")
    }

    /// Get XDG_CACHE_HOME/noticeboard or fallback
    pub fn cache_dir() -> PathBuf {
        env::var("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|home| home.join(".cache"))
                    .unwrap_or_else(|| PathBuf::from(".cache"))
            })
            .join("noticeboard")
    }

    /// Directory holding the durable notice store
    ///
    /// `NOTICEBOARD_DATA_DIR` wins over the XDG state directory.
    pub fn store_dir() -> PathBuf {
        env::var(NOTICEBOARD_DATA_DIR_VAR)
            .map(|dir| PathBuf::from(dir).join("store"))
            .unwrap_or_else(|_| Self::state_dir().join("store"))
    }

    /// Directory holding shared cache entries and locks
    pub fn shared_cache_dir() -> PathBuf {
        env::var(NOTICEBOARD_DATA_DIR_VAR)
            .map(|dir| PathBuf::from(dir).join("cache"))
            .unwrap_or_else(|_| Self::cache_dir().join("shared"))
    }
}
