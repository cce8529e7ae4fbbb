//! Extension traits for error handling

use super::types::{Error, Result};

/// Extension trait for attaching store context to adapter results
pub trait ResultExt<T> {
    /// Map any error into `Error::Store` for the given operation and key
    fn store_context(self, operation: &str, key: &str) -> Result<T>;

    /// Map any error into `Error::Cache` for the given operation and key
    fn cache_context(self, operation: &str, key: &str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn store_context(self, operation: &str, key: &str) -> Result<T> {
        self.map_err(|e| Error::store(operation, key, e.to_string()))
    }

    fn cache_context(self, operation: &str, key: &str) -> Result<T> {
        self.map_err(|e| Error::cache(operation, key, e.to_string()))
    }
}
