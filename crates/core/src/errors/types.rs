//! Core error type definitions

use crate::types::SlotId;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for noticeboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for noticeboard operations using thiserror
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller input failed validation (message length, notice type, expiry)
    Validation { field: String, message: String },

    /// No slot with this id is present
    SlotNotFound { id: SlotId },

    /// An explicit id was requested but the slot is already present
    SlotOccupied { id: SlotId },

    /// The id is outside the indexed range
    InvalidId { id: u32, max: u32 },

    /// Every indexed slot is in use
    SlotsExhausted { max: u32 },

    /// Mutual exclusion could not be established for a scope
    LockContended {
        scope: String,
        attempts: usize,
        waited: Duration,
    },

    /// Durable store failure
    Store {
        operation: String,
        key: String,
        message: String,
    },

    /// Shared cache failure
    Cache {
        operation: String,
        key: String,
        message: String,
    },

    /// The authorizer denied a mutating operation
    PermissionDenied { operation: String, message: String },

    /// Configuration errors
    Configuration { message: String },

    /// File system operations
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Whether the caller may retry the same operation later
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LockContended { .. })
    }

    /// Whether the error is a registry precondition failure raised before any write
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::SlotNotFound { .. }
                | Error::SlotOccupied { .. }
                | Error::InvalidId { .. }
                | Error::SlotsExhausted { .. }
        )
    }
}
