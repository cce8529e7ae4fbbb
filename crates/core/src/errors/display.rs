//! Display implementations for error types

use super::types::Error;
use std::fmt;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation { field, message } => {
                write!(f, "invalid {field}: {message}")
            }
            Error::SlotNotFound { id } => {
                write!(f, "notice slot {id} does not exist")
            }
            Error::SlotOccupied { id } => {
                write!(f, "notice slot {id} is already in use")
            }
            Error::InvalidId { id, max } => {
                write!(f, "notice id {id} is out of range (expected 1-{max})")
            }
            Error::SlotsExhausted { max } => {
                write!(f, "all {max} notice slots are in use")
            }
            Error::LockContended {
                scope,
                attempts,
                waited,
            } => {
                write!(
                    f,
                    "could not acquire lock '{scope}' after {attempts} attempts ({waited:?}); try again later"
                )
            }
            Error::Store {
                operation,
                key,
                message,
            } => {
                write!(f, "store {operation} failed for '{key}': {message}")
            }
            Error::Cache {
                operation,
                key,
                message,
            } => {
                write!(f, "cache {operation} failed for '{key}': {message}")
            }
            Error::PermissionDenied { operation, message } => {
                write!(f, "permission denied for {operation}: {message}")
            }
            Error::Configuration { message } => {
                write!(f, "configuration error: {message}")
            }
            Error::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "file system {} operation failed for '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            Error::Json { message, .. } => {
                write!(f, "JSON error: {message}")
            }
        }
    }
}
