//! Adapter implementations
//!
//! - **`memory`**: in-process store and cache, shared by cloning an `Arc`.
//!   Used by tests and by embedders that run a single process.
//! - **`file`**: directory-backed store and cache so that separate processes
//!   (CLI invocations) share notices, projections and locks.

pub mod file;
pub mod memory;

pub use file::{FileCache, FileStore};
pub use memory::{MemoryCache, MemoryStore, StoreStats};
