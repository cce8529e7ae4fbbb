//! Notice slot registry for noticeboard
//!
//! This crate provides the storage side of noticeboard:
//! - Durable store and shared cache adapters (in-memory and file backed)
//! - A distributed mutex built on the cache's add-if-absent primitive
//! - Cached projections of the slot table with explicit invalidation
//! - Gap-filling slot allocation and the notice lifecycle
//! - Authorization and audit collaborators

pub mod aggregation;
pub mod backends;
pub mod concurrent;
pub mod keys;
pub mod registry;
pub mod security;
pub mod traits;

pub use aggregation::{AggregationCache, NextIdHint, INVALIDATION_SCOPE};
pub use backends::{FileCache, FileStore, MemoryCache, MemoryStore, StoreStats};
pub use concurrent::DistributedMutex;
pub use keys::{CacheKeys, KeyLayout, SlotField};
pub use registry::{slot_scope, SlotRegistry, SlotRegistryBuilder, ALLOCATION_SCOPE};
pub use security::*;
pub use traits::{DurableStore, SharedCache};
