//! Cross-process coordination

pub mod mutex;

pub use mutex::DistributedMutex;
