//! Shared utilities for noticeboard
//!
//! File helpers and advisory locks used by the file-backed adapters, XDG
//! path resolution and tracing initialization for the binary.

pub mod atomic_file;
pub mod file_lock;
pub mod tracing;
pub mod xdg;

pub use atomic_file::*;
pub use file_lock::FileGuard;
pub use xdg::*;
