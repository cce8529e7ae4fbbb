//! Core domain types, errors, configuration and expiry policy for `noticeboard`.
//!
//! This crate has no I/O. It defines the vocabulary shared by the registry,
//! its storage adapters and the command-line front end.
//!
//! ## Key Components
//!
//! - **`errors`**: The `Error` enum and `Result` alias covering validation,
//!   registry preconditions, lock contention and adapter failures.
//! - **`types`**: `SlotId`, `Slot`, `NoticeType` and the write requests
//!   `NewNotice` / `NoticePatch`.
//! - **`expiry`**: Parsing and checking of expiry timestamps.
//! - **`config`**: `RegistryConfig` and `LockConfig` with environment overrides.
//! - **`constants`**: Defaults and environment variable names.

pub mod config;
pub mod constants;
pub mod errors;
pub mod expiry;
pub mod types;

pub use self::{
    config::{LockConfig, RegistryConfig, RegistryConfigBuilder},
    constants::*,
    errors::{Error, Result, ResultExt},
    types::*,
};
