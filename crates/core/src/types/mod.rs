//! Core domain types for the `noticeboard` registry.
//!
//! ## Organization
//!
//! - **`notice_type`**: The severity of a notice and its lenient normalization
//! - **`slot`**: Slot identifiers, stored notices and the write requests that
//!   create or modify them

pub mod notice_type;
pub mod slot;

// Re-export all public types for convenient access
pub use notice_type::*;
pub use slot::*;
