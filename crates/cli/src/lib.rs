//! Command-line front end for the noticeboard slot registry

pub mod commands;
pub mod context;
pub mod output;
pub mod sanitize;

// Re-export commonly used types
pub use commands::Commands;
pub use context::{AppContext, ContextOptions};
