/// Constants used throughout the noticeboard codebase
// Registry sizing
pub const DEFAULT_MAX_SLOTS: u32 = 10;
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1000;

// Cache lifetimes
pub const DEFAULT_SNAPSHOT_TTL_SECS: u64 = 300;
pub const DEFAULT_NEXT_ID_TTL_SECS: u64 = 60;

// Expiry write buffer
pub const DEFAULT_EXPIRY_BUFFER_SECS: i64 = 60;

// Distributed lock
pub const DEFAULT_LOCK_TTL_SECS: u64 = 5;
pub const DEFAULT_LOCK_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_LOCK_BASE_DELAY_MS: u64 = 100;

// Key namespaces
pub const DEFAULT_KEY_PREFIX: &str = "admin_notice";
pub const DEFAULT_CACHE_NAMESPACE: &str = "noticeboard";

// Environment variable names
pub const NOTICEBOARD_MAX_SLOTS_VAR: &str = "NOTICEBOARD_MAX_SLOTS";
pub const NOTICEBOARD_MAX_MESSAGE_LEN_VAR: &str = "NOTICEBOARD_MAX_MESSAGE_LEN";
pub const NOTICEBOARD_SNAPSHOT_TTL_VAR: &str = "NOTICEBOARD_SNAPSHOT_TTL";
pub const NOTICEBOARD_NEXT_ID_TTL_VAR: &str = "NOTICEBOARD_NEXT_ID_TTL";
pub const NOTICEBOARD_EXPIRY_BUFFER_VAR: &str = "NOTICEBOARD_EXPIRY_BUFFER";
pub const NOTICEBOARD_LOCK_TTL_VAR: &str = "NOTICEBOARD_LOCK_TTL";
pub const NOTICEBOARD_LOCK_ATTEMPTS_VAR: &str = "NOTICEBOARD_LOCK_ATTEMPTS";
pub const NOTICEBOARD_LOCK_DELAY_MS_VAR: &str = "NOTICEBOARD_LOCK_DELAY_MS";
pub const NOTICEBOARD_DATA_DIR_VAR: &str = "NOTICEBOARD_DATA_DIR";
pub const NOTICEBOARD_AUDIT_LOG_VAR: &str = "NOTICEBOARD_AUDIT_LOG";
