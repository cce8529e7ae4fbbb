//! Registry configuration with environment overrides and validation

use crate::constants::*;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Settings for the distributed mutex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long a held lock survives if its owner never releases it
    pub ttl_secs: u64,
    /// Total acquisition attempts before giving up
    pub max_attempts: usize,
    /// Backoff unit; attempt `n` sleeps `n * base_delay` before the next try
    pub base_delay_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_LOCK_TTL_SECS,
            max_attempts: DEFAULT_LOCK_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_LOCK_BASE_DELAY_MS,
        }
    }
}

impl LockConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: usize) -> Duration {
        self.base_delay() * attempt as u32
    }
}

/// Configuration for the slot registry and its caches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Number of indexed slots (ids `1..=max_slots`)
    pub max_slots: u32,
    /// Longest accepted message, in code points
    pub max_message_len: usize,
    /// Lifetime of the cached slot snapshots
    pub snapshot_ttl_secs: u64,
    /// Lifetime of the cached next-free-id hint
    pub next_id_ttl_secs: u64,
    /// Minimum distance between now and a newly written expiry
    pub expiry_buffer_secs: i64,
    /// Prefix shared by every durable store key
    pub key_prefix: String,
    /// Prefix shared by every shared cache key
    pub cache_namespace: String,
    pub lock: LockConfig,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_slots: DEFAULT_MAX_SLOTS,
            max_message_len: DEFAULT_MAX_MESSAGE_LEN,
            snapshot_ttl_secs: DEFAULT_SNAPSHOT_TTL_SECS,
            next_id_ttl_secs: DEFAULT_NEXT_ID_TTL_SECS,
            expiry_buffer_secs: DEFAULT_EXPIRY_BUFFER_SECS,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            cache_namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
            lock: LockConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Defaults overlaid with any `NOTICEBOARD_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        override_from_env(NOTICEBOARD_MAX_SLOTS_VAR, &mut config.max_slots)?;
        override_from_env(NOTICEBOARD_MAX_MESSAGE_LEN_VAR, &mut config.max_message_len)?;
        override_from_env(NOTICEBOARD_SNAPSHOT_TTL_VAR, &mut config.snapshot_ttl_secs)?;
        override_from_env(NOTICEBOARD_NEXT_ID_TTL_VAR, &mut config.next_id_ttl_secs)?;
        override_from_env(NOTICEBOARD_EXPIRY_BUFFER_VAR, &mut config.expiry_buffer_secs)?;
        override_from_env(NOTICEBOARD_LOCK_TTL_VAR, &mut config.lock.ttl_secs)?;
        override_from_env(NOTICEBOARD_LOCK_ATTEMPTS_VAR, &mut config.lock.max_attempts)?;
        override_from_env(NOTICEBOARD_LOCK_DELAY_MS_VAR, &mut config.lock.base_delay_ms)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_slots == 0 {
            return Err(Error::configuration("max_slots must be at least 1"));
        }
        if self.max_message_len == 0 {
            return Err(Error::configuration("max_message_len must be at least 1"));
        }
        if self.snapshot_ttl_secs == 0 || self.next_id_ttl_secs == 0 {
            return Err(Error::configuration("cache TTLs must be greater than zero"));
        }
        if self.expiry_buffer_secs < 0 {
            return Err(Error::configuration("expiry_buffer must not be negative"));
        }
        if self.lock.ttl_secs == 0 {
            return Err(Error::configuration("lock ttl must be greater than zero"));
        }
        if self.lock.max_attempts == 0 {
            return Err(Error::configuration("lock max_attempts must be at least 1"));
        }
        if self.key_prefix.is_empty() || self.cache_namespace.is_empty() {
            return Err(Error::configuration(
                "key_prefix and cache_namespace must not be empty",
            ));
        }
        Ok(())
    }

    pub fn snapshot_ttl(&self) -> Duration {
        Duration::from_secs(self.snapshot_ttl_secs)
    }

    pub fn next_id_ttl(&self) -> Duration {
        Duration::from_secs(self.next_id_ttl_secs)
    }

    pub fn expiry_buffer(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.expiry_buffer_secs)
    }
}

fn override_from_env<T: FromStr>(var: &str, target: &mut T) -> Result<()> {
    match env::var(var) {
        Ok(raw) => {
            *target = raw.trim().parse().map_err(|_| {
                Error::configuration(format!("{var}='{raw}' is not a valid value"))
            })?;
            Ok(())
        }
        Err(_) => Ok(()),
    }
}

/// Builder for creating registry configurations
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    config: RegistryConfig,
}

impl RegistryConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: RegistryConfig) -> Self {
        Self { config }
    }

    pub fn with_max_slots(mut self, max_slots: u32) -> Self {
        self.config.max_slots = max_slots;
        self
    }

    pub fn with_max_message_len(mut self, max_message_len: usize) -> Self {
        self.config.max_message_len = max_message_len;
        self
    }

    pub fn with_snapshot_ttl(mut self, ttl: Duration) -> Self {
        self.config.snapshot_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_next_id_ttl(mut self, ttl: Duration) -> Self {
        self.config.next_id_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_expiry_buffer(mut self, buffer: Duration) -> Self {
        self.config.expiry_buffer_secs = buffer.as_secs() as i64;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.key_prefix = prefix.into();
        self
    }

    pub fn with_cache_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.cache_namespace = namespace.into();
        self
    }

    pub fn with_lock(mut self, lock: LockConfig) -> Self {
        self.config.lock = lock;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<RegistryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = RegistryConfig::default();
        assert_eq!(config.max_slots, 10);
        assert_eq!(config.max_message_len, 1000);
        assert_eq!(config.snapshot_ttl(), Duration::from_secs(300));
        assert_eq!(config.next_id_ttl(), Duration::from_secs(60));
        assert_eq!(config.expiry_buffer(), chrono::Duration::seconds(60));
        assert_eq!(config.lock.ttl(), Duration::from_secs(5));
        assert_eq!(config.lock.max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_linear_backoff() {
        let lock = LockConfig::default();
        assert_eq!(lock.delay_after(1), Duration::from_millis(100));
        assert_eq!(lock.delay_after(2), Duration::from_millis(200));
    }

    #[test]
    fn test_builder_rejects_zero_slots() {
        let result = RegistryConfigBuilder::new().with_max_slots(0).build();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RegistryConfig =
            serde_json::from_str(r#"{"max_slots": 4, "lock": {"max_attempts": 5}}"#).unwrap();
        assert_eq!(config.max_slots, 4);
        assert_eq!(config.lock.max_attempts, 5);
        assert_eq!(config.lock.ttl_secs, DEFAULT_LOCK_TTL_SECS);
        assert_eq!(config.key_prefix, DEFAULT_KEY_PREFIX);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        env::set_var(NOTICEBOARD_MAX_SLOTS_VAR, "5");
        env::set_var(NOTICEBOARD_LOCK_DELAY_MS_VAR, "25");
        let config = RegistryConfig::from_env();
        env::remove_var(NOTICEBOARD_MAX_SLOTS_VAR);
        env::remove_var(NOTICEBOARD_LOCK_DELAY_MS_VAR);

        let config = config.unwrap();
        assert_eq!(config.max_slots, 5);
        assert_eq!(config.lock.base_delay_ms, 25);
    }

    #[test]
    #[serial]
    fn test_env_override_rejects_garbage() {
        env::set_var(NOTICEBOARD_MAX_SLOTS_VAR, "many");
        let result = RegistryConfig::from_env();
        env::remove_var(NOTICEBOARD_MAX_SLOTS_VAR);

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }
}
