//! Backend configuration.
//!
//! A plain struct with a validating builder, the way the teacher
//! workspace's `database::config` module shapes its own open-time
//! options — no environment parsing or file format here, that belongs to
//! a collaborator layer that knows how the process is deployed.

/// Configuration for an in-memory [`crate::mem::InMemoryBackend`].
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Default TTL, in seconds, applied to a cached query result set that
    /// the caller did not supply an explicit TTL for.
    pub default_cache_ttl_secs: u64,
    /// Default TTL, in seconds, for an entity lock acquired without an
    /// explicit TTL.
    pub default_lock_ttl_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            default_cache_ttl_secs: 60,
            default_lock_ttl_secs: 30,
        }
    }
}

impl BackendConfig {
    /// Start a builder seeded with the defaults.
    pub fn builder() -> BackendConfigBuilder {
        BackendConfigBuilder(BackendConfig::default())
    }
}

/// Builder for [`BackendConfig`].
#[derive(Debug, Clone)]
pub struct BackendConfigBuilder(BackendConfig);

impl BackendConfigBuilder {
    /// Override the default cache TTL.
    pub fn default_cache_ttl_secs(mut self, secs: u64) -> Self {
        self.0.default_cache_ttl_secs = secs;
        self
    }

    /// Override the default entity-lock TTL.
    pub fn default_lock_ttl_secs(mut self, secs: u64) -> Self {
        self.0.default_lock_ttl_secs = secs;
        self
    }

    /// Validate and build. Fails if either TTL is zero — a zero TTL would
    /// make a cached result or a lock vanish before the caller could ever
    /// observe it.
    pub fn build(self) -> Result<BackendConfig, ConfigError> {
        if self.0.default_cache_ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl("default_cache_ttl_secs"));
        }
        if self.0.default_lock_ttl_secs == 0 {
            return Err(ConfigError::ZeroTtl("default_lock_ttl_secs"));
        }
        Ok(self.0)
    }
}

/// Errors raised while validating a [`BackendConfig`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The named TTL field was zero.
    #[error("{0} must be greater than zero")]
    ZeroTtl(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = BackendConfig::builder().build().unwrap();
        assert_eq!(cfg.default_cache_ttl_secs, 60);
    }

    #[test]
    fn zero_ttl_rejected() {
        let err = BackendConfig::builder()
            .default_cache_ttl_secs(0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ZeroTtl("default_cache_ttl_secs"));
    }
}
