//! Idempotency record retention configuration.

use serde::Deserialize;

use super::ConfigError;

fn default_ttl_secs() -> u64 {
    86_400
}

/// How long committed idempotency records shield retries.
#[derive(Debug, Clone, Deserialize)]
pub struct IdempotencySettings {
    /// Record lifetime in seconds. Defaults to one day, which comfortably
    /// outlives any client retry loop on the floor network.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for IdempotencySettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl IdempotencySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_secs == 0 {
            return Err(ConfigError::invalid(
                "idempotency.ttl_secs",
                "TTL must be positive",
            ));
        }
        Ok(())
    }
}
