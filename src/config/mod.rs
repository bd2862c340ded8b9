//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Values are read with the `PIT_BOSS`
//! prefix and `__` as the nesting separator.
//!
//! # Example
//!
//! ```no_run
//! use pit_boss::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! let gaming_day = config.casino.gaming_day_config().unwrap();
//! ```

mod casino;
mod error;
mod idempotency;

pub use casino::CasinoSettings;
pub use error::ConfigError;
pub use idempotency::IdempotencySettings;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// Casino property settings (gaming day cutoff, timezone).
    #[serde(default)]
    pub casino: CasinoSettings,

    /// Idempotency record retention.
    #[serde(default)]
    pub idempotency: IdempotencySettings,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variable Format
    ///
    /// - `PIT_BOSS__CASINO__GAMING_DAY_CUTOFF=06:00`
    /// - `PIT_BOSS__CASINO__TIMEZONE=America/Los_Angeles`
    /// - `PIT_BOSS__IDEMPOTENCY__TTL_SECS=86400`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PIT_BOSS")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.casino.validate()?;
        self.idempotency.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        env::remove_var("PIT_BOSS__CASINO__GAMING_DAY_CUTOFF");
        env::remove_var("PIT_BOSS__CASINO__TIMEZONE");
        env::remove_var("PIT_BOSS__IDEMPOTENCY__TTL_SECS");
    }

    #[test]
    fn loads_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.casino.gaming_day_cutoff, "06:00");
        assert_eq!(config.casino.timezone, "America/Los_Angeles");
        assert_eq!(config.idempotency.ttl_secs, 86_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_overrides_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PIT_BOSS__CASINO__GAMING_DAY_CUTOFF", "04:00");
        env::set_var("PIT_BOSS__CASINO__TIMEZONE", "America/New_York");
        env::set_var("PIT_BOSS__IDEMPOTENCY__TTL_SECS", "600");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.casino.gaming_day_cutoff, "04:00");
        assert_eq!(config.casino.timezone, "America/New_York");
        assert_eq!(config.idempotency.ttl_secs, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_cutoff_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("PIT_BOSS__CASINO__GAMING_DAY_CUTOFF", "late");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_err());
    }
}
