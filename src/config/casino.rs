//! Casino property configuration.

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;

use super::ConfigError;
use crate::domain::gaming_day::GamingDayConfig;

fn default_cutoff() -> String {
    "06:00".to_string()
}

fn default_timezone() -> String {
    "America/Los_Angeles".to_string()
}

/// Gaming-day settings for the property.
#[derive(Debug, Clone, Deserialize)]
pub struct CasinoSettings {
    /// Local time at which the gaming day rolls over, `HH:MM`.
    #[serde(default = "default_cutoff")]
    pub gaming_day_cutoff: String,

    /// IANA timezone of the property, e.g. `America/Los_Angeles`.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for CasinoSettings {
    fn default() -> Self {
        Self {
            gaming_day_cutoff: default_cutoff(),
            timezone: default_timezone(),
        }
    }
}

impl CasinoSettings {
    /// Validate cutoff and timezone formats.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parse_cutoff()?;
        self.parse_timezone()?;
        Ok(())
    }

    /// Build the resolver configuration from the raw settings.
    pub fn gaming_day_config(&self) -> Result<GamingDayConfig, ConfigError> {
        Ok(GamingDayConfig::new(self.parse_cutoff()?, self.parse_timezone()?))
    }

    fn parse_cutoff(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(&self.gaming_day_cutoff, "%H:%M").map_err(|e| {
            ConfigError::invalid(
                "casino.gaming_day_cutoff",
                format!("expected HH:MM, got '{}': {}", self.gaming_day_cutoff, e),
            )
        })
    }

    fn parse_timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse().map_err(|_| {
            ConfigError::invalid(
                "casino.timezone",
                format!("unknown IANA timezone '{}'", self.timezone),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = CasinoSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.gaming_day_config().is_ok());
    }

    #[test]
    fn rejects_malformed_cutoff() {
        let settings = CasinoSettings {
            gaming_day_cutoff: "6am".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_unknown_timezone() {
        let settings = CasinoSettings {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
