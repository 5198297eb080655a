//! Settings for join priority and the bypass cleanup task.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinSettings {
    /// Highest priority level scanned for.
    pub max_level: u32,
    /// Seconds between two bypass sweeps.
    pub cleanup_interval_secs: u64,
    /// Delay before the first sweep after startup.
    pub cleanup_initial_delay_ms: u64,
    /// Grant duration used when an admin request does not specify one.
    pub default_grant_secs: u64,
}

impl Default for JoinSettings {
    fn default() -> Self {
        Self {
            max_level: 10,
            cleanup_interval_secs: 30,
            cleanup_initial_delay_ms: 50, // one tick at 20 TPS
            default_grant_secs: 300,
        }
    }
}

impl JoinSettings {
    /// Table name inside a server settings document.
    pub const SECTION: &'static str = "join_manager";

    /// Reads the `[join_manager]` table of a TOML document.
    ///
    /// A document without that table yields the defaults; missing keys inside
    /// the table fall back to their default values.
    pub fn from_toml_str(document: &str) -> Result<Self, SettingsError> {
        let mut table: toml::Table = toml::from_str(document)?;
        let settings = match table.remove(Self::SECTION) {
            Some(section) => section.try_into::<Self>()?,
            None => Self::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.cleanup_interval_secs == 0 {
            return Err(SettingsError::InvalidValue {
                key: "cleanup_interval_secs",
                reason: "must be greater than zero".into(),
            });
        }
        if self.default_grant_secs == 0 {
            return Err(SettingsError::InvalidValue {
                key: "default_grant_secs",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    pub fn cleanup_initial_delay(&self) -> Duration {
        Duration::from_millis(self.cleanup_initial_delay_ms)
    }

    pub fn default_grant(&self) -> Duration {
        Duration::from_secs(self.default_grant_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = JoinSettings::default();
        assert_eq!(settings.max_level, 10);
        assert_eq!(settings.cleanup_interval(), Duration::from_secs(30));
        assert_eq!(settings.cleanup_initial_delay(), Duration::from_millis(50));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let settings = JoinSettings::from_toml_str("[network]\nport = 5000\n").unwrap();
        assert_eq!(settings, JoinSettings::default());
    }

    #[test]
    fn test_partial_section() {
        let settings =
            JoinSettings::from_toml_str("[join_manager]\nmax_level = 25\n").unwrap();
        assert_eq!(settings.max_level, 25);
        assert_eq!(settings.cleanup_interval_secs, 30);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = JoinSettings::from_toml_str("[join_manager]\ncleanup_interval_secs = 0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidValue {
                key: "cleanup_interval_secs",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            JoinSettings::from_toml_str("[join_manager\n"),
            Err(SettingsError::Toml(_))
        ));
    }

    #[test]
    fn test_wrong_type_rejected() {
        assert!(matches!(
            JoinSettings::from_toml_str("[join_manager]\nmax_level = \"ten\"\n"),
            Err(SettingsError::Toml(_))
        ));
    }
}
