//! Configuration management for sensorstream
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables (`SENSORSTREAM__<SECTION>__<KEY>`)
//! 3. Configuration file (`sensorstream.toml`)
//! 4. Default values

mod app;
mod server;
mod source;
mod store;

// Re-export main types
pub use app::{AppConfig, LogFormat, LogLevel};
pub use server::ServerConfig;
pub use source::SourceConfig;
pub use store::StoreConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("invalid setting {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Root configuration structure containing all configuration categories
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Application-wide settings
    pub app: AppConfig,

    /// Sample store and ingestion cadence
    pub store: StoreConfig,

    /// Sample source (CSV) location
    pub source: SourceConfig,

    /// HTTP query and live-tail service
    pub server: ServerConfig,
}

impl Settings {
    /// Load configuration from multiple sources with proper precedence
    pub fn load() -> Result<Self, SettingsError> {
        let builder = config::Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&Settings::default())?)
            // Add configuration file if it exists
            .add_source(
                config::File::with_name("sensorstream")
                    .format(config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(Self::environment());

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from a specific file path (environment still applies)
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&Settings::default())?)
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(Self::environment());

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Merge command-line arguments into the loaded configuration
    pub fn merge_cli_args(mut self, cli_args: &dyn CliConfigMerge) -> Result<Self, SettingsError> {
        cli_args.merge_into_config(&mut self);
        self.validate()?;
        Ok(self)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.store.capacity == 0 {
            return Err(SettingsError::Invalid {
                field: "store.capacity",
                reason: "must be at least 1",
            });
        }
        if self.store.tick_interval_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "store.tick_interval_ms",
                reason: "must be at least 1",
            });
        }
        if self.server.default_cadence_ms == 0 {
            return Err(SettingsError::Invalid {
                field: "server.default_cadence_ms",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    // Double underscore keeps snake_case keys like tick_interval_ms intact
    fn environment() -> config::Environment {
        config::Environment::with_prefix("SENSORSTREAM")
            .prefix_separator("__")
            .separator("__")
    }
}

/// Trait for merging CLI arguments into configuration
pub trait CliConfigMerge {
    fn merge_into_config(&self, config: &mut Settings);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.store.capacity, 1_000_000);
        assert_eq!(settings.store.tick_interval_ms, 1);
        assert_eq!(settings.source.path, PathBuf::from("sensor_data.csv"));
        assert_eq!(settings.server.port, 3000);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();

        let toml_str = toml::to_string(&settings).expect("Failed to serialize to TOML");
        let _: Settings = toml::from_str(&toml_str).expect("Failed to deserialize from TOML");
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[store]\ncapacity = 5000\n\n[server]\nport = 8088").unwrap();

        let settings = Settings::load_from_file(file.path()).unwrap();
        assert_eq!(settings.store.capacity, 5000);
        assert_eq!(settings.server.port, 8088);
        // Untouched sections keep defaults
        assert_eq!(settings.store.tick_interval_ms, 1);
        assert_eq!(settings.server.default_cadence_ms, 100);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut settings = Settings::default();
        settings.store.capacity = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("store.capacity"));
    }

    #[test]
    fn test_cli_merge_is_validated() {
        struct ZeroTick;
        impl CliConfigMerge for ZeroTick {
            fn merge_into_config(&self, config: &mut Settings) {
                config.store.tick_interval_ms = 0;
            }
        }

        let result = Settings::default().merge_cli_args(&ZeroTick);
        assert!(matches!(
            result,
            Err(SettingsError::Invalid {
                field: "store.tick_interval_ms",
                ..
            })
        ));
    }
}
