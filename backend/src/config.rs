//! Configuration management for the stock assignment engine
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with STOCK_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::SortDirection;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Assignment engine configuration
    pub engine: EngineSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set
    pub filter: String,

    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Whether new stock units may be created when no lot can take demand
    pub allow_unit_creation: bool,

    /// Which assignments leave an over-committed unit first
    pub overflow_sort: SortDirection,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            allow_unit_creation: true,
            overflow_sort: SortDirection::NewestFirst,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "stock_backend=info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let environment =
            std::env::var("STOCK_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Self::builder(&environment)?.build()?.try_deserialize()
    }

    /// Layered sources for `environment` without the `.env` file.
    ///
    /// Callers that need their own overrides build from here and
    /// deserialize the result themselves.
    pub fn builder(
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let builder = config::Config::builder()
            // Start with default values
            .set_default("environment", environment)?
            .set_default("logging.filter", "stock_backend=info")?
            .set_default("logging.json", false)?
            .set_default("engine.allow_unit_creation", true)?
            .set_default("engine.overflow_sort", SortDirection::NewestFirst.as_str())?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (STOCK_ prefix)
            .add_source(
                Environment::with_prefix("STOCK")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_deserialize() {
        let config: Config = Config::builder("test")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.environment, "test");
        assert_eq!(config.engine, EngineSettings::default());
        assert!(!config.logging.json);
    }

    #[test]
    fn test_override_sort_direction() {
        let config: Config = Config::builder("test")
            .unwrap()
            .set_override("engine.overflow_sort", "oldest_first")
            .unwrap()
            .set_override("engine.allow_unit_creation", false)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.engine.overflow_sort, SortDirection::OldestFirst);
        assert!(!config.engine.allow_unit_creation);
    }
}
