use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::AnthropometryError;
use crate::logging::LogConfig;
use crate::thresholds::ThresholdTables;

/// Engine configuration, loaded from TOML
///
/// ```toml
/// [logging]
/// level = "info"
///
/// [batch]
/// threads = 4
///
/// [thresholds.body_roundness_index.optimal]
/// max = 4.0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub logging: LogConfig,

    /// Band tables overriding the built-in entries, metric by metric
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<ThresholdTables>,

    pub batch: BatchConfig,
}

/// Batch evaluation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads (None uses one per CPU)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,

    /// Show a progress bar on the terminal
    pub show_progress: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            threads: None,
            show_progress: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnthropometryError::ConfigNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::load_from_string(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file, creating parent directories as needed
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// `<config dir>/anthropometry/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("anthropometry")
            .join("config.toml")
    }

    /// Load from the default location; a missing or broken file yields defaults
    pub fn load_or_default() -> Self {
        let path = Self::default_config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring configuration at {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Reject threshold overrides with inverted bands or a zero thread count
    pub fn validate(&self) -> std::result::Result<(), AnthropometryError> {
        if let Some(thresholds) = &self.thresholds {
            thresholds.validate()?;
        }

        if self.batch.threads == Some(0) {
            return Err(AnthropometryError::Configuration(
                "batch.threads must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Built-in tables with the configured overrides applied
    pub fn threshold_tables(&self) -> ThresholdTables {
        match &self.thresholds {
            Some(overrides) => ThresholdTables::standard().merged_with(overrides),
            None => ThresholdTables::standard().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use crate::models::{Gender, MetricName, Status};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::load_from_string("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(&config.threshold_tables(), ThresholdTables::standard());
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::load_from_string(
            r#"
            [logging]
            level = "debug"

            [batch]
            threads = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.batch.threads, Some(2));
        assert!(config.batch.show_progress);
    }

    #[test]
    fn test_threshold_override() {
        let config = EngineConfig::load_from_string(
            r#"
            [thresholds.body_roundness_index.optimal]
            max = 4.0

            [thresholds.body_roundness_index.warning]
            min = 4.0
            max = 6.0
            "#,
        )
        .unwrap();

        let tables = config.threshold_tables();
        assert_eq!(
            tables.classify(MetricName::BodyRoundnessIndex, Some(dec!(5)), None),
            Status::Warning
        );
        // untouched entries keep their built-in bands
        assert_eq!(
            tables.classify(MetricName::WaistHipRatio, Some(dec!(0.90)), Some(Gender::Male)),
            Status::Optimal
        );
    }

    #[test]
    fn test_inverted_band_rejected() {
        let result = EngineConfig::load_from_string(
            r#"
            [thresholds.bmi.optimal]
            min = 25.0
            max = 18.5

            [thresholds.bmi.warning]
            min = 25.0
            max = 29.9
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(EngineConfig::load_from_string("[batch]\nthreads = 0\n").is_err());
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = EngineConfig::default();
        config.batch.threads = Some(3);
        config.batch.show_progress = false;

        config.save_to_file(&config_path).unwrap();
        let loaded = EngineConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = tempdir().unwrap();
        let err = EngineConfig::load_from_file(temp_dir.path().join("absent.toml")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AnthropometryError>(),
            Some(AnthropometryError::ConfigNotFound { .. })
        ));
    }

    #[test]
    fn test_default_config_path() {
        let path = EngineConfig::default_config_path();
        assert!(path.ends_with("anthropometry/config.toml"));
    }
}
