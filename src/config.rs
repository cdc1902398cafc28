use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::acwr::AcwrConfig;
use crate::advisor::AdvisorConfig;
use crate::engine::{EngineSettings, SamcEngine};
use crate::exercise::ContributionTable;
use crate::logging::LogConfig;
use crate::micro_cycle::MicroCycleConfig;
use crate::readiness::ReadinessConfig;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamcConfig {
    /// Contribution table to load instead of the built-in one
    pub contribution_table_path: Option<PathBuf>,

    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Acute:chronic workload ratio settings
    pub acwr: AcwrConfig,

    /// Recovery model settings
    pub readiness: ReadinessConfig,

    /// Micro-cycle sizing
    pub micro_cycle: MicroCycleConfig,

    /// Daily advisor settings
    pub advisor: AdvisorConfig,

    /// Logging output
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for SamcConfig {
    fn default() -> Self {
        SamcConfig {
            contribution_table_path: None,
            metadata: ConfigMetadata::default(),
            acwr: AcwrConfig::default(),
            readiness: ReadinessConfig::default(),
            micro_cycle: MicroCycleConfig::default(),
            advisor: AdvisorConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl SamcConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: SamcConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".samc")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "No usable config file, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Load the contribution table named by `contribution_table_path`,
    /// or the built-in table when none is set
    pub fn contribution_table(&self) -> Result<ContributionTable> {
        match &self.contribution_table_path {
            None => Ok(ContributionTable::default()),
            Some(path) => {
                let content = fs::read_to_string(path).with_context(|| {
                    format!("Failed to read contribution table: {}", path.display())
                })?;
                ContributionTable::from_toml_str(&content).with_context(|| {
                    format!("Invalid contribution table: {}", path.display())
                })
            }
        }
    }

    /// Engine settings described by this configuration
    pub fn engine_settings(&self) -> Result<EngineSettings> {
        Ok(EngineSettings {
            contribution_table: self.contribution_table()?,
            acwr: self.acwr.clone(),
            readiness: self.readiness.clone(),
            advisor: self.advisor.clone(),
            micro_cycle: self.micro_cycle.clone(),
        })
    }

    /// Check every section without touching the contribution table file
    pub fn validate(&self) -> Result<()> {
        self.acwr.validate()?;
        self.readiness.validate()?;
        self.advisor.validate()?;
        self.micro_cycle.validate()?;
        Ok(())
    }

    /// Build a validated engine from this configuration
    pub fn build_engine(&self) -> Result<SamcEngine> {
        let settings = self.engine_settings()?;
        let engine = SamcEngine::with_settings(settings)
            .with_context(|| "Configuration rejected by the engine")?;
        Ok(engine)
    }
}
