//! # Report Configuration
//!
//! Settings that shape every report: the analytics calendar, the scoring
//! model and logging.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     HARVEST_EPOCH=2022-01-01                                           │
//! │     HARVEST_WEEK_START=monday                                          │
//! │     HARVEST_LOG_FILTER=debug   HARVEST_LOG_FORMAT=json                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config PATH, else $HARVEST_CONFIG, else                          │
//! │     ~/.config/harvest/harvest.toml (Linux)                             │
//! │     ~/Library/Application Support/com.harvest.harvest/harvest.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     epoch 2020-01-01, Sunday weeks, default scoring model              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # harvest.toml
//! [analytics]
//! epoch = "2021-01-01"
//! week_start = "monday"
//!
//! [scoring.customer]
//! revenue_target = 75000.0
//!
//! [scoring.tiers]
//! a = 85
//! b = 65
//!
//! [logging]
//! filter = "info,harvest=debug"
//! format = "json"
//! ```

use chrono::NaiveDate;
use harvest_core::{ScoringModel, WeekStart};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use crate::error::{ReportError, ReportResult};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "HARVEST_CONFIG";

// =============================================================================
// Analytics Settings
// =============================================================================

/// Calendar settings for time aggregation and date filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSettings {
    /// Start date used when `--from` is not given.
    #[serde(default = "harvest_core::default_epoch")]
    pub epoch: NaiveDate,

    /// First day of week buckets.
    #[serde(default)]
    pub week_start: WeekStart,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        AnalyticsSettings {
            epoch: harvest_core::default_epoch(),
            week_start: WeekStart::default(),
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(ReportError::InvalidConfig(format!(
                "Unknown log format: '{}'. Valid options: compact, pretty, json",
                other
            ))),
        }
    }
}

/// Log subscriber settings. `RUST_LOG`, when set, still wins over `filter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_filter")]
    pub filter: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_filter() -> String {
    "info,harvest=debug".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

// =============================================================================
// Main Report Configuration
// =============================================================================

/// Complete report configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub analytics: AnalyticsSettings,

    /// Scoring weights, targets and tier thresholds.
    #[serde(default)]
    pub scoring: ScoringModel,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl ReportConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`harvest.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ReportResult<Self> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// [`ReportConfig::load`] with an injectable environment lookup.
    pub fn load_with<F>(config_path: Option<PathBuf>, env: F) -> ReportResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = config_path.or_else(|| env(CONFIG_ENV).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) if !path.exists() => return Err(ReportError::ConfigNotFound(path)),
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        config.apply_env_overrides(env)?;
        config.validate()?;

        Ok(config)
    }

    /// Parses one TOML file. Missing sections keep their defaults.
    pub fn from_file(path: &Path) -> ReportResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ReportResult<()> {
        self.scoring.validate()?;

        if self.logging.filter.trim().is_empty() {
            return Err(ReportError::InvalidConfig(
                "logging.filter must not be empty".into(),
            ));
        }
        if let Err(e) = EnvFilter::try_new(&self.logging.filter) {
            return Err(ReportError::InvalidConfig(format!(
                "logging.filter '{}' is not a valid filter: {}",
                self.logging.filter, e
            )));
        }

        Ok(())
    }

    /// Applies `HARVEST_*` overrides.
    fn apply_env_overrides<F>(&mut self, env: F) -> ReportResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(epoch) = env("HARVEST_EPOCH") {
            self.analytics.epoch = epoch.trim().parse().map_err(|_| {
                ReportError::InvalidConfig(format!(
                    "HARVEST_EPOCH must be a YYYY-MM-DD date, got '{}'",
                    epoch
                ))
            })?;
        }

        if let Some(week_start) = env("HARVEST_WEEK_START") {
            self.analytics.week_start = week_start.parse()?;
        }

        if let Some(filter) = env("HARVEST_LOG_FILTER") {
            self.logging.filter = filter;
        }

        if let Some(format) = env("HARVEST_LOG_FORMAT") {
            self.logging.format = format.parse()?;
        }

        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "harvest", "harvest")
            .map(|dirs| dirs.config_dir().join("harvest.toml"))
    }
}
