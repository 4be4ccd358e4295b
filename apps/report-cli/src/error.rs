//! # Report Error Type
//!
//! Unified error type for the reporting front end.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Error Flow in harvest-report                        │
//! │                                                                         │
//! │  config.rs ── TOML / env / validate ──┐                                │
//! │                                        │                                │
//! │  loader.rs ── I/O / JSON / CSV ────────┼──► ReportError ──► main.rs    │
//! │                                        │        (typed)     (anyhow +  │
//! │  harvest-core ── CoreError ────────────┘                     context)  │
//! │                                                                         │
//! │  Invalid sale ROWS are not errors: they are skipped and counted.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use harvest_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    // =========================================================================
    // Engine Errors
    // =========================================================================
    /// Bad argument or invalid scoring model, raised by harvest-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// File could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Input file extension is neither `.json` nor `.csv`.
    #[error("Unsupported input format for {} (expected .json or .csv)", .0.display())]
    UnsupportedFormat(PathBuf),

    /// JSON input is not an array of rows, or JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV input could not be read.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Config file is not valid TOML for `ReportConfig`.
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A config value (file or environment) is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<ValidationError> for ReportError {
    fn from(err: ValidationError) -> Self {
        ReportError::Core(CoreError::Validation(err))
    }
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}
