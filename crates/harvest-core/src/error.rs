//! # Error Types
//!
//! Domain-specific error types for harvest-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  harvest-core errors (this file)                                       │
//! │  ├── CoreError        - Caller errors (bad arguments)                  │
//! │  └── ValidationError  - Record / scoring model validation failures     │
//! │                                                                         │
//! │  harvest-report errors (CLI crate)                                     │
//! │  └── ReportError      - I/O, parsing and configuration failures        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ReportError → exit code           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What is NOT an error
//! Zero matching records is a legitimate state. Aggregations return an
//! empty `Vec`, scoring returns a zeroed tier-C result. Division by zero in
//! ratios resolves to 0. Only programmer/caller mistakes surface here.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised by the aggregation and scoring engines.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// An argument the caller supplied is not acceptable.
    ///
    /// ## When This Occurs
    /// - Unrecognized granularity, dimension or tier string
    /// - Empty / whitespace-only entity identifier
    /// - Date range whose start is after its end
    ///
    /// Never coerced into a default: a silent fallback granularity would
    /// attribute revenue to the wrong buckets.
    #[error("Invalid {argument} '{value}': {reason}")]
    InvalidArgument {
        argument: String,
        value: String,
        reason: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for building an `InvalidArgument`.
    pub fn invalid_argument(
        argument: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CoreError::InvalidArgument {
            argument: argument.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the boundary where ERP rows become `SaleRecord`s, and when a
/// scoring model is loaded from configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Derived amount does not match its inputs.
    #[error("{field} is {actual} but expected {expected}")]
    Inconsistent {
        field: String,
        expected: String,
        actual: String,
    },

    /// Weights of a scoring profile must add up to the score ceiling.
    #[error("{profile} weights sum to {sum}, expected 100")]
    WeightSum { profile: String, sum: f64 },

    /// Tier thresholds are out of order or out of range.
    #[error("tier thresholds invalid: A={a}, B={b} (need 0 < B < A <= 100)")]
    TierThresholds { a: u32, b: u32 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
