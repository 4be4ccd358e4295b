//! # harvest-core: Pure Analytics for Harvest BI
//!
//! This crate is the **heart** of Harvest BI. It turns sale line items of a
//! wholesale produce business into trend series, performance breakdowns and
//! customer/product tiers, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Harvest BI Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │           Dashboards / API layer (external)                     │   │
//! │  │    Trend charts ── Category table ── Customer & product tiers   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          harvest-report (CLI: load, configure, render)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ &[SaleRecord]                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ harvest-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────┐  ┌─────────────┐  ┌─────────────┐            │   │
//! │  │   │ aggregation │  │   scoring   │  │    model    │            │   │
//! │  │   │ time / dim  │  │ cust / prod │  │  weights    │            │   │
//! │  │   └─────────────┘  └─────────────┘  └─────────────┘            │   │
//! │  │   ┌─────────────┐  ┌─────────────┐  ┌─────────────┐            │   │
//! │  │   │    types    │  │    money    │  │ validation  │            │   │
//! │  │   └─────────────┘  └─────────────┘  └─────────────┘            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Sale records, granularity, dimensions, tiers, date ranges
//! - [`money`] - Money type with integer arithmetic
//! - [`aggregation`] - Time buckets, category breakdowns, summaries
//! - [`scoring`] - Customer / product scores and rankings
//! - [`model`] - Scoring weights, targets and tier thresholds
//! - [`validation`] - Record and argument validation
//! - [`format`] - Output rounding and display helpers
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same records in, same report out
//! 2. **Caller-owned data**: no module-level dataset, records are passed in
//! 3. **Integer Money**: currency sums are exact cents
//! 4. **Round once**: ratios are rounded to 2 decimals only at output
//! 5. **Empty is not an error**: no records means empty buckets / zero scores
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use harvest_core::{aggregate_by_time, Granularity, Money, SaleRecord};
//!
//! let sale = |day: u32, total: i64, margin: i64| SaleRecord {
//!     id: format!("S-{day}"),
//!     date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
//!     customer_id: "1".into(),
//!     product_id: "P-1".into(),
//!     category: "Fruit".into(),
//!     subcategory: "Apples".into(),
//!     quantity: 1.0,
//!     unit_price_cents: total,
//!     total_amount_cents: total,
//!     cost_cents: total - margin,
//!     margin_cents: margin,
//! };
//! let records = vec![sale(1, 10_000, 3_000), sale(2, 20_000, 5_000)];
//!
//! let buckets = aggregate_by_time(&records, Granularity::Month);
//! assert_eq!(buckets[0].key, "2024-01");
//! assert_eq!(buckets[0].revenue, Money::from_cents(30_000));
//! assert_eq!(buckets[0].margin_percent, 26.67);
//! assert_eq!(buckets[0].average_order_value, Money::from_cents(15_000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregation;
pub mod error;
pub mod format;
pub mod model;
pub mod money;
pub mod scoring;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregation::{
    aggregate_by_category, aggregate_by_dimension, aggregate_by_time, aggregate_by_time_with,
    par_aggregate_by_dimension, par_aggregate_by_time, summarize, AggregateBucket,
    CategorySummary, SalesSummary,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use model::ScoringModel;
pub use money::Money;
pub use scoring::{
    score_customer, score_product, CustomerScore, ProductScore, TierDistribution,
};
pub use types::*;

use chrono::NaiveDate;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Lower bound used when a caller gives no start date: 2020-01-01.
///
/// ## Why not unbounded?
/// The ERP export reaches back to data migrations that predate the current
/// product catalogue. Reports start at a fixed epoch instead.
pub const DEFAULT_EPOCH: (i32, u32, u32) = (2020, 1, 1);

/// [`DEFAULT_EPOCH`] as a date.
pub fn default_epoch() -> NaiveDate {
    let (y, m, d) = DEFAULT_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Today's date in UTC. The only clock read in the crate.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
