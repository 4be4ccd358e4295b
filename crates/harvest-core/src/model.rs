//! # Scoring Model
//!
//! The weights and linear-scale targets behind customer and product scores.
//!
//! ## Default Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CUSTOMER (weights sum to 100)        PRODUCT (weights sum to 100)      │
//! │  ───────────────────────────────      ───────────────────────────────   │
//! │  Revenue    40  full at $50,000       Revenue    35  full at $20,000    │
//! │  Frequency  25  full at 365 orders    Velocity   25  full at 10 / day   │
//! │  Recency    20  zero after 30 days    Margin     25  full at 50 %       │
//! │  Margin     15  full at 50 %          Frequency  15  full at 200 orders │
//! │                                                                         │
//! │  Tiers:  A ≥ 80    B ≥ 60    C < 60                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The targets were tuned against the historical dataset of the business
//! and are kept exactly as defaults. Deployments may override them in the
//! `[scoring]` section of the report configuration; whatever is loaded goes
//! through [`ScoringModel::validate`] first.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::Tier;

/// Score ceiling; each profile's weights must add up to it.
pub const MAX_SCORE: f64 = 100.0;

// =============================================================================
// Customer Profile
// =============================================================================

/// Weights and targets for customer scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CustomerScoring {
    pub revenue_weight: f64,
    /// Revenue (major units) at which the revenue sub-score is full.
    pub revenue_target: f64,
    pub frequency_weight: f64,
    /// Transaction count at which the frequency sub-score is full.
    pub frequency_target: f64,
    pub recency_weight: f64,
    /// Days of inactivity after which the recency sub-score reaches 0.
    pub recency_window_days: f64,
    pub margin_weight: f64,
    /// Average margin percent at which the margin sub-score is full.
    pub margin_target_percent: f64,
}

impl Default for CustomerScoring {
    fn default() -> Self {
        CustomerScoring {
            revenue_weight: 40.0,
            revenue_target: 50_000.0,
            frequency_weight: 25.0,
            frequency_target: 365.0,
            recency_weight: 20.0,
            recency_window_days: 30.0,
            margin_weight: 15.0,
            margin_target_percent: 50.0,
        }
    }
}

impl CustomerScoring {
    fn weight_sum(&self) -> f64 {
        self.revenue_weight + self.frequency_weight + self.recency_weight + self.margin_weight
    }

    fn targets(&self) -> [(&'static str, f64); 4] {
        [
            ("customer.revenue_target", self.revenue_target),
            ("customer.frequency_target", self.frequency_target),
            ("customer.recency_window_days", self.recency_window_days),
            ("customer.margin_target_percent", self.margin_target_percent),
        ]
    }

    fn weights(&self) -> [(&'static str, f64); 4] {
        [
            ("customer.revenue_weight", self.revenue_weight),
            ("customer.frequency_weight", self.frequency_weight),
            ("customer.recency_weight", self.recency_weight),
            ("customer.margin_weight", self.margin_weight),
        ]
    }
}

// =============================================================================
// Product Profile
// =============================================================================

/// Weights and targets for product scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ProductScoring {
    pub revenue_weight: f64,
    pub revenue_target: f64,
    pub velocity_weight: f64,
    /// Units per selling day at which the velocity sub-score is full.
    pub velocity_target: f64,
    pub margin_weight: f64,
    pub margin_target_percent: f64,
    pub frequency_weight: f64,
    pub frequency_target: f64,
}

impl Default for ProductScoring {
    fn default() -> Self {
        ProductScoring {
            revenue_weight: 35.0,
            revenue_target: 20_000.0,
            velocity_weight: 25.0,
            velocity_target: 10.0,
            margin_weight: 25.0,
            margin_target_percent: 50.0,
            frequency_weight: 15.0,
            frequency_target: 200.0,
        }
    }
}

impl ProductScoring {
    fn weight_sum(&self) -> f64 {
        self.revenue_weight + self.velocity_weight + self.margin_weight + self.frequency_weight
    }

    fn targets(&self) -> [(&'static str, f64); 4] {
        [
            ("product.revenue_target", self.revenue_target),
            ("product.velocity_target", self.velocity_target),
            ("product.margin_target_percent", self.margin_target_percent),
            ("product.frequency_target", self.frequency_target),
        ]
    }

    fn weights(&self) -> [(&'static str, f64); 4] {
        [
            ("product.revenue_weight", self.revenue_weight),
            ("product.velocity_weight", self.velocity_weight),
            ("product.margin_weight", self.margin_weight),
            ("product.frequency_weight", self.frequency_weight),
        ]
    }
}

// =============================================================================
// Tier Thresholds
// =============================================================================

/// Inclusive lower bounds of tiers A and B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct TierThresholds {
    pub a: u32,
    pub b: u32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        TierThresholds { a: 80, b: 60 }
    }
}

impl TierThresholds {
    #[inline]
    pub fn classify(&self, score: u32) -> Tier {
        Tier::classify(score, self.a, self.b)
    }
}

// =============================================================================
// Scoring Model
// =============================================================================

/// Complete scoring configuration.
///
/// ## Example Config Section
/// ```toml
/// [scoring.customer]
/// revenue_target = 75000.0
///
/// [scoring.tiers]
/// a = 85
/// b = 65
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct ScoringModel {
    pub customer: CustomerScoring,
    pub product: ProductScoring,
    pub tiers: TierThresholds,
}

impl ScoringModel {
    /// Checks that targets are positive, weights are non-negative and sum
    /// to 100, and tier thresholds are ordered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let targets = self.customer.targets().into_iter().chain(self.product.targets());
        for (field, value) in targets {
            if !(value > 0.0) {
                return Err(ValidationError::MustBePositive {
                    field: field.to_string(),
                });
            }
        }

        let weights = self.customer.weights().into_iter().chain(self.product.weights());
        for (field, value) in weights {
            if value < 0.0 || value.is_nan() {
                return Err(ValidationError::MustNotBeNegative {
                    field: field.to_string(),
                });
            }
        }

        for (profile, sum) in [
            ("customer", self.customer.weight_sum()),
            ("product", self.product.weight_sum()),
        ] {
            if (sum - MAX_SCORE).abs() > 1e-9 {
                return Err(ValidationError::WeightSum {
                    profile: profile.to_string(),
                    sum,
                });
            }
        }

        let TierThresholds { a, b } = self.tiers;
        if b == 0 || b >= a || a > MAX_SCORE as u32 {
            return Err(ValidationError::TierThresholds { a, b });
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_is_valid() {
        let model = ScoringModel::default();
        assert!(model.validate().is_ok());
        assert_eq!(model.customer.weight_sum(), 100.0);
        assert_eq!(model.product.weight_sum(), 100.0);
    }

    #[test]
    fn test_rejects_weights_not_summing_to_100() {
        let mut model = ScoringModel::default();
        model.customer.margin_weight = 10.0;
        assert_eq!(
            model.validate(),
            Err(ValidationError::WeightSum {
                profile: "customer".to_string(),
                sum: 95.0
            })
        );
    }

    #[test]
    fn test_rejects_zero_target() {
        let mut model = ScoringModel::default();
        model.product.velocity_target = 0.0;
        assert!(matches!(
            model.validate(),
            Err(ValidationError::MustBePositive { field }) if field == "product.velocity_target"
        ));
    }

    #[test]
    fn test_rejects_unordered_tiers() {
        let mut model = ScoringModel::default();
        model.tiers = TierThresholds { a: 60, b: 60 };
        assert!(model.validate().is_err());

        model.tiers = TierThresholds { a: 101, b: 60 };
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let model: ScoringModel =
            serde_json::from_str(r#"{"customer": {"revenue_target": 75000.0}}"#).unwrap();
        assert_eq!(model.customer.revenue_target, 75_000.0);
        assert_eq!(model.customer.revenue_weight, 40.0);
        assert_eq!(model.product, ProductScoring::default());
        assert_eq!(model.tiers, TierThresholds::default());
    }
}
