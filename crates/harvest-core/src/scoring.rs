//! # Scoring Engine
//!
//! Composite 0-100 performance scores for customers and products, and their
//! A/B/C tier.
//!
//! ## Shape of Every Score
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  entity's records                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  raw metrics (revenue, frequency, recency | velocity, margin %)         │
//! │       │                                                                 │
//! │       ▼  linear scale, clamped to [0, weight]  (independently)          │
//! │  sub-scores ── Σ ──► round ──► total_score (0-100) ──► Tier A / B / C   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An entity without records is not an error: it gets a zeroed tier-C
//! result. Only an empty identifier is rejected.
//!
//! ## Usage
//! ```rust
//! use chrono::NaiveDate;
//! use harvest_core::model::ScoringModel;
//! use harvest_core::types::{SaleRecord, Tier};
//!
//! let records: Vec<SaleRecord> = Vec::new();
//! let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
//! let score = ScoringModel::default().score_customer("42", &records, as_of).unwrap();
//! assert_eq!(score.total_score, 0);
//! assert_eq!(score.tier, Tier::C);
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::format::{margin_percent, round2};
use crate::model::{ScoringModel, MAX_SCORE};
use crate::money::Money;
use crate::types::{SaleRecord, Tier};
use crate::validation::validate_entity_id;

// =============================================================================
// Result Types
// =============================================================================

/// Weighted components of a customer score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerSubScores {
    pub revenue: f64,
    pub frequency: f64,
    pub recency: f64,
    pub margin: f64,
}

/// Score and raw metrics for one customer.
///
/// `total_revenue`, `total_margin` and `average_order_value` serialize as
/// integer cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerScore {
    pub customer_id: String,
    pub total_score: u32,
    pub tier: Tier,
    pub total_revenue: Money,
    pub total_margin: Money,
    pub average_order_value: Money,
    /// Number of transactions.
    pub frequency: u64,
    pub avg_margin_percent: f64,
    pub days_since_last_purchase: i64,
    #[ts(as = "Option<String>")]
    pub last_purchase: Option<NaiveDate>,
    pub sub_scores: CustomerSubScores,
}

impl CustomerScore {
    /// Zero-activity result: score 0, tier C, every metric zeroed.
    pub fn no_activity(customer_id: &str) -> Self {
        CustomerScore {
            customer_id: customer_id.to_string(),
            total_score: 0,
            tier: Tier::C,
            total_revenue: Money::zero(),
            total_margin: Money::zero(),
            average_order_value: Money::zero(),
            frequency: 0,
            avg_margin_percent: 0.0,
            days_since_last_purchase: 0,
            last_purchase: None,
            sub_scores: CustomerSubScores::default(),
        }
    }
}

/// Weighted components of a product score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductSubScores {
    pub revenue: f64,
    pub velocity: f64,
    pub margin: f64,
    pub frequency: f64,
}

/// Score and raw metrics for one product.
///
/// `total_revenue` and `total_margin` serialize as integer cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductScore {
    pub product_id: String,
    pub total_score: u32,
    pub tier: Tier,
    pub total_revenue: Money,
    pub total_margin: Money,
    pub total_quantity: f64,
    pub frequency: u64,
    /// Inclusive day count between first and last sale (at least 1).
    pub days_selling: i64,
    /// Quantity sold per selling day.
    pub velocity: f64,
    pub avg_margin_percent: f64,
    #[ts(as = "Option<String>")]
    pub first_sale: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub last_sale: Option<NaiveDate>,
    pub sub_scores: ProductSubScores,
}

impl ProductScore {
    /// Zero-activity result: score 0, tier C, every metric zeroed.
    pub fn no_activity(product_id: &str) -> Self {
        ProductScore {
            product_id: product_id.to_string(),
            total_score: 0,
            tier: Tier::C,
            total_revenue: Money::zero(),
            total_margin: Money::zero(),
            total_quantity: 0.0,
            frequency: 0,
            days_selling: 0,
            velocity: 0.0,
            avg_margin_percent: 0.0,
            first_sale: None,
            last_sale: None,
            sub_scores: ProductSubScores::default(),
        }
    }
}

/// How many ranked entities landed in each tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TierDistribution {
    pub a: u64,
    pub b: u64,
    pub c: u64,
}

impl TierDistribution {
    pub fn from_tiers<I: IntoIterator<Item = Tier>>(tiers: I) -> Self {
        let mut dist = TierDistribution::default();
        for tier in tiers {
            match tier {
                Tier::A => dist.a += 1,
                Tier::B => dist.b += 1,
                Tier::C => dist.c += 1,
            }
        }
        dist
    }

    pub fn total(&self) -> u64 {
        self.a + self.b + self.c
    }
}

// =============================================================================
// Sub-score Scales
// =============================================================================

/// `value / target × weight`, clamped to `[0, weight]`.
#[inline]
fn linear(value: f64, target: f64, weight: f64) -> f64 {
    cap(value / target * weight, weight)
}

/// Full weight at 0 days, decaying linearly to 0 at `window` days.
#[inline]
fn decay(days: f64, window: f64, weight: f64) -> f64 {
    cap(weight - days / window * weight, weight)
}

#[inline]
fn cap(value: f64, weight: f64) -> f64 {
    value.max(0.0).min(weight)
}

#[inline]
fn total_of(parts: [f64; 4]) -> u32 {
    let sum: f64 = parts.iter().sum();
    sum.round().clamp(0.0, MAX_SCORE) as u32
}

// =============================================================================
// Per-entity Totals
// =============================================================================

/// Sums over one entity's records.
struct Totals {
    revenue: Money,
    margin: Money,
    quantity: f64,
    count: u64,
    first: NaiveDate,
    last: NaiveDate,
}

impl Totals {
    fn collect<'a, I>(records: I) -> Option<Totals>
    where
        I: IntoIterator<Item = &'a SaleRecord>,
    {
        let mut iter = records.into_iter();
        let first = iter.next()?;
        let mut totals = Totals {
            revenue: first.total_amount(),
            margin: first.margin(),
            quantity: first.quantity,
            count: 1,
            first: first.date,
            last: first.date,
        };
        for record in iter {
            totals.revenue += record.total_amount();
            totals.margin += record.margin();
            totals.quantity += record.quantity;
            totals.count += 1;
            totals.first = totals.first.min(record.date);
            totals.last = totals.last.max(record.date);
        }
        Some(totals)
    }
}

// =============================================================================
// Scoring Operations
// =============================================================================

/// Scores a customer with the default model as of today (UTC).
pub fn score_customer<'a, I>(customer_id: &str, records: I) -> CoreResult<CustomerScore>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    ScoringModel::default().score_customer(customer_id, records, crate::today())
}

/// Scores a product with the default model.
pub fn score_product<'a, I>(product_id: &str, records: I) -> CoreResult<ProductScore>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    ScoringModel::default().score_product(product_id, records)
}

impl ScoringModel {
    /// Scores the customer `customer_id` from the full record set.
    ///
    /// `as_of` is the date recency is measured from.
    pub fn score_customer<'a, I>(
        &self,
        customer_id: &str,
        records: I,
        as_of: NaiveDate,
    ) -> CoreResult<CustomerScore>
    where
        I: IntoIterator<Item = &'a SaleRecord>,
    {
        let id = validate_entity_id("customer_id", customer_id)?;
        let own = records.into_iter().filter(|r| r.customer_id == id);
        Ok(self.customer_from(id, own, as_of))
    }

    /// Scores the product `product_id` from the full record set.
    pub fn score_product<'a, I>(&self, product_id: &str, records: I) -> CoreResult<ProductScore>
    where
        I: IntoIterator<Item = &'a SaleRecord>,
    {
        let id = validate_entity_id("product_id", product_id)?;
        let own = records.into_iter().filter(|r| r.product_id == id);
        Ok(self.product_from(id, own))
    }

    /// Scores every customer present in `records`, best first.
    ///
    /// Ordering: score descending, then revenue descending, then id.
    pub fn rank_customers(&self, records: &[SaleRecord], as_of: NaiveDate) -> Vec<CustomerScore> {
        let groups = group_by(records, |r| r.customer_id.as_str());
        let mut scores: Vec<CustomerScore> = groups
            .into_par_iter()
            .map(|(id, own)| self.customer_from(id, own, as_of))
            .collect();

        scores.sort_by(|a, b| {
            rank_order(
                (a.total_score, a.total_revenue, &a.customer_id),
                (b.total_score, b.total_revenue, &b.customer_id),
            )
        });

        debug!(customers = scores.len(), "Ranked customers");
        scores
    }

    /// Scores every product present in `records`, best first.
    pub fn rank_products(&self, records: &[SaleRecord]) -> Vec<ProductScore> {
        let groups = group_by(records, |r| r.product_id.as_str());
        let mut scores: Vec<ProductScore> = groups
            .into_par_iter()
            .map(|(id, own)| self.product_from(id, own))
            .collect();

        scores.sort_by(|a, b| {
            rank_order(
                (a.total_score, a.total_revenue, &a.product_id),
                (b.total_score, b.total_revenue, &b.product_id),
            )
        });

        debug!(products = scores.len(), "Ranked products");
        scores
    }

    fn customer_from<'a, I>(&self, id: &str, own: I, as_of: NaiveDate) -> CustomerScore
    where
        I: IntoIterator<Item = &'a SaleRecord>,
    {
        let Some(totals) = Totals::collect(own) else {
            trace!(customer_id = id, "No activity for customer");
            return CustomerScore::no_activity(id);
        };

        let p = &self.customer;
        let revenue = totals.revenue.to_major();
        let margin_pct = margin_percent(totals.margin, totals.revenue);
        let days_since = (as_of - totals.last).num_days();

        let sub_scores = CustomerSubScores {
            revenue: linear(revenue, p.revenue_target, p.revenue_weight),
            frequency: linear(totals.count as f64, p.frequency_target, p.frequency_weight),
            recency: decay(days_since as f64, p.recency_window_days, p.recency_weight),
            margin: linear(margin_pct, p.margin_target_percent, p.margin_weight),
        };
        let total_score = total_of([
            sub_scores.revenue,
            sub_scores.frequency,
            sub_scores.recency,
            sub_scores.margin,
        ]);

        debug!(
            customer_id = id,
            orders = totals.count,
            total_score,
            "Scored customer"
        );

        CustomerScore {
            customer_id: id.to_string(),
            total_score,
            tier: self.tiers.classify(total_score),
            total_revenue: totals.revenue,
            total_margin: totals.margin,
            average_order_value: totals.revenue.average_over(totals.count),
            frequency: totals.count,
            avg_margin_percent: round2(margin_pct),
            days_since_last_purchase: days_since,
            last_purchase: Some(totals.last),
            sub_scores: CustomerSubScores {
                revenue: round2(sub_scores.revenue),
                frequency: round2(sub_scores.frequency),
                recency: round2(sub_scores.recency),
                margin: round2(sub_scores.margin),
            },
        }
    }

    fn product_from<'a, I>(&self, id: &str, own: I) -> ProductScore
    where
        I: IntoIterator<Item = &'a SaleRecord>,
    {
        let Some(totals) = Totals::collect(own) else {
            trace!(product_id = id, "No activity for product");
            return ProductScore::no_activity(id);
        };

        let p = &self.product;
        let revenue = totals.revenue.to_major();
        let margin_pct = margin_percent(totals.margin, totals.revenue);
        // Inclusive: a single day of sales counts as one selling day.
        let days_selling = (totals.last - totals.first).num_days() + 1;
        let velocity = totals.quantity / days_selling as f64;

        let sub_scores = ProductSubScores {
            revenue: linear(revenue, p.revenue_target, p.revenue_weight),
            velocity: linear(velocity, p.velocity_target, p.velocity_weight),
            margin: linear(margin_pct, p.margin_target_percent, p.margin_weight),
            frequency: linear(totals.count as f64, p.frequency_target, p.frequency_weight),
        };
        let total_score = total_of([
            sub_scores.revenue,
            sub_scores.velocity,
            sub_scores.margin,
            sub_scores.frequency,
        ]);

        debug!(
            product_id = id,
            orders = totals.count,
            days_selling,
            total_score,
            "Scored product"
        );

        ProductScore {
            product_id: id.to_string(),
            total_score,
            tier: self.tiers.classify(total_score),
            total_revenue: totals.revenue,
            total_margin: totals.margin,
            total_quantity: round2(totals.quantity),
            frequency: totals.count,
            days_selling,
            velocity: round2(velocity),
            avg_margin_percent: round2(margin_pct),
            first_sale: Some(totals.first),
            last_sale: Some(totals.last),
            sub_scores: ProductSubScores {
                revenue: round2(sub_scores.revenue),
                velocity: round2(sub_scores.velocity),
                margin: round2(sub_scores.margin),
                frequency: round2(sub_scores.frequency),
            },
        }
    }
}

fn group_by<'a, F>(records: &'a [SaleRecord], key: F) -> HashMap<&'a str, Vec<&'a SaleRecord>>
where
    F: Fn(&'a SaleRecord) -> &'a str,
{
    let mut groups: HashMap<&'a str, Vec<&'a SaleRecord>> = HashMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    groups
}

fn rank_order(a: (u32, Money, &String), b: (u32, Money, &String)) -> Ordering {
    b.0.cmp(&a.0)
        .then_with(|| b.1.cmp(&a.1))
        .then_with(|| a.2.cmp(b.2))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TierThresholds;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(customer: &str, product: &str, day: NaiveDate, total: i64, margin: i64, qty: f64) -> SaleRecord {
        SaleRecord {
            id: format!("{customer}-{product}-{day}-{total}"),
            date: day,
            customer_id: customer.to_string(),
            product_id: product.to_string(),
            category: "Vegetables".to_string(),
            subcategory: "Leafy".to_string(),
            quantity: qty,
            unit_price_cents: (total as f64 / qty).round() as i64,
            total_amount_cents: total,
            cost_cents: total - margin,
            margin_cents: margin,
        }
    }

    #[test]
    fn test_customer_without_records_is_zero_sentinel() {
        let records: Vec<SaleRecord> = Vec::new();
        let score = ScoringModel::default()
            .score_customer("42", &records, date(2024, 6, 1))
            .unwrap();
        assert_eq!(score, CustomerScore::no_activity("42"));
        assert_eq!(score.total_score, 0);
        assert_eq!(score.tier, Tier::C);
    }

    #[test]
    fn test_product_without_records_is_zero_sentinel() {
        let records = vec![sale("C-1", "P-1", date(2024, 1, 1), 100, 10, 1.0)];
        let score = ScoringModel::default().score_product("P-404", &records).unwrap();
        assert_eq!(score, ProductScore::no_activity("P-404"));
    }

    #[test]
    fn test_empty_identifier_is_invalid_argument() {
        let records: Vec<SaleRecord> = Vec::new();
        let model = ScoringModel::default();
        assert!(model.score_customer("", &records, date(2024, 1, 1)).is_err());
        assert!(model.score_product("   ", &records).is_err());
        assert!(score_customer("", &records).is_err());
    }

    #[test]
    fn test_customer_sub_scores() {
        // $25,000 revenue, 40% margin, 73 orders, last purchase 15 days ago.
        let as_of = date(2024, 6, 30);
        let records: Vec<SaleRecord> = (0..73)
            .map(|i| {
                let day = date(2024, 6, 15) - chrono::Duration::days(i);
                let total = if i == 0 { 2_500_000 - 72 * 34_000 } else { 34_000 };
                sale("C-7", "P-1", day, total, total * 2 / 5, 1.0)
            })
            .collect();

        let score = ScoringModel::default().score_customer("C-7", &records, as_of).unwrap();

        assert_eq!(score.total_revenue, Money::from_cents(2_500_000));
        assert_eq!(score.frequency, 73);
        assert_eq!(score.days_since_last_purchase, 15);
        assert_eq!(score.avg_margin_percent, 40.0);
        assert_eq!(score.sub_scores.revenue, 20.0);
        assert_eq!(score.sub_scores.frequency, 5.0);
        assert_eq!(score.sub_scores.recency, 10.0);
        assert_eq!(score.sub_scores.margin, 12.0);
        assert_eq!(score.total_score, 47);
        assert_eq!(score.tier, Tier::C);
        assert_eq!(score.last_purchase, Some(date(2024, 6, 15)));
    }

    #[test]
    fn test_customer_sub_scores_are_capped() {
        let as_of = date(2024, 6, 30);
        // One huge order today at 80% margin: revenue and margin saturate.
        let records = vec![sale("C-1", "P-1", as_of, 1_000_000_000, 800_000_000, 1.0)];
        let score = ScoringModel::default().score_customer("C-1", &records, as_of).unwrap();
        assert_eq!(score.sub_scores.revenue, 40.0);
        assert_eq!(score.sub_scores.recency, 20.0);
        assert_eq!(score.sub_scores.margin, 15.0);
        assert!(score.total_score <= 100);
    }

    #[test]
    fn test_recency_never_negative_or_above_weight() {
        let model = ScoringModel::default();
        let records = vec![sale("C-1", "P-1", date(2023, 1, 1), 100, 10, 1.0)];
        let stale = model.score_customer("C-1", &records, date(2024, 6, 30)).unwrap();
        assert_eq!(stale.sub_scores.recency, 0.0);

        // Future-dated record (clock skew in the ERP).
        let ahead = model.score_customer("C-1", &records, date(2022, 12, 1)).unwrap();
        assert!(ahead.days_since_last_purchase < 0);
        assert_eq!(ahead.sub_scores.recency, 20.0);
    }

    #[test]
    fn test_negative_margin_does_not_go_below_zero() {
        let records = vec![sale("C-1", "P-1", date(2024, 1, 1), 1000, -500, 1.0)];
        let score = ScoringModel::default()
            .score_customer("C-1", &records, date(2024, 1, 1))
            .unwrap();
        assert_eq!(score.avg_margin_percent, -50.0);
        assert_eq!(score.sub_scores.margin, 0.0);
    }

    #[test]
    fn test_velocity_single_day() {
        let day = date(2024, 3, 10);
        let records = vec![
            sale("C-1", "P-9", day, 1000, 300, 10.0),
            sale("C-2", "P-9", day, 1000, 300, 10.0),
        ];
        let score = ScoringModel::default().score_product("P-9", &records).unwrap();
        assert_eq!(score.days_selling, 1);
        assert_eq!(score.velocity, 20.0);
        assert_eq!(score.total_quantity, 20.0);
        assert_eq!(score.sub_scores.velocity, 25.0);
    }

    #[test]
    fn test_product_sub_scores() {
        // 10 days of selling, 50 units total, $10,000, 25% margin, 20 orders.
        let records: Vec<SaleRecord> = (0..20)
            .map(|i| {
                let day = date(2024, 4, 1) + chrono::Duration::days(i % 10);
                sale("C-1", "P-5", day, 50_000, 12_500, 2.5)
            })
            .collect();

        let score = ScoringModel::default().score_product("P-5", &records).unwrap();
        assert_eq!(score.days_selling, 10);
        assert_eq!(score.velocity, 5.0);
        assert_eq!(score.sub_scores.revenue, 17.5);
        assert_eq!(score.sub_scores.velocity, 12.5);
        assert_eq!(score.sub_scores.margin, 12.5);
        assert_eq!(score.sub_scores.frequency, 1.5);
        assert_eq!(score.total_score, 44);
        assert_eq!(score.first_sale, Some(date(2024, 4, 1)));
        assert_eq!(score.last_sale, Some(date(2024, 4, 10)));
    }

    #[test]
    fn test_revenue_sub_score_is_monotonic() {
        let model = ScoringModel::default();
        let as_of = date(2024, 6, 30);
        let mut previous = -1.0;
        for total in [0, 100, 1_000_000, 2_500_000, 5_000_000, 9_000_000] {
            let records = vec![sale("C-1", "P-1", as_of, total, 0, 1.0)];
            let score = model.score_customer("C-1", &records, as_of).unwrap();
            assert!(score.sub_scores.revenue >= previous);
            previous = score.sub_scores.revenue;
        }
        assert_eq!(previous, 40.0);
    }

    #[test]
    fn test_custom_tier_thresholds() {
        let mut model = ScoringModel::default();
        model.tiers = TierThresholds { a: 40, b: 20 };
        let as_of = date(2024, 6, 30);
        // Recency 20 + margin 15 + a little revenue/frequency.
        let records = vec![sale("C-1", "P-1", as_of, 10_000, 6_000, 1.0)];
        let score = model.score_customer("C-1", &records, as_of).unwrap();
        assert_eq!(score.total_score, 35);
        assert_eq!(score.tier, Tier::B);
    }

    #[test]
    fn test_rank_customers_orders_by_score_then_revenue() {
        let as_of = date(2024, 6, 30);
        let records = vec![
            sale("C-low", "P-1", date(2024, 1, 1), 1_000, 100, 1.0),
            sale("C-high", "P-1", as_of, 5_000_000, 2_500_000, 1.0),
            sale("C-mid", "P-1", as_of, 10_000, 1_000, 1.0),
            sale("C-mid2", "P-1", as_of, 20_000, 2_000, 1.0),
        ];

        let ranked = ScoringModel::default().rank_customers(&records, as_of);
        let ids: Vec<&str> = ranked.iter().map(|s| s.customer_id.as_str()).collect();
        assert_eq!(ids, vec!["C-high", "C-mid2", "C-mid", "C-low"]);

        let dist = TierDistribution::from_tiers(ranked.iter().map(|s| s.tier));
        assert_eq!(ranked[0].total_score, 75);
        assert_eq!(dist.total(), 4);
        assert_eq!((dist.a, dist.b, dist.c), (0, 1, 3));
    }

    #[test]
    fn test_rank_products_matches_individual_scores() {
        let records = vec![
            sale("C-1", "P-1", date(2024, 1, 1), 1_000, 100, 1.0),
            sale("C-1", "P-2", date(2024, 1, 2), 9_000, 4_000, 30.0),
            sale("C-2", "P-1", date(2024, 1, 5), 2_000, 200, 2.0),
        ];
        let model = ScoringModel::default();
        let ranked = model.rank_products(&records);
        assert_eq!(ranked.len(), 2);
        for score in &ranked {
            assert_eq!(score, &model.score_product(&score.product_id, &records).unwrap());
        }
        assert_eq!(ranked[0].product_id, "P-2");
    }
}
