//! # Aggregation Engine
//!
//! Turns a (range-filtered) sequence of sale records into keyed summaries:
//! trend buckets by time period, and performance breakdowns by category or
//! another categorical dimension.
//!
//! ## Bucket Keys
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Granularity   Key              Example for 2024-05-15 (a Wednesday)    │
//! │  ───────────   ──────────────   ──────────────────────────────────────  │
//! │  day           YYYY-MM-DD       2024-05-15                              │
//! │  week          week-start date  2024-05-12 (Sunday on or before)        │
//! │  month         YYYY-MM          2024-05                                 │
//! │  quarter       YYYY-Qn          2024-Q2   (n = month0 / 3 + 1)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every key is zero-padded, so lexical order is chronological order.
//!
//! ## Accumulate, Then Round
//! ```text
//!  records ──► Accumulator (exact cents, raw f64 quantity, order count)
//!                   │
//!                   │  merge (parallel partitions only)
//!                   ▼
//!              finish ──► margin %, AOV, quantity rounded to 2 decimals
//! ```
//! Rounding happens once per bucket at output, so results do not depend on
//! the order records arrive in.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::format::{margin_percent, ratio_or_zero, round2};
use crate::money::Money;
use crate::types::{Dimension, Granularity, SaleRecord, WeekStart};

// =============================================================================
// Output Types
// =============================================================================

/// One time period of a trend series.
///
/// `revenue`, `margin` and `average_order_value` serialize as integer
/// cents (see [`Money`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AggregateBucket {
    /// `YYYY-MM-DD`, `YYYY-MM` or `YYYY-Qn` depending on granularity.
    pub key: String,
    /// First calendar day covered by the bucket.
    #[ts(as = "String")]
    pub period_start: NaiveDate,
    pub revenue: Money,
    pub margin: Money,
    pub quantity: f64,
    pub orders: u64,
    pub margin_percent: f64,
    pub average_order_value: Money,
}

/// Performance of one category (or subcategory, customer, product).
///
/// Currency fields serialize as integer cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategorySummary {
    pub key: String,
    pub revenue: Money,
    pub margin: Money,
    pub quantity: f64,
    pub orders: u64,
    pub margin_percent: f64,
    pub average_order_value: Money,
    /// Percent of the revenue of all summaries in the same result.
    pub revenue_share: f64,
}

/// Whole-selection KPIs for the dashboard header cards.
///
/// Currency fields serialize as integer cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    pub revenue: Money,
    pub margin: Money,
    pub margin_percent: f64,
    pub quantity: f64,
    pub orders: u64,
    pub average_order_value: Money,
    pub customers: u64,
    pub products: u64,
    #[ts(as = "Option<String>")]
    pub first_sale: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub last_sale: Option<NaiveDate>,
}

// =============================================================================
// Accumulator
// =============================================================================

/// Running sums for one bucket.
#[derive(Debug, Clone, Copy)]
struct Accumulator {
    revenue: Money,
    margin: Money,
    quantity: f64,
    orders: u64,
    /// Input position of the first record in this bucket (tie-breaking).
    first_seen: usize,
}

impl Accumulator {
    fn new(first_seen: usize) -> Self {
        Accumulator {
            revenue: Money::zero(),
            margin: Money::zero(),
            quantity: 0.0,
            orders: 0,
            first_seen,
        }
    }

    fn add(&mut self, record: &SaleRecord) {
        self.revenue += record.total_amount();
        self.margin += record.margin();
        self.quantity += record.quantity;
        self.orders += 1;
    }

    fn merge(&mut self, other: Accumulator) {
        self.revenue += other.revenue;
        self.margin += other.margin;
        self.quantity += other.quantity;
        self.orders += other.orders;
        self.first_seen = self.first_seen.min(other.first_seen);
    }

    fn margin_percent(&self) -> f64 {
        round2(margin_percent(self.margin, self.revenue))
    }

    fn average_order_value(&self) -> Money {
        self.revenue.average_over(self.orders)
    }
}

// =============================================================================
// Key Derivation
// =============================================================================

/// Derives the bucket key and period start for `date`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use harvest_core::aggregation::bucket_key;
/// use harvest_core::types::{Granularity, WeekStart};
///
/// let date = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
/// let key = |g| bucket_key(date, g, WeekStart::Sunday).0;
/// assert_eq!(key(Granularity::Day), "2024-05-15");
/// assert_eq!(key(Granularity::Week), "2024-05-12");
/// assert_eq!(key(Granularity::Month), "2024-05");
/// assert_eq!(key(Granularity::Quarter), "2024-Q2");
/// ```
pub fn bucket_key(
    date: NaiveDate,
    granularity: Granularity,
    week_start: WeekStart,
) -> (String, NaiveDate) {
    match granularity {
        Granularity::Day => (iso_date(date), date),
        Granularity::Week => {
            let start = week_start.week_of(date);
            (iso_date(start), start)
        }
        Granularity::Month => {
            let start = first_of_month(date.year(), date.month(), date);
            (format!("{:04}-{:02}", date.year(), date.month()), start)
        }
        Granularity::Quarter => {
            let quarter = date.month0() / 3 + 1;
            let start = first_of_month(date.year(), (quarter - 1) * 3 + 1, date);
            (format!("{:04}-Q{}", date.year(), quarter), start)
        }
    }
}

fn iso_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

// Day 1 of a month that `fallback` already proves exists.
fn first_of_month(year: i32, month: u32, fallback: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(fallback)
}

// =============================================================================
// Time Aggregation
// =============================================================================

/// Groups records into time buckets with Sunday-start weeks.
///
/// Returns buckets sorted ascending by key; empty input gives an empty
/// vector.
///
/// ```rust
/// use harvest_core::aggregation::aggregate_by_time;
/// use harvest_core::types::{Granularity, SaleRecord};
///
/// let records: Vec<SaleRecord> = Vec::new();
/// assert!(aggregate_by_time(&records, Granularity::Month).is_empty());
/// ```
pub fn aggregate_by_time<'a, I>(records: I, granularity: Granularity) -> Vec<AggregateBucket>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    aggregate_by_time_with(records, granularity, WeekStart::default())
}

/// [`aggregate_by_time`] with an explicit week start.
pub fn aggregate_by_time_with<'a, I>(
    records: I,
    granularity: Granularity,
    week_start: WeekStart,
) -> Vec<AggregateBucket>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    let mut buckets: BTreeMap<String, (NaiveDate, Accumulator)> = BTreeMap::new();
    let mut count = 0usize;

    for (index, record) in records.into_iter().enumerate() {
        let (key, start) = bucket_key(record.date, granularity, week_start);
        buckets
            .entry(key)
            .or_insert_with(|| (start, Accumulator::new(index)))
            .1
            .add(record);
        count = index + 1;
    }

    debug!(
        records = count,
        buckets = buckets.len(),
        %granularity,
        "Aggregated sales by time"
    );

    finish_time(buckets)
}

/// Parallel [`aggregate_by_time_with`]: partitions are accumulated on the
/// rayon pool and merged per key. Output is identical to the sequential
/// version.
pub fn par_aggregate_by_time(
    records: &[SaleRecord],
    granularity: Granularity,
    week_start: WeekStart,
) -> Vec<AggregateBucket> {
    let buckets = records
        .par_iter()
        .enumerate()
        .fold(
            HashMap::<String, (NaiveDate, Accumulator)>::new,
            |mut map, (index, record)| {
                let (key, start) = bucket_key(record.date, granularity, week_start);
                map.entry(key)
                    .or_insert_with(|| (start, Accumulator::new(index)))
                    .1
                    .add(record);
                map
            },
        )
        .reduce(HashMap::new, |mut left, right| {
            for (key, (start, acc)) in right {
                match left.get_mut(&key) {
                    Some((_, existing)) => existing.merge(acc),
                    None => {
                        left.insert(key, (start, acc));
                    }
                }
            }
            left
        });

    debug!(
        records = records.len(),
        buckets = buckets.len(),
        %granularity,
        "Aggregated sales by time (parallel)"
    );

    finish_time(buckets.into_iter().collect())
}

fn finish_time(buckets: BTreeMap<String, (NaiveDate, Accumulator)>) -> Vec<AggregateBucket> {
    buckets
        .into_iter()
        .map(|(key, (period_start, acc))| AggregateBucket {
            key,
            period_start,
            revenue: acc.revenue,
            margin: acc.margin,
            quantity: round2(acc.quantity),
            orders: acc.orders,
            margin_percent: acc.margin_percent(),
            average_order_value: acc.average_order_value(),
        })
        .collect()
}

// =============================================================================
// Dimension Aggregation
// =============================================================================

/// Groups records by product category, highest revenue first.
///
/// Ties keep the order in which categories were first encountered.
pub fn aggregate_by_category<'a, I>(records: I) -> Vec<CategorySummary>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    aggregate_by_dimension(records, Dimension::Category)
}

/// Groups records along `dimension`, highest revenue first.
pub fn aggregate_by_dimension<'a, I>(records: I, dimension: Dimension) -> Vec<CategorySummary>
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    let mut groups: HashMap<&'a str, Accumulator> = HashMap::new();
    let mut count = 0usize;

    for (index, record) in records.into_iter().enumerate() {
        groups
            .entry(dimension.key_of(record))
            .or_insert_with(|| Accumulator::new(index))
            .add(record);
        count = index + 1;
    }

    debug!(
        records = count,
        groups = groups.len(),
        %dimension,
        "Aggregated sales by dimension"
    );

    finish_dimension(groups.into_iter().map(|(k, acc)| (k.to_string(), acc)).collect())
}

/// Parallel [`aggregate_by_dimension`] with the same ordering guarantees.
pub fn par_aggregate_by_dimension(
    records: &[SaleRecord],
    dimension: Dimension,
) -> Vec<CategorySummary> {
    let groups = records
        .par_iter()
        .enumerate()
        .fold(HashMap::<&str, Accumulator>::new, |mut map, (index, record)| {
            map.entry(dimension.key_of(record))
                .or_insert_with(|| Accumulator::new(index))
                .add(record);
            map
        })
        .reduce(HashMap::new, |mut left, right| {
            for (key, acc) in right {
                match left.get_mut(key) {
                    Some(existing) => existing.merge(acc),
                    None => {
                        left.insert(key, acc);
                    }
                }
            }
            left
        });

    debug!(
        records = records.len(),
        groups = groups.len(),
        %dimension,
        "Aggregated sales by dimension (parallel)"
    );

    finish_dimension(groups.into_iter().map(|(k, acc)| (k.to_string(), acc)).collect())
}

fn finish_dimension(mut groups: Vec<(String, Accumulator)>) -> Vec<CategorySummary> {
    groups.sort_by(|(_, a), (_, b)| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| a.first_seen.cmp(&b.first_seen))
    });

    let total: Money = groups.iter().map(|(_, acc)| acc.revenue).sum();
    let total = total.to_major();

    groups
        .into_iter()
        .map(|(key, acc)| CategorySummary {
            key,
            revenue: acc.revenue,
            margin: acc.margin,
            quantity: round2(acc.quantity),
            orders: acc.orders,
            margin_percent: acc.margin_percent(),
            average_order_value: acc.average_order_value(),
            revenue_share: round2(ratio_or_zero(acc.revenue.to_major(), total) * 100.0),
        })
        .collect()
}

// =============================================================================
// Summary
// =============================================================================

/// Computes whole-selection KPIs. Empty input gives zeroes and no dates.
pub fn summarize<'a, I>(records: I) -> SalesSummary
where
    I: IntoIterator<Item = &'a SaleRecord>,
{
    let mut acc = Accumulator::new(0);
    let mut customers: HashSet<&str> = HashSet::new();
    let mut products: HashSet<&str> = HashSet::new();
    let mut first_sale: Option<NaiveDate> = None;
    let mut last_sale: Option<NaiveDate> = None;

    for record in records {
        acc.add(record);
        customers.insert(record.customer_id.as_str());
        products.insert(record.product_id.as_str());
        first_sale = Some(first_sale.map_or(record.date, |d| d.min(record.date)));
        last_sale = Some(last_sale.map_or(record.date, |d| d.max(record.date)));
    }

    SalesSummary {
        revenue: acc.revenue,
        margin: acc.margin,
        margin_percent: acc.margin_percent(),
        quantity: round2(acc.quantity),
        orders: acc.orders,
        average_order_value: acc.average_order_value(),
        customers: customers.len() as u64,
        products: products.len() as u64,
        first_sale,
        last_sale,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(day: NaiveDate, category: &str, total: i64, margin: i64, quantity: f64) -> SaleRecord {
        SaleRecord {
            id: format!("{}-{}-{}", day, category, total),
            date: day,
            customer_id: "C-1".to_string(),
            product_id: format!("P-{}", category),
            category: category.to_string(),
            subcategory: String::new(),
            quantity,
            unit_price_cents: (total as f64 / quantity).round() as i64,
            total_amount_cents: total,
            cost_cents: total - margin,
            margin_cents: margin,
        }
    }

    #[test]
    fn test_month_scenario() {
        let records = vec![
            sale(date(2024, 1, 1), "Fruit", 10000, 3000, 1.0),
            sale(date(2024, 1, 2), "Fruit", 20000, 5000, 1.0),
        ];

        let buckets = aggregate_by_time(&records, Granularity::Month);
        assert_eq!(buckets.len(), 1);

        let bucket = &buckets[0];
        assert_eq!(bucket.key, "2024-01");
        assert_eq!(bucket.period_start, date(2024, 1, 1));
        assert_eq!(bucket.revenue, Money::from_cents(30000));
        assert_eq!(bucket.margin, Money::from_cents(8000));
        assert_eq!(bucket.orders, 2);
        assert_eq!(bucket.margin_percent, 26.67);
        assert_eq!(bucket.average_order_value, Money::from_cents(15000));
    }

    #[test]
    fn test_empty_input_gives_no_buckets() {
        let records: Vec<SaleRecord> = Vec::new();
        for g in Granularity::ALL {
            assert!(aggregate_by_time(&records, g).is_empty());
        }
        assert!(aggregate_by_category(&records).is_empty());
        assert!(par_aggregate_by_time(&records, Granularity::Day, WeekStart::Sunday).is_empty());
    }

    #[test]
    fn test_quarter_keys() {
        let cases = [
            (date(2024, 1, 15), "2024-Q1", date(2024, 1, 1)),
            (date(2024, 3, 31), "2024-Q1", date(2024, 1, 1)),
            (date(2024, 4, 1), "2024-Q2", date(2024, 4, 1)),
            (date(2024, 9, 30), "2024-Q3", date(2024, 7, 1)),
            (date(2024, 12, 31), "2024-Q4", date(2024, 10, 1)),
        ];
        for (day, key, start) in cases {
            assert_eq!(bucket_key(day, Granularity::Quarter, WeekStart::Sunday), (key.to_string(), start));
        }
    }

    #[test]
    fn test_week_keys_start_on_sunday() {
        // Sat 2024-01-06 and Sun 2024-01-07 fall in different weeks.
        let records = vec![
            sale(date(2024, 1, 6), "Fruit", 1000, 100, 1.0),
            sale(date(2024, 1, 7), "Fruit", 2000, 200, 1.0),
            sale(date(2024, 1, 13), "Fruit", 4000, 400, 1.0),
        ];
        let buckets = aggregate_by_time(&records, Granularity::Week);
        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["2023-12-31", "2024-01-07"]);
        assert_eq!(buckets[1].revenue, Money::from_cents(6000));
        assert_eq!(buckets[1].orders, 2);
    }

    #[test]
    fn test_week_keys_with_monday_start() {
        let records = vec![
            sale(date(2024, 1, 6), "Fruit", 1000, 100, 1.0),
            sale(date(2024, 1, 7), "Fruit", 2000, 200, 1.0),
        ];
        let buckets = aggregate_by_time_with(&records, Granularity::Week, WeekStart::Monday);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].key, "2024-01-01");
    }

    #[test]
    fn test_time_buckets_sorted_regardless_of_input_order() {
        let records = vec![
            sale(date(2024, 3, 5), "Fruit", 100, 10, 1.0),
            sale(date(2023, 11, 5), "Fruit", 100, 10, 1.0),
            sale(date(2024, 1, 5), "Fruit", 100, 10, 1.0),
        ];
        let keys: Vec<String> = aggregate_by_time(&records, Granularity::Day)
            .into_iter()
            .map(|b| b.key)
            .collect();
        assert_eq!(keys, vec!["2023-11-05", "2024-01-05", "2024-03-05"]);
    }

    #[test]
    fn test_zero_revenue_bucket_has_zero_margin_percent() {
        let records = vec![sale(date(2024, 2, 1), "Samples", 0, 0, 1.0)];
        let bucket = &aggregate_by_time(&records, Granularity::Day)[0];
        assert_eq!(bucket.margin_percent, 0.0);
        assert_eq!(bucket.average_order_value, Money::zero());
    }

    #[test]
    fn test_quantity_rounded_once_at_output() {
        let records: Vec<SaleRecord> = (0..3)
            .map(|_| sale(date(2024, 2, 1), "Herbs", 100, 10, 0.1))
            .collect();
        let bucket = &aggregate_by_time(&records, Granularity::Day)[0];
        assert_eq!(bucket.quantity, 0.3);
    }

    #[test]
    fn test_category_sorted_by_revenue_with_stable_ties() {
        let records = vec![
            sale(date(2024, 1, 1), "Herbs", 500, 100, 1.0),
            sale(date(2024, 1, 1), "Citrus", 500, 100, 1.0),
            sale(date(2024, 1, 1), "Berries", 9000, 3000, 1.0),
            sale(date(2024, 1, 2), "Herbs", 500, 100, 1.0),
            sale(date(2024, 1, 2), "Citrus", 500, 100, 1.0),
        ];

        let summaries = aggregate_by_category(&records);
        let keys: Vec<&str> = summaries.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["Berries", "Herbs", "Citrus"]);

        let berries = &summaries[0];
        assert_eq!(berries.orders, 1);
        assert_eq!(berries.average_order_value, Money::from_cents(9000));
        assert_eq!(berries.margin_percent, 33.33);
        assert_eq!(berries.revenue_share, 81.82);
    }

    #[test]
    fn test_dimension_by_product() {
        let records = vec![
            sale(date(2024, 1, 1), "Herbs", 500, 100, 1.0),
            sale(date(2024, 1, 1), "Citrus", 700, 100, 1.0),
        ];
        let summaries = aggregate_by_dimension(&records, Dimension::Product);
        assert_eq!(summaries[0].key, "P-Citrus");
        assert_eq!(summaries[1].key, "P-Herbs");
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let categories = ["Herbs", "Citrus", "Berries", "Roots", "Greens"];
        let records: Vec<SaleRecord> = (0..2_000)
            .map(|i| {
                let day = date(2023, 1, 1) + chrono::Duration::days(i % 400);
                let category = categories[(i as usize * 7) % categories.len()];
                sale(day, category, 100 + (i * 37) % 5000, (i * 11) % 90, 1.0 + (i % 4) as f64 * 0.25)
            })
            .collect();

        for g in Granularity::ALL {
            assert_eq!(
                par_aggregate_by_time(&records, g, WeekStart::Sunday),
                aggregate_by_time(&records, g),
                "granularity {g}"
            );
        }
        assert_eq!(
            par_aggregate_by_dimension(&records, Dimension::Category),
            aggregate_by_category(&records)
        );
    }

    #[test]
    fn test_summary() {
        let mut records = vec![
            sale(date(2024, 1, 3), "Herbs", 500, 100, 2.0),
            sale(date(2024, 1, 1), "Citrus", 1500, 300, 3.0),
        ];
        records[1].customer_id = "C-2".to_string();

        let summary = summarize(&records);
        assert_eq!(summary.revenue, Money::from_cents(2000));
        assert_eq!(summary.margin_percent, 20.0);
        assert_eq!(summary.orders, 2);
        assert_eq!(summary.quantity, 5.0);
        assert_eq!(summary.customers, 2);
        assert_eq!(summary.products, 2);
        assert_eq!(summary.first_sale, Some(date(2024, 1, 1)));
        assert_eq!(summary.last_sale, Some(date(2024, 1, 3)));

        let empty = summarize(&Vec::<SaleRecord>::new());
        assert_eq!(empty.orders, 0);
        assert_eq!(empty.first_sale, None);
    }
}
