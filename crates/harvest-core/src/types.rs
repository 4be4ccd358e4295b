//! # Domain Types
//!
//! Input records and the small enums callers use to shape a query.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   SaleRecord    │   │   Granularity   │   │    Dimension    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id, date       │   │  Day            │   │  Category       │       │
//! │  │  customer_id    │   │  Week           │   │  Subcategory    │       │
//! │  │  product_id     │   │  Month          │   │  Customer       │       │
//! │  │  category       │   │  Quarter        │   │  Product        │       │
//! │  │  *_cents        │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   DateRange     │   │    WeekStart    │   │      Tier       │       │
//! │  │  start? end?    │   │  Sunday (dflt)  │   │  A  ≥ 80        │       │
//! │  │  → Period       │   │  Monday         │   │  B  ≥ 60        │       │
//! │  └─────────────────┘   └─────────────────┘   │  C  < 60        │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sale records are read-only input. Nothing in this crate mutates them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::format::margin_percent;
use crate::money::Money;

// =============================================================================
// Sale Record
// =============================================================================

/// One transaction line as delivered by the ERP access layer.
///
/// Currency values are in cents. `total_amount_cents` is
/// `quantity × unit_price` (within a cent) and `margin_cents` is
/// `total_amount − cost`; `validation::validate_sale_record` checks both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    pub id: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub customer_id: String,
    pub product_id: String,
    /// Product category at time of sale (frozen).
    pub category: String,
    /// Product subcategory at time of sale (frozen).
    pub subcategory: String,
    /// Amount sold in the product's unit (kg, crate, bunch...).
    pub quantity: f64,
    pub unit_price_cents: i64,
    pub total_amount_cents: i64,
    pub cost_cents: i64,
    pub margin_cents: i64,
}

impl SaleRecord {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    #[inline]
    pub fn margin(&self) -> Money {
        Money::from_cents(self.margin_cents)
    }

    /// `margin / total_amount × 100`, 0 for zero-value lines.
    pub fn margin_percent(&self) -> f64 {
        margin_percent(self.margin(), self.total_amount())
    }
}

// =============================================================================
// Granularity
// =============================================================================

/// Time-bucketing unit for trend series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    Week,
    Month,
    Quarter,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Day,
        Granularity::Week,
        Granularity::Month,
        Granularity::Quarter,
    ];
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Day => write!(f, "day"),
            Granularity::Week => write!(f, "week"),
            Granularity::Month => write!(f, "month"),
            Granularity::Quarter => write!(f, "quarter"),
        }
    }
}

/// Parsing is strict: unknown values are an `InvalidArgument`, never a
/// fallback to some default granularity.
impl FromStr for Granularity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Granularity::Day),
            "week" => Ok(Granularity::Week),
            "month" => Ok(Granularity::Month),
            "quarter" => Ok(Granularity::Quarter),
            _ => Err(CoreError::invalid_argument(
                "granularity",
                s,
                "expected one of: day, week, month, quarter",
            )),
        }
    }
}

// =============================================================================
// Week Start
// =============================================================================

/// First day of a week bucket.
///
/// Sunday is the historical behavior of the dashboards. Monday (ISO) has to
/// be chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    /// The week-start day on or before `date`.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use harvest_core::types::WeekStart;
    ///
    /// // 2024-01-03 is a Wednesday.
    /// let wed = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
    /// assert_eq!(WeekStart::Sunday.week_of(wed), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    /// assert_eq!(WeekStart::Monday.week_of(wed), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    /// ```
    pub fn week_of(&self, date: NaiveDate) -> NaiveDate {
        let offset = match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        };
        date - chrono::Duration::days(i64::from(offset))
    }
}

impl FromStr for WeekStart {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            _ => Err(CoreError::invalid_argument(
                "week_start",
                s,
                "expected sunday or monday",
            )),
        }
    }
}

// =============================================================================
// Dimension
// =============================================================================

/// Categorical axis for performance breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    #[default]
    Category,
    Subcategory,
    Customer,
    Product,
}

impl Dimension {
    /// The grouping key of `record` along this axis.
    pub fn key_of<'a>(&self, record: &'a SaleRecord) -> &'a str {
        match self {
            Dimension::Category => &record.category,
            Dimension::Subcategory => &record.subcategory,
            Dimension::Customer => &record.customer_id,
            Dimension::Product => &record.product_id,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Category => write!(f, "category"),
            Dimension::Subcategory => write!(f, "subcategory"),
            Dimension::Customer => write!(f, "customer"),
            Dimension::Product => write!(f, "product"),
        }
    }
}

impl FromStr for Dimension {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "category" => Ok(Dimension::Category),
            "subcategory" => Ok(Dimension::Subcategory),
            "customer" => Ok(Dimension::Customer),
            "product" => Ok(Dimension::Product),
            _ => Err(CoreError::invalid_argument(
                "dimension",
                s,
                "expected one of: category, subcategory, customer, product",
            )),
        }
    }
}

// =============================================================================
// Tier
// =============================================================================

/// Discrete classification derived from a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Tier {
    A,
    B,
    C,
}

impl Tier {
    /// Classifies a score against the `a` and `b` lower bounds.
    ///
    /// ```rust
    /// use harvest_core::types::Tier;
    ///
    /// assert_eq!(Tier::classify(80, 80, 60), Tier::A);
    /// assert_eq!(Tier::classify(79, 80, 60), Tier::B);
    /// assert_eq!(Tier::classify(59, 80, 60), Tier::C);
    /// ```
    pub fn classify(score: u32, a: u32, b: u32) -> Tier {
        if score >= a {
            Tier::A
        } else if score >= b {
            Tier::B
        } else {
            Tier::C
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::A => write!(f, "A"),
            Tier::B => write!(f, "B"),
            Tier::C => write!(f, "C"),
        }
    }
}

impl FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Tier::A),
            "B" | "b" => Ok(Tier::B),
            "C" | "c" => Ok(Tier::C),
            _ => Err(CoreError::invalid_argument("tier", s, "expected A, B or C")),
        }
    }
}

// =============================================================================
// Date Range
// =============================================================================

/// Caller-supplied, possibly open-ended date filter.
///
/// Missing bounds are resolved against "today" and a fixed epoch rather
/// than unbounded history; see [`DateRange::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    /// Fills in missing bounds: `end` defaults to `today`, `start` to `epoch`.
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use harvest_core::types::DateRange;
    ///
    /// let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    /// let epoch = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    /// let period = DateRange::default().resolve(today, epoch).unwrap();
    /// assert_eq!(period.start, epoch);
    /// assert_eq!(period.end, today);
    /// ```
    pub fn resolve(&self, today: NaiveDate, epoch: NaiveDate) -> CoreResult<Period> {
        let start = self.start.unwrap_or(epoch);
        let end = self.end.unwrap_or(today);

        if start > end {
            return Err(CoreError::invalid_argument(
                "date range",
                format!("{}..{}", start, end),
                "start must not be after end",
            ));
        }

        Ok(Period { start, end })
    }
}

/// A resolved, inclusive date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Period {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl Period {
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Borrows the records that fall inside the period, in input order.
    pub fn filter<'a>(&self, records: &'a [SaleRecord]) -> Vec<&'a SaleRecord> {
        records.iter().filter(|r| self.contains(r.date)).collect()
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

    #[test]
    fn test_granularity_parsing() {
        assert_eq!("day".parse::<Granularity>().unwrap(), Granularity::Day);
        assert_eq!("Week".parse::<Granularity>().unwrap(), Granularity::Week);
        assert_eq!(" month ".parse::<Granularity>().unwrap(), Granularity::Month);
        assert_eq!("QUARTER".parse::<Granularity>().unwrap(), Granularity::Quarter);
    }

    #[test]
    fn test_unknown_granularity_names_value() {
        let err = "fortnight".parse::<Granularity>().unwrap_err();
        match err {
            CoreError::InvalidArgument { argument, value, .. } => {
                assert_eq!(argument, "granularity");
                assert_eq!(value, "fortnight");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_granularity_display_round_trips_through_parse() {
        for g in Granularity::ALL {
            assert_eq!(g.to_string().parse::<Granularity>().unwrap(), g);
        }
    }

    #[test]
    fn test_week_of_sunday_start() {
        // 2024-01-07 is a Sunday: it starts its own week.
        assert_eq!(WeekStart::Sunday.week_of(date(2024, 1, 7)), date(2024, 1, 7));
        // Saturday belongs to the previous Sunday.
        assert_eq!(WeekStart::Sunday.week_of(date(2024, 1, 13)), date(2024, 1, 7));
        // Crosses a year boundary.
        assert_eq!(WeekStart::Sunday.week_of(date(2024, 1, 1)), date(2023, 12, 31));
    }

    #[test]
    fn test_week_of_monday_start() {
        assert_eq!(WeekStart::Monday.week_of(date(2024, 1, 7)), date(2024, 1, 1));
        assert_eq!(WeekStart::Monday.week_of(date(2024, 1, 8)), date(2024, 1, 8));
    }

    #[test]
    fn test_dimension_key_of() {
        let record = SaleRecord {
            id: "s-1".into(),
            date: date(2024, 3, 1),
            customer_id: "c-9".into(),
            product_id: "p-4".into(),
            category: "Citrus".into(),
            subcategory: "Lemons".into(),
            quantity: 1.0,
            unit_price_cents: 100,
            total_amount_cents: 100,
            cost_cents: 60,
            margin_cents: 40,
        };
        assert_eq!(Dimension::Category.key_of(&record), "Citrus");
        assert_eq!(Dimension::Subcategory.key_of(&record), "Lemons");
        assert_eq!(Dimension::Customer.key_of(&record), "c-9");
        assert_eq!(Dimension::Product.key_of(&record), "p-4");
        assert_eq!(record.margin_percent(), 40.0);
        assert!("region".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(Tier::classify(100, 80, 60), Tier::A);
        assert_eq!(Tier::classify(80, 80, 60), Tier::A);
        assert_eq!(Tier::classify(79, 80, 60), Tier::B);
        assert_eq!(Tier::classify(60, 80, 60), Tier::B);
        assert_eq!(Tier::classify(59, 80, 60), Tier::C);
        assert_eq!(Tier::classify(0, 80, 60), Tier::C);
        assert_eq!("b".parse::<Tier>().unwrap(), Tier::B);
        assert!("D".parse::<Tier>().is_err());
    }

    #[test]
    fn test_date_range_resolution() {
        let today = date(2024, 6, 30);
        let epoch = date(2020, 1, 1);

        let open_start = DateRange::new(None, Some(date(2024, 1, 31)));
        let period = open_start.resolve(today, epoch).unwrap();
        assert_eq!(period.start, epoch);
        assert_eq!(period.end, date(2024, 1, 31));

        let inverted = DateRange::new(Some(date(2024, 2, 1)), Some(date(2024, 1, 1)));
        assert!(matches!(
            inverted.resolve(today, epoch),
            Err(CoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_period_bounds_are_inclusive() {
        let period = Period {
            start: date(2024, 1, 1),
            end: date(2024, 1, 31),
        };
        assert!(period.contains(date(2024, 1, 1)));
        assert!(period.contains(date(2024, 1, 31)));
        assert!(!period.contains(date(2023, 12, 31)));
        assert!(!period.contains(date(2024, 2, 1)));
    }
}
