//! # Money Module
//!
//! Provides the `Money` type used for every currency value in sale records
//! and report buckets.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing a year of line items as floats:                                │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ drift in every bucket           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    ERP decimals are converted to cents ONCE, at load time.             │
//! │    Bucket sums are then exact, whatever the summation order.           │
//! │    Only ratios (margin %, averages) go through f64, rounded at output. │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use harvest_core::money::Money;
//!
//! let line = Money::from_major(12.5);     // $12.50 from an ERP export
//! let total: Money = [line, Money::from_cents(750)].into_iter().sum();
//! assert_eq!(total.cents(), 2000);
//! assert_eq!(total.to_major(), 20.0);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ## Wire Format
/// Serializes as a bare integer number of cents, and the generated
/// TypeScript binding is that same integer. `30000` is $300.00; divide by
/// 100 for display.
///
/// ## Design Decisions
/// - **i64 (signed)**: credit notes and negative margins are legal
/// - **Single field tuple struct**: zero-cost wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use harvest_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(1099).cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal amount (as exported by the ERP) to cents.
    ///
    /// Rounds half away from zero to the nearest cent.
    ///
    /// ```rust
    /// use harvest_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(12.34).cents(), 1234);
    /// assert_eq!(Money::from_major(0.126).cents(), 13);
    /// assert_eq!(Money::from_major(-5.5).cents(), -550);
    /// ```
    pub fn from_major(amount: f64) -> Self {
        Money((amount * 100.0).round() as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value in major units (dollars) for ratio math and display.
    #[inline]
    pub fn to_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a unit price by a decimal quantity (kg, crates, bunches).
    ///
    /// ```rust
    /// use harvest_core::money::Money;
    ///
    /// let per_kg = Money::from_cents(349);
    /// assert_eq!(per_kg.multiply_quantity(2.5).cents(), 873); // 872.5 → 873
    /// ```
    pub fn multiply_quantity(&self, quantity: f64) -> Self {
        Money((self.0 as f64 * quantity).round() as i64)
    }

    /// Divides evenly across `count` parts, rounding half away from zero.
    ///
    /// Returns zero when `count` is zero, which is the average-order-value
    /// policy for empty buckets.
    ///
    /// ```rust
    /// use harvest_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(30000).average_over(2).cents(), 15000);
    /// assert_eq!(Money::from_cents(1000).average_over(3).cents(), 333);
    /// assert_eq!(Money::from_cents(500).average_over(0), Money::zero());
    /// ```
    pub fn average_over(&self, count: u64) -> Self {
        if count == 0 {
            return Money::zero();
        }
        let count = count as i128;
        let value = self.0 as i128;
        let half = count / 2;
        let rounded = if value >= 0 {
            (value + half) / count
        } else {
            (value - half) / count
        };
        Money(rounded as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering, `-$5.50`. Dashboards do their own locale
/// formatting; see `format::format_currency` for grouped output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_rounds_to_cents() {
        assert_eq!(Money::from_major(100.0).cents(), 10000);
        assert_eq!(Money::from_major(0.1 + 0.2).cents(), 30);
        assert_eq!(Money::from_major(19.999).cents(), 2000);
        assert_eq!(Money::from_major(-3.211).cents(), -321);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(-5)), "-$0.05");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((b - a).cents(), -500);

        let mut c = a;
        c += b;
        assert_eq!(c.cents(), 1500);
    }

    #[test]
    fn test_serializes_as_integer_cents() {
        let value = serde_json::to_value(Money::from_cents(30_000)).unwrap();
        assert_eq!(value, serde_json::json!(30000));

        let back: Money = serde_json::from_str("-550").unwrap();
        assert_eq!(back, Money::from_major(-5.5));
    }

    #[test]
    fn test_sum_is_order_independent() {
        let values = [
            Money::from_major(0.1),
            Money::from_major(0.2),
            Money::from_major(1234.56),
            Money::from_major(-99.99),
        ];
        let forward: Money = values.iter().sum();
        let backward: Money = values.iter().rev().sum();
        assert_eq!(forward, backward);
        assert_eq!(forward.cents(), 113487);
    }

    #[test]
    fn test_average_over_rounds_half_away_from_zero() {
        assert_eq!(Money::from_cents(5).average_over(2).cents(), 3);
        assert_eq!(Money::from_cents(-5).average_over(2).cents(), -3);
        assert_eq!(Money::from_cents(7).average_over(0).cents(), 0);
    }

    #[test]
    fn test_multiply_quantity() {
        assert_eq!(Money::from_cents(299).multiply_quantity(3.0).cents(), 897);
        assert_eq!(Money::from_cents(120).multiply_quantity(0.25).cents(), 30);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(-1).is_negative());
        assert_eq!(Money::from_cents(-250).abs().cents(), 250);
    }
}
