//! # Rounding & Formatting
//!
//! Small shared helpers used at the point of OUTPUT by both engines.
//! Accumulation never rounds; every bucket or score is rounded exactly once
//! when it is materialized.

use crate::money::Money;

/// Rounds to 2 decimal places, half away from zero.
///
/// ```rust
/// use harvest_core::format::round2;
///
/// assert_eq!(round2(26.666_666), 26.67);
/// assert_eq!(round2(-1.234), -1.23);
/// ```
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `numerator / denominator`, or 0 when the denominator is 0.
#[inline]
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Margin as a percentage of revenue, unrounded. 0 when revenue is 0.
///
/// ```rust
/// use harvest_core::format::margin_percent;
/// use harvest_core::money::Money;
///
/// let pct = margin_percent(Money::from_cents(8000), Money::from_cents(30000));
/// assert!((pct - 26.6667).abs() < 0.001);
/// assert_eq!(margin_percent(Money::from_cents(10), Money::zero()), 0.0);
/// ```
pub fn margin_percent(margin: Money, revenue: Money) -> f64 {
    if revenue.is_zero() {
        return 0.0;
    }
    margin.cents() as f64 / revenue.cents() as f64 * 100.0
}

/// Renders money with thousands separators: `$12,345.60`.
///
/// ```rust
/// use harvest_core::format::format_currency;
/// use harvest_core::money::Money;
///
/// assert_eq!(format_currency(Money::from_cents(1234560)), "$12,345.60");
/// assert_eq!(format_currency(Money::from_cents(-99)), "-$0.99");
/// ```
pub fn format_currency(amount: Money) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let cents = amount.cents().unsigned_abs();
    format!("{}${}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

/// Renders a percentage with 2 decimals: `26.67%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", round2(value))
}

/// Renders a quantity, dropping the fraction for whole numbers.
///
/// ```rust
/// use harvest_core::format::format_quantity;
///
/// assert_eq!(format_quantity(1200.0), "1,200");
/// assert_eq!(format_quantity(12.5), "12.50");
/// ```
pub fn format_quantity(value: f64) -> String {
    let rounded = round2(value);
    if rounded.fract() == 0.0 {
        let sign = if rounded < 0.0 { "-" } else { "" };
        format!("{}{}", sign, group_thousands(rounded.abs() as u64))
    } else {
        format!("{:.2}", rounded)
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
