//! # Report Rendering
//!
//! Wraps engine output with the context it was computed for and renders it
//! as a plain-text table or pretty JSON.

use std::fmt::Write as _;

use harvest_core::format::{format_currency, format_percent, format_quantity};
use harvest_core::{
    AggregateBucket, CategorySummary, CustomerScore, Dimension, Granularity, Period,
    ProductScore, SalesSummary, TierDistribution,
};
use serde::Serialize;

use crate::error::ReportResult;

/// One rendered result of the `harvest` command.
///
/// JSON output is tagged by `report`, e.g. `{"report": "trend", ...}`.
/// Currency amounts are integer cents: `"revenue": 30000` is $300.00.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "report", rename_all = "snake_case")]
pub enum Report {
    Trend {
        period: Period,
        granularity: Granularity,
        buckets: Vec<AggregateBucket>,
    },
    Breakdown {
        period: Period,
        dimension: Dimension,
        rows: Vec<CategorySummary>,
    },
    Summary {
        period: Period,
        summary: SalesSummary,
    },
    CustomerScore {
        period: Period,
        score: CustomerScore,
    },
    ProductScore {
        period: Period,
        score: ProductScore,
    },
    CustomerRanking {
        period: Period,
        distribution: TierDistribution,
        scores: Vec<CustomerScore>,
    },
    ProductRanking {
        period: Period,
        distribution: TierDistribution,
        scores: Vec<ProductScore>,
    },
}

impl Report {
    pub fn to_json(&self) -> ReportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        match self {
            Report::Trend {
                period,
                granularity,
                buckets,
            } => {
                writeln!(out, "Sales trend by {granularity}, {}", period_label(period))?;
                writeln!(
                    out,
                    "{:<12} {:>15} {:>15} {:>9} {:>7} {:>12} {:>12}",
                    "period", "revenue", "margin", "margin%", "orders", "avg order", "quantity"
                )?;
                for b in buckets {
                    writeln!(
                        out,
                        "{:<12} {:>15} {:>15} {:>9} {:>7} {:>12} {:>12}",
                        b.key,
                        format_currency(b.revenue),
                        format_currency(b.margin),
                        format_percent(b.margin_percent),
                        b.orders,
                        format_currency(b.average_order_value),
                        format_quantity(b.quantity),
                    )?;
                }
                if buckets.is_empty() {
                    writeln!(out, "(no sales in period)")?;
                }
            }

            Report::Breakdown {
                period,
                dimension,
                rows,
            } => {
                writeln!(out, "Performance by {dimension}, {}", period_label(period))?;
                writeln!(
                    out,
                    "{:<24} {:>15} {:>8} {:>15} {:>9} {:>7} {:>12}",
                    dimension.to_string(),
                    "revenue",
                    "share",
                    "margin",
                    "margin%",
                    "orders",
                    "avg order"
                )?;
                for r in rows {
                    writeln!(
                        out,
                        "{:<24} {:>15} {:>8} {:>15} {:>9} {:>7} {:>12}",
                        r.key,
                        format_currency(r.revenue),
                        format_percent(r.revenue_share),
                        format_currency(r.margin),
                        format_percent(r.margin_percent),
                        r.orders,
                        format_currency(r.average_order_value),
                    )?;
                }
                if rows.is_empty() {
                    writeln!(out, "(no sales in period)")?;
                }
            }

            Report::Summary { period, summary } => {
                writeln!(out, "Summary, {}", period_label(period))?;
                writeln!(out, "  revenue        {}", format_currency(summary.revenue))?;
                writeln!(out, "  margin         {}", format_currency(summary.margin))?;
                writeln!(out, "  margin %       {}", format_percent(summary.margin_percent))?;
                writeln!(out, "  orders         {}", summary.orders)?;
                writeln!(
                    out,
                    "  avg order      {}",
                    format_currency(summary.average_order_value)
                )?;
                writeln!(out, "  quantity       {}", format_quantity(summary.quantity))?;
                writeln!(out, "  customers      {}", summary.customers)?;
                writeln!(out, "  products       {}", summary.products)?;
                if let (Some(first), Some(last)) = (summary.first_sale, summary.last_sale) {
                    writeln!(out, "  first / last   {first} / {last}")?;
                }
            }

            Report::CustomerScore { period, score } => {
                writeln!(
                    out,
                    "Customer {}: score {} (tier {}), {}",
                    score.customer_id,
                    score.total_score,
                    score.tier,
                    period_label(period)
                )?;
                let s = &score.sub_scores;
                writeln!(
                    out,
                    "  revenue    {:>6.2}  {}",
                    s.revenue,
                    format_currency(score.total_revenue)
                )?;
                writeln!(out, "  frequency  {:>6.2}  {} orders", s.frequency, score.frequency)?;
                match score.last_purchase {
                    Some(last) => writeln!(
                        out,
                        "  recency    {:>6.2}  last purchase {last} ({} days ago)",
                        s.recency, score.days_since_last_purchase
                    )?,
                    None => writeln!(out, "  recency    {:>6.2}  no purchases", s.recency)?,
                }
                writeln!(
                    out,
                    "  margin     {:>6.2}  {}",
                    s.margin,
                    format_percent(score.avg_margin_percent)
                )?;
                writeln!(
                    out,
                    "  avg order  {}",
                    format_currency(score.average_order_value)
                )?;
            }

            Report::ProductScore { period, score } => {
                writeln!(
                    out,
                    "Product {}: score {} (tier {}), {}",
                    score.product_id,
                    score.total_score,
                    score.tier,
                    period_label(period)
                )?;
                let s = &score.sub_scores;
                writeln!(
                    out,
                    "  revenue    {:>6.2}  {}",
                    s.revenue,
                    format_currency(score.total_revenue)
                )?;
                writeln!(
                    out,
                    "  velocity   {:>6.2}  {} / day over {} days",
                    s.velocity,
                    format_quantity(score.velocity),
                    score.days_selling
                )?;
                writeln!(
                    out,
                    "  margin     {:>6.2}  {}",
                    s.margin,
                    format_percent(score.avg_margin_percent)
                )?;
                writeln!(out, "  frequency  {:>6.2}  {} orders", s.frequency, score.frequency)?;
            }

            Report::CustomerRanking {
                period,
                distribution,
                scores,
            } => {
                writeln!(out, "Customer ranking, {}", period_label(period))?;
                write_distribution(out, distribution)?;
                writeln!(
                    out,
                    "{:<5} {:<20} {:>5} {:>4} {:>15} {:>7} {:>9}",
                    "rank", "customer", "score", "tier", "revenue", "orders", "margin%"
                )?;
                for (i, c) in scores.iter().enumerate() {
                    writeln!(
                        out,
                        "{:<5} {:<20} {:>5} {:>4} {:>15} {:>7} {:>9}",
                        i + 1,
                        c.customer_id,
                        c.total_score,
                        c.tier.to_string(),
                        format_currency(c.total_revenue),
                        c.frequency,
                        format_percent(c.avg_margin_percent),
                    )?;
                }
            }

            Report::ProductRanking {
                period,
                distribution,
                scores,
            } => {
                writeln!(out, "Product ranking, {}", period_label(period))?;
                write_distribution(out, distribution)?;
                writeln!(
                    out,
                    "{:<5} {:<20} {:>5} {:>4} {:>15} {:>10} {:>9}",
                    "rank", "product", "score", "tier", "revenue", "velocity", "margin%"
                )?;
                for (i, p) in scores.iter().enumerate() {
                    writeln!(
                        out,
                        "{:<5} {:<20} {:>5} {:>4} {:>15} {:>10} {:>9}",
                        i + 1,
                        p.product_id,
                        p.total_score,
                        p.tier.to_string(),
                        format_currency(p.total_revenue),
                        format_quantity(p.velocity),
                        format_percent(p.avg_margin_percent),
                    )?;
                }
            }
        }
        Ok(())
    }
}

fn period_label(period: &Period) -> String {
    format!("{} to {}", period.start, period.end)
}

fn write_distribution(out: &mut String, d: &TierDistribution) -> std::fmt::Result {
    writeln!(
        out,
        "Tiers: A {}  B {}  C {}  (total {})",
        d.a,
        d.b,
        d.c,
        d.total()
    )
}
