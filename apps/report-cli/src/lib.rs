//! # harvest-report
//!
//! Command-line front end for Harvest BI. Loads a sale export, applies the
//! report configuration and runs one harvest-core operation.
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  main.rs                                                                │
//! │    1. Cli::parse()                                                      │
//! │    2. ReportConfig::load(--config)   defaults → TOML → HARVEST_* env    │
//! │    3. init_tracing(&config.logging)  stderr, stdout stays clean         │
//! │    4. run(&cli, &config, today)                                         │
//! │          │                                                              │
//! │          ├── loader::load_sales(--input)                                │
//! │          ├── DateRange(--from, --to).resolve(today, epoch)              │
//! │          ├── harvest-core operation                                     │
//! │          └── Report::to_text() | Report::to_json() (--json)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod report;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use harvest_core::{
    par_aggregate_by_dimension, par_aggregate_by_time, summarize, DateRange, Dimension,
    Granularity, SaleRecord, Tier, TierDistribution,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub use config::{LogFormat, LoggingSettings, ReportConfig};
pub use error::{ReportError, ReportResult};
pub use report::Report;

// =============================================================================
// Command Line
// =============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "harvest",
    version,
    about = "Sales analytics for wholesale produce",
    long_about = "Trend series, category breakdowns and customer/product scoring over an ERP sale export.",
    after_help = "Examples:\n  harvest --input sales.csv trend --granularity month\n  harvest --input sales.json --from 2024-01-01 breakdown --by subcategory\n  harvest --input sales.csv --json rank customers --limit 20 --tier A"
)]
pub struct Cli {
    #[arg(long, help = "Config file (default: $HARVEST_CONFIG or the platform config dir)")]
    pub config: Option<PathBuf>,

    #[arg(long, short, help = "Sale export, .json array or .csv with header")]
    pub input: PathBuf,

    #[arg(long, help = "First day included, YYYY-MM-DD (default: configured epoch)")]
    pub from: Option<NaiveDate>,

    #[arg(long, help = "Last day included, YYYY-MM-DD (default: today)")]
    pub to: Option<NaiveDate>,

    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Revenue and margin over time")]
    Trend {
        #[arg(long, short, help = "day, week, month or quarter")]
        granularity: Granularity,
    },
    #[command(about = "Performance per category, subcategory, customer or product")]
    Breakdown {
        #[arg(long, default_value = "category")]
        by: Dimension,
    },
    #[command(about = "Headline KPIs for the selected period")]
    Summary,
    #[command(about = "Score one customer or product")]
    Score {
        #[command(subcommand)]
        target: ScoreTarget,
    },
    #[command(about = "Score and rank every customer or product")]
    Rank {
        #[arg(value_enum)]
        target: RankTarget,
        #[arg(long, help = "Show at most N entries")]
        limit: Option<usize>,
        #[arg(long, help = "Only show entries in this tier")]
        tier: Option<Tier>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScoreTarget {
    Customer { id: String },
    Product { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RankTarget {
    Customers,
    Products,
}

// =============================================================================
// Logging
// =============================================================================

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG` wins when set
/// - otherwise `logging.filter` from the config (default `info,harvest=debug`)
///
/// Logs go to stderr. Calling this twice is a no-op.
pub fn init_tracing(settings: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match settings.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

// =============================================================================
// Execution
// =============================================================================

/// Runs the selected command and renders it.
pub fn run(cli: &Cli, config: &ReportConfig, today: NaiveDate) -> ReportResult<String> {
    let report = execute(cli, config, today)?;
    if cli.json {
        report.to_json()
    } else {
        Ok(report.to_text())
    }
}

/// Runs the selected command against the input file.
///
/// Trend, breakdown and summary only see records inside `--from`..`--to`.
/// Scoring sees each entity's whole history up to the end of the period,
/// so `--from` never shrinks a score. Customer recency is measured from
/// the end of the period.
pub fn execute(cli: &Cli, config: &ReportConfig, today: NaiveDate) -> ReportResult<Report> {
    let period = DateRange::new(cli.from, cli.to).resolve(today, config.analytics.epoch)?;
    let loaded = loader::load_sales(&cli.input)?;

    let history: Vec<SaleRecord> = loaded
        .records
        .into_iter()
        .filter(|r| r.date <= period.end)
        .collect();
    let records: Vec<SaleRecord> = history
        .iter()
        .filter(|r| period.contains(r.date))
        .cloned()
        .collect();

    info!(
        start = %period.start,
        end = %period.end,
        records = records.len(),
        history = history.len(),
        "Selected sales for period"
    );

    let scoring = &config.scoring;
    let report = match &cli.command {
        Command::Trend { granularity } => Report::Trend {
            period,
            granularity: *granularity,
            buckets: par_aggregate_by_time(&records, *granularity, config.analytics.week_start),
        },

        Command::Breakdown { by } => Report::Breakdown {
            period,
            dimension: *by,
            rows: par_aggregate_by_dimension(&records, *by),
        },

        Command::Summary => Report::Summary {
            period,
            summary: summarize(&records),
        },

        Command::Score {
            target: ScoreTarget::Customer { id },
        } => Report::CustomerScore {
            period,
            score: scoring.score_customer(id, &history, period.end)?,
        },

        Command::Score {
            target: ScoreTarget::Product { id },
        } => Report::ProductScore {
            period,
            score: scoring.score_product(id, &history)?,
        },

        Command::Rank {
            target: RankTarget::Customers,
            limit,
            tier,
        } => {
            let all = scoring.rank_customers(&history, period.end);
            let distribution = TierDistribution::from_tiers(all.iter().map(|s| s.tier));
            Report::CustomerRanking {
                period,
                distribution,
                scores: select(all, |s| s.tier, *tier, *limit),
            }
        }

        Command::Rank {
            target: RankTarget::Products,
            limit,
            tier,
        } => {
            let all = scoring.rank_products(&history);
            let distribution = TierDistribution::from_tiers(all.iter().map(|s| s.tier));
            Report::ProductRanking {
                period,
                distribution,
                scores: select(all, |s| s.tier, *tier, *limit),
            }
        }
    };

    Ok(report)
}

/// Applies `--tier` then `--limit` to an already ranked list.
fn select<T, F>(ranked: Vec<T>, tier_of: F, tier: Option<Tier>, limit: Option<usize>) -> Vec<T>
where
    F: Fn(&T) -> Tier,
{
    let total = ranked.len();
    let mut selected: Vec<T> = match tier {
        Some(wanted) => ranked.into_iter().filter(|s| tier_of(s) == wanted).collect(),
        None => ranked,
    };
    if let Some(limit) = limit {
        selected.truncate(limit);
    }
    debug!(total, shown = selected.len(), "Selected ranking entries");
    selected
}
