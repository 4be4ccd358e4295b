//! # Sale Loader
//!
//! Reads ERP sale exports and turns each row into a validated
//! [`SaleRecord`].
//!
//! ## Load Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sales.json / sales.csv                                                 │
//! │       │                                                                 │
//! │       ▼  per row                                                        │
//! │  SaleRow (decimal amounts) ──✗ malformed ──► warn!, skipped += 1       │
//! │       │                                                                 │
//! │       ▼  Money::from_major (once, at the boundary)                      │
//! │  SaleRecord ── validate_sale_record ──✗──► warn!, skipped += 1         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LoadedSales { records, report }                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A file that cannot be read at all is an error. A single bad row is not.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use harvest_core::validation::validate_sale_record;
use harvest_core::{Money, SaleRecord};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ReportError, ReportResult};

// =============================================================================
// Input Row
// =============================================================================

/// One row of an ERP export, amounts in major currency units.
///
/// Accepts both `snake_case` and the ERP's `camelCase` column names.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaleRow {
    pub id: String,
    pub date: NaiveDate,
    #[serde(alias = "customerId")]
    pub customer_id: String,
    #[serde(alias = "productId")]
    pub product_id: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    pub quantity: f64,
    #[serde(alias = "unitPrice")]
    pub unit_price: f64,
    #[serde(alias = "totalAmount")]
    pub total_amount: f64,
    pub cost: f64,
    /// Derived as `total_amount - cost` when the export omits it.
    #[serde(default)]
    pub margin: Option<f64>,
}

impl SaleRow {
    /// Converts decimal amounts to cents.
    pub fn into_record(self) -> SaleRecord {
        let total = Money::from_major(self.total_amount);
        let cost = Money::from_major(self.cost);
        let margin = self.margin.map(Money::from_major).unwrap_or(total - cost);

        SaleRecord {
            id: self.id,
            date: self.date,
            customer_id: self.customer_id,
            product_id: self.product_id,
            category: self.category,
            subcategory: self.subcategory,
            quantity: self.quantity,
            unit_price_cents: Money::from_major(self.unit_price).cents(),
            total_amount_cents: total.cents(),
            cost_cents: cost.cents(),
            margin_cents: margin.cents(),
        }
    }
}

// =============================================================================
// Load Results
// =============================================================================

/// Supported export formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> ReportResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(InputFormat::Json),
            Some("csv") => Ok(InputFormat::Csv),
            _ => Err(ReportError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Row counts for one load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Rows present in the input.
    pub rows: usize,
    pub loaded: usize,
    /// Rows dropped for being malformed or failing validation.
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedSales {
    pub records: Vec<SaleRecord>,
    pub report: LoadReport,
}

/// Accumulates records and counts as rows stream in.
#[derive(Default)]
struct Collector {
    records: Vec<SaleRecord>,
    report: LoadReport,
}

impl Collector {
    fn push(&mut self, line: usize, row: Result<SaleRow, String>) {
        self.report.rows += 1;

        let row = match row {
            Ok(row) => row,
            Err(reason) => {
                warn!(line, %reason, "Skipping malformed sale row");
                self.report.skipped += 1;
                return;
            }
        };

        let record = row.into_record();
        match validate_sale_record(&record) {
            Ok(()) => {
                self.records.push(record);
                self.report.loaded += 1;
            }
            Err(e) => {
                warn!(line, id = %record.id, error = %e, "Skipping invalid sale row");
                self.report.skipped += 1;
            }
        }
    }

    fn finish(self) -> LoadedSales {
        LoadedSales {
            records: self.records,
            report: self.report,
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Loads a sale export, picking the parser from the file extension.
pub fn load_sales(path: &Path) -> ReportResult<LoadedSales> {
    let format = InputFormat::from_path(path)?;
    let file = std::fs::File::open(path).map_err(|e| ReportError::io(path, e))?;

    let loaded = match format {
        InputFormat::Json => parse_json(std::io::BufReader::new(file))?,
        InputFormat::Csv => parse_csv(file)?,
    };

    info!(
        path = %path.display(),
        rows = loaded.report.rows,
        loaded = loaded.report.loaded,
        skipped = loaded.report.skipped,
        "Loaded sales"
    );

    Ok(loaded)
}

/// Parses a JSON array of sale rows.
///
/// The document must be an array; each element is decoded on its own so
/// one malformed row does not discard the file.
pub fn parse_json<R: Read>(reader: R) -> ReportResult<LoadedSales> {
    let rows: Vec<serde_json::Value> = serde_json::from_reader(reader)?;
    let mut collector = Collector::default();

    for (index, value) in rows.into_iter().enumerate() {
        let row = serde_json::from_value::<SaleRow>(value).map_err(|e| e.to_string());
        collector.push(index + 1, row);
    }

    Ok(collector.finish())
}

/// Parses CSV with a header row.
pub fn parse_csv<R: Read>(reader: R) -> ReportResult<LoadedSales> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut collector = Collector::default();

    for (index, result) in reader.deserialize::<SaleRow>().enumerate() {
        match result {
            Err(e) if e.is_io_error() => return Err(e.into()),
            // Header is line 1.
            other => collector.push(index + 2, other.map_err(|e| e.to_string())),
        }
    }

    Ok(collector.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
id,date,customer_id,product_id,category,subcategory,quantity,unit_price,total_amount,cost,margin
S-1,2024-01-03,C-1,P-APL,Fruit,Apples,2,50.00,100.00,70.00,30.00
S-2,2024-01-20,C-2,P-TOM,Vegetables,Tomatoes,4,50.00,200.00,150.00,
S-3,2024-01-21,C-2,P-TOM,Vegetables,Tomatoes,0,50.00,0.00,0.00,0.00
S-4,not-a-date,C-2,P-TOM,Vegetables,Tomatoes,1,5.00,5.00,4.00,1.00
";

    #[test]
    fn test_csv_loads_valid_rows_and_skips_invalid() {
        let loaded = parse_csv(CSV.as_bytes()).unwrap();
        assert_eq!(
            loaded.report,
            LoadReport {
                rows: 4,
                loaded: 2,
                skipped: 2
            }
        );

        let first = &loaded.records[0];
        assert_eq!(first.total_amount(), Money::from_cents(10_000));
        assert_eq!(first.margin(), Money::from_cents(3_000));
        assert_eq!(first.subcategory, "Apples");

        // Missing margin is derived from total - cost.
        assert_eq!(loaded.records[1].margin(), Money::from_cents(5_000));
    }

    #[test]
    fn test_json_accepts_camel_case_and_skips_bad_rows() {
        let json = r#"[
            {"id": "S-1", "date": "2024-02-01", "customerId": "C-9", "productId": "P-1",
             "category": "Herbs", "quantity": 1.5, "unitPrice": 4.0, "totalAmount": 6.0,
             "cost": 3.6, "margin": 2.4},
            {"id": "S-2", "date": "2024-02-01", "customer_id": "C-9"},
            {"id": "S-3", "date": "2024-02-02", "customer_id": "C-9", "product_id": "P-1",
             "category": "Herbs", "quantity": 2, "unit_price": 4.0, "total_amount": 8.0,
             "cost": 5.0, "margin": 9.99}
        ]"#;

        let loaded = parse_json(json.as_bytes()).unwrap();
        assert_eq!(loaded.report.rows, 3);
        assert_eq!(loaded.report.loaded, 1);
        assert_eq!(loaded.report.skipped, 2);

        let record = &loaded.records[0];
        assert_eq!(record.customer_id, "C-9");
        assert_eq!(record.subcategory, "");
        assert_eq!(record.cost(), Money::from_cents(360));
        assert_eq!(record.margin(), Money::from_cents(240));
    }

    #[test]
    fn test_sub_cent_unit_price_is_kept() {
        let csv = "\
id,date,customer_id,product_id,category,subcategory,quantity,unit_price,total_amount,cost,margin
S-1,2024-03-04,C-7,P-ONI,Vegetables,Onions,1000,1.234,1234.00,1000.00,234.00
";
        let loaded = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            loaded.report,
            LoadReport {
                rows: 1,
                loaded: 1,
                skipped: 0
            }
        );

        let record = &loaded.records[0];
        assert_eq!(record.unit_price(), Money::from_cents(123));
        assert_eq!(record.total_amount(), Money::from_cents(123_400));
        assert_eq!(record.margin(), Money::from_cents(23_400));
    }

    #[test]
    fn test_json_must_be_array() {
        let err = parse_json(r#"{"id": "S-1"}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, ReportError::Json(_)));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_path(Path::new("a.JSON")).unwrap(), InputFormat::Json);
        assert_eq!(InputFormat::from_path(Path::new("dir/a.csv")).unwrap(), InputFormat::Csv);
        assert!(InputFormat::from_path(Path::new("a.xlsx")).is_err());
        assert!(InputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_load_sales_from_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let loaded = load_sales(file.path()).unwrap();
        assert_eq!(loaded.records.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sales(&dir.path().join("sales.json")).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
