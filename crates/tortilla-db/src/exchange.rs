//! # Spreadsheet Exchange
//!
//! CSV export and import of Sale Records.
//!
//! ## Import Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  header row ── missing a required column? ──► ImportFormatError (file) │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  each data row                                                          │
//! │       ├── convert cells (date, time, quantities, money, flags)         │
//! │       ├── validate_record                                               │
//! │       │                                                                 │
//! │       ├── ok  ──► records                                               │
//! │       └── err ──► RowRejection { row, column, reason }  (row skipped)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Column names are matched case-insensitively, in any order; extra columns
//! are ignored. Exported files always use [`RECORD_COLUMNS`] order.

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;
use serde::Serialize;

use tortilla_core::validation::validate_record;
use tortilla_core::{Money, Product, ProductQuantities, Quantity, SaleRecord, RECORD_COLUMNS};

use crate::error::{DbResult, ImportFormatError};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// =============================================================================
// Export
// =============================================================================

/// Writes a header row and one row per record.
///
/// ## Returns
/// Number of records written.
pub fn export_records<'a, W, I>(records: I, writer: W) -> DbResult<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a SaleRecord>,
{
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(RECORD_COLUMNS)?;

    let mut written = 0;
    for record in records {
        out.write_record(record_cells(record))?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

fn record_cells(record: &SaleRecord) -> Vec<String> {
    let mut cells = Vec::with_capacity(RECORD_COLUMNS.len());
    cells.push(record.date.format(DATE_FORMAT).to_string());
    cells.push(record.time.format(TIME_FORMAT).to_string());
    cells.push(record.recorded_by.clone());
    for (_, qty) in record.quantities.iter() {
        cells.push(qty.to_string());
    }
    cells.push(record.special_unit_price.to_decimal_string());
    cells.push(record.frequent_customer.to_string());
    cells.push(record.supplier_rate.to_string());
    cells.push(record.total.to_decimal_string());
    cells.push(record.payment.to_decimal_string());
    cells.push(record.change.to_decimal_string());
    cells
}

// =============================================================================
// Import
// =============================================================================

/// A data row that was skipped during import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// 1-based data row number (the header is not counted).
    pub row: usize,
    /// Offending column, when one can be named.
    pub column: Option<String>,
    pub reason: String,
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column {
            Some(column) => write!(f, "row {}, column {}: {}", self.row, column, self.reason),
            None => write!(f, "row {}: {}", self.row, self.reason),
        }
    }
}

/// Rows parsed from one file.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub records: Vec<SaleRecord>,
    pub rejected: Vec<RowRejection>,
}

/// Outcome of importing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub file_name: String,
    pub imported: usize,
    pub rejected: Vec<RowRejection>,
}

/// Parses and validates every row of a CSV file.
///
/// Nothing is stored here; the caller appends `records` in one batch.
///
/// ## Errors
/// - `MissingColumns` when the header lacks any of [`RECORD_COLUMNS`]
/// - `Unreadable` when the header or the underlying reader fails
pub fn parse_records<R: Read>(reader: R, file_name: &str) -> Result<ImportBatch, ImportFormatError> {
    let unreadable = |e: csv::Error| ImportFormatError::Unreadable {
        file: file_name.to_string(),
        reason: e.to_string(),
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_header(csv_reader.headers().map_err(unreadable)?);
    let missing = columns.missing();
    if !missing.is_empty() {
        return Err(ImportFormatError::MissingColumns {
            file: file_name.to_string(),
            columns: missing,
        });
    }

    let mut batch = ImportBatch::default();
    for (i, result) in csv_reader.records().enumerate() {
        let row = i + 1;
        let cells = match result {
            Ok(cells) => cells,
            Err(e) if e.is_io_error() => return Err(unreadable(e)),
            Err(e) => {
                batch.rejected.push(RowRejection {
                    row,
                    column: None,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match columns.to_record(&cells) {
            Ok(record) => batch.records.push(record),
            Err(CellError { column, reason }) => batch.rejected.push(RowRejection {
                row,
                column,
                reason,
            }),
        }
    }

    Ok(batch)
}

struct CellError {
    column: Option<String>,
    reason: String,
}

impl CellError {
    fn at(column: &str, reason: impl fmt::Display) -> Self {
        CellError {
            column: Some(column.to_string()),
            reason: reason.to_string(),
        }
    }
}

/// Header name (lowercased) to cell position.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_header(header: &StringRecord) -> Self {
        let mut map = HashMap::new();
        for (pos, name) in header.iter().enumerate() {
            // First occurrence wins on duplicate names
            map.entry(name.trim().to_ascii_lowercase()).or_insert(pos);
        }
        Columns(map)
    }

    fn missing(&self) -> Vec<String> {
        RECORD_COLUMNS
            .iter()
            .filter(|name| !self.0.contains_key(**name))
            .map(|name| name.to_string())
            .collect()
    }

    /// Cell text, empty when the row is shorter than the header.
    fn cell<'r>(&self, cells: &'r StringRecord, column: &str) -> &'r str {
        self.0
            .get(column)
            .and_then(|&pos| cells.get(pos))
            .unwrap_or("")
    }

    fn required<'r>(&self, cells: &'r StringRecord, column: &str) -> Result<&'r str, CellError> {
        let value = self.cell(cells, column);
        if value.is_empty() {
            Err(CellError::at(column, "is required"))
        } else {
            Ok(value)
        }
    }

    fn money(&self, cells: &StringRecord, column: &str) -> Result<Money, CellError> {
        self.required(cells, column)?
            .parse()
            .map_err(|e| CellError::at(column, e))
    }

    fn to_record(&self, cells: &StringRecord) -> Result<SaleRecord, CellError> {
        let date = parse_date(self.required(cells, "date")?)
            .ok_or_else(|| CellError::at("date", "expected YYYY-MM-DD"))?;
        let time = parse_time(self.required(cells, "time")?)
            .ok_or_else(|| CellError::at("time", "expected HH:MM:SS"))?;

        let mut quantities = ProductQuantities::default();
        for product in Product::ALL {
            let column = product.column();
            let text = self.cell(cells, column);
            if !text.is_empty() {
                let qty: Quantity = text.parse().map_err(|e| CellError::at(column, e))?;
                quantities.set(product, qty);
            }
        }

        let special_text = self.cell(cells, "special_price");
        let special_unit_price = if special_text.is_empty() {
            Money::zero()
        } else {
            special_text
                .parse()
                .map_err(|e| CellError::at("special_price", e))?
        };

        let record = SaleRecord {
            date,
            time,
            recorded_by: self.cell(cells, "username").to_string(),
            quantities,
            special_unit_price,
            frequent_customer: self.flag(cells, "frequent_customer")?,
            supplier_rate: self.flag(cells, "supplier")?,
            total: self.money(cells, "total")?,
            payment: self.money(cells, "payment")?,
            change: self.money(cells, "change")?,
        };

        validate_record(&record).map_err(|e| CellError {
            column: e.field().map(str::to_string),
            reason: e.to_string(),
        })?;
        Ok(record)
    }

    fn flag(&self, cells: &StringRecord, column: &str) -> Result<bool, CellError> {
        let text = self.cell(cells, column);
        parse_flag(text).ok_or_else(|| CellError::at(column, format!("'{text}' is not a yes/no value")))
    }
}

/// `YYYY-MM-DD`, or a full timestamp whose date part is kept.
fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).ok().or_else(|| {
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
            .map(|dt| dt.date())
    })
}

/// `HH:MM:SS` or `HH:MM`.
fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// Spreadsheet booleans. An empty cell is `false`.
fn parse_flag(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" | "n" | "f" => Some(false),
        "true" | "1" | "yes" | "y" | "t" => Some(true),
        _ => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
