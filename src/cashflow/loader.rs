//! Load dated cash flows from CSV
//!
//! Single schedule files have a `date,amount` header. Batch files add a
//! leading `id` column and may interleave rows from many schedules.

use super::CashFlowEntry;
use chrono::NaiveDate;
use csv::{Reader, ReaderBuilder, Trim};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Date format accepted in the `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised while reading cash flow files
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid date '{value}' on line {line}: {source}")]
    InvalidDate {
        line: usize,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Raw CSV row for a single schedule
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    date: String,
    amount: f64,
}

/// Raw CSV row for a batch file
#[derive(Debug, serde::Deserialize)]
struct BatchCsvRow {
    id: String,
    date: String,
    amount: f64,
}

/// Header occupies line 1, so record `index` sits on line `index + 2`
fn parse_date(value: &str, index: usize) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|source| LoadError::InvalidDate {
        line: index + 2,
        value: value.to_string(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> Reader<R> {
    ReaderBuilder::new().trim(Trim::All).from_reader(reader)
}

/// Load one schedule from a CSV file
pub fn load_cash_flows<P: AsRef<Path>>(path: P) -> Result<Vec<CashFlowEntry>, LoadError> {
    let reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
    read_cash_flows(reader)
}

/// Load one schedule from any reader (e.g., string buffer, stdin)
pub fn load_cash_flows_from_reader<R: Read>(reader: R) -> Result<Vec<CashFlowEntry>, LoadError> {
    read_cash_flows(csv_reader(reader))
}

fn read_cash_flows<R: Read>(mut reader: Reader<R>) -> Result<Vec<CashFlowEntry>, LoadError> {
    let mut flows = Vec::new();

    for (index, result) in reader.deserialize().enumerate() {
        let row: CsvRow = result?;
        let date = parse_date(&row.date, index)?;
        flows.push(CashFlowEntry::new(date, row.amount));
    }

    Ok(flows)
}

/// Load a batch file, grouping rows by id
pub fn load_batch<P: AsRef<Path>>(
    path: P,
) -> Result<BTreeMap<String, Vec<CashFlowEntry>>, LoadError> {
    let reader = ReaderBuilder::new().trim(Trim::All).from_path(path)?;
    read_batch(reader)
}

/// Load a batch from any reader
pub fn load_batch_from_reader<R: Read>(
    reader: R,
) -> Result<BTreeMap<String, Vec<CashFlowEntry>>, LoadError> {
    read_batch(csv_reader(reader))
}

fn read_batch<R: Read>(
    mut reader: Reader<R>,
) -> Result<BTreeMap<String, Vec<CashFlowEntry>>, LoadError> {
    let mut groups: BTreeMap<String, Vec<CashFlowEntry>> = BTreeMap::new();

    for (index, result) in reader.deserialize().enumerate() {
        let row: BatchCsvRow = result?;
        let date = parse_date(&row.date, index)?;
        groups
            .entry(row.id)
            .or_default()
            .push(CashFlowEntry::new(date, row.amount));
    }

    Ok(groups)
}
