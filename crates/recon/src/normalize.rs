//! Canonicalization of spreadsheet date serials.
//!
//! Spreadsheet readers hand back date cells as serial day numbers
//! (days since 1899-12-30). Any field whose name contains "date"
//! (case-insensitive) and holds a number is rewritten as `DD/MM/YYYY`.
//! Everything else passes through untouched, so normalizing twice is a no-op.

use chrono::{Datelike, NaiveDate};
use serde_json::Value;

use crate::model::Record;

/// Serial of 1970-01-01. Excel epoch is 1899-12-30, Unix epoch is 1970-01-01.
const UNIX_EPOCH_SERIAL: f64 = 25569.0;

/// `NaiveDate::num_days_from_ce()` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

pub const DATE_DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// True when a field name marks a date column.
pub fn is_date_key(key: &str) -> bool {
    key.to_lowercase().contains("date")
}

/// Convert a spreadsheet serial to a calendar date (time of day dropped).
/// Returns `None` for non-finite serials or dates outside years 1..=9999.
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let days = (serial - UNIX_EPOCH_SERIAL).floor();
    if days.abs() > i32::MAX as f64 {
        return None;
    }
    let from_ce = i32::try_from(days as i64 + UNIX_EPOCH_DAYS_FROM_CE).ok()?;
    let date = NaiveDate::from_num_days_from_ce_opt(from_ce)?;
    (1..=9999).contains(&date.year()).then_some(date)
}

/// Normalize any JSON shape: records, lists of records, or scalars.
pub fn normalize(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(normalize).collect()),
        Value::Object(map) => Value::Object(normalize_record(map)),
        other => other.clone(),
    }
}

pub fn normalize_record(record: &Record) -> Record {
    record
        .iter()
        .map(|(key, value)| {
            let value = if is_date_key(key) {
                normalize_date_value(value)
            } else {
                normalize(value)
            };
            (key.clone(), value)
        })
        .collect()
}

pub fn normalize_dataset(records: &[Record]) -> Vec<Record> {
    records.iter().map(normalize_record).collect()
}

fn normalize_date_value(value: &Value) -> Value {
    let Value::Number(n) = value else {
        return value.clone();
    };
    n.as_f64()
        .and_then(serial_to_date)
        .map(|d| Value::String(d.format(DATE_DISPLAY_FORMAT).to_string()))
        .unwrap_or_else(|| value.clone())
}
