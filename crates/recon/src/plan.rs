//! Chunk planning: split two datasets of unequal size into comparison units.
//!
//! The bigger dataset (ties go to A) is cut into fixed-size windows and each
//! window is paired with the whole smaller dataset. Oracle calls are bounded
//! by `ceil(max(|A|, |B|) / window_size)` whatever the smaller side's size.
//! When either side is empty there is nothing to pair, so no units are made.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::model::{ComparisonUnit, Dataset, Record, Side};
use crate::normalize::{is_date_key, serial_to_date};

pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Day-first: `01/02/2021` is read as 1 February.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M"];

/// Output of the planner: both datasets in planning order plus the units.
#[derive(Debug, Clone)]
pub struct Plan {
    pub dataset_a: Dataset,
    pub dataset_b: Dataset,
    pub bigger: Side,
    pub window_size: usize,
    pub units: Vec<ComparisonUnit>,
}

impl Plan {
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }
}

/// Sort both datasets by date and cut the bigger one into windows.
pub fn plan(dataset_a: &[Record], dataset_b: &[Record], window_size: usize) -> Plan {
    let window_size = window_size.max(1);
    let dataset_a = sort_by_date(dataset_a);
    let dataset_b = sort_by_date(dataset_b);

    let bigger = if dataset_a.len() >= dataset_b.len() {
        Side::A
    } else {
        Side::B
    };

    let units = match bigger {
        _ if dataset_a.is_empty() || dataset_b.is_empty() => Vec::new(),
        Side::A => dataset_a
            .chunks(window_size)
            .enumerate()
            .map(|(index, window)| ComparisonUnit {
                index,
                side_a: window.to_vec(),
                side_b: dataset_b.clone(),
            })
            .collect(),
        Side::B => dataset_b
            .chunks(window_size)
            .enumerate()
            .map(|(index, window)| ComparisonUnit {
                index,
                side_a: dataset_a.clone(),
                side_b: window.to_vec(),
            })
            .collect(),
    };

    Plan {
        dataset_a,
        dataset_b,
        bigger,
        window_size,
        units,
    }
}

/// Convenience wrapper returning only the units.
pub fn plan_units(dataset_a: &[Record], dataset_b: &[Record], window_size: usize) -> Vec<ComparisonUnit> {
    plan(dataset_a, dataset_b, window_size).units
}

/// Stable sort by the record's date field, ascending.
///
/// Records whose date is missing or unparsable keep their relative source
/// order and go after every dated record.
pub fn sort_by_date(records: &[Record]) -> Dataset {
    let mut keyed: Vec<(Option<NaiveDate>, &Record)> =
        records.iter().map(|r| (record_date(r), r)).collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    keyed.into_iter().map(|(_, r)| r.clone()).collect()
}

/// The date of the first date-marked field in the record, if it parses.
pub fn record_date(record: &Record) -> Option<NaiveDate> {
    record
        .iter()
        .find(|(key, _)| is_date_key(key))
        .and_then(|(_, value)| parse_date_value(value))
}

pub fn parse_date_value(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Number(n) => n.as_f64().and_then(serial_to_date),
        Value::String(s) => parse_date_str(s),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
