// Workbook import (xlsx, xlsm, xls, xlsb, ods)

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use ledgerlink_recon::Dataset;
use serde_json::Value;

use crate::error::IngestError;
use crate::table::{build_record, Headers};

/// Parse the first sheet of a workbook. Numbers stay numbers and date
/// cells are returned as their serial day number.
pub fn parse(bytes: &[u8]) -> Result<Dataset, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| IngestError::Workbook(format!("failed to open workbook: {e}")))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let Some(first) = sheet_names.first() else {
        return Err(IngestError::Empty);
    };
    if sheet_names.len() > 1 {
        log::debug!("workbook has {} sheets, reading '{first}'", sheet_names.len());
    }

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| IngestError::Workbook(format!("failed to read sheet '{first}': {e}")))?;

    let mut rows = range.rows().skip_while(|row| row.iter().all(is_blank));

    let Some(header_row) = rows.next() else {
        return Err(IngestError::Empty);
    };
    let mut headers = Headers::new(header_row.iter().map(header_text));

    let mut records = Vec::new();
    for row in rows {
        let cells = row
            .iter()
            .enumerate()
            .filter_map(|(idx, cell)| cell_value(cell).map(|v| (idx, v)));
        if let Some(record) = build_record(&mut headers, cells) {
            records.push(record);
        }
    }

    Ok(records)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        _ => false,
    }
}

fn header_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::Float(n) => Some(format_float(*n)),
        Data::Int(n) => Some(n.to_string()),
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Some(format_float(dt.as_f64())),
    }
}

/// JSON value for a body cell; `None` for cells that are omitted.
fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            Some(Value::String(s.clone()))
        }
        Data::Float(n) => number(*n),
        Data::Int(n) => Some(Value::from(*n)),
        Data::Bool(b) => Some(Value::Bool(*b)),
        // 1900 date system assumed; the serial is normalized downstream.
        Data::DateTime(dt) => number(dt.as_f64()),
    }
}

/// Whole floats become integers so `100` is not written back as `100.0`.
fn number(n: f64) -> Option<Value> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Some(Value::from(n as i64))
    } else {
        Some(Value::from(n))
    }
}

fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Format, Workbook};

    fn workbook_bytes(build: impl FnOnce(&mut rust_xlsxwriter::Worksheet)) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        build(sheet);
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn first_sheet_with_typed_cells() {
        let bytes = workbook_bytes(|ws| {
            let date = Format::new().set_num_format("dd/mm/yyyy");
            ws.write_string(0, 0, "Date").unwrap();
            ws.write_string(0, 1, "Amount").unwrap();
            ws.write_string(0, 2, "Cleared").unwrap();
            ws.write_string(0, 3, "Ref").unwrap();
            ws.write_number_with_format(1, 0, 44197.0, &date).unwrap();
            ws.write_number(1, 1, 120.5).unwrap();
            ws.write_boolean(1, 2, true).unwrap();
            ws.write_string(1, 3, "INV-001").unwrap();
            ws.write_number(2, 1, 300.0).unwrap();
        });

        let records = parse(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["Date"], 44197);
        assert_eq!(records[0]["Amount"], 120.5);
        assert_eq!(records[0]["Cleared"], true);
        assert_eq!(records[0]["Ref"], "INV-001");
        assert_eq!(records[1]["Amount"], 300);
        assert!(!records[1].contains_key("Date"));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let bytes = workbook_bytes(|ws| {
            ws.write_string(0, 0, "Ref").unwrap();
            ws.write_string(1, 0, "A").unwrap();
            ws.write_string(3, 0, "B").unwrap();
        });
        let records = parse(&bytes).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["Ref"], "B");
    }

    #[test]
    fn empty_sheet_has_no_header() {
        let bytes = workbook_bytes(|_| {});
        assert!(matches!(parse(&bytes), Err(IngestError::Empty)));
    }

    #[test]
    fn garbage_is_workbook_error() {
        assert!(matches!(parse(b"not a zip"), Err(IngestError::Workbook(_))));
    }

    #[test]
    fn through_load_dataset() {
        let bytes = workbook_bytes(|ws| {
            ws.write_string(0, 0, "Name").unwrap();
            ws.write_string(0, 1, "Name").unwrap();
            ws.write_string(1, 0, "x").unwrap();
            ws.write_string(1, 1, "y").unwrap();
        });
        let records = crate::load_dataset(&bytes, "Ledger.XLSX").unwrap();
        assert_eq!(records[0]["Name_1"], "y");
    }
}
