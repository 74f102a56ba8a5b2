// Delimited text import (CSV/TSV)

use ledgerlink_recon::Dataset;
use serde_json::Value;

use crate::error::IngestError;
use crate::table::{build_record, Headers};

/// Parse delimited text. Every cell is kept as a string; the first row is
/// the header.
pub fn parse(bytes: &[u8]) -> Result<Dataset, IngestError> {
    let content = decode_text(bytes);
    let delimiter = sniff_delimiter(&content);
    parse_str(&content, delimiter)
}

pub fn parse_str(content: &str, delimiter: u8) -> Result<Dataset, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = reader.records();

    let header_row = loop {
        match rows.next() {
            None => return Err(IngestError::Empty),
            Some(row) => {
                let row = row.map_err(|e| IngestError::Csv(e.to_string()))?;
                if row.iter().any(|f| !f.trim().is_empty()) {
                    break row;
                }
            }
        }
    };
    let mut headers = Headers::new(header_row.iter().map(|f| Some(f.to_string())));

    let mut records = Vec::new();
    for row in rows {
        let row = row.map_err(|e| IngestError::Csv(e.to_string()))?;
        let cells = row
            .iter()
            .enumerate()
            .filter(|(_, field)| !field.is_empty())
            .map(|(idx, field)| (idx, Value::String(field.to_string())));
        if let Some(record) = build_record(&mut headers, cells) {
            records.push(record);
        }
    }

    Ok(records)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// Each candidate (tab, semicolon, comma, pipe) is scored by how many sample
/// lines share the first line's field count, weighted by that count.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| field_count(line, delim))
            .collect();

        let Some(&target) = counts.first() else {
            continue;
        };
        if target <= 1 {
            continue;
        }

        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

fn field_count(line: &str, delim: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map(|r| r.len())
        .unwrap_or(1)
}

/// UTF-8 when valid, otherwise Windows-1252 (common for Excel-exported CSVs).
/// A leading byte-order mark is dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            log::debug!("input is not UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}
