//! Merge per-unit oracle results into one global reconciliation.
//!
//! Matches are taken from every usable result. The unmatched lists are
//! recomputed here by structural subtraction against the full datasets;
//! whatever the oracle claimed as unmatched for its own window is ignored,
//! since a record unmatched in one window may well be matched in another.

use std::collections::HashSet;
use std::fmt::Write as _;

use serde_json::Value;

use crate::config::DuplicateMatches;
use crate::model::{OracleResult, Record, ReconciliationResult};
use crate::normalize::{normalize_dataset, normalize_record};

/// Canonical text form of a record used for structural equality.
///
/// Object keys are sorted at every depth and numbers are written by numeric
/// value, so `{"b":1,"a":100}` and `{"a":100.0,"b":1}` share a key.
pub fn identity_key(record: &Record) -> String {
    let mut out = String::new();
    write_object(record, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => {
            // Integers are exact; above 2^53 the f64 form would merge neighbours
            if let Some(i) = n.as_i64() {
                let _ = write!(out, "{i}");
            } else if let Some(u) = n.as_u64() {
                let _ = write!(out, "{u}");
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() => {
                        let _ = write!(out, "{f}");
                    }
                    _ => out.push_str(&n.to_string()),
                }
            }
        }
        Value::String(s) => write_string(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => write_object(map, out),
    }
}

fn write_object(map: &Record, out: &mut String) {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    out.push('{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_string(key, out);
        out.push(':');
        write_canonical(value, out);
    }
    out.push('}');
}

fn write_string(s: &str, out: &mut String) {
    // serde_json escaping keeps keys such as `a":1,"b` unambiguous.
    match serde_json::to_string(s) {
        Ok(quoted) => out.push_str(&quoted),
        Err(_) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
    }
}

/// Identity keys of every record in an already-normalized dataset.
pub fn identity_set(records: &[Record]) -> HashSet<String> {
    records.iter().map(identity_key).collect()
}

/// Combine the usable per-unit results into the global result.
///
/// Every input record ends up either in a match or in its side's unmatched
/// list, never both, and never in both lists of one side.
pub fn aggregate(
    dataset_a: &[Record],
    dataset_b: &[Record],
    results: Vec<OracleResult>,
    duplicates: DuplicateMatches,
) -> ReconciliationResult {
    let mut matches = Vec::new();
    let mut matched_a: HashSet<String> = HashSet::new();
    let mut matched_b: HashSet<String> = HashSet::new();
    let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
    let mut skipped = 0usize;

    for result in results {
        for mut candidate in result.matches {
            candidate.record_a = normalize_record(&candidate.record_a);
            candidate.record_b = normalize_record(&candidate.record_b);
            candidate.confidence_score = clamp_score(candidate.confidence_score);

            let key_a = identity_key(&candidate.record_a);
            let key_b = identity_key(&candidate.record_b);

            if duplicates == DuplicateMatches::FirstReported
                && !seen_pairs.insert((key_a.clone(), key_b.clone()))
            {
                skipped += 1;
                continue;
            }

            matched_a.insert(key_a);
            matched_b.insert(key_b);
            matches.push(candidate);
        }
    }

    if skipped > 0 {
        log::debug!("dropped {skipped} repeated match report(s)");
    }

    let unmatched_a = subtract(normalize_dataset(dataset_a), &matched_a);
    let unmatched_b = subtract(normalize_dataset(dataset_b), &matched_b);

    ReconciliationResult {
        matches,
        unmatched_a,
        unmatched_b,
    }
}

fn subtract(records: Vec<Record>, matched: &HashSet<String>) -> Vec<Record> {
    records
        .into_iter()
        .filter(|r| !matched.contains(&identity_key(r)))
        .collect()
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
