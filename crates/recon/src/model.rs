use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One row from an input file: field name → scalar, in source column order.
pub type Record = Map<String, Value>;

/// All rows from one input file, in source order.
pub type Dataset = Vec<Record>;

/// Which input a dataset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

/// One oracle call's worth of work: a window of the bigger dataset paired
/// against the whole smaller dataset. Sides keep their A/B identity
/// regardless of which one was windowed.
#[derive(Debug, Clone)]
pub struct ComparisonUnit {
    pub index: usize,
    pub side_a: Vec<Record>,
    pub side_b: Vec<Record>,
}

// ---------------------------------------------------------------------------
// Oracle output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    #[serde(rename = "file_a_entry")]
    pub record_a: Record,
    #[serde(rename = "file_b_entry")]
    pub record_b: Record,
    #[serde(default, deserialize_with = "lenient_score")]
    pub confidence_score: f64,
    #[serde(default, deserialize_with = "lenient_reason")]
    pub match_reason: String,
}

/// Decoded response for one comparison unit. The unmatched lists are the
/// oracle's local view and are never trusted for the final accounting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleResult {
    #[serde(default)]
    pub matches: Vec<MatchCandidate>,
    #[serde(
        rename = "unmatched_file_a_entries",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub unmatched_a: Option<Vec<Record>>,
    #[serde(
        rename = "unmatched_file_b_entries",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub unmatched_b: Option<Vec<Record>>,
}

/// Scores arrive as numbers, numeric strings, or not at all.
fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

fn lenient_reason<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Every input record lands either on one side of a match or in its
/// side's unmatched list, never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub matches: Vec<MatchCandidate>,
    #[serde(rename = "unmatched_file_a_entries")]
    pub unmatched_a: Vec<Record>,
    #[serde(rename = "unmatched_file_b_entries")]
    pub unmatched_b: Vec<Record>,
}

/// Per-run unit accounting from the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub planned: usize,
    pub succeeded: usize,
    /// Oracle call returned an error (or panicked).
    pub failed: usize,
    /// Oracle answered but nothing usable could be extracted.
    pub unusable: usize,
}

impl DispatchStats {
    /// Units were planned but none produced a usable result.
    pub fn nothing_reconciled(&self) -> bool {
        self.planned > 0 && self.succeeded == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
    pub window_size: usize,
    pub pool_size: usize,
    pub bigger_side: Side,
    pub units: DispatchStats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconSummary {
    pub records_a: usize,
    pub records_b: usize,
    pub matches: usize,
    pub matched_a: usize,
    pub matched_b: usize,
    pub unmatched_a: usize,
    pub unmatched_b: usize,
    /// Matches naming a record that exists in neither input.
    pub foreign_matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub result: ReconciliationResult,
}
