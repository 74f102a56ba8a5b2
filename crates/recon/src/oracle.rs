//! The matching oracle boundary.
//!
//! The engine only knows the oracle as a capability that takes two record
//! batches plus the matching policy and answers with free-form text. The
//! text is *supposed* to be one JSON object shaped like `OracleResult`;
//! nothing downstream relies on that (see `extract`).

use std::sync::Arc;

use crate::error::OracleError;
use crate::model::{ComparisonUnit, Record};

pub const DEFAULT_DATE_WINDOW_DAYS: u32 = 3;

/// One round-trip to an external semantic matcher. Implementations must be
/// shareable across dispatcher workers.
pub trait MatchOracle: Send + Sync {
    fn matches(&self, request: &OracleRequest<'_>) -> Result<String, OracleError>;
}

impl<T: MatchOracle + ?Sized> MatchOracle for Box<T> {
    fn matches(&self, request: &OracleRequest<'_>) -> Result<String, OracleError> {
        (**self).matches(request)
    }
}

impl<T: MatchOracle + ?Sized> MatchOracle for Arc<T> {
    fn matches(&self, request: &OracleRequest<'_>) -> Result<String, OracleError> {
        (**self).matches(request)
    }
}

/// Everything a provider needs for one call: the raw batches (for oracles
/// that want them) and the rendered system and user prompts.
#[derive(Debug, Clone)]
pub struct OracleRequest<'a> {
    pub batch_a: &'a [Record],
    pub batch_b: &'a [Record],
    pub date_window_days: u32,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl<'a> OracleRequest<'a> {
    pub fn new(batch_a: &'a [Record], batch_b: &'a [Record], date_window_days: u32) -> Self {
        Self {
            batch_a,
            batch_b,
            date_window_days,
            system_prompt: build_system_prompt(date_window_days),
            user_prompt: build_user_prompt(batch_a, batch_b, date_window_days),
        }
    }

    pub fn for_unit(unit: &'a ComparisonUnit, date_window_days: u32) -> Self {
        Self::new(&unit.side_a, &unit.side_b, date_window_days)
    }
}

/// Build the request for one unit and hand it to the oracle.
pub fn call_oracle(
    oracle: &dyn MatchOracle,
    unit: &ComparisonUnit,
    date_window_days: u32,
) -> Result<String, OracleError> {
    let request = OracleRequest::for_unit(unit, date_window_days);
    oracle.matches(&request)
}

pub fn build_system_prompt(date_window_days: u32) -> String {
    format!(
        r#"You are an expert reconciliation assistant.
Match transactions from File A and File B based on these rules:
1. Match based on customer names, invoice/transaction numbers, amounts, and descriptions.
2. Allow date mismatches up to ±{days} days. DO NOT match entries if the date difference is more than {days} days.
3. Handle fuzzy matches in text fields (e.g., Invoice vs INV vs /INV/).
4. Consider currency formatting differences but ensure amounts match logically.
5. Avoid duplicate matches. A record may appear in at most one match.
6. Return only one list per entry: matched or unmatched, never both.
7. Dates must be returned in human-readable format (DD/MM/YYYY).
8. Copy every entry exactly as given; do not rename, drop or add fields.
9. Return ONLY one JSON object. Do NOT include markdown, code fences or explanations."#,
        days = date_window_days
    )
}

pub fn build_user_prompt(batch_a: &[Record], batch_b: &[Record], date_window_days: u32) -> String {
    let mut prompt = String::new();

    prompt.push_str("File A: ");
    prompt.push_str(&pretty(batch_a));
    prompt.push_str("\n\nFile B: ");
    prompt.push_str(&pretty(batch_b));
    prompt.push_str(
        r#"

Return ONLY a JSON object without markdown, like:
{
  "matches": [
    {
      "file_a_entry": { ... },
      "file_b_entry": { ... },
      "confidence_score": 0.87,
      "match_reason": "Amount and description match, dates within 3 days"
    }
  ],
  "unmatched_file_a_entries": [ ... ],
  "unmatched_file_b_entries": [ ... ]
}
"#,
    );
    prompt.push_str(&format!(
        "\nRules:\n- Do not match entries with date differences over {date_window_days} days.\n- Return dates as DD/MM/YYYY.\n- confidence_score is a number between 0 and 1."
    ));

    prompt
}

fn pretty(batch: &[Record]) -> String {
    // Serializing a map of JSON values cannot fail.
    serde_json::to_string_pretty(batch).unwrap_or_else(|_| "[]".to_string())
}
