use crate::aggregate::{identity_key, identity_set};
use crate::model::{Record, ReconSummary, ReconciliationResult};
use crate::normalize::normalize_dataset;

/// Compute summary statistics for a finished reconciliation.
///
/// `dataset_a` / `dataset_b` are the inputs as ingested; they are normalized
/// here the same way the aggregator normalized them.
pub fn compute_summary(
    dataset_a: &[Record],
    dataset_b: &[Record],
    result: &ReconciliationResult,
) -> ReconSummary {
    let keys_a = identity_set(&normalize_dataset(dataset_a));
    let keys_b = identity_set(&normalize_dataset(dataset_b));

    let mut foreign_matches = 0;
    let mut score_total = 0.0;
    for m in &result.matches {
        let known_a = keys_a.contains(&identity_key(&m.record_a));
        let known_b = keys_b.contains(&identity_key(&m.record_b));
        if !known_a || !known_b {
            foreign_matches += 1;
        }
        score_total += m.confidence_score;
    }

    let mean_confidence =
        (!result.matches.is_empty()).then(|| score_total / result.matches.len() as f64);

    ReconSummary {
        records_a: dataset_a.len(),
        records_b: dataset_b.len(),
        matches: result.matches.len(),
        matched_a: dataset_a.len().saturating_sub(result.unmatched_a.len()),
        matched_b: dataset_b.len().saturating_sub(result.unmatched_b.len()),
        unmatched_a: result.unmatched_a.len(),
        unmatched_b: result.unmatched_b.len(),
        foreign_matches,
        mean_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MatchCandidate;
    use serde_json::{json, Value};

    fn rec(v: Value) -> Record {
        v.as_object().unwrap().clone()
    }

    fn m(a: Value, b: Value, score: f64) -> MatchCandidate {
        MatchCandidate {
            record_a: rec(a),
            record_b: rec(b),
            confidence_score: score,
            match_reason: "test".into(),
        }
    }

    #[test]
    fn summary_counts() {
        let a = vec![rec(json!({"id": 1})), rec(json!({"id": 2}))];
        let b = vec![rec(json!({"ref": "x"})), rec(json!({"ref": "y"})), rec(json!({"ref": "z"}))];
        let result = ReconciliationResult {
            matches: vec![
                m(json!({"id": 1}), json!({"ref": "x"}), 0.75),
                m(json!({"id": 99}), json!({"ref": "y"}), 0.25),
            ],
            unmatched_a: vec![rec(json!({"id": 2}))],
            unmatched_b: vec![rec(json!({"ref": "z"}))],
        };
        let summary = compute_summary(&a, &b, &result);
        assert_eq!(summary.records_a, 2);
        assert_eq!(summary.records_b, 3);
        assert_eq!(summary.matches, 2);
        assert_eq!(summary.matched_a, 1);
        assert_eq!(summary.matched_b, 2);
        assert_eq!(summary.unmatched_a, 1);
        assert_eq!(summary.unmatched_b, 1);
        assert_eq!(summary.foreign_matches, 1);
        assert_eq!(summary.mean_confidence, Some(0.5));
    }

    #[test]
    fn no_matches_has_no_mean() {
        let a = vec![rec(json!({"id": 1}))];
        let result = ReconciliationResult {
            matches: vec![],
            unmatched_a: a.clone(),
            unmatched_b: vec![],
        };
        let summary = compute_summary(&a, &[], &result);
        assert_eq!(summary.mean_confidence, None);
        assert_eq!(summary.matched_a, 0);
        assert_eq!(summary.foreign_matches, 0);
    }
}
