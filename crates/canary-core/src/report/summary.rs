use crate::model::TestResultRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bucket for results that carry no severity label.
pub const UNKNOWN_LABEL: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub severity_counts: BTreeMap<String, usize>,
    pub regression_count: usize,
}

pub fn summarize(results: &[TestResultRecord]) -> RunSummary {
    let mut summary = RunSummary::default();
    for r in results {
        let label = r
            .severity_label
            .map(|l| l.as_str())
            .unwrap_or(UNKNOWN_LABEL);
        *summary.severity_counts.entry(label.to_string()).or_insert(0) += 1;
        if r.is_regression {
            summary.regression_count += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SeverityLabel;

    fn result(label: Option<SeverityLabel>, regression: bool) -> TestResultRecord {
        TestResultRecord {
            id: 0,
            test_run_id: 1,
            test_case_id: 1,
            input_prompt: "p".into(),
            expected_behavior: "e".into(),
            actual_output: Some("a".into()),
            severity_score: None,
            severity_label: label,
            change_type: None,
            reasoning: None,
            is_regression: regression,
            judge_cost: 0.0,
            processing_time: 0.0,
            diff_hash: None,
            cached: false,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_histogram_with_unknown_bucket() {
        let rows = vec![
            result(Some(SeverityLabel::High), true),
            result(Some(SeverityLabel::High), true),
            result(Some(SeverityLabel::Low), false),
            result(None, false),
        ];
        let s = summarize(&rows);
        assert_eq!(s.severity_counts.len(), 3);
        assert_eq!(s.severity_counts["high"], 2);
        assert_eq!(s.severity_counts["low"], 1);
        assert_eq!(s.severity_counts["unknown"], 1);
        assert_eq!(s.regression_count, 2);
    }

    #[test]
    fn test_empty_input() {
        let s = summarize(&[]);
        assert!(s.severity_counts.is_empty());
        assert_eq!(s.regression_count, 0);
    }
}
