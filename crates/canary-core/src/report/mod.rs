pub mod console;
pub mod json;
pub mod summary;

use crate::model::{ChangeType, SeverityLabel, TestResultRecord, TestRun};
use crate::storage::Store;
use serde::{Deserialize, Serialize};

pub use summary::{summarize, RunSummary};

/// Full view of a run: header, per-case verdicts and the aggregated summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub test_run: TestRun,
    pub results: Vec<ResultView>,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultView {
    pub id: i64,
    pub test_case_id: i64,
    pub severity_score: Option<f64>,
    pub severity_label: Option<SeverityLabel>,
    pub change_type: Option<ChangeType>,
    pub reasoning: Option<String>,
    pub is_regression: bool,
    pub judge_cost: f64,
    pub cached: bool,
    pub diff_hash: Option<String>,
    pub created_at: String,
}

impl From<&TestResultRecord> for ResultView {
    fn from(r: &TestResultRecord) -> Self {
        Self {
            id: r.id,
            test_case_id: r.test_case_id,
            severity_score: r.severity_score,
            severity_label: r.severity_label,
            change_type: r.change_type,
            reasoning: r.reasoning.clone(),
            is_regression: r.is_regression,
            judge_cost: r.judge_cost,
            cached: r.cached,
            diff_hash: r.diff_hash.clone(),
            created_at: r.created_at.clone(),
        }
    }
}

/// Loads a run and its results. `None` when the run does not exist.
pub fn build_report(store: &Store, run_id: i64) -> anyhow::Result<Option<RunReport>> {
    let Some(test_run) = store.get_run(run_id)? else {
        return Ok(None);
    };
    let rows = store.results_for_run(run_id)?;
    Ok(Some(RunReport {
        test_run,
        summary: summarize(&rows),
        results: rows.iter().map(ResultView::from).collect(),
    }))
}
