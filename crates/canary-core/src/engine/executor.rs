use crate::fingerprint;
use crate::judge::Judge;
use crate::model::{
    ChangeType, ResultSummary, SuiteOutcome, SuiteSummary, TestCase, TestResultRecord, Verdict,
};
use crate::providers::source::ResponseSource;
use crate::storage::Store;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::timeout;

/// Fixed pass/fail policy: a case passes when its severity score is strictly
/// below this value. Not configurable; a case without a score fails.
pub const PASS_THRESHOLD: f64 = 0.3;

pub fn is_pass(severity_score: Option<f64>) -> bool {
    matches!(severity_score, Some(s) if s < PASS_THRESHOLD)
}

#[derive(Debug, Clone)]
pub struct ExecutorPolicy {
    /// Model name handed to the response source.
    pub model: String,
    pub source_timeout: Duration,
    /// Max cases in flight. 1 evaluates strictly in order.
    pub parallel: usize,
}

impl Default for ExecutorPolicy {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            source_timeout: Duration::from_secs(30),
            parallel: 1,
        }
    }
}

/// Runs a suite: response source -> judge -> persisted result, per active case.
#[derive(Clone)]
pub struct SuiteExecutor {
    store: Store,
    judge: Judge,
    source: Arc<dyn ResponseSource>,
    policy: ExecutorPolicy,
}

/// Partial aggregate owned by one case evaluation.
struct CaseOutcome {
    summary: ResultSummary,
    cost: f64,
}

impl SuiteExecutor {
    pub fn new(
        store: Store,
        judge: Judge,
        source: Arc<dyn ResponseSource>,
        policy: ExecutorPolicy,
    ) -> Self {
        Self {
            store,
            judge,
            source,
            policy,
        }
    }

    pub fn judge(&self) -> &Judge {
        &self.judge
    }

    pub fn policy(&self) -> &ExecutorPolicy {
        &self.policy
    }

    /// Evaluates every active case and persists one result row per case.
    ///
    /// Judge and response-source failures stay local to their case. A store
    /// failure aborts the remaining cases and is returned.
    pub async fn run(&self, test_cases: &[TestCase], run_id: i64) -> anyhow::Result<SuiteOutcome> {
        let sem = Arc::new(Semaphore::new(self.policy.parallel.max(1)));
        // set before the failing task releases its permit
        let halted = Arc::new(AtomicBool::new(false));
        let mut set = JoinSet::new();
        let mut outcomes = Vec::new();

        for (idx, tc) in test_cases.iter().enumerate() {
            if !tc.is_active {
                tracing::debug!(event = "executor.case_skipped", run_id, case = %tc.name);
                continue;
            }
            let permit = sem.clone().acquire_owned().await?;
            while let Some(joined) = set.try_join_next() {
                match collect_case(joined) {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        set.abort_all();
                        return Err(e);
                    }
                }
            }
            if halted.load(Ordering::SeqCst) {
                tracing::warn!(event = "executor.halted", run_id, case = %tc.name);
                break;
            }

            let this = self.clone();
            let tc = tc.clone();
            let halted = halted.clone();
            set.spawn(async move {
                let _permit = permit;
                let res = this.evaluate_case(&tc, run_id).await;
                if res.is_err() {
                    halted.store(true, Ordering::SeqCst);
                }
                (idx, res)
            });
        }

        while let Some(joined) = set.join_next().await {
            match collect_case(joined) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    set.abort_all();
                    return Err(e);
                }
            }
        }
        outcomes.sort_by_key(|(idx, _)| *idx);

        let mut summary = SuiteSummary::default();
        let mut results = Vec::with_capacity(outcomes.len());
        for (_, o) in outcomes {
            summary.total_tests += 1;
            if o.summary.passed {
                summary.passed_tests += 1;
            } else {
                summary.failed_tests += 1;
            }
            summary.total_cost += o.cost;
            results.push(o.summary);
        }

        Ok(SuiteOutcome { results, summary })
    }

    async fn evaluate_case(&self, tc: &TestCase, run_id: i64) -> anyhow::Result<CaseOutcome> {
        let start = Instant::now();

        let record = match self.fetch_actual_output(&tc.input_prompt).await {
            Ok(actual_output) => {
                let verdict = self
                    .judge
                    .evaluate(&tc.input_prompt, &tc.expected_behavior, &actual_output)
                    .await;
                let diff_hash =
                    fingerprint::compute(&tc.input_prompt, &tc.expected_behavior, &actual_output);
                judged_record(tc, run_id, actual_output, &verdict, diff_hash.into_string())
            }
            Err(e) => {
                tracing::warn!(
                    event = "executor.source_failed",
                    run_id,
                    case = %tc.name,
                    provider = self.source.provider_name(),
                    error = %e,
                    "response source failed; recording degraded result"
                );
                source_failed_record(tc, run_id, &e)
            }
        };
        let record = TestResultRecord {
            processing_time: start.elapsed().as_secs_f64(),
            ..record
        };

        self.store.insert_result(&record)?;

        let passed = is_pass(record.severity_score);
        tracing::info!(
            event = "executor.case_done",
            run_id,
            case = %tc.name,
            score = ?record.severity_score,
            label = record.severity_label.map(|l| l.as_str()).unwrap_or("unknown"),
            passed,
            cached = record.cached
        );

        Ok(CaseOutcome {
            summary: ResultSummary {
                test_case_id: tc.id,
                test_case_name: tc.name.clone(),
                severity_score: record.severity_score,
                severity_label: record.severity_label,
                is_regression: record.is_regression,
                cached: record.cached,
                passed,
            },
            cost: record.judge_cost,
        })
    }

    async fn fetch_actual_output(&self, prompt: &str) -> anyhow::Result<String> {
        let t = self.policy.source_timeout;
        timeout(t, self.source.get_response(prompt, &self.policy.model))
            .await
            .map_err(|_| anyhow::anyhow!("response source timed out after {}s", t.as_secs_f64()))?
    }
}

fn collect_case(
    joined: Result<(usize, anyhow::Result<CaseOutcome>), JoinError>,
) -> anyhow::Result<(usize, CaseOutcome)> {
    match joined {
        Ok((idx, Ok(outcome))) => Ok((idx, outcome)),
        Ok((_, Err(e))) => Err(e),
        Err(e) => Err(anyhow::anyhow!("case task failed: {}", e)),
    }
}

fn judged_record(
    tc: &TestCase,
    run_id: i64,
    actual_output: String,
    verdict: &Verdict,
    diff_hash: String,
) -> TestResultRecord {
    TestResultRecord {
        id: 0,
        test_run_id: run_id,
        test_case_id: tc.id,
        input_prompt: tc.input_prompt.clone(),
        expected_behavior: tc.expected_behavior.clone(),
        actual_output: Some(actual_output),
        severity_score: Some(verdict.severity_score),
        severity_label: Some(verdict.severity_label),
        change_type: Some(verdict.change_type),
        reasoning: Some(verdict.reasoning.clone()),
        is_regression: verdict.is_regression,
        judge_cost: verdict.judge_cost,
        processing_time: 0.0,
        diff_hash: Some(diff_hash),
        cached: verdict.cached,
        created_at: String::new(),
    }
}

fn source_failed_record(tc: &TestCase, run_id: i64, err: &anyhow::Error) -> TestResultRecord {
    TestResultRecord {
        id: 0,
        test_run_id: run_id,
        test_case_id: tc.id,
        input_prompt: tc.input_prompt.clone(),
        expected_behavior: tc.expected_behavior.clone(),
        actual_output: None,
        severity_score: None,
        severity_label: None,
        change_type: Some(ChangeType::ResponseError),
        reasoning: Some(format!("Response source failed: {:#}", err)),
        is_regression: false,
        judge_cost: 0.0,
        processing_time: 0.0,
        diff_hash: None,
        cached: false,
        created_at: String::new(),
    }
}
