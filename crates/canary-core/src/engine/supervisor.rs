use crate::engine::executor::SuiteExecutor;
use crate::errors::StartError;
use crate::model::{NewRun, RunStatus, SuiteOutcome};
use crate::storage::Store;
use tokio::task::{AbortHandle, JoinHandle};

#[derive(Debug, Clone, Default)]
pub struct StartRequest {
    pub name: Option<String>,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub trigger_source: String,
}

/// Starts suite executions in the background and owns their terminal status.
#[derive(Clone)]
pub struct RunSupervisor {
    store: Store,
    executor: SuiteExecutor,
}

/// Returned as soon as the run row exists; the suite keeps running after this.
pub struct RunHandle {
    pub run_id: i64,
    pub total_tests: u32,
    abort: AbortHandle,
    done: JoinHandle<RunStatus>,
}

impl RunHandle {
    pub fn status(&self) -> &'static str {
        "started"
    }

    /// Stops the in-flight suite. The run is then recorded as `failed`.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Detached canceller, usable after `wait` has taken the handle.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Resolves to the terminal status written to the store.
    pub async fn wait(self) -> RunStatus {
        self.done.await.unwrap_or(RunStatus::Failed)
    }
}

impl RunSupervisor {
    pub fn new(store: Store, executor: SuiteExecutor) -> Self {
        Self { store, executor }
    }

    pub async fn start(&self, req: StartRequest) -> Result<RunHandle, StartError> {
        let cases = self.store.list_test_cases(true)?;
        if cases.is_empty() {
            return Err(StartError::NoActiveTestCases);
        }

        let total_tests = cases.len() as u32;
        let name = req.name.unwrap_or_else(default_run_name);
        let run_id = self.store.create_run(&NewRun {
            name: name.clone(),
            trigger_source: req.trigger_source.clone(),
            git_commit: req.git_commit,
            git_branch: req.git_branch,
            judge_model_used: Some(self.executor.judge().config().model.clone()),
            total_tests,
        })?;

        tracing::info!(
            event = "run.started",
            run_id,
            name = %name,
            trigger_source = %req.trigger_source,
            total_tests
        );

        let executor = self.executor.clone();
        let inner = tokio::spawn(async move { executor.run(&cases, run_id).await });
        let abort = inner.abort_handle();

        let store = self.store.clone();
        let done = tokio::spawn(supervise(store, run_id, inner));

        Ok(RunHandle {
            run_id,
            total_tests,
            abort,
            done,
        })
    }
}

/// Awaits the executor task and writes the run's terminal status once.
async fn supervise(
    store: Store,
    run_id: i64,
    inner: JoinHandle<anyhow::Result<SuiteOutcome>>,
) -> RunStatus {
    let outcome = match inner.await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            tracing::error!(event = "run.failed", run_id, error = %e);
            return mark_failed(&store, run_id);
        }
        Err(e) if e.is_cancelled() => {
            tracing::warn!(event = "run.failed", run_id, reason = "cancelled");
            return mark_failed(&store, run_id);
        }
        Err(e) => {
            tracing::error!(event = "run.failed", run_id, error = %e, "suite task panicked");
            return mark_failed(&store, run_id);
        }
    };

    match store.complete_run(run_id, &outcome.summary) {
        Ok(true) => {
            tracing::info!(
                event = "run.completed",
                run_id,
                passed = outcome.summary.passed_tests,
                failed = outcome.summary.failed_tests,
                total_cost = outcome.summary.total_cost
            );
            RunStatus::Completed
        }
        Ok(false) => {
            // someone else already finished this run; report what the store holds
            let stored = store
                .get_run(run_id)
                .ok()
                .flatten()
                .map(|r| r.status)
                .unwrap_or(RunStatus::Failed);
            tracing::warn!(
                event = "run.status_conflict",
                run_id,
                stored = stored.as_str(),
                "run was no longer running; completion not recorded"
            );
            stored
        }
        Err(e) => {
            tracing::error!(event = "run.failed", run_id, error = %e, "could not record run completion");
            mark_failed(&store, run_id)
        }
    }
}

fn mark_failed(store: &Store, run_id: i64) -> RunStatus {
    if let Err(e) = store.fail_run(run_id) {
        tracing::error!(event = "run.status_lost", run_id, error = %e);
    }
    RunStatus::Failed
}

fn default_run_name() -> String {
    format!("Test Run {}", chrono::Utc::now().format("%Y-%m-%d %H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SuiteSummary;

    fn store_with_run() -> (Store, i64) {
        let store = Store::memory().unwrap();
        store.init_schema().unwrap();
        let run_id = store
            .create_run(&NewRun {
                name: "r".into(),
                trigger_source: "test".into(),
                total_tests: 1,
                ..Default::default()
            })
            .unwrap();
        (store, run_id)
    }

    #[tokio::test]
    async fn test_panicking_suite_task_marks_failed() {
        let (store, run_id) = store_with_run();
        let inner = tokio::spawn(async move {
            if run_id > 0 {
                panic!("executor blew up");
            }
            Ok(SuiteOutcome::default())
        });

        assert_eq!(supervise(store.clone(), run_id, inner).await, RunStatus::Failed);
        let run = store.get_run(run_id).unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_completion_after_external_terminal_update_keeps_stored_status() {
        let (store, run_id) = store_with_run();
        assert!(store.fail_run(run_id).unwrap());

        let inner = tokio::spawn(async {
            Ok(SuiteOutcome {
                results: Vec::new(),
                summary: SuiteSummary {
                    total_tests: 1,
                    passed_tests: 1,
                    failed_tests: 0,
                    total_cost: 0.0,
                },
            })
        });

        assert_eq!(supervise(store.clone(), run_id, inner).await, RunStatus::Failed);
        let run = store.get_run(run_id).unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.passed_tests, 0);
    }
}
