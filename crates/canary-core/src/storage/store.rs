use crate::model::{
    ChangeType, NewRun, NewTestCase, RunStatus, SeverityLabel, SuiteSummary, TestCase,
    TestResultRecord, TestRun,
};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub struct Store {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite db {}", path.display()))?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("store connection mutex poisoned"))
    }

    // test cases

    /// Inserts a case or updates the existing one with the same name.
    pub fn upsert_test_case(&self, tc: &NewTestCase) -> anyhow::Result<i64> {
        let conn = self.lock()?;
        let now = now_rfc3339();
        let metadata_json = tc
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        conn.execute(
            "INSERT INTO test_cases(
                name, description, input_prompt, expected_behavior, category,
                is_active, metadata_json, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(name) DO UPDATE SET
                description=excluded.description,
                input_prompt=excluded.input_prompt,
                expected_behavior=excluded.expected_behavior,
                category=excluded.category,
                is_active=excluded.is_active,
                metadata_json=excluded.metadata_json,
                updated_at=?8",
            params![
                tc.name,
                tc.description,
                tc.input_prompt,
                tc.expected_behavior,
                tc.category,
                tc.is_active,
                metadata_json,
                now
            ],
        )?;
        let id = conn.query_row(
            "SELECT id FROM test_cases WHERE name=?1",
            params![tc.name],
            |r| r.get(0),
        )?;
        Ok(id)
    }

    pub fn list_test_cases(&self, active_only: bool) -> anyhow::Result<Vec<TestCase>> {
        self.page_test_cases(active_only, 0, u32::MAX)
    }

    /// Cases in insertion order, `limit` rows after skipping `skip`.
    pub fn page_test_cases(
        &self,
        active_only: bool,
        skip: u32,
        limit: u32,
    ) -> anyhow::Result<Vec<TestCase>> {
        let conn = self.lock()?;
        let sql = if active_only {
            "SELECT id, name, description, input_prompt, expected_behavior, category, is_active, metadata_json
             FROM test_cases WHERE is_active = 1 ORDER BY id LIMIT ?1 OFFSET ?2"
        } else {
            "SELECT id, name, description, input_prompt, expected_behavior, category, is_active, metadata_json
             FROM test_cases ORDER BY id LIMIT ?1 OFFSET ?2"
        };
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![limit, skip], test_case_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn get_test_case(&self, name: &str) -> anyhow::Result<Option<TestCase>> {
        let conn = self.lock()?;
        let tc = conn
            .query_row(
                "SELECT id, name, description, input_prompt, expected_behavior, category, is_active, metadata_json
                 FROM test_cases WHERE name=?1",
                params![name],
                test_case_from_row,
            )
            .optional()?;
        Ok(tc)
    }

    /// Returns false when no case has that name.
    pub fn set_test_case_active(&self, name: &str, active: bool) -> anyhow::Result<bool> {
        let conn = self.lock()?;
        let n = conn.execute(
            "UPDATE test_cases SET is_active=?1, updated_at=?2 WHERE name=?3",
            params![active, now_rfc3339(), name],
        )?;
        Ok(n > 0)
    }

    // runs

    pub fn create_run(&self, run: &NewRun) -> anyhow::Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO test_runs(
                name, status, trigger_source, git_commit, git_branch, judge_model_used,
                total_tests, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                run.name,
                RunStatus::Running.as_str(),
                run.trigger_source,
                run.git_commit,
                run.git_branch,
                run.judge_model_used,
                run.total_tests,
                now_rfc3339()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Moves a running run to `completed`. Returns false if the run was not running.
    pub fn complete_run(&self, run_id: i64, summary: &SuiteSummary) -> anyhow::Result<bool> {
        let conn = self.lock()?;
        let n = conn.execute(
            "UPDATE test_runs SET status=?1, passed_tests=?2, failed_tests=?3, total_cost=?4, completed_at=?5
             WHERE id=?6 AND status=?7",
            params![
                RunStatus::Completed.as_str(),
                summary.passed_tests,
                summary.failed_tests,
                summary.total_cost,
                now_rfc3339(),
                run_id,
                RunStatus::Running.as_str()
            ],
        )?;
        Ok(n > 0)
    }

    /// Moves a running run to `failed`. Returns false if the run was not running.
    pub fn fail_run(&self, run_id: i64) -> anyhow::Result<bool> {
        let conn = self.lock()?;
        let n = conn.execute(
            "UPDATE test_runs SET status=?1, completed_at=?2 WHERE id=?3 AND status=?4",
            params![
                RunStatus::Failed.as_str(),
                now_rfc3339(),
                run_id,
                RunStatus::Running.as_str()
            ],
        )?;
        Ok(n > 0)
    }

    pub fn get_run(&self, run_id: i64) -> anyhow::Result<Option<TestRun>> {
        let conn = self.lock()?;
        let run = conn
            .query_row(
                "SELECT id, name, status, trigger_source, git_commit, git_branch, judge_model_used,
                        total_tests, passed_tests, failed_tests, total_cost, created_at, completed_at
                 FROM test_runs WHERE id=?1",
                params![run_id],
                test_run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    /// Newest first.
    pub fn list_runs(&self, skip: u32, limit: u32) -> anyhow::Result<Vec<TestRun>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, status, trigger_source, git_commit, git_branch, judge_model_used,
                    total_tests, passed_tests, failed_tests, total_cost, created_at, completed_at
             FROM test_runs ORDER BY created_at DESC, id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let rows = stmt.query_map(params![limit, skip], test_run_from_row)?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    // results

    pub fn insert_result(&self, row: &TestResultRecord) -> anyhow::Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO test_results(
                test_run_id, test_case_id, input_prompt, expected_behavior, actual_output,
                severity_score, severity_label, change_type, reasoning, is_regression,
                judge_cost, processing_time, diff_hash, cached, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                row.test_run_id,
                row.test_case_id,
                row.input_prompt,
                row.expected_behavior,
                row.actual_output,
                row.severity_score,
                row.severity_label.map(|l| l.as_str()),
                row.change_type.map(|c| c.as_str()),
                row.reasoning,
                row.is_regression,
                row.judge_cost,
                row.processing_time,
                row.diff_hash,
                row.cached,
                now_rfc3339()
            ],
        )
        .with_context(|| {
            format!(
                "failed to insert result for run {} case {}",
                row.test_run_id, row.test_case_id
            )
        })?;
        Ok(conn.last_insert_rowid())
    }

    pub fn results_for_run(&self, run_id: i64) -> anyhow::Result<Vec<TestResultRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, test_run_id, test_case_id, input_prompt, expected_behavior, actual_output,
                    severity_score, severity_label, change_type, reasoning, is_regression,
                    judge_cost, processing_time, diff_hash, cached, created_at
             FROM test_results WHERE test_run_id=?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![run_id], |row| {
            let label: Option<String> = row.get(7)?;
            let change: Option<String> = row.get(8)?;
            Ok(TestResultRecord {
                id: row.get(0)?,
                test_run_id: row.get(1)?,
                test_case_id: row.get(2)?,
                input_prompt: row.get(3)?,
                expected_behavior: row.get(4)?,
                actual_output: row.get(5)?,
                severity_score: row.get(6)?,
                severity_label: label.as_deref().and_then(SeverityLabel::parse),
                change_type: change.as_deref().and_then(ChangeType::parse),
                reasoning: row.get(9)?,
                is_regression: row.get(10)?,
                judge_cost: row.get(11)?,
                processing_time: row.get::<_, Option<f64>>(12)?.unwrap_or(0.0),
                diff_hash: row.get(13)?,
                cached: row.get(14)?,
                created_at: row.get(15)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

fn test_case_from_row(row: &Row<'_>) -> rusqlite::Result<TestCase> {
    let metadata_json: Option<String> = row.get(7)?;
    let metadata = match metadata_json {
        Some(s) if !s.trim().is_empty() => Some(serde_json::from_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?),
        _ => None,
    };
    Ok(TestCase {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        input_prompt: row.get(3)?,
        expected_behavior: row.get(4)?,
        category: row.get(5)?,
        is_active: row.get(6)?,
        metadata,
    })
}

fn test_run_from_row(row: &Row<'_>) -> rusqlite::Result<TestRun> {
    let status: String = row.get(2)?;
    let status = RunStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown run status '{}'", status).into(),
        )
    })?;
    Ok(TestRun {
        id: row.get(0)?,
        name: row.get(1)?,
        status,
        trigger_source: row.get(3)?,
        git_commit: row.get(4)?,
        git_branch: row.get(5)?,
        judge_model_used: row.get(6)?,
        total_tests: row.get(7)?,
        passed_tests: row.get(8)?,
        failed_tests: row.get(9)?,
        total_cost: row.get(10)?,
        created_at: row.get(11)?,
        completed_at: row.get(12)?,
    })
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &str, active: bool) -> NewTestCase {
        NewTestCase {
            name: name.into(),
            description: None,
            input_prompt: format!("prompt for {}", name),
            expected_behavior: "answers correctly".into(),
            category: Some("factual".into()),
            is_active: active,
            metadata: Some(serde_json::json!({"owner": "qa"})),
        }
    }

    fn store() -> Store {
        let s = Store::memory().unwrap();
        s.init_schema().unwrap();
        s
    }

    #[test]
    fn test_upsert_keeps_id_and_updates_fields() {
        let s = store();
        let id1 = s.upsert_test_case(&case("capital", true)).unwrap();
        let mut edited = case("capital", false);
        edited.expected_behavior = "names Paris".into();
        let id2 = s.upsert_test_case(&edited).unwrap();
        assert_eq!(id1, id2);

        let tc = s.get_test_case("capital").unwrap().unwrap();
        assert_eq!(tc.expected_behavior, "names Paris");
        assert!(!tc.is_active);
        assert_eq!(tc.metadata.unwrap()["owner"], "qa");
    }

    #[test]
    fn test_list_active_only() {
        let s = store();
        s.upsert_test_case(&case("a", true)).unwrap();
        s.upsert_test_case(&case("b", false)).unwrap();
        s.upsert_test_case(&case("c", true)).unwrap();
        let names: Vec<_> = s
            .list_test_cases(true)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(s.list_test_cases(false).unwrap().len(), 3);

        assert!(s.set_test_case_active("b", true).unwrap());
        assert!(!s.set_test_case_active("missing", true).unwrap());
        assert_eq!(s.list_test_cases(true).unwrap().len(), 3);
    }

    #[test]
    fn test_page_test_cases_skips_and_limits() {
        let s = store();
        for (name, active) in [("a", true), ("b", false), ("c", true), ("d", true)] {
            s.upsert_test_case(&case(name, active)).unwrap();
        }
        let names = |v: Vec<TestCase>| v.into_iter().map(|t| t.name).collect::<Vec<_>>();

        assert_eq!(names(s.page_test_cases(false, 1, 2).unwrap()), vec!["b", "c"]);
        assert_eq!(names(s.page_test_cases(true, 1, 10).unwrap()), vec!["c", "d"]);
        assert_eq!(names(s.page_test_cases(true, 0, 1).unwrap()), vec!["a"]);
        assert!(s.page_test_cases(false, 4, 10).unwrap().is_empty());
    }

    #[test]
    fn test_run_terminal_update_happens_once() {
        let s = store();
        let run_id = s
            .create_run(&NewRun {
                name: "nightly".into(),
                trigger_source: "cli".into(),
                total_tests: 2,
                ..Default::default()
            })
            .unwrap();
        let summary = SuiteSummary {
            total_tests: 2,
            passed_tests: 1,
            failed_tests: 1,
            total_cost: 0.002,
        };
        assert!(s.complete_run(run_id, &summary).unwrap());
        assert!(!s.fail_run(run_id).unwrap());
        assert!(!s.complete_run(run_id, &summary).unwrap());

        let run = s.get_run(run_id).unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.passed_tests, 1);
        assert_eq!(run.failed_tests, 1);
        assert!(run.completed_at.is_some());
    }

    #[test]
    fn test_list_runs_newest_first_with_paging() {
        let s = store();
        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(
                s.create_run(&NewRun {
                    name: format!("run {}", i),
                    trigger_source: "cli".into(),
                    ..Default::default()
                })
                .unwrap(),
            );
        }
        let runs = s.list_runs(0, 2).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, ids[2]);
        let rest = s.list_runs(2, 10).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, ids[0]);
    }

    #[test]
    fn test_result_nullable_fields_roundtrip() {
        let s = store();
        let case_id = s.upsert_test_case(&case("a", true)).unwrap();
        let run_id = s
            .create_run(&NewRun {
                name: "r".into(),
                trigger_source: "cli".into(),
                ..Default::default()
            })
            .unwrap();
        s.insert_result(&TestResultRecord {
            id: 0,
            test_run_id: run_id,
            test_case_id: case_id,
            input_prompt: "p".into(),
            expected_behavior: "e".into(),
            actual_output: None,
            severity_score: None,
            severity_label: None,
            change_type: Some(ChangeType::ResponseError),
            reasoning: Some("Response source failed: boom".into()),
            is_regression: false,
            judge_cost: 0.0,
            processing_time: 0.01,
            diff_hash: None,
            cached: false,
            created_at: String::new(),
        })
        .unwrap();

        let rows = s.results_for_run(run_id).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].severity_label.is_none());
        assert!(rows[0].actual_output.is_none());
        assert_eq!(rows[0].change_type, Some(ChangeType::ResponseError));
        assert!(!rows[0].created_at.is_empty());
    }
}
