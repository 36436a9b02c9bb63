pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS test_cases (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL UNIQUE,
  description TEXT,
  input_prompt TEXT NOT NULL,
  expected_behavior TEXT NOT NULL,
  category TEXT,
  is_active INTEGER NOT NULL DEFAULT 1,
  metadata_json TEXT,
  created_at TEXT NOT NULL,
  updated_at TEXT
);

CREATE TABLE IF NOT EXISTS test_runs (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  status TEXT NOT NULL,
  trigger_source TEXT NOT NULL,
  git_commit TEXT,
  git_branch TEXT,
  judge_model_used TEXT,
  total_tests INTEGER NOT NULL DEFAULT 0,
  passed_tests INTEGER NOT NULL DEFAULT 0,
  failed_tests INTEGER NOT NULL DEFAULT 0,
  total_cost REAL NOT NULL DEFAULT 0.0,
  created_at TEXT NOT NULL,
  completed_at TEXT
);

CREATE TABLE IF NOT EXISTS test_results (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  test_run_id INTEGER NOT NULL REFERENCES test_runs(id),
  test_case_id INTEGER NOT NULL REFERENCES test_cases(id),
  input_prompt TEXT NOT NULL,
  expected_behavior TEXT NOT NULL,
  actual_output TEXT,
  severity_score REAL,
  severity_label TEXT,
  change_type TEXT,
  reasoning TEXT,
  is_regression INTEGER NOT NULL DEFAULT 0,
  judge_cost REAL NOT NULL DEFAULT 0.0,
  processing_time REAL,
  diff_hash TEXT,
  cached INTEGER NOT NULL DEFAULT 0,
  created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_test_results_run ON test_results(test_run_id);
CREATE INDEX IF NOT EXISTS idx_test_results_diff_hash ON test_results(diff_hash);

CREATE TABLE IF NOT EXISTS verdict_cache (
  key TEXT PRIMARY KEY,
  payload_json TEXT NOT NULL,
  created_at_ms INTEGER NOT NULL,
  expires_at_ms INTEGER NOT NULL
);
"#;
