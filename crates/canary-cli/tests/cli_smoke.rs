use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn canary(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("canary").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("CANARY_DB")
        .env_remove("CANARY_JUDGE")
        .env_remove("CANARY_SOURCE")
        .env_remove("CANARY_MODEL")
        .env("CANARY_LOG", "warn");
    cmd
}

#[test]
fn test_version() {
    let dir = TempDir::new().unwrap();
    canary(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_init_import_run_and_inspect() {
    let dir = TempDir::new().unwrap();

    canary(&dir)
        .args(["init", "--fixtures", "fixtures.yaml"])
        .assert()
        .success()
        .stderr(contains("created canary.yaml"));
    assert!(dir.path().join(".canary/canary.db").exists());

    canary(&dir)
        .args(["cases", "import", "--config", "canary.yaml"])
        .assert()
        .success()
        .stderr(contains("imported 4 cases"));

    canary(&dir)
        .args(["run", "--judge", "fake", "--source", "fixtures", "--fixtures", "fixtures.yaml"])
        .args(["--out", "out/report.json"])
        .assert()
        .success()
        .stderr(contains("run #1 started: 3 tests"))
        .stderr(contains("none=3"));

    let report = std::fs::read_to_string(dir.path().join("out/report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["test_run"]["status"], "completed");
    assert_eq!(report["test_run"]["passed_tests"], 3);
    assert_eq!(report["summary"]["regression_count"], 0);

    // identical outputs: every verdict comes from the cache
    let out = canary(&dir)
        .args(["runs", "show", "1", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let first: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

    canary(&dir).args(["run", "--judge", "fake"]).assert().success();
    let out = canary(&dir)
        .args(["runs", "show", "2", "--json"])
        .output()
        .unwrap();
    let second: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let results = second["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r["cached"] == true));
    assert_eq!(
        first["test_run"]["total_cost"],
        second["test_run"]["total_cost"]
    );

    canary(&dir)
        .args(["runs", "list"])
        .assert()
        .success()
        .stderr(contains("#2"))
        .stderr(contains("completed"));
}

#[test]
fn test_run_without_cases_is_config_error() {
    let dir = TempDir::new().unwrap();
    canary(&dir)
        .args(["run", "--judge", "fake"])
        .assert()
        .code(2)
        .stderr(contains("No active test cases found"));
}

#[test]
fn test_unknown_judge_is_config_error() {
    let dir = TempDir::new().unwrap();
    canary(&dir)
        .args(["run", "--judge", "oracle"])
        .assert()
        .code(2)
        .stderr(contains("unknown judge 'oracle'"));
}

#[test]
fn test_deactivate_unknown_case() {
    let dir = TempDir::new().unwrap();
    canary(&dir)
        .args(["cases", "deactivate", "nope"])
        .assert()
        .code(2)
        .stderr(contains("no test case named 'nope'"));
}

#[test]
fn test_model_comes_from_flag_then_suite_then_default() {
    let dir = TempDir::new().unwrap();
    canary(&dir).arg("init").assert().success();

    canary(&dir)
        .args(["cases", "import", "--config", "canary.yaml"])
        .assert()
        .success();
    canary(&dir)
        .args(["run", "--judge", "fake"])
        .assert()
        .success()
        .stderr(contains("(model gpt-3.5-turbo)"));

    let suite = std::fs::read_to_string(dir.path().join("canary.yaml"))
        .unwrap()
        .replace("model: gpt-3.5-turbo", "model: suite-model-x");
    std::fs::write(dir.path().join("suite.yaml"), suite).unwrap();

    canary(&dir)
        .args(["run", "--judge", "fake", "--suite", "suite.yaml"])
        .assert()
        .success()
        .stderr(contains("(model suite-model-x)"));

    canary(&dir)
        .args(["run", "--judge", "fake", "--suite", "suite.yaml", "--model", "flag-model-y"])
        .assert()
        .success()
        .stderr(contains("(model flag-model-y)"));
}

#[test]
fn test_cases_list_pages_and_show() {
    let dir = TempDir::new().unwrap();
    canary(&dir).arg("init").assert().success();
    canary(&dir)
        .args(["cases", "import", "--config", "canary.yaml"])
        .assert()
        .success();

    let out = canary(&dir)
        .args(["cases", "list", "--all", "--skip", "1", "--limit", "2"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let listed = String::from_utf8(out.stderr).unwrap();
    assert!(!listed.contains("capital_of_france"));
    assert!(listed.contains("simple_arithmetic"));
    assert!(listed.contains("quantum_overview"));
    assert!(!listed.contains("medical_dosage"));

    canary(&dir)
        .args(["cases", "show", "medical_dosage"])
        .assert()
        .success()
        .stderr(contains("[inactive]"))
        .stderr(contains("How much ibuprofen can I take?"));

    canary(&dir)
        .args(["cases", "show", "nope"])
        .assert()
        .code(2)
        .stderr(contains("no test case named 'nope'"));
}

#[test]
fn test_openai_base_url_is_used_by_the_source() {
    let dir = TempDir::new().unwrap();
    canary(&dir).arg("init").assert().success();
    canary(&dir)
        .args(["cases", "import", "--config", "canary.yaml"])
        .assert()
        .success();

    // nothing listens on port 9: every case degrades to a response error
    canary(&dir)
        .env("OPENAI_API_KEY", "sk-test")
        .args(["run", "--judge", "fake", "--source", "openai"])
        .args(["--openai-base-url", "http://127.0.0.1:9/v1", "--source-timeout-secs", "5"])
        .args(["--out", "report.json"])
        .assert()
        .code(1);

    let report = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["test_run"]["status"], "completed");
    assert_eq!(report["test_run"]["failed_tests"], 3);
    assert!(report["results"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["change_type"] == "response_error"));
}
