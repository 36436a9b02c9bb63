use crate::model::{TestCase, TestRun};
use crate::report::RunReport;

fn score_str(score: Option<f64>) -> String {
    score
        .map(|s| format!("{:.2}", s))
        .unwrap_or_else(|| "--".into())
}

pub fn print_run_header(run: &TestRun) {
    eprintln!("Run #{} \"{}\" [{}]", run.id, run.name, run.status);
    eprintln!(
        "  trigger: {}  commit: {}  branch: {}",
        run.trigger_source,
        run.git_commit.as_deref().unwrap_or("-"),
        run.git_branch.as_deref().unwrap_or("-")
    );
    eprintln!(
        "  tests: {} total, {} passed, {} failed  cost: ${:.6}",
        run.total_tests, run.passed_tests, run.failed_tests, run.total_cost
    );
    eprintln!(
        "  created: {}  completed: {}",
        run.created_at,
        run.completed_at.as_deref().unwrap_or("-")
    );
}

pub fn print_report(report: &RunReport) {
    print_run_header(&report.test_run);
    eprintln!();
    for r in &report.results {
        let label = r.severity_label.map(|l| l.as_str()).unwrap_or("unknown");
        let change = r.change_type.map(|c| c.as_str()).unwrap_or("-");
        let regression = if r.is_regression { " REGRESSION" } else { "" };
        eprintln!(
            "#{:<5} case {:<5} {}  {:<8} {}{}",
            r.id,
            r.test_case_id,
            score_str(r.severity_score),
            label,
            change,
            regression
        );
        if let Some(reasoning) = &r.reasoning {
            eprintln!("      {}", reasoning);
        }
    }

    eprintln!();
    let counts = report
        .summary
        .severity_counts
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");
    eprintln!(
        "Severity: {}  regressions: {}",
        if counts.is_empty() { "-".into() } else { counts },
        report.summary.regression_count
    );
}

pub fn print_runs(runs: &[TestRun]) {
    if runs.is_empty() {
        eprintln!("no runs recorded");
        return;
    }
    for run in runs {
        eprintln!(
            "#{:<5} {:<10} {:>3}/{:<3} passed  ${:.6}  {}  {}",
            run.id,
            run.status.as_str(),
            run.passed_tests,
            run.total_tests,
            run.total_cost,
            run.created_at,
            run.name
        );
    }
}

pub fn print_cases(cases: &[TestCase]) {
    if cases.is_empty() {
        eprintln!("no test cases");
        return;
    }
    for tc in cases {
        eprintln!(
            "{} {:<28} {:<12} {}",
            if tc.is_active { "●" } else { "○" },
            tc.name,
            tc.category.as_deref().unwrap_or("-"),
            tc.input_prompt
        );
    }
}

pub fn print_case(tc: &TestCase) {
    eprintln!(
        "Case #{} \"{}\" [{}]",
        tc.id,
        tc.name,
        if tc.is_active { "active" } else { "inactive" }
    );
    eprintln!("  category: {}", tc.category.as_deref().unwrap_or("-"));
    if let Some(description) = &tc.description {
        eprintln!("  description: {}", description);
    }
    eprintln!("  prompt: {}", tc.input_prompt);
    eprintln!("  expected: {}", tc.expected_behavior);
    if let Some(metadata) = &tc.metadata {
        eprintln!("  metadata: {}", metadata);
    }
}
