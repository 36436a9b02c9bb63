use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered severity scale emitted by the judge (`none < low < ... < critical`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLabel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLabel::None => "none",
            SeverityLabel::Low => "low",
            SeverityLabel::Medium => "medium",
            SeverityLabel::High => "high",
            SeverityLabel::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(SeverityLabel::None),
            "low" => Some(SeverityLabel::Low),
            "medium" => Some(SeverityLabel::Medium),
            "high" => Some(SeverityLabel::High),
            "critical" => Some(SeverityLabel::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for SeverityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    FactualError,
    StyleChange,
    Refusal,
    Hallucination,
    SafetyIssue,
    FormatChange,
    ContentOmission,
    ContentAddition,
    /// Judge fallback; never accepted from an evaluator payload.
    EvaluationError,
    /// Response source failed before the judge ran; never accepted from an evaluator payload.
    ResponseError,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::FactualError => "factual_error",
            ChangeType::StyleChange => "style_change",
            ChangeType::Refusal => "refusal",
            ChangeType::Hallucination => "hallucination",
            ChangeType::SafetyIssue => "safety_issue",
            ChangeType::FormatChange => "format_change",
            ChangeType::ContentOmission => "content_omission",
            ChangeType::ContentAddition => "content_addition",
            ChangeType::EvaluationError => "evaluation_error",
            ChangeType::ResponseError => "response_error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "factual_error" => Some(ChangeType::FactualError),
            "style_change" => Some(ChangeType::StyleChange),
            "refusal" => Some(ChangeType::Refusal),
            "hallucination" => Some(ChangeType::Hallucination),
            "safety_issue" => Some(ChangeType::SafetyIssue),
            "format_change" => Some(ChangeType::FormatChange),
            "content_omission" => Some(ChangeType::ContentOmission),
            "content_addition" => Some(ChangeType::ContentAddition),
            "evaluation_error" => Some(ChangeType::EvaluationError),
            "response_error" => Some(ChangeType::ResponseError),
            _ => None,
        }
    }

    /// Values only the pipeline itself may produce.
    pub fn is_reserved(&self) -> bool {
        matches!(self, ChangeType::EvaluationError | ChangeType::ResponseError)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured judge output for one (prompt, expected, actual) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub severity_score: f64,
    pub severity_label: SeverityLabel,
    pub change_type: ChangeType,
    pub reasoning: String,
    pub is_regression: bool,
    pub judge_cost: f64,
    /// True only when the verdict was served from the cache.
    #[serde(default)]
    pub cached: bool,
}

impl Verdict {
    /// Degraded verdict returned when the evaluator fails. Never cached.
    pub fn evaluation_failed(cause: impl fmt::Display) -> Self {
        Self {
            severity_score: 0.5,
            severity_label: SeverityLabel::Medium,
            change_type: ChangeType::EvaluationError,
            reasoning: format!("Judge evaluation failed: {}", cause),
            is_regression: false,
            judge_cost: 0.0,
            cached: false,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.change_type == ChangeType::EvaluationError
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(RunStatus::Running),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub input_prompt: String,
    pub expected_behavior: String,
    #[serde(default)]
    pub category: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Test case as authored in a suite file, before the store assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTestCase {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub input_prompt: String,
    pub expected_behavior: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRun {
    pub id: i64,
    pub name: String,
    pub status: RunStatus,
    pub trigger_source: String,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub judge_model_used: Option<String>,
    pub total_tests: u32,
    pub passed_tests: u32,
    pub failed_tests: u32,
    pub total_cost: f64,
    pub created_at: String,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewRun {
    pub name: String,
    pub trigger_source: String,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    pub judge_model_used: Option<String>,
    pub total_tests: u32,
}

/// One persisted evaluation of a test case within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResultRecord {
    /// Store id; zero until inserted.
    #[serde(default)]
    pub id: i64,
    pub test_run_id: i64,
    pub test_case_id: i64,
    pub input_prompt: String,
    pub expected_behavior: String,
    pub actual_output: Option<String>,
    pub severity_score: Option<f64>,
    pub severity_label: Option<SeverityLabel>,
    pub change_type: Option<ChangeType>,
    pub reasoning: Option<String>,
    pub is_regression: bool,
    pub judge_cost: f64,
    pub processing_time: f64,
    pub diff_hash: Option<String>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub created_at: String,
}

/// Lightweight per-case record returned by the executor for immediate reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub test_case_id: i64,
    pub test_case_name: String,
    pub severity_score: Option<f64>,
    pub severity_label: Option<SeverityLabel>,
    pub is_regression: bool,
    pub cached: bool,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuiteSummary {
    pub total_tests: u32,
    pub passed_tests: u32,
    pub failed_tests: u32,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteOutcome {
    pub results: Vec<ResultSummary>,
    pub summary: SuiteSummary,
}
