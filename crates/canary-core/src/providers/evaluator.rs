use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    /// Ask the provider to constrain output to a JSON object.
    pub json_response: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub total_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    pub usage: Usage,
}

/// Text-generating model used by the judge to score a response.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn complete(&self, req: &EvaluationRequest) -> anyhow::Result<Completion>;
    fn provider_name(&self) -> &'static str;
}

/// Offline evaluator for local runs and CI smoke tests.
///
/// Always reports "no meaningful change"; token usage scales with request
/// size so cost accounting still moves.
#[derive(Debug, Clone, Default)]
pub struct FakeEvaluator;

impl FakeEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Evaluator for FakeEvaluator {
    async fn complete(&self, req: &EvaluationRequest) -> anyhow::Result<Completion> {
        let content = json!({
            "severity_score": 0.0,
            "severity_label": "none",
            "change_type": "style_change",
            "reasoning": "fake evaluator: no semantic difference assessed",
            "is_regression": false
        })
        .to_string();
        let chars = req.system_prompt.len() + req.user_prompt.len() + content.len();
        Ok(Completion {
            content,
            usage: Usage {
                total_tokens: chars.div_ceil(4) as u64,
            },
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_evaluator_reports_usage() {
        let req = EvaluationRequest {
            system_prompt: "sys".into(),
            user_prompt: "user prompt".into(),
            temperature: 0.1,
            json_response: true,
        };
        let c = FakeEvaluator::new().complete(&req).await.unwrap();
        assert!(c.usage.total_tokens > 0);
        let v: serde_json::Value = serde_json::from_str(&c.content).unwrap();
        assert_eq!(v["severity_label"], "none");
    }
}
