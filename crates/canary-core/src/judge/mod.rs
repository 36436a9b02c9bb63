//! LLM-as-judge: scores an actual output against the expected behavior.
//!
//! - `prompt.rs`: judge prompt text
//! - `parse.rs`: evaluator payload validation
//!
//! Verdicts are cached by fingerprint; evaluator failures degrade to
//! [`Verdict::evaluation_failed`] and are never cached.

use crate::fingerprint::{self, Fingerprint};
use crate::model::Verdict;
use crate::providers::evaluator::{EvaluationRequest, Evaluator};
use crate::storage::VerdictCache;
use std::sync::Arc;
use std::time::Duration;

mod parse;
mod prompt;


/// Approximate USD cost per judge token.
pub const DEFAULT_COST_PER_TOKEN: f64 = 0.000002;
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-3.5-turbo";

#[derive(Clone, Debug)]
pub struct JudgeConfig {
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub cost_per_token: f64,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_JUDGE_MODEL.to_string(),
            temperature: 0.1,
            timeout: Duration::from_secs(60),
            cost_per_token: DEFAULT_COST_PER_TOKEN,
        }
    }
}

#[derive(Clone)]
pub struct Judge {
    config: JudgeConfig,
    cache: VerdictCache,
    evaluator: Arc<dyn Evaluator>,
}

impl Judge {
    pub fn new(config: JudgeConfig, cache: VerdictCache, evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            config,
            cache,
            evaluator,
        }
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    pub fn fingerprint(
        &self,
        prompt: &str,
        expected_behavior: &str,
        actual_output: &str,
    ) -> Fingerprint {
        fingerprint::compute(prompt, expected_behavior, actual_output)
    }

    pub async fn evaluate(
        &self,
        prompt: &str,
        expected_behavior: &str,
        actual_output: &str,
    ) -> Verdict {
        let key = self.fingerprint(prompt, expected_behavior, actual_output);

        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(event = "judge.cache_hit", key = %key);
            return hit;
        }

        match self.call_evaluator(prompt, expected_behavior, actual_output).await {
            Ok(verdict) => {
                self.cache.put(&key, &verdict);
                verdict
            }
            Err(e) => {
                tracing::warn!(
                    event = "judge.fallback",
                    key = %key,
                    provider = self.evaluator.provider_name(),
                    error = %e,
                    "judge evaluation failed; returning degraded verdict"
                );
                Verdict::evaluation_failed(format!("{:#}", e))
            }
        }
    }

    async fn call_evaluator(
        &self,
        prompt: &str,
        expected_behavior: &str,
        actual_output: &str,
    ) -> anyhow::Result<Verdict> {
        let req = EvaluationRequest {
            system_prompt: prompt::SYSTEM_PROMPT.to_string(),
            user_prompt: prompt::build_prompt(prompt, expected_behavior, actual_output),
            temperature: self.config.temperature,
            json_response: true,
        };

        let completion = tokio::time::timeout(self.config.timeout, self.evaluator.complete(&req))
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "evaluator timed out after {}s",
                    self.config.timeout.as_secs_f64()
                )
            })??;

        let payload = parse::parse_payload(&completion.content)?;
        Ok(Verdict {
            severity_score: payload.severity_score,
            severity_label: payload.severity_label,
            change_type: payload.change_type,
            reasoning: payload.reasoning,
            is_regression: payload.is_regression,
            judge_cost: completion.usage.total_tokens as f64 * self.config.cost_per_token,
            cached: false,
        })
    }
}
