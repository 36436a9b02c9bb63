use super::evaluator::{Completion, EvaluationRequest, Evaluator, Usage};
use super::source::ResponseSource;
use async_trait::async_trait;
use serde_json::json;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions client. Serves both as the live response source
/// and as the judge's evaluator.
pub struct OpenAiClient {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(model: String, api_key: String) -> Self {
        Self {
            model,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn chat(&self, body: serde_json::Value) -> anyhow::Result<serde_json::Value> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI chat API error ({}): {}", status, error_text);
        }

        Ok(resp.json().await?)
    }
}

fn message_content(json: &serde_json::Value) -> anyhow::Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("OpenAI API response missing content"))
}

#[async_trait]
impl ResponseSource for OpenAiClient {
    async fn get_response(&self, prompt: &str, model: &str) -> anyhow::Result<String> {
        let model = if model.is_empty() { &self.model } else { model };
        let body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        let json = self.chat(body).await?;
        message_content(&json)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[async_trait]
impl Evaluator for OpenAiClient {
    async fn complete(&self, req: &EvaluationRequest) -> anyhow::Result<Completion> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": req.system_prompt },
                { "role": "user", "content": req.user_prompt }
            ],
            "temperature": req.temperature,
        });
        if req.json_response {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let json = self.chat(body).await?;
        let content = message_content(&json)?;
        let total_tokens = json
            .pointer("/usage/total_tokens")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        Ok(Completion {
            content,
            usage: Usage { total_tokens },
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_content_extracts_first_choice() {
        let v = json!({"choices": [{"message": {"content": "{\"a\":1}"}}]});
        assert_eq!(message_content(&v).unwrap(), "{\"a\":1}");
        assert!(message_content(&json!({"choices": []})).is_err());
    }
}
