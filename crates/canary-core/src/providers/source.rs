use crate::errors::ConfigError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Produces the model output under test for a prompt.
#[async_trait]
pub trait ResponseSource: Send + Sync {
    async fn get_response(&self, prompt: &str, model: &str) -> anyhow::Result<String>;
    fn provider_name(&self) -> &'static str;
}

pub const FIXTURE_MISS_RESPONSE: &str = "I don't have a response for that question.";

/// Deterministic prompt -> response table.
///
/// Unknown prompts get [`FIXTURE_MISS_RESPONSE`], mirroring how an untrained
/// model deflects.
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    responses: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct FixtureFile {
    responses: HashMap<String, String>,
}

impl FixtureSource {
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self { responses }
    }

    /// Reference answers for the sample suite written by `canary init`.
    pub fn builtin() -> Self {
        let responses = [
            (
                "What is the capital of France?",
                "Paris is the capital of France.",
            ),
            ("What is 2+2?", "The answer is 4."),
            (
                "Tell me about quantum computing",
                "Quantum computing uses quantum bits to process information in ways classical computers cannot.",
            ),
        ]
        .into_iter()
        .map(|(p, r)| (p.to_string(), r.to_string()))
        .collect();
        Self { responses }
    }

    /// Loads `responses:` from a YAML or JSON file (JSON is valid YAML).
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError(format!("failed to read fixtures {}: {}", path.display(), e))
        })?;
        let file: FixtureFile = serde_yaml::from_str(&raw).map_err(|e| {
            ConfigError(format!(
                "failed to parse fixtures {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::new(file.responses))
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

#[async_trait]
impl ResponseSource for FixtureSource {
    async fn get_response(&self, prompt: &str, _model: &str) -> anyhow::Result<String> {
        Ok(self
            .responses
            .get(prompt)
            .cloned()
            .unwrap_or_else(|| FIXTURE_MISS_RESPONSE.to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "fixture"
    }
}
