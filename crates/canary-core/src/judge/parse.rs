use crate::model::{ChangeType, SeverityLabel};
use serde::Deserialize;

/// Validated evaluator payload. Every field is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct JudgePayload {
    pub severity_score: f64,
    pub severity_label: SeverityLabel,
    pub change_type: ChangeType,
    pub reasoning: String,
    pub is_regression: bool,
}

pub(crate) fn parse_payload(text: &str) -> anyhow::Result<JudgePayload> {
    let text = text.trim();
    let start = text
        .find('{')
        .ok_or_else(|| anyhow::anyhow!("no JSON object found in judge output"))?;

    let val: serde_json::Value = serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<serde_json::Value>()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no JSON object found in judge output"))?
        .map_err(|e| anyhow::anyhow!("invalid JSON: {}", e))?;

    let payload: JudgePayload = serde_json::from_value(val)
        .map_err(|e| anyhow::anyhow!("judge payload rejected: {}", e))?;

    if !payload.severity_score.is_finite() || !(0.0..=1.0).contains(&payload.severity_score) {
        anyhow::bail!(
            "judge payload rejected: severity_score {} outside [0, 1]",
            payload.severity_score
        );
    }
    if payload.change_type.is_reserved() {
        anyhow::bail!(
            "judge payload rejected: change_type '{}' is reserved",
            payload.change_type
        );
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"{"severity_score": 0.8, "severity_label": "high", "change_type": "factual_error", "reasoning": "wrong city", "is_regression": true}"#;

    #[test]
    fn test_parses_valid_payload() {
        let p = parse_payload(GOOD).unwrap();
        assert_eq!(p.severity_label, SeverityLabel::High);
        assert_eq!(p.change_type, ChangeType::FactualError);
        assert!(p.is_regression);
    }

    #[test]
    fn test_tolerates_surrounding_prose() {
        let text = format!("Here is my verdict:\n{}\nThanks", GOOD);
        assert_eq!(parse_payload(&text).unwrap().severity_score, 0.8);
    }

    #[test]
    fn test_rejects_missing_field() {
        let text = r#"{"severity_score": 0.1, "severity_label": "low", "change_type": "style_change", "reasoning": "x"}"#;
        assert!(parse_payload(text).is_err());
    }

    #[test]
    fn test_rejects_out_of_enum_values() {
        let bad_label = GOOD.replace("\"high\"", "\"severe\"");
        assert!(parse_payload(&bad_label).is_err());
        let bad_type = GOOD.replace("factual_error", "typo");
        assert!(parse_payload(&bad_type).is_err());
        let reserved = GOOD.replace("factual_error", "evaluation_error");
        assert!(parse_payload(&reserved).is_err());
    }

    #[test]
    fn test_rejects_score_out_of_range() {
        let text = GOOD.replace("0.8", "1.5");
        assert!(parse_payload(&text).is_err());
        let text = GOOD.replace("0.8", "-0.1");
        assert!(parse_payload(&text).is_err());
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(parse_payload("I think it is fine").is_err());
        assert!(parse_payload("{not json").is_err());
    }
}
