use thiserror::Error;

#[derive(Debug, Error)]
#[error("ConfigError: {0}")]
pub struct ConfigError(pub String);

/// Precondition failures when starting a run. No run row exists when these are returned.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("No active test cases found")]
    NoActiveTestCases,
    #[error("failed to create test run: {0}")]
    Store(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_one_line() {
        assert_eq!(
            StartError::NoActiveTestCases.to_string(),
            "No active test cases found"
        );
        assert_eq!(
            ConfigError("suite has no cases".into()).to_string(),
            "ConfigError: suite has no cases"
        );
    }
}
