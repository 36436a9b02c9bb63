pub const SAMPLE_FIXTURES_YAML: &str = r#"# prompt -> response table used by `canary run --source fixtures`
responses:
  "What is the capital of France?": "Paris is the capital of France."
  "What is 2+2?": "The answer is 4."
  "Tell me about quantum computing": "Quantum computing uses quantum bits to process information in ways classical computers cannot."
"#;

pub const GITIGNORE: &str = "/.canary/\n*.db\n*.db-shm\n*.db-wal\n/canary-report.json\n";
