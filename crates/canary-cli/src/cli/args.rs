use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "canary",
    version,
    about = "Regression harness for LLM outputs, graded by an LLM judge"
)]
pub struct Cli {
    /// SQLite database holding cases, runs, results and the verdict cache
    #[arg(long, global = true, env = "CANARY_DB", default_value = ".canary/canary.db")]
    pub db: PathBuf,

    /// Emit logs as JSON lines (stderr)
    #[arg(long, global = true, env = "CANARY_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    Init(InitArgs),
    Cases(CasesArgs),
    Run(RunArgs),
    Runs(RunsArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "canary.yaml")]
    pub config: PathBuf,

    /// also write a fixture file answering the sample prompts
    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    /// generate .gitignore for the database directory
    #[arg(long)]
    pub gitignore: bool,
}

#[derive(Parser, Clone)]
pub struct CasesArgs {
    #[command(subcommand)]
    pub cmd: CasesSub,
}

#[derive(Subcommand, Clone)]
pub enum CasesSub {
    /// Upsert every case of a suite file (matched by name)
    Import {
        #[arg(long, default_value = "canary.yaml")]
        config: PathBuf,
    },
    /// In import order
    List {
        /// include inactive cases
        #[arg(long)]
        all: bool,
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    Show {
        name: String,
    },
    Activate {
        name: String,
    },
    Deactivate {
        name: String,
    },
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    /// import this suite before starting the run
    #[arg(long)]
    pub suite: Option<PathBuf>,

    /// run name (default: "Test Run <date> <time>")
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, env = "CANARY_GIT_COMMIT")]
    pub git_commit: Option<String>,

    #[arg(long, env = "CANARY_GIT_BRANCH")]
    pub git_branch: Option<String>,

    #[arg(long, default_value = "cli")]
    pub trigger: String,

    /// max cases evaluated concurrently (1 = sequential)
    #[arg(long, default_value_t = 1)]
    pub parallel: usize,

    /// write the run report as JSON
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// OpenAI-compatible endpoint for the openai source and judge
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub openai_base_url: Option<String>,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub judge: JudgeArgs,
}

#[derive(clap::Args, Clone)]
pub struct SourceArgs {
    /// Where the output under test comes from
    /// - builtin: reference answers for the sample suite
    /// - fixtures: prompt -> response table from --fixtures
    /// - openai: live chat completion (needs OPENAI_API_KEY)
    #[arg(long, default_value = "builtin", env = "CANARY_SOURCE")]
    pub source: String,

    #[arg(long)]
    pub fixtures: Option<PathBuf>,

    /// model under test (default: the suite's `model`, then gpt-3.5-turbo)
    #[arg(long, env = "CANARY_MODEL")]
    pub model: Option<String>,

    #[arg(long, default_value_t = 30)]
    pub source_timeout_secs: u64,
}

#[derive(clap::Args, Clone)]
pub struct JudgeArgs {
    /// Judge backend
    /// - fake: deterministic offline judge (tests/dev)
    /// - openai: live judge calls via OpenAI (needs OPENAI_API_KEY)
    #[arg(long, default_value = "fake", env = "CANARY_JUDGE")]
    pub judge: String,

    #[arg(long, default_value = "gpt-3.5-turbo", env = "CANARY_JUDGE_MODEL")]
    pub judge_model: String,

    #[arg(long, default_value_t = 60)]
    pub judge_timeout_secs: u64,

    /// USD per judge token used for cost accounting
    #[arg(long, default_value_t = canary_core::judge::DEFAULT_COST_PER_TOKEN)]
    pub cost_per_token: f64,
}

#[derive(Parser, Clone)]
pub struct RunsArgs {
    #[command(subcommand)]
    pub cmd: RunsSub,
}

#[derive(Subcommand, Clone)]
pub enum RunsSub {
    /// Newest first
    List {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
    Show {
        run_id: i64,
        /// print the report as JSON on stdout
        #[arg(long)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
