use super::args::*;
use canary_core::config::SuiteConfig;
use canary_core::engine::{ExecutorPolicy, RunSupervisor, StartRequest, SuiteExecutor};
use canary_core::errors::{ConfigError, StartError};
use canary_core::judge::{Judge, JudgeConfig};
use canary_core::model::RunStatus;
use canary_core::providers::openai::OpenAiClient;
use canary_core::providers::{Evaluator, FakeEvaluator, FixtureSource, ResponseSource};
use canary_core::report::{self, console};
use canary_core::storage::{Store, VerdictCache};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const TEST_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => cmd_init(&cli.db, args),
        Command::Cases(args) => cmd_cases(&cli.db, args),
        Command::Run(args) => cmd_run(&cli.db, args).await,
        Command::Runs(args) => cmd_runs(&cli.db, args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_init(db: &Path, args: InitArgs) -> anyhow::Result<i32> {
    if !args.config.exists() {
        ensure_parent_dir(&args.config)?;
        canary_core::config::write_sample_suite(&args.config)?;
        eprintln!("created {}", args.config.display());
    } else {
        eprintln!("note: {} already exists", args.config.display());
    }

    if let Some(path) = &args.fixtures {
        write_file_if_missing(path, crate::templates::SAMPLE_FIXTURES_YAML)?;
    }
    if args.gitignore {
        write_file_if_missing(Path::new(".gitignore"), crate::templates::GITIGNORE)?;
    }

    open_store(db)?;
    eprintln!(
        "next: canary cases import --config {} && canary run",
        args.config.display()
    );
    Ok(exit_codes::OK)
}

fn cmd_cases(db: &Path, args: CasesArgs) -> anyhow::Result<i32> {
    let store = open_store(db)?;
    match args.cmd {
        CasesSub::Import { config } => {
            let n = import_suite(&store, &config)?.1;
            eprintln!("imported {} cases from {}", n, config.display());
        }
        CasesSub::List { all, skip, limit } => {
            console::print_cases(&store.page_test_cases(!all, skip, limit)?);
        }
        CasesSub::Show { name } => {
            let Some(tc) = store.get_test_case(&name)? else {
                eprintln!("config error: no test case named '{}'", name);
                return Ok(exit_codes::CONFIG_ERROR);
            };
            console::print_case(&tc);
        }
        CasesSub::Activate { name } => return set_active(&store, &name, true),
        CasesSub::Deactivate { name } => return set_active(&store, &name, false),
    }
    Ok(exit_codes::OK)
}

fn set_active(store: &Store, name: &str, active: bool) -> anyhow::Result<i32> {
    if !store.set_test_case_active(name, active)? {
        eprintln!("config error: no test case named '{}'", name);
        return Ok(exit_codes::CONFIG_ERROR);
    }
    eprintln!(
        "{} {}",
        if active { "activated" } else { "deactivated" },
        name
    );
    Ok(exit_codes::OK)
}

async fn cmd_run(db: &Path, args: RunArgs) -> anyhow::Result<i32> {
    let store = open_store(db)?;

    let suite = match &args.suite {
        Some(path) => {
            let (cfg, n) = import_suite(&store, path)?;
            eprintln!("imported {} cases from {}", n, path.display());
            Some(cfg)
        }
        None => None,
    };
    let model = canary_core::config::resolve_model(args.source.model.as_deref(), suite.as_ref());
    let base_url = args.openai_base_url.as_deref();

    let evaluator = build_evaluator(&args.judge, base_url)?;
    let source = build_source(&args.source, &model, base_url)?;

    let judge = Judge::new(
        JudgeConfig {
            model: args.judge.judge_model.clone(),
            timeout: Duration::from_secs(args.judge.judge_timeout_secs),
            cost_per_token: args.judge.cost_per_token,
            ..JudgeConfig::default()
        },
        VerdictCache::new(store.clone()),
        evaluator,
    );
    let policy = ExecutorPolicy {
        model: model.clone(),
        source_timeout: Duration::from_secs(args.source.source_timeout_secs),
        parallel: args.parallel,
    };
    let executor = SuiteExecutor::new(store.clone(), judge, source, policy);
    let supervisor = RunSupervisor::new(store.clone(), executor);

    let handle = match supervisor
        .start(StartRequest {
            name: args.name,
            git_commit: args.git_commit,
            git_branch: args.git_branch,
            trigger_source: args.trigger,
        })
        .await
    {
        Ok(h) => h,
        Err(StartError::NoActiveTestCases) => {
            eprintln!("config error: No active test cases found (try `canary cases import`)");
            return Ok(exit_codes::CONFIG_ERROR);
        }
        Err(e) => return Err(e.into()),
    };

    let run_id = handle.run_id;
    eprintln!(
        "run #{} {}: {} tests (model {})",
        run_id,
        handle.status(),
        handle.total_tests,
        model
    );

    let abort = handle.abort_handle();
    let wait = handle.wait();
    tokio::pin!(wait);
    let status = tokio::select! {
        status = &mut wait => status,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("interrupted: cancelling run #{}", run_id);
            abort.abort();
            wait.await
        }
    };

    let Some(report) = report::build_report(&store, run_id)? else {
        anyhow::bail!("run #{} disappeared from the store", run_id);
    };
    eprintln!();
    console::print_report(&report);
    if let Some(out) = &args.out {
        report::json::write_json(&report, out)?;
        eprintln!("wrote {}", out.display());
    }

    Ok(match status {
        RunStatus::Completed if report.test_run.failed_tests == 0 => exit_codes::OK,
        _ => exit_codes::TEST_FAILED,
    })
}

fn cmd_runs(db: &Path, args: RunsArgs) -> anyhow::Result<i32> {
    let store = open_store(db)?;
    match args.cmd {
        RunsSub::List { skip, limit } => {
            console::print_runs(&store.list_runs(skip, limit)?);
        }
        RunsSub::Show { run_id, json, out } => {
            let Some(report) = report::build_report(&store, run_id)? else {
                eprintln!("config error: run #{} not found", run_id);
                return Ok(exit_codes::CONFIG_ERROR);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                console::print_report(&report);
            }
            if let Some(out) = &out {
                report::json::write_json(&report, out)?;
                eprintln!("wrote {}", out.display());
            }
        }
    }
    Ok(exit_codes::OK)
}

fn build_evaluator(args: &JudgeArgs, base_url: Option<&str>) -> anyhow::Result<Arc<dyn Evaluator>> {
    match args.judge.as_str() {
        "fake" => Ok(Arc::new(FakeEvaluator::new())),
        "openai" => Ok(Arc::new(openai_client(&args.judge_model, base_url)?)),
        other => Err(ConfigError(format!(
            "unknown judge '{}' (expected fake|openai)",
            other
        ))
        .into()),
    }
}

fn build_source(
    args: &SourceArgs,
    model: &str,
    base_url: Option<&str>,
) -> anyhow::Result<Arc<dyn ResponseSource>> {
    match args.source.as_str() {
        "builtin" => Ok(Arc::new(FixtureSource::builtin())),
        "fixtures" => {
            let Some(path) = &args.fixtures else {
                return Err(ConfigError("--source fixtures requires --fixtures <path>".into()).into());
            };
            let fixtures = FixtureSource::from_path(path)?;
            tracing::debug!(event = "source.fixtures_loaded", path = %path.display(), count = fixtures.len());
            Ok(Arc::new(fixtures))
        }
        "openai" => Ok(Arc::new(openai_client(model, base_url)?)),
        other => Err(ConfigError(format!(
            "unknown source '{}' (expected builtin|fixtures|openai)",
            other
        ))
        .into()),
    }
}

fn openai_client(model: &str, base_url: Option<&str>) -> Result<OpenAiClient, ConfigError> {
    let client = OpenAiClient::new(model.to_string(), openai_api_key()?);
    Ok(match base_url {
        Some(url) => client.with_base_url(url),
        None => client,
    })
}

fn openai_api_key() -> Result<String, ConfigError> {
    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ConfigError("OPENAI_API_KEY is not set".into()))
}

fn import_suite(store: &Store, path: &Path) -> anyhow::Result<(SuiteConfig, usize)> {
    let cfg = canary_core::config::load_suite(path)?;
    let n = canary_core::config::import_suite(store, &cfg)?;
    Ok((cfg, n))
}

fn open_store(db: &Path) -> anyhow::Result<Store> {
    ensure_parent_dir(db)?;
    let store = Store::open(db)?;
    store.init_schema()?;
    Ok(store)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    if !path.exists() {
        std::fs::write(path, content)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists (skipped)", path.display());
    }
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
