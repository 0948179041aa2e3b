use anyhow::{Context, Result};
use bench_runner::config::DEFAULT_CONFIG_FILE;
use bench_runner::{AlgorithmReport, CheckerKind, Experiment, HarnessConfig, RunOptions, Rundir};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "bench", version, about = "Algorithm benchmarking harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CheckerArg {
    #[value(name = "time")]
    Time,
    #[value(name = "steps")]
    Steps,
}

impl From<CheckerArg> for CheckerKind {
    fn from(value: CheckerArg) -> Self {
        match value {
            CheckerArg::Time => CheckerKind::Time,
            CheckerArg::Steps => CheckerKind::Steps,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and run every algorithm against every test.
    Run {
        experiment: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = CheckerArg::Time)]
        checker: CheckerArg,
        #[arg(long)]
        rundir: Option<PathBuf>,
        #[arg(long)]
        keep_individual_results: bool,
        #[arg(long)]
        json: bool,
    },
    Describe {
        experiment: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write a configuration file with every default spelled out.
    Init {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json_mode = command_json_mode(&cli.command);
    match run_command(cli.command) {
        Ok(Some(payload)) => {
            emit_json(&payload);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            if json_mode {
                emit_json(&json_error("command_failed", format!("{err:#}"), json!({})));
                std::process::exit(1);
            }
            Err(err)
        }
    }
}

fn run_command(command: Commands) -> Result<Option<Value>> {
    match command {
        Commands::Run {
            experiment,
            config,
            checker,
            rundir,
            keep_individual_results,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(rundir) = rundir {
                config.rundir = rundir;
            }
            if keep_individual_results {
                config.keep_individual_results = true;
            }
            let cwd = std::env::current_dir()?;
            config.resolve_paths(&cwd);

            let exp = Experiment::open(&experiment)
                .with_context(|| format!("failed to open experiment {}", experiment.display()))?;
            let kind = CheckerKind::from(checker);
            let rundir = Rundir::new(&config.rundir, &config.execution_log);
            let checker = kind.build(config.backends.for_kind(kind), rundir.tests_path());
            info!(experiment = %experiment.display(), checker = kind.as_str(), "starting run");

            let reports = exp.run_tests(&rundir, checker.as_ref(), &RunOptions::from_config(&config))?;
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "run",
                    "experiment": experiment.display().to_string(),
                    "checker": kind.as_str(),
                    "reports": serde_json::to_value(&reports)?,
                })));
            }
            for report in &reports {
                print_report(report);
            }
        }
        Commands::Describe { experiment, json } => {
            let summary = Experiment::open(&experiment)?.describe()?;
            if json {
                return Ok(Some(json!({
                    "ok": true,
                    "command": "describe",
                    "summary": serde_json::to_value(&summary)?,
                })));
            }
            println!("experiment: {}", summary.path.display());
            println!("tests: {}", summary.test_count);
            println!("reference_outputs: {}", summary.reference_outputs);
            println!("algorithms: {}", summary.algorithms.len());
            for algorithm in &summary.algorithms {
                println!("  {}", algorithm);
            }
        }
        Commands::Init { path, force } => {
            if !force && path.exists() {
                return Err(anyhow::anyhow!(
                    "config file already exists (use --force): {}",
                    path.display()
                ));
            }
            let yaml = HarnessConfig::default().to_yaml()?;
            std::fs::write(&path, yaml)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote: {}", path.display());
            println!("next: bench describe <experiment>");
        }
    }
    Ok(None)
}

/// Explicit path, else `bench.yaml` in the working directory, else defaults.
fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    let path = match path {
        Some(p) => p,
        None if default_path.exists() => default_path,
        None => return Ok(HarnessConfig::default()),
    };
    HarnessConfig::load(path).with_context(|| format!("failed to load config {}", path.display()))
}

fn print_report(report: &AlgorithmReport) {
    let status = match report.aborted_at {
        Some(test) => format!("aborted at test {}", test),
        None => "complete".to_string(),
    };
    println!(
        "{} [{}]: {} tests, {} -> {}",
        report.algorithm,
        report.checker,
        report.tests_run,
        status,
        report.summary.display()
    );
    if let Some(archive) = &report.archived {
        println!("  archived previous results: {}", archive.display());
    }
}

fn emit_json(value: &Value) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!(
            "{{\"ok\":false,\"error\":{{\"code\":\"serialization_error\",\"message\":\"failed to serialize JSON payload\",\"details\":{{}}}}}}"
        ),
    }
}

fn json_error(code: &str, message: String, details: Value) -> Value {
    json!({
        "ok": false,
        "error": {
            "code": code,
            "message": message,
            "details": details
        }
    })
}

fn command_json_mode(command: &Commands) -> bool {
    match command {
        Commands::Run { json, .. } | Commands::Describe { json, .. } => *json,
        Commands::Init { .. } => false,
    }
}
