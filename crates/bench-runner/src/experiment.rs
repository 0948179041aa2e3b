use crate::binary::Binary;
use crate::checker::{Ceilings, Checker, RunResult};
use crate::config::{CompilerConfig, DiffConfig, HarnessConfig};
use crate::results::ResultsDir;
use crate::rundir::Rundir;
use crate::summary::{SummaryFile, SummaryRecord, MISSING_REFERENCE};
use bench_core::{fsops, paths, Command, HarnessError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ALGORITHM_SUFFIX: &str = ".cpp";
const INPUT_SUFFIX: &str = ".in";
const CRASH_WITHOUT_CODE: &str = "-1";

#[cfg(unix)]
const NULL_DEVICE: &str = "/dev/null";
#[cfg(windows)]
const NULL_DEVICE: &str = "NUL";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub ceilings: Ceilings,
    pub compiler: CompilerConfig,
    pub diff: DiffConfig,
    pub keep_individual_results: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&HarnessConfig::default())
    }
}

impl RunOptions {
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self {
            ceilings: config.ceilings,
            compiler: config.compiler.clone(),
            diff: config.diff.clone(),
            keep_individual_results: config.keep_individual_results,
        }
    }
}

/// Outcome of one (algorithm, checker) pass.
#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmReport {
    pub algorithm: String,
    pub checker: String,
    pub results_dir: PathBuf,
    pub summary: PathBuf,
    pub archived: Option<PathBuf>,
    pub tests_run: usize,
    /// Test whose non-success return code stopped the pass.
    pub aborted_at: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExperimentSummary {
    pub path: PathBuf,
    pub algorithms: Vec<String>,
    pub test_count: usize,
    pub reference_outputs: usize,
}

/// An experiment directory: `algorithms/*.cpp`, `tests/{n}.in` with optional
/// `tests/{n}.out` references, and the `results/` archive.
#[derive(Debug, Clone)]
pub struct Experiment {
    root: PathBuf,
    tests: PathBuf,
    algorithms: PathBuf,
    results: PathBuf,
}

impl Experiment {
    pub fn open(path: &Path) -> Result<Self> {
        let root = path.to_string_lossy();
        let experiment = Self {
            root: path.to_path_buf(),
            tests: paths::join(&root, &["tests"]),
            algorithms: paths::join(&root, &["algorithms"]),
            results: paths::join(&root, &["results"]),
        };
        for dir in [&experiment.tests, &experiment.algorithms] {
            if !dir.is_dir() {
                return Err(HarnessError::Config(format!(
                    "experiment directory is missing {}",
                    dir.display()
                )));
            }
        }
        Ok(experiment)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn tests_path(&self) -> &Path {
        &self.tests
    }

    pub fn results_path(&self) -> &Path {
        &self.results
    }

    /// Algorithm source file names, sorted.
    pub fn algorithms(&self) -> Result<Vec<String>> {
        let mut algorithms: Vec<String> = fsops::list_file_names(&self.algorithms)?
            .into_iter()
            .filter(|name| name.ends_with(ALGORITHM_SUFFIX))
            .collect();
        algorithms.sort();
        Ok(algorithms)
    }

    /// Tests are numbered `0..count` where count is the number of inputs.
    pub fn test_count(&self) -> Result<usize> {
        Ok(fsops::list_file_names(&self.tests)?
            .iter()
            .filter(|name| name.ends_with(INPUT_SUFFIX))
            .count())
    }

    pub fn describe(&self) -> Result<ExperimentSummary> {
        let test_count = self.test_count()?;
        let reference_outputs = (0..test_count)
            .filter(|n| self.reference_output(*n).exists())
            .count();
        Ok(ExperimentSummary {
            path: self.root.clone(),
            algorithms: self.algorithms()?,
            test_count,
            reference_outputs,
        })
    }

    /// Runs every algorithm against every test under `checker`.
    ///
    /// Algorithms run one after another through the same sandbox. A pass for
    /// one algorithm stops right after the first test whose return code is
    /// not success.
    pub fn run_tests(
        &self,
        rundir: &Rundir,
        checker: &dyn Checker,
        options: &RunOptions,
    ) -> Result<Vec<AlgorithmReport>> {
        let mut reports = Vec::new();
        for algorithm in self.algorithms()? {
            reports.push(self.run_algorithm(&algorithm, rundir, checker, options)?);
        }
        Ok(reports)
    }

    pub fn run_algorithm(
        &self,
        algorithm: &str,
        rundir: &Rundir,
        checker: &dyn Checker,
        options: &RunOptions,
    ) -> Result<AlgorithmReport> {
        info!(algorithm, checker = checker.name(), "run {} with {}", algorithm, checker.name());

        let results = ResultsDir::new(&self.results, algorithm, checker.name());
        let archived = results.archive_previous();

        rundir.reset()?;
        Binary::new(&self.algorithms.join(algorithm), &options.compiler)
            .compile_to(rundir.path())?;
        rundir.stage_corpus(&self.tests)?;

        fsops::ensure_dir(&self.results)?;
        let summary = results.recreate()?;

        let mut report = AlgorithmReport {
            algorithm: algorithm.to_string(),
            checker: checker.name().to_string(),
            results_dir: results.path().to_path_buf(),
            summary: summary.path().to_path_buf(),
            archived,
            tests_run: 0,
            aborted_at: None,
        };

        for test_number in 0..self.test_count()? {
            let result = self.run_test(test_number, rundir, checker, &results, &summary, options)?;
            report.tests_run += 1;
            if !result.is_success() {
                info!(
                    algorithm,
                    test_number,
                    returned_code = ?result.returned_code,
                    "stopping pass after unsuccessful test"
                );
                report.aborted_at = Some(test_number);
                break;
            }
        }
        Ok(report)
    }

    fn run_test(
        &self,
        test_number: usize,
        rundir: &Rundir,
        checker: &dyn Checker,
        results: &ResultsDir,
        summary: &SummaryFile,
        options: &RunOptions,
    ) -> Result<RunResult> {
        debug!(test_number, "running test");
        rundir.stage_input(test_number)?;
        rundir.clear_emulator_log()?;

        let result = checker.run(&options.ceilings)?;

        rundir.capture_output(test_number)?;
        rundir.record_metrics(&result, test_number)?;
        rundir.export_artifacts_to(results.path(), test_number)?;
        rundir.relay_emulator_log(results.path(), test_number, checker.name())?;

        self.verify_test_result(results.path(), test_number, &result, options)?;
        summary.append(&SummaryRecord::from_artifacts(results.path(), test_number)?)?;
        if !options.keep_individual_results {
            results.prune_individual_files()?;
        }

        rundir.relay_execution_log(results.path(), test_number, checker.name())?;
        rundir.clear_execution_log()?;
        Ok(result)
    }

    /// Writes `{n}.compare`: the return code for a crash, the diff text when
    /// a reference exists, otherwise the missing-reference marker.
    fn verify_test_result(
        &self,
        results: &Path,
        test_number: usize,
        result: &RunResult,
        options: &RunOptions,
    ) -> Result<()> {
        let reference = self.reference_output(test_number);
        let compare = if !result.is_success() {
            result
                .returned_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| CRASH_WITHOUT_CODE.to_string())
        } else if reference.exists() {
            let produced = results.join(format!("{test_number}.out"));
            let produced = if produced.exists() {
                produced
            } else {
                PathBuf::from(NULL_DEVICE)
            };
            Command::new(&options.diff.program)
                .args(&options.diff.args)
                .arg(&reference)
                .arg(&produced)
                .run()?
        } else {
            MISSING_REFERENCE.to_string()
        };
        fsops::write_string(&results.join(format!("{test_number}.compare")), &compare)
    }

    fn reference_output(&self, test_number: usize) -> PathBuf {
        self.tests.join(format!("{test_number}.out"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs;

    fn temp_experiment(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "bench_experiment_{}_{}_{}",
            tag,
            std::process::id(),
            Utc::now().timestamp_micros()
        ));
        fs::create_dir_all(root.join("tests")).expect("tests");
        fs::create_dir_all(root.join("algorithms")).expect("algorithms");
        root
    }

    #[test]
    fn open_requires_corpus_directories() {
        let root = temp_experiment("open");
        fs::remove_dir_all(root.join("algorithms")).expect("remove");
        let err = Experiment::open(&root).expect_err("missing algorithms");
        assert!(err.to_string().contains("algorithms"), "got {err}");
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn describe_counts_inputs_references_and_algorithms() {
        let root = temp_experiment("describe");
        for name in ["0.in", "0.out", "1.in", "2.in", "2.out", "notes.md"] {
            fs::write(root.join("tests").join(name), "x").expect("test file");
        }
        for name in ["merge.cpp", "bubble.cpp", "README"] {
            fs::write(root.join("algorithms").join(name), "x").expect("algorithm");
        }

        let experiment = Experiment::open(&root).expect("open");
        let summary = experiment.describe().expect("describe");
        assert_eq!(summary.test_count, 3);
        assert_eq!(summary.reference_outputs, 2);
        assert_eq!(summary.algorithms, vec!["bubble.cpp", "merge.cpp"]);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn crash_overrides_comparison() {
        let root = temp_experiment("crash");
        fs::write(root.join("tests").join("0.out"), "1\n").expect("reference");
        let results = root.join("results");
        fs::create_dir_all(&results).expect("results");
        let experiment = Experiment::open(&root).expect("open");

        let crashed = RunResult {
            returned_code: Some(139),
            ..RunResult::default()
        };
        experiment
            .verify_test_result(&results, 0, &crashed, &RunOptions::default())
            .expect("verify");
        assert_eq!(fs::read_to_string(results.join("0.compare")).expect("compare"), "139");

        experiment
            .verify_test_result(&results, 0, &RunResult::default(), &RunOptions::default())
            .expect("verify");
        assert_eq!(fs::read_to_string(results.join("0.compare")).expect("compare"), "-1");
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn missing_reference_is_reported_even_with_output() {
        let root = temp_experiment("missing");
        let results = root.join("results");
        fs::create_dir_all(&results).expect("results");
        fs::write(results.join("0.out"), "looks right\n").expect("produced");
        let experiment = Experiment::open(&root).expect("open");

        let ok = RunResult {
            returned_code: Some(0),
            ..RunResult::default()
        };
        experiment
            .verify_test_result(&results, 0, &ok, &RunOptions::default())
            .expect("verify");
        assert_eq!(
            fs::read_to_string(results.join("0.compare")).expect("compare"),
            MISSING_REFERENCE
        );
        let _ = fs::remove_dir_all(root);
    }
}
