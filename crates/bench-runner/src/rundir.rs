use crate::checker::RunResult;
use crate::streams::{VirtualStdin, VirtualStdout};
use bench_core::fsops;
use bench_core::{HarnessError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const TESTS_DIR: &str = "tests";
pub const INPUT_FILE: &str = "in.txt";
pub const OUTPUT_FILE: &str = "out.txt";
pub const EMULATOR_LOG_FILE: &str = "qiling-log.txt";
pub const EXECUTION_LOG_FILE: &str = "test-log.txt";

/// Per-test files the sandbox hands over to the results directory.
const ARTIFACT_EXTENSIONS: [&str; 4] = ["out", "steps", "time", "memory"];

/// Scratch directory an algorithm binary executes inside.
///
/// Holds artifacts for at most one in-flight test. The staged input and the
/// produced output always use the fixed names [`INPUT_FILE`] and
/// [`OUTPUT_FILE`] under the tests subdirectory.
#[derive(Debug, Clone)]
pub struct Rundir {
    root: PathBuf,
    tests: PathBuf,
    emulator_log: PathBuf,
    execution_log: PathBuf,
}

impl Rundir {
    pub fn new(root: &Path, execution_log: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            tests: root.join(TESTS_DIR),
            emulator_log: root.join(EMULATOR_LOG_FILE),
            execution_log: execution_log.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn tests_path(&self) -> &Path {
        &self.tests
    }

    pub fn emulator_log_path(&self) -> &Path {
        &self.emulator_log
    }

    pub fn execution_log_path(&self) -> &Path {
        &self.execution_log
    }

    /// Deletes the whole tree and recreates an empty tests subdirectory.
    pub fn reset(&self) -> Result<()> {
        fsops::remove_dir_all_if_exists(&self.root)?;
        fsops::ensure_dir(&self.tests)
    }

    /// Copies every `*.in` file of a test corpus into the tests subdirectory.
    pub fn stage_corpus(&self, corpus: &Path) -> Result<()> {
        for name in fsops::list_file_names(corpus)? {
            if name.ends_with(".in") {
                fsops::copy_file(&corpus.join(&name), &self.tests.join(&name))?;
            }
        }
        Ok(())
    }

    pub fn stage_input(&self, test_number: usize) -> Result<()> {
        fsops::copy_file(
            &self.tests.join(format!("{test_number}.in")),
            &self.tests.join(INPUT_FILE),
        )
    }

    /// Moves the fixed-name output to `{n}.out`; returns whether one existed.
    pub fn capture_output(&self, test_number: usize) -> Result<bool> {
        let produced = self.tests.join(OUTPUT_FILE);
        if !produced.exists() {
            debug!(test_number, "no output produced");
            return Ok(false);
        }
        let kept = self.tests.join(format!("{test_number}.out"));
        fsops::rename(&produced, &kept)?;
        Ok(true)
    }

    /// Writes one file per reported metric; absent metrics write nothing.
    pub fn record_metrics(&self, result: &RunResult, test_number: usize) -> Result<()> {
        if let Some(steps) = result.steps {
            fsops::write_string(&self.artifact(test_number, "steps"), &steps.to_string())?;
        }
        if let Some(time) = result.elapsed_time() {
            fsops::write_string(&self.artifact(test_number, "time"), &format_seconds(time))?;
        }
        if let Some(memory) = result.memory_usage {
            fsops::write_string(&self.artifact(test_number, "memory"), &memory.to_string())?;
        }
        Ok(())
    }

    pub fn export_artifacts_to(&self, destination: &Path, test_number: usize) -> Result<()> {
        for ext in ARTIFACT_EXTENSIONS {
            let artifact = self.artifact(test_number, ext);
            if artifact.exists() {
                let name = format!("{test_number}.{ext}");
                fsops::copy_file(&artifact, &destination.join(name))?;
            }
        }
        Ok(())
    }

    pub fn relay_emulator_log(
        &self,
        destination: &Path,
        test_number: usize,
        checker_name: &str,
    ) -> Result<()> {
        relay_log(
            &self.emulator_log,
            &destination.join(EMULATOR_LOG_FILE),
            test_number,
            checker_name,
        )
    }

    pub fn relay_execution_log(
        &self,
        destination: &Path,
        test_number: usize,
        checker_name: &str,
    ) -> Result<()> {
        relay_log(
            &self.execution_log,
            &destination.join(EXECUTION_LOG_FILE),
            test_number,
            checker_name,
        )
    }

    pub fn clear_emulator_log(&self) -> Result<()> {
        fsops::remove_file_if_exists(&self.emulator_log)
    }

    pub fn clear_execution_log(&self) -> Result<()> {
        fsops::truncate_if_exists(&self.execution_log)
    }

    /// Opens the stream shim over the staged input and fixed output path.
    pub fn virtual_stdio(&self) -> Result<(VirtualStdin, VirtualStdout)> {
        let input = self.tests.join(INPUT_FILE);
        let output = self.tests.join(OUTPUT_FILE);
        let stdin = VirtualStdin::open(&input).map_err(|e| HarnessError::io(&input, e))?;
        let stdout = VirtualStdout::open(&output).map_err(|e| HarnessError::io(&output, e))?;
        Ok((stdin, stdout))
    }

    fn artifact(&self, test_number: usize, ext: &str) -> PathBuf {
        self.tests.join(format!("{test_number}.{ext}"))
    }
}

fn relay_log(source: &Path, saved: &Path, test_number: usize, checker_name: &str) -> Result<()> {
    let Some(log) = fsops::read_to_string_if_exists(source)? else {
        return Ok(());
    };
    fsops::append_string(
        saved,
        &format!("----------- {test_number} {checker_name}\n{log}"),
    )
}

/// Formats seconds so integral values keep one decimal (`2.0`, not `2`).
fn format_seconds(seconds: f64) -> String {
    if seconds.fract() == 0.0 && seconds.is_finite() {
        format!("{seconds:.1}")
    } else {
        seconds.to_string()
    }
}
