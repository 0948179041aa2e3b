use bench_core::{Command, HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resource ceilings handed to the measurement backend for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ceilings {
    pub max_time: u64,
    pub max_memory: u64,
    pub max_output_size: u64,
}

impl Default for Ceilings {
    fn default() -> Self {
        Self {
            max_time: 4600,
            max_memory: 10_000_000_000,
            max_output_size: 1_000_000_000,
        }
    }
}

/// Normalized metadata reported by one checker invocation.
///
/// Every field is optional: an absent key is distinct from a zero value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    pub returned_code: Option<i32>,
    pub steps: Option<u64>,
    pub time_system: Option<f64>,
    pub time_user: Option<f64>,
    pub memory_usage: Option<u64>,
    pub extra: BTreeMap<String, String>,
}

impl RunResult {
    /// Parses a backend metadata block of `key: value` lines.
    ///
    /// Lines without a `: ` separator are dropped. A recognized key whose
    /// value does not parse is a [`HarnessError::MetadataParse`].
    pub fn parse_metadata(meta: &str) -> Result<Self> {
        let mut result = RunResult::default();
        for line in meta.trim().split('\n') {
            let Some((key, value)) = line.split_once(": ") else {
                continue;
            };
            match key {
                "returned_code" => result.returned_code = Some(parse_field(key, value)?),
                "steps" => result.steps = Some(parse_field(key, value)?),
                "time_system" => result.time_system = Some(parse_field(key, value)?),
                "time_user" => result.time_user = Some(parse_field(key, value)?),
                "memory_usage" => result.memory_usage = Some(parse_field(key, value)?),
                _ => {
                    result.extra.insert(key.to_string(), value.to_string());
                }
            }
        }
        Ok(result)
    }

    pub fn is_success(&self) -> bool {
        self.returned_code == Some(0)
    }

    /// `max(time_system, time_user)` over whichever components were reported.
    pub fn elapsed_time(&self) -> Option<f64> {
        match (self.time_system, self.time_user) {
            (Some(s), Some(u)) => Some(s.max(u)),
            (Some(t), None) | (None, Some(t)) => Some(t),
            (None, None) => None,
        }
    }
}

fn parse_field<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| HarnessError::MetadataParse {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// An instrumented execution of the staged binary against the staged input.
pub trait Checker {
    /// Stable identifier used to namespace results per checker.
    fn name(&self) -> &str;

    fn run(&self, ceilings: &Ceilings) -> Result<RunResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckerKind {
    Time,
    Steps,
}

impl CheckerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckerKind::Time => "time-checker",
            CheckerKind::Steps => "steps-checker",
        }
    }

    pub fn build(self, backend: &Path, working_dir: &Path) -> Box<dyn Checker> {
        let backend = Backend::new(backend, working_dir);
        match self {
            CheckerKind::Time => Box::new(TimeChecker::new(backend)),
            CheckerKind::Steps => Box::new(StepsChecker::new(backend)),
        }
    }
}

/// The external measurement program and the directory it runs in.
#[derive(Debug, Clone)]
pub struct Backend {
    program: PathBuf,
    working_dir: PathBuf,
}

impl Backend {
    pub fn new(program: &Path, working_dir: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    fn invoke(&self, ceilings: &Ceilings) -> Result<RunResult> {
        let memory = ceilings.max_memory.to_string();
        let time = ceilings.max_time.to_string();
        let output = ceilings.max_output_size.to_string();
        let meta = Command::new(&self.program)
            .args(["-s", memory.as_str(), "-h", memory.as_str()])
            .args(["-t", time.as_str(), "-o", output.as_str()])
            .current_dir(&self.working_dir)
            .run()?;
        RunResult::parse_metadata(&meta)
    }
}

/// Measures wall-clock time by running the binary natively.
#[derive(Debug, Clone)]
pub struct TimeChecker {
    backend: Backend,
}

impl TimeChecker {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

impl Checker for TimeChecker {
    fn name(&self) -> &str {
        CheckerKind::Time.as_str()
    }

    fn run(&self, ceilings: &Ceilings) -> Result<RunResult> {
        self.backend.invoke(ceilings)
    }
}

/// Counts executed instructions by emulating the binary.
#[derive(Debug, Clone)]
pub struct StepsChecker {
    backend: Backend,
}

impl StepsChecker {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

impl Checker for StepsChecker {
    fn name(&self) -> &str {
        CheckerKind::Steps.as_str()
    }

    fn run(&self, ceilings: &Ceilings) -> Result<RunResult> {
        self.backend.invoke(ceilings)
    }
}
