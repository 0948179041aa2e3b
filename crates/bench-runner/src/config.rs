use crate::checker::{Ceilings, CheckerKind};
use bench_core::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "bench.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub ceilings: Ceilings,
    pub compiler: CompilerConfig,
    pub diff: DiffConfig,
    pub backends: BackendsConfig,
    pub rundir: PathBuf,
    pub execution_log: PathBuf,
    pub keep_individual_results: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            ceilings: Ceilings::default(),
            compiler: CompilerConfig::default(),
            diff: DiffConfig::default(),
            backends: BackendsConfig::default(),
            rundir: PathBuf::from("rundir"),
            execution_log: PathBuf::from("/code/workdir/test-log.txt"),
            keep_individual_results: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            program: "g++".to_string(),
            args: vec!["-O0".to_string()],
        }
    }
}

/// External byte-oriented diff; empty stdout means the files match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            program: "git".to_string(),
            args: vec![
                "diff".to_string(),
                "-G.*".to_string(),
                "--no-index".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub time: PathBuf,
    pub steps: PathBuf,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            time: PathBuf::from("./workdir/test"),
            steps: PathBuf::from("./workdir/test.py"),
        }
    }
}

impl BackendsConfig {
    pub fn for_kind(&self, kind: CheckerKind) -> &Path {
        match kind {
            CheckerKind::Time => &self.time,
            CheckerKind::Steps => &self.steps,
        }
    }
}

impl HarnessConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let config: HarnessConfig = serde_yaml::from_str(&raw)
            .map_err(|e| HarnessError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.ceilings;
        if c.max_time == 0 || c.max_memory == 0 || c.max_output_size == 0 {
            return Err(HarnessError::Config(
                "ceilings must all be greater than zero".to_string(),
            ));
        }
        if self.compiler.program.trim().is_empty() {
            return Err(HarnessError::Config("compiler.program is empty".to_string()));
        }
        if self.diff.program.trim().is_empty() {
            return Err(HarnessError::Config("diff.program is empty".to_string()));
        }
        Ok(())
    }

    /// Makes relative backend paths absolute against `base`.
    ///
    /// Backends run with the sandbox as working directory, so a relative
    /// program path would otherwise resolve inside the sandbox.
    pub fn resolve_paths(&mut self, base: &Path) {
        for backend in [&mut self.backends.time, &mut self.backends.steps] {
            if backend.is_relative() {
                *backend = base.join(&*backend);
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| HarnessError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: HarnessConfig = serde_yaml::from_str("{}").expect("parse");
        assert_eq!(config.ceilings.max_time, 4600);
        assert_eq!(config.ceilings.max_memory, 10_000_000_000);
        assert_eq!(config.ceilings.max_output_size, 1_000_000_000);
        assert_eq!(config.compiler.program, "g++");
        assert_eq!(config.compiler.args, vec!["-O0"]);
        assert_eq!(config.diff.args, vec!["diff", "-G.*", "--no-index"]);
        assert!(!config.keep_individual_results);
    }

    #[test]
    fn partial_document_overrides_selected_fields() {
        let yaml = "\
ceilings:
  max_time: 100
rundir: /tmp/sandbox
keep_individual_results: true
";
        let config: HarnessConfig = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(config.ceilings.max_time, 100);
        assert_eq!(config.ceilings.max_memory, 10_000_000_000);
        assert_eq!(config.rundir, PathBuf::from("/tmp/sandbox"));
        assert!(config.keep_individual_results);
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let mut config = HarnessConfig::default();
        config.ceilings.max_output_size = 0;
        let err = config.validate().expect_err("zero ceiling");
        assert!(err.to_string().contains("ceilings"), "got {err}");
    }

    #[test]
    fn resolve_paths_only_touches_relative_backends() {
        let mut config = HarnessConfig::default();
        config.backends.steps = PathBuf::from("/opt/steps");
        config.resolve_paths(Path::new("/code"));
        assert_eq!(config.backends.time, PathBuf::from("/code/./workdir/test"));
        assert_eq!(config.backends.steps, PathBuf::from("/opt/steps"));
    }

    #[test]
    fn yaml_round_trip_preserves_backends() {
        let config = HarnessConfig::default();
        let yaml = config.to_yaml().expect("serialize");
        let parsed: HarnessConfig = serde_yaml::from_str(&yaml).expect("parse");
        assert_eq!(parsed.backends.for_kind(CheckerKind::Steps), Path::new("./workdir/test.py"));
    }
}
