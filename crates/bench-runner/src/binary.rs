use crate::config::CompilerConfig;
use bench_core::{Command, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const BINARY_NAME: &str = "a.out";

/// One algorithm source file and the compiler that builds it.
#[derive(Debug, Clone)]
pub struct Binary {
    source: PathBuf,
    compiler: CompilerConfig,
}

impl Binary {
    pub fn new(source: &Path, compiler: &CompilerConfig) -> Self {
        Self {
            source: source.to_path_buf(),
            compiler: compiler.clone(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Compiles into `{destination}/a.out`. Any compiler diagnostic on
    /// stderr fails the build.
    pub fn compile_to(&self, destination: &Path) -> Result<PathBuf> {
        let output = destination.join(BINARY_NAME);
        debug!(source = %self.source.display(), output = %output.display(), "compiling");
        Command::new(&self.compiler.program)
            .args(&self.compiler.args)
            .arg(&self.source)
            .arg("-o")
            .arg(&output)
            .run()?;
        Ok(output)
    }
}
