use crate::error::{HarnessError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A single external process invocation whose stderr is treated as failure.
///
/// The exit status is not inspected; only output on stderr counts as failure.
#[derive(Debug, Clone)]
pub struct Command {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl Command {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Runs the process and returns its stdout, failing if stderr is non-empty.
    pub fn run(&self) -> Result<String> {
        self.execute(false)
    }

    /// Runs the process and returns its stdout regardless of stderr.
    pub fn run_ignoring_errors(&self) -> Result<String> {
        self.execute(true)
    }

    fn execute(&self, ignore_errors: bool) -> Result<String> {
        let rendered = self.display();
        debug!(command = %rendered, cwd = ?self.current_dir, "executing command");

        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }
        let output = cmd.output().map_err(|source| HarnessError::Launch {
            command: rendered.clone(),
            source,
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !stderr.is_empty() && !ignore_errors {
            return Err(HarnessError::Execution {
                command: rendered,
                stderr,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if !stdout.is_empty() {
            debug!(output = %stdout, "command output");
        }
        Ok(stdout)
    }

    fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| part.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn run_returns_stdout() {
        let out = Command::new("sh")
            .args(["-c", "printf hello"])
            .run()
            .expect("sh should run");
        assert_eq!(out, "hello");
    }

    #[test]
    fn run_returns_empty_string_without_output() {
        let out = Command::new("true").run().expect("true should run");
        assert_eq!(out, "");
    }

    #[test]
    fn run_fails_on_stderr() {
        let err = Command::new("sh")
            .args(["-c", "echo boom >&2"])
            .run()
            .expect_err("stderr must fail the command");
        match err {
            HarnessError::Execution { stderr, .. } => assert_eq!(stderr, "boom\n"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn run_ignoring_errors_tolerates_stderr() {
        let out = Command::new("sh")
            .args(["-c", "echo boom >&2; printf ok"])
            .run_ignoring_errors()
            .expect("stderr is ignored");
        assert_eq!(out, "ok");
    }

    #[test]
    fn exit_status_alone_is_not_a_failure() {
        let out = Command::new("sh")
            .args(["-c", "printf diff; exit 1"])
            .run()
            .expect("non-zero exit without stderr is fine");
        assert_eq!(out, "diff");
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let err = Command::new("/nonexistent/bench-program")
            .run_ignoring_errors()
            .expect_err("missing program");
        assert!(matches!(err, HarnessError::Launch { .. }), "got {err}");
    }

    #[test]
    fn current_dir_is_applied() {
        let dir = std::env::temp_dir();
        let out = Command::new("pwd")
            .current_dir(&dir)
            .run()
            .expect("pwd should run");
        let reported = std::path::PathBuf::from(out.trim());
        assert_eq!(
            reported.canonicalize().expect("canonical pwd"),
            dir.canonicalize().expect("canonical temp dir")
        );
    }
}
