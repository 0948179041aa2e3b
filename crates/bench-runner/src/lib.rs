pub mod binary;
pub mod checker;
pub mod config;
pub mod experiment;
pub mod results;
pub mod rundir;
pub mod streams;
pub mod summary;

pub use binary::Binary;
pub use checker::{Ceilings, Checker, CheckerKind, RunResult, StepsChecker, TimeChecker};
pub use config::HarnessConfig;
pub use experiment::{AlgorithmReport, Experiment, ExperimentSummary, RunOptions};
pub use results::ResultsDir;
pub use rundir::Rundir;
pub use streams::{GuestStream, VirtualStdin, VirtualStdout};
pub use summary::{Correctness, SummaryFile, SummaryRecord};

pub use bench_core::{HarnessError, Result};
