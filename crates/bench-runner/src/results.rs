use crate::summary::SummaryFile;
use bench_core::{fsops, paths, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";
const RETAINED_SUFFIXES: [&str; 2] = [".txt", ".csv"];

/// Results directory for one (algorithm, checker) pair:
/// `<results>/<algorithm>-<checker>`.
#[derive(Debug, Clone)]
pub struct ResultsDir {
    path: PathBuf,
}

impl ResultsDir {
    pub fn new(results_root: &Path, algorithm: &str, checker_name: &str) -> Self {
        let algorithm = algorithm.rsplit('/').next().unwrap_or(algorithm);
        let path = paths::join(
            &results_root.to_string_lossy(),
            &[format!("{algorithm}-{checker_name}")],
        );
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves an existing directory aside to a timestamped sibling.
    ///
    /// Best effort: failures are logged and the pass continues. Returns the
    /// archive path when one was written.
    pub fn archive_previous(&self) -> Option<PathBuf> {
        if !self.path.exists() {
            return None;
        }
        let archive = self.unique_archive_path();
        if let Err(err) = fsops::copy_dir_recursive(&self.path, &archive) {
            warn!(error = %err, dir = %self.path.display(), "failed to archive previous results");
            return None;
        }
        if let Err(err) = fsops::remove_dir_all_if_exists(&self.path) {
            warn!(error = %err, dir = %self.path.display(), "failed to remove archived results");
        }
        debug!(archive = %archive.display(), "archived previous results");
        Some(archive)
    }

    /// Clears and recreates the directory with a fresh summary file.
    pub fn recreate(&self) -> Result<SummaryFile> {
        fsops::remove_dir_all_if_exists(&self.path)?;
        fsops::ensure_dir(&self.path)?;
        SummaryFile::create(&self.path)
    }

    /// Deletes every per-test file that is not a `.txt` or `.csv` file.
    pub fn prune_individual_files(&self) -> Result<()> {
        for name in fsops::list_file_names(&self.path)? {
            if !RETAINED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
                fsops::remove_file_if_exists(&self.path.join(name))?;
            }
        }
        Ok(())
    }

    fn unique_archive_path(&self) -> PathBuf {
        let stamp = Local::now().format(ARCHIVE_TIMESTAMP_FORMAT);
        let base = format!("{}_{}", self.path.display(), stamp);
        let mut candidate = PathBuf::from(&base);
        let mut n = 1;
        while candidate.exists() {
            candidate = PathBuf::from(format!("{base}_{n}"));
            n += 1;
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs;

    fn temp_root(tag: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "bench_results_{}_{}_{}",
            tag,
            std::process::id(),
            Utc::now().timestamp_micros()
        ));
        fs::create_dir_all(&root).expect("temp root");
        root
    }

    fn sorted_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("ls")
            .map(|e| e.expect("entry").file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn name_combines_algorithm_file_and_checker() {
        let dir = ResultsDir::new(Path::new("exp/results/"), "quick.cpp", "time-checker");
        assert_eq!(dir.path(), Path::new("exp/results/quick.cpp-time-checker"));
    }

    #[test]
    fn archive_previous_is_a_noop_without_results() {
        let root = temp_root("noop");
        let dir = ResultsDir::new(&root, "a.cpp", "time-checker");
        assert_eq!(dir.archive_previous(), None);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn repeated_archives_never_collide() {
        let root = temp_root("archive");
        let dir = ResultsDir::new(&root, "a.cpp", "steps-checker");

        dir.recreate().expect("first pass");
        fs::write(dir.path().join("0.out"), "first").expect("artifact");
        let first = dir.archive_previous().expect("first archive");
        assert!(!dir.path().exists());

        dir.recreate().expect("second pass");
        fs::write(dir.path().join("0.out"), "second").expect("artifact");
        let second = dir.archive_previous().expect("second archive");

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(first.join("0.out")).expect("first"), "first");
        assert_eq!(fs::read_to_string(second.join("0.out")).expect("second"), "second");
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn recreate_leaves_only_summary_header() {
        let root = temp_root("recreate");
        let dir = ResultsDir::new(&root, "a.cpp", "time-checker");
        fs::create_dir_all(dir.path()).expect("dir");
        fs::write(dir.path().join("stale.out"), "x").expect("stale");

        let summary = dir.recreate().expect("recreate");
        assert_eq!(sorted_names(dir.path()), vec!["summary.csv"]);
        assert!(fs::read_to_string(summary.path())
            .expect("summary")
            .starts_with("TestNumber;"));
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn prune_keeps_txt_and_csv() {
        let root = temp_root("prune");
        let dir = ResultsDir::new(&root, "a.cpp", "time-checker");
        dir.recreate().expect("recreate");
        for name in ["0.out", "0.steps", "0.time", "0.memory", "0.compare", "test-log.txt"] {
            fs::write(dir.path().join(name), "x").expect("artifact");
        }
        dir.prune_individual_files().expect("prune");
        assert_eq!(sorted_names(dir.path()), vec!["summary.csv", "test-log.txt"]);
        let _ = fs::remove_dir_all(root);
    }
}
