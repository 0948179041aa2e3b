use bench_core::fsops;
use bench_core::Result;
use std::fmt;
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "summary.csv";
pub const SUMMARY_HEADER: &str =
    "TestNumber;ExecutionTime;ExecutedSteps;PeakMemoryUsage;CorrectAnswer";
pub const MISSING_REFERENCE: &str = "missing output";

const NOT_AVAILABLE: &str = "NA";

/// Comparison records shorter than this are written to the summary verbatim.
const LITERAL_COMPARE_LIMIT: usize = 10;

/// Encoded outcome in the `CorrectAnswer` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correctness {
    /// Empty diff: `1`.
    Correct,
    /// Non-empty diff of ten characters or more: `0`.
    Incorrect,
    /// A return code or the missing-reference marker, passed through.
    Literal(String),
    /// No comparison record at all: `-2`.
    Indeterminate,
}

impl Correctness {
    pub fn from_compare(compare: Option<&str>) -> Self {
        match compare {
            Some("") => Correctness::Correct,
            Some(text) if text == MISSING_REFERENCE || text.chars().count() < LITERAL_COMPARE_LIMIT => {
                Correctness::Literal(text.to_string())
            }
            Some(_) => Correctness::Incorrect,
            None => Correctness::Indeterminate,
        }
    }
}

impl fmt::Display for Correctness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Correctness::Correct => f.write_str("1"),
            Correctness::Incorrect => f.write_str("0"),
            Correctness::Literal(text) => f.write_str(text),
            Correctness::Indeterminate => f.write_str("-2"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub test_number: usize,
    pub time: Option<String>,
    pub steps: Option<String>,
    pub memory: Option<String>,
    pub correct: Correctness,
}

impl SummaryRecord {
    /// Builds the row for one test from the artifacts in a results directory.
    pub fn from_artifacts(dir: &Path, test_number: usize) -> Result<Self> {
        let read = |ext: &str| fsops::read_to_string_if_exists(&dir.join(format!("{test_number}.{ext}")));
        let compare = read("compare")?;
        Ok(Self {
            test_number,
            time: read("time")?,
            steps: read("steps")?,
            memory: read("memory")?,
            correct: Correctness::from_compare(compare.as_deref()),
        })
    }

    pub fn to_row(&self) -> String {
        let field = |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
        format!(
            "{};{};{};{};{}",
            self.test_number,
            field(&self.time),
            field(&self.steps),
            field(&self.memory),
            self.correct
        )
    }
}

/// Append-only `summary.csv` for one (algorithm, checker) pair.
#[derive(Debug, Clone)]
pub struct SummaryFile {
    path: PathBuf,
}

impl SummaryFile {
    /// Creates the file with only the header row, replacing any previous one.
    pub fn create(dir: &Path) -> Result<Self> {
        let path = dir.join(SUMMARY_FILE);
        fsops::write_string(&path, &format!("{SUMMARY_HEADER}\n"))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &SummaryRecord) -> Result<()> {
        fsops::append_string(&self.path, &format!("{}\n", record.to_row()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs;

    #[test]
    fn correctness_encoding() {
        assert_eq!(Correctness::from_compare(Some("")).to_string(), "1");
        assert_eq!(Correctness::from_compare(Some("2")).to_string(), "2");
        assert_eq!(Correctness::from_compare(Some("-1")).to_string(), "-1");
        assert_eq!(
            Correctness::from_compare(Some(MISSING_REFERENCE)).to_string(),
            "missing output"
        );
        assert_eq!(
            Correctness::from_compare(Some("diff --git a/0.out b/0.out\n")).to_string(),
            "0"
        );
        assert_eq!(Correctness::from_compare(None).to_string(), "-2");
    }

    #[test]
    fn correctness_boundary_is_ten_characters() {
        assert_eq!(
            Correctness::from_compare(Some("123456789")),
            Correctness::Literal("123456789".to_string())
        );
        assert_eq!(Correctness::from_compare(Some("1234567890")), Correctness::Incorrect);
    }

    #[test]
    fn absent_metrics_render_as_na() {
        let record = SummaryRecord {
            test_number: 4,
            time: Some("0.5".to_string()),
            steps: None,
            memory: None,
            correct: Correctness::Correct,
        };
        assert_eq!(record.to_row(), "4;0.5;NA;NA;1");
    }

    #[test]
    fn summary_file_appends_rows_after_header() {
        let dir = std::env::temp_dir().join(format!(
            "bench_summary_{}_{}",
            std::process::id(),
            Utc::now().timestamp_micros()
        ));
        fs::create_dir_all(&dir).expect("dir");
        fs::write(dir.join("0.time"), "1.0").expect("time");
        fs::write(dir.join("0.steps"), "77").expect("steps");
        fs::write(dir.join("0.compare"), "").expect("compare");

        let summary = SummaryFile::create(&dir).expect("create");
        let first = SummaryRecord::from_artifacts(&dir, 0).expect("record");
        summary.append(&first).expect("append");
        let second = SummaryRecord::from_artifacts(&dir, 1).expect("record");
        summary.append(&second).expect("append");

        assert_eq!(
            fs::read_to_string(summary.path()).expect("summary"),
            format!("{SUMMARY_HEADER}\n0;1.0;77;NA;1\n1;NA;NA;NA;-2\n")
        );
        let _ = fs::remove_dir_all(dir);
    }
}
