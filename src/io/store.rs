//! JSON-backed test-run store.
//!
//! The pipeline depends on an abstract run reader; this is the file-backed
//! implementation. A run file is a single JSON document:
//!
//! ```json
//! {
//!   "tests": [
//!     {
//!       "id": "tests/AuthTest.php::testLogin",
//!       "execution_time_ms": 120,
//!       "recent_fail_rate": 0.0,
//!       "source_text": "class AuthTest { ... }",
//!       "coverage": [["src/auth.php", 10], ["src/auth.php", 11]]
//!     }
//!   ]
//! }
//! ```
//!
//! The whole document is buffered on load, which makes the reader trivially
//! restartable.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::core::{CoverageLine, Error, Result, TestRecord};

/// Store-level counts, used for progress reporting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub test_count: usize,
    pub coverage_line_count: usize,
    pub unique_files: usize,
}

/// An abstract source of one test run. Implementations must hand out the
/// same records on every call.
pub trait TestRunReader {
    fn stats(&self) -> StoreStats;
    fn tests(&self) -> &[TestRecord];
}

/// Wire shape of one test entry in a run file. Coverage is a list of
/// `[file, line]` pairs.
#[derive(Debug, Deserialize, Serialize)]
struct RunFileTest {
    id: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    execution_time_ms: u64,
    #[serde(default)]
    recent_fail_rate: f64,
    #[serde(default)]
    source_text: Option<String>,
    #[serde(default)]
    coverage: Vec<(String, u32)>,
}

#[derive(Debug, Deserialize, Serialize)]
struct RunFile {
    tests: Vec<RunFileTest>,
}

/// File-backed store holding one buffered test run.
#[derive(Debug)]
pub struct JsonStore {
    tests: Vec<TestRecord>,
    stats: StoreStats,
}

impl JsonStore {
    /// Load and buffer a run file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::store(format!("cannot read run file {}", path.display()), e)
        })?;
        let run: RunFile = serde_json::from_str(&text).map_err(|e| {
            Error::store(format!("malformed run file {}", path.display()), e)
        })?;
        Ok(Self::from_records(
            run.tests.into_iter().map(into_record).collect(),
        ))
    }

    /// Build a store from in-memory records (used by tests and embedders).
    pub fn from_records(tests: Vec<TestRecord>) -> Self {
        let mut files: HashSet<&str> = HashSet::new();
        let mut line_count = 0usize;
        for test in &tests {
            line_count += test.coverage.len();
            for line in &test.coverage {
                files.insert(line.file.as_str());
            }
        }
        let stats = StoreStats {
            test_count: tests.len(),
            coverage_line_count: line_count,
            unique_files: files.len(),
        };
        Self { tests, stats }
    }
}

impl TestRunReader for JsonStore {
    fn stats(&self) -> StoreStats {
        self.stats
    }

    fn tests(&self) -> &[TestRecord] {
        &self.tests
    }
}

fn into_record(entry: RunFileTest) -> TestRecord {
    let (id_path, id_method) = crate::core::types::split_test_id(&entry.id);
    let mut coverage: Vec<CoverageLine> = entry
        .coverage
        .into_iter()
        .map(|(file, line)| CoverageLine::new(file, line))
        .collect();
    coverage.sort();
    coverage.dedup();

    TestRecord {
        id: entry.id,
        path: entry.path.unwrap_or(id_path),
        method: entry.method.unwrap_or(id_method),
        execution_time_ms: entry.execution_time_ms,
        recent_fail_rate: entry.recent_fail_rate,
        source_text: entry.source_text,
        coverage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_records_stats() {
        let mut a = TestRecord::new("a::t1");
        a.coverage = vec![CoverageLine::new("x.php", 1), CoverageLine::new("y.php", 2)];
        let mut b = TestRecord::new("a::t2");
        b.coverage = vec![CoverageLine::new("x.php", 1)];

        let store = JsonStore::from_records(vec![a, b]);
        let stats = store.stats();
        assert_eq!(stats.test_count, 2);
        assert_eq!(stats.coverage_line_count, 3);
        assert_eq!(stats.unique_files, 2);
    }

    #[test]
    fn test_into_record_dedups_coverage_and_splits_id() {
        let entry = RunFileTest {
            id: "tests/AuthTest.php::testLogin".to_string(),
            path: None,
            method: None,
            execution_time_ms: 5,
            recent_fail_rate: 0.1,
            source_text: None,
            coverage: vec![
                ("a.php".to_string(), 1),
                ("a.php".to_string(), 1),
                ("a.php".to_string(), 2),
            ],
        };
        let record = into_record(entry);
        assert_eq!(record.path, "tests/AuthTest.php");
        assert_eq!(record.method, "testLogin");
        assert_eq!(record.coverage.len(), 2);
    }

    #[test]
    fn test_reader_is_restartable() {
        let store = JsonStore::from_records(vec![TestRecord::new("a::t1")]);
        let first: Vec<String> = store.tests().iter().map(|t| t.id.clone()).collect();
        let second: Vec<String> = store.tests().iter().map(|t| t.id.clone()).collect();
        assert_eq!(first, second);
    }
}
