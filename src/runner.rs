//! Types for suite run results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::harness::types::TestOutcome;

/// Result of a complete suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    /// Whether every test passed
    pub success: bool,

    pub total: usize,
    pub passed: usize,
    pub failed: usize,

    /// Wall-clock time of the whole run
    pub duration_ms: u64,

    /// Aggregate report written during the run
    pub report_path: Option<PathBuf>,

    /// Outcomes in catalogue order
    pub tests: Vec<TestOutcome>,
}

impl SuiteResult {
    pub fn new(tests: Vec<TestOutcome>, duration: Duration, report_path: Option<PathBuf>) -> Self {
        let passed = tests.iter().filter(|t| t.passed()).count();
        Self {
            success: passed == tests.len(),
            total: tests.len(),
            passed,
            failed: tests.len() - passed,
            duration_ms: duration.as_millis() as u64,
            report_path,
            tests,
        }
    }

    /// Outcomes of the failed tests
    pub fn failures(&self) -> impl Iterator<Item = &TestOutcome> {
        self.tests.iter().filter(|t| !t.passed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::types::TestStatus;

    fn outcome(name: &str, status: TestStatus) -> TestOutcome {
        TestOutcome {
            name: name.to_string(),
            status,
            message: String::new(),
            trace: String::new(),
            duration_ms: 10,
            screenshot: None,
        }
    }

    #[test]
    fn test_counts() {
        let result = SuiteResult::new(
            vec![outcome("a", TestStatus::Passed), outcome("b", TestStatus::Failed)],
            Duration::from_millis(1500),
            None,
        );
        assert!(!result.success);
        assert_eq!((result.total, result.passed, result.failed), (2, 1, 1));
        assert_eq!(result.duration_ms, 1500);
        assert_eq!(result.failures().map(|t| t.name.as_str()).collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_json_shape() {
        let result = SuiteResult::new(vec![outcome("a", TestStatus::Passed)], Duration::ZERO, None);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["tests"][0]["status"], "Passed");
    }

    #[test]
    fn test_empty_run_succeeds() {
        let result = SuiteResult::new(Vec::new(), Duration::ZERO, None);
        assert!(result.success);
        assert_eq!(result.total, 0);
    }
}
