use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::driver::DriverError;

/// Outcome of one test as seen by the fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    Passed,
    Failed,
}

impl TestStatus {
    /// Label used in the aggregate report
    pub fn label(&self) -> &'static str {
        match self {
            TestStatus::Passed => "ПРОЙДЕН",
            TestStatus::Failed => "ПРОВАЛЕН",
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }
}

/// What the fixture knows about a finished test body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    pub name: String,
    pub status: TestStatus,
    /// Failure message; empty when the test passed
    pub message: String,
    /// Error chain of the failure, outermost first
    pub trace: String,
    pub duration_ms: u64,
    pub screenshot: Option<std::path::PathBuf>,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.status.is_passed()
    }
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Error types for harness operations
#[derive(Debug)]
pub enum HarnessError {
    /// Chrome could not be launched or configured
    DriverInit(DriverError),

    /// Page load failed
    Navigation { url: String, source: DriverError },

    /// Required element is missing
    ElementNotFound(String),

    /// Element was found but is not enabled
    ElementDisabled(String),

    /// Read-back text differs from what was typed
    TextMismatch { expected: String, actual: String },

    /// Explicit wait expired
    WaitTimeout { what: String, timeout: Duration },

    /// No response arrived in time
    ResponseTimeout(Duration),

    /// Button never became enabled again
    ButtonStuckDisabled(Duration),

    /// Test assertion failed
    Assertion(String),

    /// Any other driver failure
    Driver(DriverError),

    /// I/O error
    Io(std::io::Error),
}

impl HarnessError {
    /// Short exception-style type name for the report
    pub fn kind(&self) -> &'static str {
        match self {
            HarnessError::DriverInit(_) => "DriverInitError",
            HarnessError::Navigation { .. } => "NavigationError",
            HarnessError::ElementNotFound(_) => "ElementNotFound",
            HarnessError::ElementDisabled(_) => "ElementDisabled",
            HarnessError::TextMismatch { .. } => "TextMismatch",
            HarnessError::WaitTimeout { .. } => "WaitTimeout",
            HarnessError::ResponseTimeout(_) => "ResponseTimeout",
            HarnessError::ButtonStuckDisabled(_) => "ButtonStuckDisabled",
            HarnessError::Assertion(_) => "AssertionError",
            HarnessError::Driver(_) => "WebDriverError",
            HarnessError::Io(_) => "IOError",
        }
    }

    /// Error chain rendered one cause per line
    pub fn trace(&self) -> String {
        let mut lines = vec![format!("{}: {}", self.kind(), self)];
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            lines.push(format!("  caused by: {}", err));
            source = err.source();
        }
        lines.join("\n")
    }
}

impl std::fmt::Display for HarnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarnessError::DriverInit(err) => write!(f, "Driver initialization failed: {}", err),
            HarnessError::Navigation { url, source } => write!(f, "Navigation to {} failed: {}", url, source),
            HarnessError::ElementNotFound(what) => write!(f, "Element not found: {}", what),
            HarnessError::ElementDisabled(what) => write!(f, "Element is disabled: {}", what),
            HarnessError::TextMismatch { expected, actual } => {
                write!(f, "Text mismatch: expected '{}', got '{}'", expected, actual)
            }
            HarnessError::WaitTimeout { what, timeout } => {
                write!(f, "Timed out after {:.1}s waiting for {}", timeout.as_secs_f64(), what)
            }
            HarnessError::ResponseTimeout(timeout) => {
                write!(f, "No response within {:.1}s", timeout.as_secs_f64())
            }
            HarnessError::ButtonStuckDisabled(timeout) => {
                write!(f, "Button still disabled after {:.1}s", timeout.as_secs_f64())
            }
            HarnessError::Assertion(msg) => write!(f, "Assertion failed: {}", msg),
            HarnessError::Driver(err) => write!(f, "WebDriver error: {}", err),
            HarnessError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::DriverInit(err) | HarnessError::Driver(err) => Some(err),
            HarnessError::Navigation { source, .. } => Some(source),
            HarnessError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HarnessError {
    fn from(err: std::io::Error) -> Self {
        HarnessError::Io(err)
    }
}

impl From<DriverError> for HarnessError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::NoSuchElement(what) => HarnessError::ElementNotFound(what),
            other => HarnessError::Driver(other),
        }
    }
}
