//! Ecosystem Autotests - browser-driven end-to-end tests for the AI Ecosystem site.
//!
//! This crate provides:
//! - A WebDriver abstraction with a Chrome client and an in-process mock browser
//! - Bounded waits for DOM conditions, model answers and button re-enabling
//! - Page operations (login, user menu, account settings, model page)
//! - Per-test step reports streamed into one session-wide aggregate file
//! - A fixture that captures a screenshot on failure and always quits the driver
//!
//! # Example
//!
//! ```rust,no_run
//! use ecosystem_autotests::config::Config;
//! use ecosystem_autotests::harness::TestBase;
//!
//! let base = TestBase::new(Config::from_env());
//! let outcome = base.run("Login", |ctx| {
//!     ctx.perform_login(None)?;
//!     ctx.validate_login_success()
//! });
//! println!("{}: {}", outcome.name, outcome.status.label());
//! ```

pub mod config;
pub mod driver;
pub mod harness;
pub mod logging;
pub mod pages;
pub mod report;
pub mod runner;
pub mod snapshot;
pub mod wait;

// Re-export runner types
pub use runner::SuiteResult;

// Re-export harness types
pub use harness::{HarnessError, HarnessResult, TestBase, TestContext, TestOutcome, TestStatus, run_suite};

// Re-export driver types
pub use driver::{By, ChromeLauncher, DriverError, DriverResult, MockBrowser, MockSite, WebDriver, WebElement};

// Re-export report types
pub use report::{Aggregator, Severity, TestReport};

// Re-export snapshot types
pub use snapshot::{Snapshot, SnapshotConfig, SnapshotError, SnapshotResult, capture_screenshot};

pub use wait::{ResponseEvidence, Wait};
