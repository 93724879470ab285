pub mod base;
pub mod context;
pub mod suite;
pub mod types;

pub use base::TestBase;
pub use context::TestContext;
pub use suite::{Scenario, catalogue, run_suite, select};
pub use types::{HarnessError, HarnessResult, TestOutcome, TestStatus};
