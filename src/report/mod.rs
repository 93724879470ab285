//! Per-test step logs and the session-wide aggregate report.
//!
//! A [`TestReport`] records timestamped [`Step`]s for one test and streams
//! each line into the [`Aggregator`], which owns a single append-only file
//! per session:
//!
//! ```text
//! ╔════ ОБЩИЙ ОТЧЕТ ТЕСТОВ ════╗   <- banner, rewritten after every test
//! ТЕСТЫ:
//! [2024-05-01 12:00:00.123] [ИНФО] ...   <- step lines
//! ---- ИТОГ ТЕСТА: ... ----               <- per-test summary block
//! СЕССИЯ ТЕСТИРОВАНИЯ ЗАВЕРШЕНА           <- footer, written once at exit
//! ```

pub mod aggregator;
pub mod console;
pub mod format;
pub mod paths;
pub mod step;
pub mod test_report;

pub use aggregator::{Aggregator, ReportError, Ticket};
pub use format::Counters;
pub use paths::{cleanup_old_reports, list_reports, resolve_reports_dir};
pub use step::{Severity, Step};
pub use test_report::TestReport;
