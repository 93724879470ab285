use chrono::{DateTime, Local};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::aggregator::{Aggregator, Ticket};
use super::console;
use super::format::{self, TestSummary};
use super::step::{Severity, Step};

/// Name used when a test has none
pub const UNKNOWN_TEST_NAME: &str = "НеизвестныйТест";

/// Ordered step log of one test, streamed into the session aggregate
#[derive(Debug)]
pub struct TestReport {
    name: String,
    start: DateTime<Local>,
    end: Option<DateTime<Local>>,
    passed: bool,
    finalized: bool,
    steps: Vec<Step>,
    ticket: Option<Ticket>,
    aggregator: Arc<Aggregator>,
}

impl TestReport {
    /// Start a report on the process-wide aggregator
    pub fn start(name: &str) -> Self {
        Self::new(name, Aggregator::global())
    }

    /// Start a report on `aggregator`
    ///
    /// Registers the test (creating the aggregate file on first use) and
    /// records the opening steps.
    pub fn new(name: &str, aggregator: Arc<Aggregator>) -> Self {
        let name = if name.trim().is_empty() { UNKNOWN_TEST_NAME } else { name };
        let ticket = aggregator.register_test(name);

        let mut report = Self {
            name: name.to_string(),
            start: Local::now(),
            end: None,
            passed: true,
            finalized: false,
            steps: Vec::new(),
            ticket,
            aggregator,
        };
        report.info(&format!("Инициализация отчета для теста: {}", report.name));
        report.info(&format!("Время начала: {}", report.start.format(super::step::STEP_TIMESTAMP_FORMAT)));
        report
    }

    /// Record one step
    ///
    /// Dropped silently once this report or the session is finalized. An
    /// ERROR step marks the test as failed.
    pub fn add_step(&mut self, message: &str, severity: Severity) {
        if self.finalized || self.aggregator.is_finalized() {
            return;
        }
        if severity == Severity::Error {
            self.passed = false;
        }

        let step = Step::new(severity, message);
        if self.aggregator.console() {
            console::echo(&step);
        }
        self.aggregator.write_line(&step.line());
        self.steps.push(step);
    }

    pub fn info(&mut self, message: &str) {
        self.add_step(message, Severity::Info);
    }

    pub fn success(&mut self, message: &str) {
        self.add_step(&format!("УСПЕХ: {}", message), Severity::Success);
    }

    pub fn warning(&mut self, message: &str) {
        self.add_step(&format!("ПРЕДУПРЕЖДЕНИЕ: {}", message), Severity::Warning);
    }

    pub fn error(&mut self, message: &str) {
        self.add_step(&format!("ОШИБКА: {}", message), Severity::Error);
    }

    /// ERROR step carrying the error and its cause chain
    pub fn error_with(&mut self, message: &str, err: &dyn std::error::Error) {
        let mut trace = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            trace.push(cause.to_string());
            source = cause.source();
        }
        let trace = if trace.is_empty() {
            "нет".to_string()
        } else {
            trace.join(" <- ")
        };

        self.add_step(
            &format!(
                "ОШИБКА: {}\nИсключение: {}\nТрассировка стека: {}",
                message, err, trace
            ),
            Severity::Error,
        );
    }

    pub fn screenshot(&mut self, path: &Path) {
        if path.as_os_str().is_empty() {
            return;
        }
        self.add_step(&format!("Скриншот сохранен: {}", path.display()), Severity::Screenshot);
    }

    pub fn add_url(&mut self, url: &str) {
        if url.is_empty() {
            return;
        }
        self.add_step(&format!("Текущий URL: {}", url), Severity::Info);
    }

    pub fn add_data(&mut self, key: &str, value: &str) {
        self.add_step(&format!("Данные теста: {} = {}", key, value), Severity::Data);
    }

    /// Close the report and hand its summary to the aggregator
    ///
    /// Idempotent: only the first call writes anything.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        if self.aggregator.is_finalized() {
            self.finalized = true;
            return;
        }

        let status = format::status_label(self.passed);
        self.add_step(&format!("Тест завершен: {}", status), Severity::Report);

        let end = Local::now();
        self.end = Some(end);
        self.finalized = true;

        let count = |severity: Severity| self.steps.iter().filter(|s| s.severity == severity).count();
        let block = format::summary_block(&TestSummary {
            name: &self.name,
            passed: self.passed,
            start: self.start,
            end,
            total_steps: self.steps.len(),
            successes: count(Severity::Success),
            errors: count(Severity::Error),
            warnings: count(Severity::Warning),
        });

        self.aggregator
            .complete_test(self.ticket, &self.name, self.passed, self.duration(), &block);
        info!("Test '{}' finished with status {}", self.name, status);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn start_time(&self) -> DateTime<Local> {
        self.start
    }

    /// Time from start to finalize (or to now while running)
    pub fn duration(&self) -> std::time::Duration {
        (self.end.unwrap_or_else(Local::now) - self.start)
            .to_std()
            .unwrap_or_default()
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> (tempfile::TempDir, Arc<Aggregator>) {
        let dir = tempfile::tempdir().unwrap();
        let agg = Arc::new(Aggregator::new(dir.path()).with_console(false));
        (dir, agg)
    }

    #[test]
    fn test_opening_steps() {
        let (_dir, agg) = aggregator();
        let report = TestReport::new("Opening", agg);
        assert_eq!(report.step_count(), 2);
        assert!(report.steps()[0].message.contains("Инициализация отчета для теста: Opening"));
        assert!(report.is_passed());
    }

    #[test]
    fn test_empty_name() {
        let (_dir, agg) = aggregator();
        assert_eq!(TestReport::new("  ", agg).name(), UNKNOWN_TEST_NAME);
    }

    #[test]
    fn test_error_marks_failed() {
        let (_dir, agg) = aggregator();
        let mut report = TestReport::new("Failing", agg);
        report.warning("careful");
        assert!(report.is_passed());
        report.error("broken");
        assert!(!report.is_passed());
        assert_eq!(report.steps().last().unwrap().message, "ОШИБКА: broken");
    }

    #[test]
    fn test_error_with_cause_chain() {
        let (_dir, agg) = aggregator();
        let mut report = TestReport::new("Chain", agg);
        let err = std::io::Error::other("disk full");
        report.error_with("save failed", &err);
        let message = &report.steps().last().unwrap().message;
        assert!(message.starts_with("ОШИБКА: save failed\nИсключение: disk full\nТрассировка стека: "));
    }

    #[test]
    fn test_message_prefixes() {
        let (_dir, agg) = aggregator();
        let mut report = TestReport::new("Prefixes", agg);
        report.success("ok");
        report.screenshot(Path::new("Screenshots/a.png"));
        report.screenshot(Path::new(""));
        report.add_url("https://x/");
        report.add_url("");
        report.add_data("key", "value");

        let messages: Vec<_> = report.steps()[2..].iter().map(|s| (s.severity, s.message.as_str())).collect();
        assert_eq!(
            messages,
            vec![
                (Severity::Success, "УСПЕХ: ok"),
                (Severity::Screenshot, "Скриншот сохранен: Screenshots/a.png"),
                (Severity::Info, "Текущий URL: https://x/"),
                (Severity::Data, "Данные теста: key = value"),
            ]
        );
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let (_dir, agg) = aggregator();
        let mut report = TestReport::new("Once", agg.clone());
        report.finalize();
        let steps = report.step_count();
        report.finalize();
        report.info("after");

        assert_eq!(report.step_count(), steps);
        assert_eq!(agg.counters().total, 1);
        let content = std::fs::read_to_string(agg.current_report_path().unwrap()).unwrap();
        assert_eq!(content.matches("ИТОГ ТЕСТА: Once").count(), 1);
        assert!(!content.contains("after"));
    }

    #[test]
    fn test_steps_dropped_after_session_finalized() {
        let (_dir, agg) = aggregator();
        let mut report = TestReport::new("Late", agg.clone());
        agg.finalize_session();
        let path = agg.current_report_path().unwrap();
        let size = std::fs::metadata(&path).unwrap().len();

        report.info("ignored");
        report.finalize();
        assert_eq!(report.step_count(), 2);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), size);
        assert_eq!(agg.counters().total, 0);
    }
}
