//! Fixture template wrapping every test: report, driver, screenshot, teardown.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::context::TestContext;
use super::types::{HarnessError, HarnessResult, TestOutcome, TestStatus};
use crate::config::Config;
use crate::driver::{ChromeLauncher, DriverFactory, WebDriver, lifecycle};
use crate::report::{Aggregator, TestReport};
use crate::snapshot::{SnapshotConfig, capture_screenshot};
use crate::wait::Wait;

/// Runs test bodies inside the setup / teardown envelope
///
/// Each [`TestBase::run`] call owns one driver and one report. The base
/// itself is shareable between threads.
#[derive(Clone)]
pub struct TestBase {
    config: Config,
    factory: Arc<dyn DriverFactory>,
    aggregator: Arc<Aggregator>,
}

impl TestBase {
    /// Real Chrome, process-wide aggregator
    pub fn new(config: Config) -> Self {
        let factory = Arc::new(ChromeLauncher::new(config.browser.clone()));
        Self::from_parts(config, factory, Aggregator::global())
    }

    pub fn from_parts(config: Config, factory: Arc<dyn DriverFactory>, aggregator: Arc<Aggregator>) -> Self {
        Self {
            config,
            factory,
            aggregator,
        }
    }

    pub fn with_factory(mut self, factory: impl DriverFactory + 'static) -> Self {
        self.factory = Arc::new(factory);
        self
    }

    pub fn with_aggregator(mut self, aggregator: Arc<Aggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn aggregator(&self) -> &Arc<Aggregator> {
        &self.aggregator
    }

    /// Run one test
    ///
    /// Never panics and never fails: setup errors, body errors and body
    /// panics all end up as a failed [`TestOutcome`].
    pub fn run<F>(&self, name: &str, body: F) -> TestOutcome
    where
        F: FnOnce(&mut TestContext<'_>) -> HarnessResult<()>,
    {
        let mut report = TestReport::new(name, self.aggregator.clone());
        let name = report.name().to_string();
        report.info(&format!("Начало выполнения теста: {}", name));

        let poll = Duration::from_millis(self.config.waits.poll_interval_ms);
        let session = match lifecycle::setup(self.factory.as_ref(), &self.config.browser, poll) {
            Ok(session) => session,
            Err(e) => {
                error!("Setup of '{}' failed: {}", name, e);
                report.error_with("Ошибка при инициализации драйвера", &e);
                return self.teardown(report, None, Err(e));
            }
        };

        report.info(&format!(
            "Неявное ожидание: {} сек, загрузка страницы: {} сек",
            session.timeouts.implicit.as_secs(),
            session.timeouts.page_load.as_secs()
        ));
        report.info(&format!(
            "Режим браузера: {}",
            if self.config.browser.headless { "headless" } else { "с окном" }
        ));

        let wait = Wait::new(self.config.waits.default_wait()).with_poll_interval(session.wait.poll_interval());
        let result = {
            let mut ctx = TestContext::new(session.driver.as_ref(), wait, &mut report, &self.config);
            panic::catch_unwind(AssertUnwindSafe(|| body(&mut ctx)))
                .unwrap_or_else(|payload| Err(HarnessError::Assertion(panic_message(payload.as_ref()))))
        };

        self.teardown(report, Some(session.driver), result)
    }

    fn teardown(
        &self,
        mut report: TestReport,
        driver: Option<Box<dyn WebDriver>>,
        result: HarnessResult<()>,
    ) -> TestOutcome {
        let name = report.name().to_string();

        let (status, message, trace) = match &result {
            Ok(()) if report.is_passed() => (TestStatus::Passed, String::new(), String::new()),
            Ok(()) => (
                TestStatus::Failed,
                "Отчет теста содержит ошибки".to_string(),
                String::new(),
            ),
            Err(e) => (TestStatus::Failed, e.to_string(), e.trace()),
        };

        guarded("record url", || {
            if let Some(driver) = &driver {
                match driver.current_url() {
                    Ok(url) => report.add_url(&url),
                    Err(e) => warn!("Could not read final URL: {}", e),
                }
            }
        });

        let mut screenshot: Option<PathBuf> = None;
        guarded("record outcome", || {
            if status.is_passed() {
                report.success(&format!("ТЕСТ ПРОЙДЕН: {}", name));
                return;
            }
            if let Some(driver) = &driver {
                let config = SnapshotConfig::new(&self.config.reports.screenshots_dir);
                match capture_screenshot(driver.as_ref(), &config, &name) {
                    Ok(snapshot) => {
                        report.screenshot(&snapshot.image_path);
                        screenshot = Some(snapshot.image_path);
                    }
                    Err(e) => report.warning(&format!("Не удалось сохранить скриншот: {}", e)),
                }
            }
            report.error(&format!("ТЕСТ НЕ ПРОЙДЕН: {} - {}", name, message));
        });

        guarded("record runner data", || {
            report.add_data("Статус теста", status.label());
            report.add_data("Сообщение", if message.is_empty() { "нет" } else { message.as_str() });
            report.add_data("Стек вызовов", if trace.is_empty() { "нет" } else { trace.as_str() });
        });

        guarded("finalize report", || report.finalize());

        if let Some(driver) = driver {
            guarded("quit driver", || lifecycle::teardown(driver, &mut report));
        }

        let duration_ms = report.duration().as_millis() as u64;
        info!("{} '{}' in {} ms", status.label(), name, duration_ms);
        TestOutcome {
            name,
            status,
            message,
            trace,
            duration_ms,
            screenshot,
        }
    }
}

/// Run one teardown step; a panic is logged and does not stop the next step
fn guarded(step: &str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        error!("Teardown step '{}' panicked: {}", step, panic_message(payload.as_ref()));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("panic: {}", detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ChromeOptions, DriverError, DriverResult, MockBrowser, MockSite};

    fn setup() -> (tempfile::TempDir, Config, Arc<Aggregator>) {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::pages::testing::config().with_screenshots_dir(dir.path().join("Screenshots"));
        let agg = Arc::new(Aggregator::new(dir.path().join("Reports")).with_console(false));
        (dir, config, agg)
    }

    fn base(config: &Config, agg: &Arc<Aggregator>, browser: &MockBrowser) -> TestBase {
        let browser = browser.clone();
        let factory = move |_: &ChromeOptions| -> DriverResult<Box<dyn WebDriver>> { Ok(browser.boxed()) };
        TestBase::from_parts(config.clone(), Arc::new(factory), agg.clone())
    }

    #[test]
    fn test_passing_test() {
        let (_dir, config, agg) = setup();
        let browser = MockSite::new(&config.site).build();
        let outcome = base(&config, &agg, &browser).run("Passing", |ctx| ctx.perform_login(None));

        assert!(outcome.passed());
        assert!(outcome.screenshot.is_none());
        assert_eq!(browser.quit_calls(), 1);
        assert_eq!(browser.screenshots_taken(), 0);
        assert_eq!(agg.counters().passed, 1);

        let content = std::fs::read_to_string(agg.current_report_path().unwrap()).unwrap();
        assert!(content.contains("ТЕСТ ПРОЙДЕН: Passing"));
        assert!(content.contains("Данные теста: Статус теста = ПРОЙДЕН"));
    }

    #[test]
    fn test_failing_test_takes_one_screenshot() {
        let (_dir, config, agg) = setup();
        let browser = MockSite::new(&config.site).build();
        let outcome = base(&config, &agg, &browser).run("Failing", |ctx| {
            ctx.perform_login(None)?;
            ctx.ensure(false, "URL is wrong")
        });

        assert!(!outcome.passed());
        assert_eq!(outcome.message, "Assertion failed: URL is wrong");
        assert_eq!(browser.screenshots_taken(), 1);
        assert_eq!(browser.quit_calls(), 1);
        let shot = outcome.screenshot.unwrap();
        assert!(shot.exists());
        assert!(shot.starts_with(&config.reports.screenshots_dir));
        assert_eq!(agg.counters().failed, 1);
    }

    #[test]
    fn test_panicking_body_is_a_failure() {
        let (_dir, config, agg) = setup();
        let browser = MockSite::new(&config.site).build();
        let outcome = base(&config, &agg, &browser).run("Panics", |_| panic!("boom"));

        assert_eq!(outcome.status, TestStatus::Failed);
        assert_eq!(outcome.message, "Assertion failed: panic: boom");
        assert_eq!(browser.quit_calls(), 1);
    }

    #[test]
    fn test_setup_failure() {
        let (_dir, config, agg) = setup();
        let factory = |_: &ChromeOptions| -> DriverResult<Box<dyn WebDriver>> {
            Err(DriverError::Launch("chrome not found".to_string()))
        };
        let base = TestBase::from_parts(config, Arc::new(factory), agg.clone());

        let mut ran = false;
        let outcome = base.run("NoBrowser", |_| {
            ran = true;
            Ok(())
        });

        assert!(!ran);
        assert!(!outcome.passed());
        assert!(outcome.trace.starts_with("DriverInitError"));
        assert!(outcome.screenshot.is_none());
        assert_eq!(agg.counters().failed, 1);
    }

    #[test]
    fn test_teardown_survives_failing_quit_and_screenshot() {
        let (_dir, config, agg) = setup();
        let browser = MockSite::new(&config.site).build().fail_quit(true).fail_screenshots(true);
        let outcome = base(&config, &agg, &browser).run("Broken", |ctx| ctx.ensure(false, "nope"));

        assert!(!outcome.passed());
        assert!(outcome.screenshot.is_none());
        assert_eq!(browser.quit_calls(), 1);
        assert_eq!(agg.counters().total, 1);
    }

    #[test]
    fn test_recorded_error_fails_test() {
        let (_dir, config, agg) = setup();
        let browser = MockSite::new(&config.site).build();
        let outcome = base(&config, &agg, &browser).run("Swallowed", |ctx| {
            ctx.report.error("something broke");
            Ok(())
        });
        assert!(!outcome.passed());
        assert_eq!(browser.screenshots_taken(), 1);
    }
}
