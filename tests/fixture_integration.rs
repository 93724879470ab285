//! End-to-end runs of the fixture and page operations against the mock site.

use ecosystem_autotests::config::Config;
use ecosystem_autotests::driver::mock::dom::el;
use ecosystem_autotests::driver::{By, MockBrowser, MockSite, WebDriver};
use ecosystem_autotests::harness::{self, HarnessError, TestBase, TestStatus};
use ecosystem_autotests::report::Aggregator;
use ecosystem_autotests::wait::{self, ResponseEvidence};
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Fixture {
    _dir: tempfile::TempDir,
    config: Config,
    aggregator: Arc<Aggregator>,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::defaults()
            .with_credentials("v_shutenko", "8nEThznM")
            .without_pauses()
            .with_screenshots_dir(dir.path().join("Screenshots"));
        let aggregator = Arc::new(Aggregator::new(dir.path().join("Reports")).with_console(false));
        Self {
            _dir: dir,
            config,
            aggregator,
        }
    }

    fn base(&self) -> TestBase {
        let site = MockSite::new(&self.config.site).response_delay(Duration::from_millis(50));
        TestBase::from_parts(self.config.clone(), Arc::new(site.into_factory()), self.aggregator.clone())
    }

    fn report(&self) -> String {
        fs::read_to_string(self.aggregator.current_report_path().unwrap()).unwrap()
    }

    fn screenshots(&self) -> usize {
        fs::read_dir(&self.config.reports.screenshots_dir)
            .map(|entries| entries.filter_map(Result::ok).filter(|e| e.path().extension().is_some_and(|x| x == "png")).count())
            .unwrap_or(0)
    }
}

#[test]
fn test_single_passing_login() {
    let fixture = Fixture::new();
    let mut final_url = String::new();

    let outcome = fixture.base().run("AuthorizationLogInTest", |ctx| {
        ctx.perform_login(None)?;
        final_url = ctx.current_url();
        Ok(())
    });
    fixture.aggregator.finalize_session();

    assert_eq!(outcome.status, TestStatus::Passed);
    assert!(!final_url.contains("login"), "{}", final_url);

    let counters = fixture.aggregator.counters();
    assert_eq!((counters.total, counters.passed, counters.failed), (1, 1, 0));

    let content = fixture.report();
    assert!(content.contains("Всего тестов: 1"));
    assert!(content.contains("✅ AuthorizationLogInTest - ПРОЙДЕН ("));
    assert!(content.contains("Данные теста: Пароль = 8n****nM"));
    assert!(!content.contains("8nEThznM"));
}

#[test]
fn test_failure_before_any_driver_action() {
    let fixture = Fixture::new();
    let base = fixture.base();

    let passed = base.run("Passing", |ctx| {
        ctx.perform_login(None)?;
        ctx.validate_login_success()
    });
    let failed = base.run("Failing", |_| Err(HarnessError::Assertion("thrown early".to_string())));
    fixture.aggregator.finalize_session();

    assert!(passed.passed());
    assert!(!failed.passed());
    assert!(failed.screenshot.as_ref().is_some_and(|p| p.exists()));
    assert_eq!(fixture.screenshots(), 1);

    let counters = fixture.aggregator.counters();
    assert_eq!((counters.total, counters.passed, counters.failed), (2, 1, 1));

    let content = fixture.report();
    let first = content.find("ИТОГ ТЕСТА: Passing").unwrap();
    let second = content.find("ИТОГ ТЕСТА: Failing").unwrap();
    assert!(first < second);
    assert!(content.contains("ТЕСТ НЕ ПРОЙДЕН: Failing - Assertion failed: thrown early"));
    assert!(content.contains("❌ Failing - ПРОВАЛЕН ("));
}

#[test]
fn test_cyrillic_text_round_trip() {
    let fixture = Fixture::new();
    let mut value = String::new();

    let outcome = fixture.base().run("UnicodeTextInput", |ctx| {
        ctx.perform_login(None)?;
        ctx.navigate_to_chatgpt()?;
        ctx.enter_text_and_verify("Привет", None)?;
        // Idempotent: a second call leaves the same value
        ctx.enter_text_and_verify("Привет", None)?;
        value = ctx.find(&By::id("textarea_request"))?.value()?;
        Ok(())
    });

    assert!(outcome.passed(), "{}", outcome.message);
    assert_eq!(value, "Привет");
    assert_eq!(value.chars().count(), 6);
}

#[test]
fn test_response_detected_by_copy_button() {
    let browser = MockBrowser::new().route(
        "http://app/",
        el("body")
            .child(el("div").class("response-body").text("Your answer will be shown here"))
            .child(el("span").class("ladda-spinner"))
            .child(el("button").class("btn coping").text("Copy Answer").hidden()),
    );
    browser.goto("http://app/").unwrap();
    browser.schedule(Duration::from_secs(1), |state| {
        state.set_displayed(".ladda-spinner", false);
        state.set_displayed(".coping", true);
    });

    let start = Instant::now();
    let evidence = wait::wait_for_response(&browser, Duration::from_secs(10), Duration::from_secs(2)).unwrap();

    assert_eq!(evidence, ResponseEvidence::CopyButtonReady);
    assert!(start.elapsed() <= Duration::from_secs(3));
}

#[test]
fn test_selected_scenarios_on_two_workers() {
    let fixture = Fixture::new();
    let scenarios = harness::select(Some("navigation"));
    let names: Vec<&str> = scenarios.iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["AccountSettingsNavigation", "ChatGPTNavigation"]);

    let result = harness::run_suite(&fixture.base(), &scenarios, 2);

    assert!(result.success, "{:?}", result.failures().collect::<Vec<_>>());
    assert_eq!((result.total, result.passed, result.failed), (2, 2, 0));
    assert_eq!(result.tests[0].name, "AccountSettingsNavigation");
    assert_eq!(result.tests[1].name, "ChatGPTNavigation");
    assert_eq!(result.report_path, fixture.aggregator.current_report_path());

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["tests"][0]["status"], "Passed");
}
