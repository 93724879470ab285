use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::driver::{By, WebDriver, WebElement, find};
use crate::harness::types::{HarnessError, HarnessResult};
use crate::report::TestReport;
use crate::wait::Wait;

/// Everything a test body works with: driver, wait, report and config
///
/// Page operations are implemented on this type in [`crate::pages`].
pub struct TestContext<'a> {
    pub driver: &'a dyn WebDriver,
    pub wait: Wait,
    pub report: &'a mut TestReport,
    pub config: &'a Config,
}

impl<'a> TestContext<'a> {
    pub fn new(driver: &'a dyn WebDriver, wait: Wait, report: &'a mut TestReport, config: &'a Config) -> Self {
        Self {
            driver,
            wait,
            report,
            config,
        }
    }

    /// Run `op`; on failure record an ERROR step with `failure` and the
    /// error, then hand the error back
    pub fn recorded<T>(&mut self, failure: &str, op: impl FnOnce(&mut Self) -> HarnessResult<T>) -> HarnessResult<T> {
        op(self).inspect_err(|e| self.report.error_with(failure, e))
    }

    /// Settle pause; skipped when zero
    pub fn pause(&self, millis: u64) {
        if millis > 0 {
            thread::sleep(Duration::from_millis(millis));
        }
    }

    /// Current URL, empty when the driver cannot tell
    pub fn current_url(&self) -> String {
        self.driver.current_url().unwrap_or_default()
    }

    /// First element matching `by`
    pub fn find(&self, by: &By) -> HarnessResult<WebElement<'a>> {
        Ok(find(self.driver, by)?)
    }

    /// Navigate, mapping failures to `Navigation`
    pub fn goto(&mut self, url: &str) -> HarnessResult<()> {
        self.driver.goto(url).map_err(|source| HarnessError::Navigation {
            url: url.to_string(),
            source,
        })
    }

    pub fn ensure(&self, condition: bool, message: &str) -> HarnessResult<()> {
        if condition {
            Ok(())
        } else {
            Err(HarnessError::Assertion(message.to_string()))
        }
    }

    pub fn assert_url_contains(&mut self, fragment: &str) -> HarnessResult<()> {
        let url = self.current_url();
        self.ensure(
            url.contains(fragment),
            &format!("URL '{}' не содержит '{}'", url, fragment),
        )?;
        self.report.success(&format!("URL содержит '{}'", fragment));
        Ok(())
    }

    pub fn assert_url_not_contains(&mut self, fragment: &str) -> HarnessResult<()> {
        let url = self.current_url();
        self.ensure(
            !url.contains(fragment),
            &format!("URL '{}' содержит '{}'", url, fragment),
        )?;
        self.report.success(&format!("URL не содержит '{}'", fragment));
        Ok(())
    }

    /// Page source contains `needle`
    pub fn page_contains(&self, needle: &str) -> bool {
        self.driver
            .page_source()
            .map(|source| source.contains(needle))
            .unwrap_or(false)
    }
}
