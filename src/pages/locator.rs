//! Ordered locator strategies with fallback reporting.
//!
//! A [`LocatorChain`] tries each strategy in turn and returns the first
//! displayed element that passes the strategy's text filter. When a
//! fallback (any strategy but the first) wins, a WARNING step is recorded so
//! DOM drift shows up in the report.

use crate::driver::{By, DriverResult, WebDriver, WebElement, find_all};
use crate::harness::types::{HarnessError, HarnessResult};
use crate::report::TestReport;

/// Optional text condition on a candidate element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFilter {
    Any,
    /// Rendered text contains the needle, ignoring case
    ContainsIgnoreCase(String),
}

impl TextFilter {
    fn accepts(&self, text: &str) -> bool {
        match self {
            TextFilter::Any => true,
            TextFilter::ContainsIgnoreCase(needle) => text.to_lowercase().contains(&needle.to_lowercase()),
        }
    }
}

/// One way of finding an element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub by: By,
    pub filter: TextFilter,
}

/// Element found by a chain, with the index of the strategy that matched
#[derive(Debug)]
pub struct Located<'a> {
    pub element: WebElement<'a>,
    pub strategy: usize,
}

impl Located<'_> {
    pub fn used_fallback(&self) -> bool {
        self.strategy > 0
    }
}

/// Ordered list of strategies for one logical element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorChain {
    name: String,
    strategies: Vec<Strategy>,
}

impl LocatorChain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategies: Vec::new(),
        }
    }

    /// Add a strategy accepting any displayed match
    pub fn then(mut self, by: By) -> Self {
        self.strategies.push(Strategy {
            by,
            filter: TextFilter::Any,
        });
        self
    }

    /// Add a strategy whose match must contain `text` (case-insensitive)
    pub fn then_with_text(mut self, by: By, text: impl Into<String>) -> Self {
        self.strategies.push(Strategy {
            by,
            filter: TextFilter::ContainsIgnoreCase(text.into()),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// First displayed match, trying strategies in order
    pub fn locate<'a>(&self, driver: &'a dyn WebDriver) -> DriverResult<Option<Located<'a>>> {
        for (index, strategy) in self.strategies.iter().enumerate() {
            for element in find_all(driver, &strategy.by)? {
                if !element.is_visible() {
                    continue;
                }
                let accepted = match &strategy.filter {
                    TextFilter::Any => true,
                    filter => element.text().map(|t| filter.accepts(&t)).unwrap_or(false),
                };
                if accepted {
                    return Ok(Some(Located { element, strategy: index }));
                }
            }
        }
        Ok(None)
    }

    /// Like [`LocatorChain::locate`], recording a warning on fallback
    ///
    /// Fails with `ElementNotFound` when no strategy matches.
    pub fn find<'a>(&self, driver: &'a dyn WebDriver, report: &mut TestReport) -> HarnessResult<WebElement<'a>> {
        let located = self
            .locate(driver)?
            .ok_or_else(|| HarnessError::ElementNotFound(self.name.clone()))?;

        if located.used_fallback() {
            let primary = self
                .strategies
                .first()
                .map(|s| s.by.to_string())
                .unwrap_or_default();
            report.warning(&format!(
                "{}: основной локатор ({}) не сработал, использован запасной ({})",
                self.name, primary, self.strategies[located.strategy].by
            ));
        }
        Ok(located.element)
    }
}
