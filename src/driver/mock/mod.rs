//! In-process mock browser for testing without Chrome.
//!
//! [`MockBrowser`] implements [`WebDriver`] over a fake DOM. Pages are
//! registered per URL prefix, click handlers mutate the browser state, and
//! mutations can be scheduled to happen after a delay so that waits can be
//! exercised deterministically.
//!
//! Element references carry the page generation, so a reference taken
//! before a navigation reports `StaleElement` afterwards, like a real
//! browser.

pub mod dom;
pub mod selector;
pub mod site;

use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::backend::WebDriver;
use super::types::{By, DriverError, DriverResult, ElementRef, Timeouts};
use dom::{Action, Dom, El, NodeId, el};
use selector::SelectorGroup;

pub use site::MockSite;

/// Builds the markup of a page; `Err(url)` redirects instead
pub type PageFn = Arc<dyn Fn(&MockState) -> Result<El, String> + Send + Sync>;

const MAX_REDIRECTS: usize = 5;

struct Route {
    prefix: String,
    page: PageFn,
}

struct Scheduled {
    at: Instant,
    generation: u64,
    action: Action,
}

/// Mutable state of the mock browser, handed to click handlers
pub struct MockState {
    url: String,
    dom: Dom,
    generation: u64,
    routes: Vec<Route>,
    unreachable: Vec<String>,
    scheduled: Vec<Scheduled>,
    flags: BTreeSet<String>,
    visited: Vec<String>,
    timeouts: Timeouts,
    window: (u32, u32),
    quit_calls: usize,
    screenshots: usize,
    fail_screenshots: bool,
    fail_quit: bool,
}

impl MockState {
    fn new() -> Self {
        Self {
            url: "about:blank".to_string(),
            dom: Dom::empty(),
            generation: 0,
            routes: Vec::new(),
            unreachable: Vec::new(),
            scheduled: Vec::new(),
            flags: BTreeSet::new(),
            visited: Vec::new(),
            timeouts: Timeouts::default(),
            window: (800, 600),
            quit_calls: 0,
            screenshots: 0,
            fail_screenshots: false,
            fail_quit: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    /// Load `url`, following page redirects
    pub fn navigate(&mut self, url: &str) -> DriverResult<()> {
        let mut target = url.to_string();

        for _ in 0..MAX_REDIRECTS {
            if self.unreachable.iter().any(|p| target.starts_with(p.as_str())) {
                return Err(DriverError::Protocol {
                    error: "unknown error".to_string(),
                    message: format!("net::ERR_NAME_NOT_RESOLVED at {}", target),
                });
            }

            let page = self
                .routes
                .iter()
                .filter(|r| target.starts_with(r.prefix.as_str()))
                .max_by_key(|r| r.prefix.len())
                .map(|r| r.page.clone());

            let root = match page {
                None => el("body"),
                Some(page) => match page(self) {
                    Ok(root) => root,
                    Err(redirect) => {
                        target = redirect;
                        continue;
                    }
                },
            };

            self.generation += 1;
            self.dom = Dom::build(root);
            self.visited.push(target.clone());
            self.url = target;
            return Ok(());
        }

        Err(DriverError::Protocol {
            error: "unknown error".to_string(),
            message: format!("too many redirects loading {}", url),
        })
    }

    /// Nodes of the current page matching a CSS selector group
    pub fn select(&self, css: &str) -> Vec<NodeId> {
        match SelectorGroup::parse(css) {
            Ok(group) => self.dom.all().filter(|&n| group.matches(&self.dom, n)).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn update(&mut self, css: &str, f: impl Fn(&mut dom::Node)) {
        for id in self.select(css) {
            f(self.dom.node_mut(id));
        }
    }

    pub fn set_text(&mut self, css: &str, text: &str) {
        self.update(css, |n| n.text = text.to_string());
    }

    pub fn set_displayed(&mut self, css: &str, displayed: bool) {
        self.update(css, |n| n.displayed = displayed);
    }

    pub fn toggle_displayed(&mut self, css: &str) {
        self.update(css, |n| n.displayed = !n.displayed);
    }

    pub fn set_enabled(&mut self, css: &str, enabled: bool) {
        self.update(css, |n| n.enabled = enabled);
    }

    pub fn set_value(&mut self, css: &str, value: &str) {
        self.update(css, |n| n.value = Some(value.to_string()));
    }

    pub fn add_class(&mut self, css: &str, class: &str) {
        self.update(css, |n| {
            if !n.classes.iter().any(|c| c == class) {
                n.classes.push(class.to_string());
            }
        });
    }

    /// Value of the first node matching `css`
    pub fn value(&self, css: &str) -> Option<String> {
        self.select(css)
            .first()
            .and_then(|&id| self.dom.node(id).value.clone())
    }

    /// Timeouts last set through the driver
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    pub fn set_flag(&mut self, name: &str, on: bool) {
        if on {
            self.flags.insert(name.to_string());
        } else {
            self.flags.remove(name);
        }
    }

    /// Run `action` once `delay` has elapsed, unless the page changes first
    pub fn schedule(&mut self, delay: Duration, action: impl Fn(&mut MockState) + Send + Sync + 'static) {
        self.scheduled.push(Scheduled {
            at: Instant::now() + delay,
            generation: self.generation,
            action: Arc::new(action),
        });
    }

    fn run_due(&mut self) {
        loop {
            let now = Instant::now();
            let next = self
                .scheduled
                .iter()
                .enumerate()
                .filter(|(_, s)| s.at <= now)
                .min_by_key(|(_, s)| s.at)
                .map(|(i, _)| i);
            let Some(index) = next else {
                return;
            };
            let due = self.scheduled.remove(index);
            if due.generation == self.generation {
                (due.action)(self);
            }
        }
    }

    fn ensure_open(&self) -> DriverResult<()> {
        if self.quit_calls > 0 {
            return Err(DriverError::Protocol {
                error: "invalid session id".to_string(),
                message: "session deleted because of page crash or quit".to_string(),
            });
        }
        Ok(())
    }

    fn element_ref(&self, node: NodeId) -> ElementRef {
        ElementRef::new(format!("mock-{}-{}", self.generation, node))
    }

    fn resolve(&self, element: &ElementRef) -> DriverResult<NodeId> {
        let stale = || DriverError::StaleElement(element.as_str().to_string());
        let mut parts = element.as_str().strip_prefix("mock-").ok_or_else(stale)?.split('-');
        let generation: u64 = parts.next().and_then(|s| s.parse().ok()).ok_or_else(stale)?;
        let node: NodeId = parts.next().and_then(|s| s.parse().ok()).ok_or_else(stale)?;
        if generation != self.generation || !self.dom.contains(node) {
            return Err(stale());
        }
        Ok(node)
    }

    fn query(&self, by: &By, scope: Option<NodeId>) -> DriverResult<Vec<ElementRef>> {
        let candidates: Vec<NodeId> = match scope {
            Some(parent) => self.dom.descendants(parent),
            None => self.dom.all().collect(),
        };

        let matches: Vec<NodeId> = match by {
            By::Css(css) => {
                let group = SelectorGroup::parse(css).map_err(|message| DriverError::Protocol {
                    error: "invalid selector".to_string(),
                    message,
                })?;
                candidates.into_iter().filter(|&n| group.matches(&self.dom, n)).collect()
            }
            By::Id(id) => candidates
                .into_iter()
                .filter(|&n| self.dom.node(n).id.as_deref() == Some(id.as_str()))
                .collect(),
            By::Name(name) => candidates
                .into_iter()
                .filter(|&n| self.dom.attribute(n, "name").as_deref() == Some(name.as_str()))
                .collect(),
            By::TagName(tag) => candidates
                .into_iter()
                .filter(|&n| self.dom.node(n).tag.eq_ignore_ascii_case(tag))
                .collect(),
            By::LinkText(text) => candidates
                .into_iter()
                .filter(|&n| self.dom.node(n).tag == "a" && self.dom.rendered_text(n).trim() == text.as_str())
                .collect(),
            By::PartialLinkText(text) => candidates
                .into_iter()
                .filter(|&n| self.dom.node(n).tag == "a" && self.dom.rendered_text(n).contains(text.as_str()))
                .collect(),
        };

        Ok(matches.into_iter().map(|n| self.element_ref(n)).collect())
    }

    fn click(&mut self, node: NodeId) -> DriverResult<()> {
        if !self.dom.is_displayed(node) {
            return Err(DriverError::Protocol {
                error: "element not interactable".to_string(),
                message: format!("element {} is not displayed", node),
            });
        }

        // A click on a container lands on its first interactive child
        let hit = self.dom.click_target(node).or_else(|| {
            self.dom
                .descendants(node)
                .into_iter()
                .filter(|&d| self.dom.is_displayed(d))
                .find_map(|d| self.dom.node(d).on_click.clone().map(|a| (d, a)))
        });

        match hit {
            Some((target, action)) => {
                if self.dom.node(target).enabled {
                    action(self);
                }
                Ok(())
            }
            None => {
                let mut current = Some(node);
                while let Some(n) = current {
                    if self.dom.node(n).tag == "a" {
                        if let Some(href) = self.dom.attribute(n, "href") {
                            return self.navigate(&href);
                        }
                    }
                    current = self.dom.parent(n);
                }
                Ok(())
            }
        }
    }
}

/// Scriptable fake browser; clones share the same state
#[derive(Clone)]
pub struct MockBrowser {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBrowser {
    /// A browser showing `about:blank` with no routes
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::new())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Lock the state with pending scheduled mutations applied
    fn live(&self) -> DriverResult<MutexGuard<'_, MockState>> {
        let mut state = self.state();
        state.ensure_open()?;
        state.run_due();
        Ok(state)
    }

    /// Serve a static page for every URL starting with `prefix`
    pub fn route(self, prefix: &str, page: El) -> Self {
        self.route_with(prefix, move |_| Ok(page.clone()))
    }

    /// Serve a page computed from the current state
    pub fn route_with(
        self,
        prefix: &str,
        page: impl Fn(&MockState) -> Result<El, String> + Send + Sync + 'static,
    ) -> Self {
        self.state().routes.push(Route {
            prefix: prefix.to_string(),
            page: Arc::new(page),
        });
        self
    }

    /// Navigation to URLs with this prefix fails like an unresolvable host
    pub fn unreachable(self, prefix: &str) -> Self {
        self.state().unreachable.push(prefix.to_string());
        self
    }

    pub fn fail_screenshots(self, fail: bool) -> Self {
        self.state().fail_screenshots = fail;
        self
    }

    pub fn fail_quit(self, fail: bool) -> Self {
        self.state().fail_quit = fail;
        self
    }

    /// Schedule a mutation of the current page
    pub fn schedule(&self, delay: Duration, action: impl Fn(&mut MockState) + Send + Sync + 'static) {
        self.state().schedule(delay, action);
    }

    /// Run `f` against the state directly
    pub fn with_state<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        let mut state = self.state();
        state.run_due();
        f(&mut state)
    }

    pub fn visited(&self) -> Vec<String> {
        self.state().visited.clone()
    }

    pub fn quit_calls(&self) -> usize {
        self.state().quit_calls
    }

    pub fn screenshots_taken(&self) -> usize {
        self.state().screenshots
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.state().window
    }

    /// Boxed clone, ready to hand to the fixture
    pub fn boxed(&self) -> Box<dyn WebDriver> {
        Box::new(self.clone())
    }
}

impl WebDriver for MockBrowser {
    fn goto(&self, url: &str) -> DriverResult<()> {
        self.live()?.navigate(url)
    }

    fn current_url(&self) -> DriverResult<String> {
        Ok(self.live()?.url.clone())
    }

    fn page_source(&self) -> DriverResult<String> {
        Ok(self.live()?.dom.to_html())
    }

    fn find_elements(&self, by: &By) -> DriverResult<Vec<ElementRef>> {
        self.live()?.query(by, None)
    }

    fn find_child_elements(&self, parent: &ElementRef, by: &By) -> DriverResult<Vec<ElementRef>> {
        let state = self.live()?;
        let node = state.resolve(parent)?;
        state.query(by, Some(node))
    }

    fn is_displayed(&self, element: &ElementRef) -> DriverResult<bool> {
        let state = self.live()?;
        let node = state.resolve(element)?;
        Ok(state.dom.is_displayed(node))
    }

    fn is_enabled(&self, element: &ElementRef) -> DriverResult<bool> {
        let state = self.live()?;
        let node = state.resolve(element)?;
        Ok(state.dom.node(node).enabled)
    }

    fn text(&self, element: &ElementRef) -> DriverResult<String> {
        let state = self.live()?;
        let node = state.resolve(element)?;
        Ok(state.dom.rendered_text(node))
    }

    fn attribute(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>> {
        let state = self.live()?;
        let node = state.resolve(element)?;
        if name == "value" {
            if let Some(value) = &state.dom.node(node).value {
                return Ok(Some(value.clone()));
            }
        }
        Ok(state.dom.attribute(node, name))
    }

    fn property(&self, element: &ElementRef, name: &str) -> DriverResult<Option<String>> {
        let state = self.live()?;
        let node = state.resolve(element)?;
        match name {
            "value" => Ok(state.dom.node(node).value.clone()),
            "textContent" | "innerText" => Ok(Some(state.dom.rendered_text(node))),
            _ => Ok(state.dom.attribute(node, name)),
        }
    }

    fn click(&self, element: &ElementRef) -> DriverResult<()> {
        let mut state = self.live()?;
        let node = state.resolve(element)?;
        state.click(node)
    }

    fn clear(&self, element: &ElementRef) -> DriverResult<()> {
        let mut state = self.live()?;
        let node = state.resolve(element)?;
        let target = state.dom.node_mut(node);
        if target.value.is_some() {
            target.value = Some(String::new());
        }
        Ok(())
    }

    fn send_keys(&self, element: &ElementRef, text: &str) -> DriverResult<()> {
        let mut state = self.live()?;
        let node = state.resolve(element)?;
        let displayed = state.dom.is_displayed(node);
        let target = state.dom.node_mut(node);
        match (&mut target.value, displayed && target.enabled) {
            (Some(value), true) => {
                value.push_str(text);
                Ok(())
            }
            _ => Err(DriverError::Protocol {
                error: "element not interactable".to_string(),
                message: format!("element {} does not accept keys", node),
            }),
        }
    }

    fn screenshot_png(&self) -> DriverResult<Vec<u8>> {
        let mut state = self.live()?;
        if state.fail_screenshots {
            return Err(DriverError::Protocol {
                error: "unknown error".to_string(),
                message: "screenshot failed".to_string(),
            });
        }
        state.screenshots += 1;

        let image = image::RgbImage::from_pixel(64, 36, image::Rgb([0xf5, 0xf5, 0xf5]));
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut bytes, image::ImageOutputFormat::Png)
            .map_err(|e| DriverError::InvalidResponse(e.to_string()))?;
        Ok(bytes.into_inner())
    }

    fn set_timeouts(&self, timeouts: &Timeouts) -> DriverResult<()> {
        self.live()?.timeouts = *timeouts;
        Ok(())
    }

    fn timeouts(&self) -> DriverResult<Timeouts> {
        Ok(self.live()?.timeouts)
    }

    fn set_window_size(&self, width: u32, height: u32) -> DriverResult<()> {
        self.live()?.window = (width, height);
        Ok(())
    }

    fn quit(&self) -> DriverResult<()> {
        let mut state = self.state();
        state.quit_calls += 1;
        if state.fail_quit {
            return Err(DriverError::Protocol {
                error: "unknown error".to_string(),
                message: "browser did not exit".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::backend::{find, find_visible};

    fn browser() -> MockBrowser {
        MockBrowser::new().route(
            "http://site/page",
            el("body")
                .child(el("input").id("name"))
                .child(el("button").id("go").text("Go").on_click(|s| s.set_displayed(".result", true)))
                .child(el("div").class("result").text("done").hidden())
                .child(el("a").attr("href", "http://site/other").text("Other page")),
        )
    }

    #[test]
    fn test_navigation_and_lookup() {
        let browser = browser();
        browser.goto("http://site/page").unwrap();
        assert_eq!(browser.current_url().unwrap(), "http://site/page");
        assert_eq!(browser.find_elements(&By::id("name")).unwrap().len(), 1);
        assert!(browser.find_element(&By::css(".missing")).unwrap_err().is_no_such_element());
    }

    #[test]
    fn test_click_runs_action() {
        let browser = browser();
        browser.goto("http://site/page").unwrap();
        assert!(find_visible(&browser, &By::css(".result")).unwrap().is_none());
        find(&browser, &By::id("go")).unwrap().click().unwrap();
        assert!(find_visible(&browser, &By::css(".result")).unwrap().is_some());
    }

    #[test]
    fn test_link_navigation_makes_refs_stale() {
        let browser = browser();
        browser.goto("http://site/page").unwrap();
        let input = browser.find_element(&By::id("name")).unwrap();
        browser.find_element(&By::link_text("Other page")).and_then(|l| browser.click(&l)).unwrap();
        assert_eq!(browser.current_url().unwrap(), "http://site/other");
        assert!(matches!(browser.is_displayed(&input), Err(DriverError::StaleElement(_))));
    }

    #[test]
    fn test_keys_and_clear() {
        let browser = browser();
        browser.goto("http://site/page").unwrap();
        let input = find(&browser, &By::id("name")).unwrap();
        input.send_keys("Привет").unwrap();
        assert_eq!(input.value().unwrap(), "Привет");
        input.clear().unwrap();
        assert_eq!(input.value().unwrap(), "");
    }

    #[test]
    fn test_scheduled_mutation() {
        let browser = browser();
        browser.goto("http://site/page").unwrap();
        browser.schedule(Duration::from_millis(30), |s| s.set_displayed(".result", true));
        assert!(find_visible(&browser, &By::css(".result")).unwrap().is_none());
        std::thread::sleep(Duration::from_millis(50));
        assert!(find_visible(&browser, &By::css(".result")).unwrap().is_some());
    }

    #[test]
    fn test_screenshot_is_png() {
        let browser = browser();
        let png = browser.screenshot_png().unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), image::ImageFormat::Png);
        assert_eq!(browser.screenshots_taken(), 1);
    }

    #[test]
    fn test_quit_closes_session() {
        let browser = browser();
        browser.quit().unwrap();
        assert_eq!(browser.quit_calls(), 1);
        assert!(browser.goto("http://site/page").is_err());
    }

    #[test]
    fn test_unreachable_host() {
        let browser = MockBrowser::new().unreachable("http://down");
        assert!(browser.goto("http://down/login").is_err());
    }
}
