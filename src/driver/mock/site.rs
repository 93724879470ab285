//! Mock of the AI Ecosystem web application.
//!
//! Reproduces the login, model (request) and profile pages with the ids and
//! classes the page library relies on. Authenticated pages redirect to the
//! login page until valid credentials have been submitted.

use std::time::Duration;

use super::MockBrowser;
use super::MockState;
use super::dom::{El, el};
use crate::config::SiteSettings;
use crate::driver::backend::{DriverFactory, WebDriver};
use crate::driver::lifecycle::ChromeOptions;
use crate::driver::types::DriverResult;

/// Placeholder shown before any answer arrives
pub const RESPONSE_PLACEHOLDER: &str = "Your answer will be shown here";

const AUTH_FLAG: &str = "authenticated";

/// Builder for a [`MockBrowser`] serving the application
#[derive(Debug, Clone)]
pub struct MockSite {
    site: SiteSettings,
    full_name: String,
    response_delay: Duration,
    answer: String,
    sliders: bool,
}

impl MockSite {
    pub fn new(site: &SiteSettings) -> Self {
        Self {
            site: site.clone(),
            full_name: format!("{} Shutenko", site.user_display_name),
            response_delay: Duration::from_millis(100),
            answer: "Hello! I'm an AI assistant. How can I help you today?".to_string(),
            sliders: true,
        }
    }

    /// How long the model takes to answer a request
    pub fn response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    pub fn answer(mut self, answer: &str) -> Self {
        self.answer = answer.to_string();
        self
    }

    /// Render the model page without temperature / top-p sliders
    pub fn without_sliders(mut self) -> Self {
        self.sliders = false;
        self
    }

    pub fn profile_url(&self) -> String {
        format!("{}{}", origin(&self.site.login_url), self.site.profile_path)
    }

    /// Factory handing every test a fresh browser on a fresh site
    pub fn into_factory(self) -> impl DriverFactory {
        move |_: &ChromeOptions| -> DriverResult<Box<dyn WebDriver>> { Ok(self.clone().build().boxed()) }
    }

    pub fn build(self) -> MockBrowser {
        let login_url = self.site.login_url.clone();
        let profile_url = self.profile_url();
        let model_url = self.site.model_url.clone();

        let login_page = self.login_page();
        let model_page = self.model_page();
        let profile_page = self.profile_page();

        let guard_login = login_url.clone();
        let guard_model = login_url.clone();

        MockBrowser::new()
            .route(&login_url, login_page)
            .route_with(&model_url, move |state| authenticated(state, &guard_login, &model_page))
            .route_with(&profile_url, move |state| authenticated(state, &guard_model, &profile_page))
    }

    fn login_page(&self) -> El {
        let login = self.site.login.clone();
        let password = self.site.password.clone();
        let model_url = self.site.model_url.clone();

        let submit = move |state: &mut MockState| {
            let entered_login = state.value("#loginform-login").unwrap_or_default();
            let entered_password = state.value("#loginform-password").unwrap_or_default();
            if entered_login == login && entered_password == password {
                state.set_flag(AUTH_FLAG, true);
                let _ = state.navigate(&model_url);
            } else {
                state.set_displayed(".alert-danger", true);
            }
        };

        el("body").child(
            el("div").class("login-container").child(
                el("form")
                    .id("login-form")
                    .attr("action", "/auth/login.html")
                    .child(el("div").class("alert alert-danger").text("Incorrect username or password.").hidden())
                    .child(el("input").id("loginform-login").attr("name", "LoginForm[login]").attr("type", "text"))
                    .child(
                        el("input")
                            .id("loginform-password")
                            .attr("name", "LoginForm[password]")
                            .attr("type", "password"),
                    )
                    .child(
                        el("button")
                            .class("btn btn-primary btn-block")
                            .attr("name", "login-button")
                            .attr("type", "submit")
                            .text("Sign in")
                            .on_click(submit)
                            .child(el("i").class("icon-circle-right2 position-right")),
                    ),
            ),
        )
    }

    fn navbar(&self) -> El {
        let model_url = self.site.model_url.clone();
        let profile_url = self.profile_url();
        let login_url = self.site.login_url.clone();

        let logout = move |state: &mut MockState| {
            state.set_flag(AUTH_FLAG, false);
            let _ = state.navigate(&login_url);
        };

        el("div").class("navbar navbar-inverse").children([
            el("a").class("navbar-brand").attr("href", &model_url).text("AI - ecosystem"),
            el("ul").class("nav navbar-nav").child(
                el("li")
                    .child(el("a").attr("href", "#").text("Menu").on_click(|s| s.toggle_displayed("#main-menu")))
                    .child(
                        el("ul")
                            .id("main-menu")
                            .class("dropdown-menu")
                            .hidden()
                            .child(el("li").child(el("a").attr("href", &model_url).text("ChatGPT"))),
                    ),
            ),
            el("ul").class("nav navbar-nav navbar-right").child(
                el("li")
                    .class("dropdown dropdown-user")
                    .child(
                        el("a")
                            .class("dropdown-toggle")
                            .attr("data-toggle", "dropdown")
                            .on_click(|s| s.toggle_displayed(".dropdown-menu-right"))
                            .child(el("span").text(&self.full_name))
                            .child(el("i").class("caret")),
                    )
                    .child(
                        el("ul")
                            .class("dropdown-menu dropdown-menu-right")
                            .hidden()
                            .child(el("li").child(el("a").attr("href", &profile_url).text("Account settings")))
                            .child(el("li").child(el("a").attr("href", "#").text("Logout").on_click(logout))),
                    ),
            ),
        ])
    }

    fn breadcrumbs(&self, current: &str) -> El {
        el("div").class("breadcrumb-line").child(
            el("ul")
                .class("breadcrumb")
                .child(el("li").child(el("a").attr("href", &self.site.model_url).text("Home")))
                .child(el("li").class("active").text(current)),
        )
    }

    fn model_page(&self) -> El {
        let delay = self.response_delay;
        let answer = self.answer.clone();

        let send = move |state: &mut MockState| {
            let request = state.value("#textarea_request").unwrap_or_default();
            state.set_enabled("#send_request", false);
            state.set_displayed(".ladda-spinner", true);
            let answer = answer.clone();
            state.schedule(delay, move |s| {
                let text = if request.trim().is_empty() {
                    "Please enter a request.".to_string()
                } else {
                    answer.clone()
                };
                s.set_text("#response_div", &text);
                s.set_displayed(".ladda-spinner", false);
                s.set_enabled("#send_request", true);
            });
        };

        let mut form = el("form")
            .id("send-request-form")
            .child(el("textarea").id("textarea_request").attr("name", "request").attr("rows", "5"))
            .child(
                el("button")
                    .id("clear_request")
                    .class("btn btn-default")
                    .attr("type", "button")
                    .text("Clear")
                    .on_click(|s| s.set_value("#textarea_request", "")),
            )
            .child(
                el("button")
                    .id("send_request")
                    .class("btn btn-primary btn-ladda")
                    .attr("type", "button")
                    .on_click(send)
                    .child(el("span").class("ladda-label").text("Send Request"))
                    .child(el("span").class("ladda-spinner").hidden()),
            );

        if self.sliders {
            form = form
                .child(slider("temperature", "Temperature:", "0.7"))
                .child(slider("topp", "TopP:", "1"));
        }

        el("body").children([
            self.navbar(),
            el("div").class("page-header").child(el("h4").text("ChatGPT")),
            self.breadcrumbs("ChatGPT"),
            el("div").class("panel panel-body border-top-info").child(form),
            el("div")
                .class("panel panel-flat")
                .child(el("div").id("response_div").class("response-body").text(RESPONSE_PLACEHOLDER))
                .child(
                    el("button")
                        .class("btn btn-default coping")
                        .attr("type", "button")
                        .text("Copy Answer"),
                ),
            el("div").class("footer text-muted pt-20").text("© AI - ecosystem"),
        ])
    }

    fn profile_page(&self) -> El {
        el("body").children([
            self.navbar(),
            el("div").class("page-header").child(el("h4").text("Profile")),
            self.breadcrumbs("Profile"),
            el("div").class("panel panel-body").children([
                el("span").class("user-id").text(&format!("User ID: {}", self.site.expected_user_id)),
                el("i").class("icon-clippy").attr("title", "Copy"),
            ]),
        ])
    }
}

fn slider(name: &str, label: &str, value: &str) -> El {
    let handle = format!("#noui-connect-lower-{} .noUi-handle", name);
    el("div").class("form-group").children([
        el("label").text(label),
        el("input").id(if name == "topp" { "top_p" } else { name }).attr("type", "hidden").value(value),
        el("div")
            .id(&format!("noui-connect-lower-{}", name))
            .class(&format!("noui-connect-lower-{} noUi-target", name))
            .child(
                el("div")
                    .class("noUi-handle")
                    .on_click(move |s| s.add_class(&handle, "noUi-active")),
            ),
    ])
}

fn authenticated(state: &MockState, login_url: &str, page: &El) -> Result<El, String> {
    if state.flag(AUTH_FLAG) {
        Ok(page.clone())
    } else {
        Err(login_url.to_string())
    }
}

/// `scheme://host[:port]` part of a URL
pub fn origin(url: &str) -> &str {
    let after_scheme = url.find("://").map(|i| i + 3).unwrap_or(0);
    match url[after_scheme..].find('/') {
        Some(i) => &url[..after_scheme + i],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::backend::{WebDriver, find, find_visible};
    use crate::driver::types::By;

    fn settings() -> SiteSettings {
        SiteSettings {
            password: "secret".to_string(),
            ..SiteSettings::defaults()
        }
    }

    fn login(browser: &MockBrowser, password: &str) {
        let site = settings();
        browser.goto(&site.login_url).unwrap();
        find(browser, &By::id("loginform-login")).unwrap().send_keys(&site.login).unwrap();
        find(browser, &By::id("loginform-password")).unwrap().send_keys(password).unwrap();
        find(browser, &By::css(".icon-circle-right2")).unwrap().click().unwrap();
    }

    #[test]
    fn test_origin() {
        assert_eq!(origin("https://host:9999/auth/login.html"), "https://host:9999");
        assert_eq!(origin("http://host"), "http://host");
    }

    #[test]
    fn test_model_page_requires_login() {
        let browser = MockSite::new(&settings()).build();
        browser.goto(&settings().model_url).unwrap();
        assert!(browser.current_url().unwrap().contains("login"));
    }

    #[test]
    fn test_login_and_logout() {
        let browser = MockSite::new(&settings()).build();
        login(&browser, "secret");
        assert!(browser.current_url().unwrap().contains("/request/model.html"));

        find(&browser, &By::css(".dropdown-toggle")).unwrap().click().unwrap();
        find(&browser, &By::link_text("Logout")).unwrap().click().unwrap();
        assert!(browser.current_url().unwrap().contains("/auth/login.html"));
    }

    #[test]
    fn test_wrong_password_stays_on_login() {
        let browser = MockSite::new(&settings()).build();
        login(&browser, "wrong");
        assert!(browser.current_url().unwrap().contains("login"));
        assert!(find_visible(&browser, &By::css(".alert-danger")).unwrap().is_some());
    }

    #[test]
    fn test_send_request_answers_after_delay() {
        let browser = MockSite::new(&settings()).response_delay(Duration::from_millis(30)).build();
        login(&browser, "secret");

        find(&browser, &By::id("textarea_request")).unwrap().send_keys("Hi").unwrap();
        let send = find(&browser, &By::id("send_request")).unwrap();
        send.click().unwrap();
        assert!(!send.is_enabled().unwrap());

        std::thread::sleep(Duration::from_millis(60));
        assert!(send.is_enabled().unwrap());
        let response = find(&browser, &By::id("response_div")).unwrap().text().unwrap();
        assert!(response.starts_with("Hello!"));
    }
}
