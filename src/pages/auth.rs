//! Login, user menu, account settings and logout.

use super::{
    BROWSER_SIZE, LOGGED_IN_MARKERS, LOGIN_INPUT, LOGIN_SUBMIT, LocatorChain, MODEL_PATH, PASSWORD_INPUT,
    USER_MENU, USER_MENU_FALLBACK,
};
use crate::driver::{By, WebElement};
use crate::harness::TestContext;
use crate::harness::types::{HarnessError, HarnessResult};

impl<'a> TestContext<'a> {
    /// Log in with the configured credentials
    ///
    /// Navigates to `url` (default: the configured login page), fills the
    /// form, submits it and waits for the user menu to appear.
    pub fn perform_login(&mut self, url: Option<&str>) -> HarnessResult<()> {
        let url = url.map_or_else(|| self.config.site.login_url.clone(), str::to_string);

        self.recorded("Ошибка при выполнении логина", |ctx| {
            ctx.report.info(&format!("Переход на страницу входа: {}", url));
            ctx.goto(&url)?;

            let login = ctx.wait.until_visible(ctx.driver, &By::id(LOGIN_INPUT))?;
            ctx.report.success("Страница входа успешно загружена");

            ctx.report.info("Ввод логина...");
            login.clear()?;
            login.send_keys(&ctx.config.site.login)?;
            ctx.report
                .success(&format!("Логин '{}' введен успешно", ctx.config.site.login));

            ctx.report.info("Ввод пароля...");
            if ctx.config.site.password.is_empty() {
                ctx.report.warning("Пароль не задан, проверьте ECOSYSTEM_PASSWORD");
            }
            let password = ctx.find(&By::id(PASSWORD_INPUT))?;
            password.clear()?;
            password.send_keys(&ctx.config.site.password)?;
            ctx.report.success("Пароль введен успешно");
            ctx.report
                .add_data("Пароль", &mask_sensitive_data(&ctx.config.site.password));

            ctx.report.info("Нажатие кнопки входа...");
            ctx.find(&By::css(LOGIN_SUBMIT))?.click()?;
            ctx.report.success("Кнопка входа нажата");

            ctx.wait.until_visible(ctx.driver, &By::css(LOGGED_IN_MARKERS))?;
            ctx.report.success("Вход выполнен успешно");
            let current = ctx.current_url();
            ctx.report.info(&format!("Текущий URL после входа: {}", current));

            ctx.pause(ctx.config.waits.post_login_pause_ms);
            Ok(())
        })
    }

    /// Open the user dropdown, preferring the toggle that shows the user's name
    pub fn open_user_menu(&mut self) -> HarnessResult<()> {
        self.recorded("Ошибка при открытии меню пользователя", |ctx| {
            ctx.report.info("Поиск меню пользователя...");
            let name = &ctx.config.site.user_display_name;
            let chain = LocatorChain::new(format!("Меню пользователя '{}'", name))
                .then_with_text(By::css(USER_MENU), name.as_str())
                .then(By::css(USER_MENU_FALLBACK));
            let menu = chain.find(ctx.driver, ctx.report)?;
            ctx.report.success("Меню пользователя найдено");

            ctx.report.info("Открытие меню пользователя...");
            menu.click()?;
            ctx.pause(ctx.config.waits.menu_pause_ms);
            ctx.report.success("Меню пользователя открыто");
            Ok(())
        })
    }

    /// The "Account settings" entry of the open user menu, checked enabled
    pub fn find_account_settings_button(&mut self) -> HarnessResult<WebElement<'a>> {
        self.recorded("Ошибка при поиске кнопки Account Settings", |ctx| {
            ctx.report.info("Поиск кнопки Account Settings...");
            let chain = LocatorChain::new("Account settings")
                .then(By::link_text("Account settings"))
                .then_with_text(By::partial_link_text("Account"), "account");
            let button = chain.find(ctx.driver, ctx.report)?;

            if !button.is_enabled()? {
                return Err(HarnessError::ElementDisabled("Account settings".to_string()));
            }
            ctx.report.success("Кнопка 'Account Settings' найдена и активна");
            Ok(button)
        })
    }

    /// User menu -> Account settings, then check the profile page
    pub fn navigate_to_account_settings(&mut self) -> HarnessResult<()> {
        self.open_user_menu()?;
        let button = self.find_account_settings_button()?;

        self.recorded("Ошибка при переходе в настройки аккаунта", |ctx| {
            ctx.report.info("Переход в настройки аккаунта...");
            button.click()?;
            let url = ctx.wait.until_url_contains(ctx.driver, &ctx.config.site.profile_path)?;
            ctx.report.add_url(&url);
            ctx.report.success("Страница настроек аккаунта открыта");

            let user_id = &ctx.config.site.expected_user_id;
            if ctx.page_contains(user_id) {
                ctx.report
                    .success(&format!("Идентификатор пользователя {} отображается", user_id));
            } else {
                ctx.report
                    .warning(&format!("Идентификатор пользователя {} не найден на странице", user_id));
            }
            Ok(())
        })
    }

    /// Back to the model page through the breadcrumb
    pub fn navigate_home(&mut self) -> HarnessResult<()> {
        self.click_link("Home")?;
        self.recorded("Ошибка при возврате на главную страницу", |ctx| {
            ctx.wait.until_url_contains(ctx.driver, MODEL_PATH)?;
            ctx.report.success("Главная страница открыта");
            Ok(())
        })
    }

    /// Click the visible link whose text is `text`, or contains it
    pub fn click_link(&mut self, text: &str) -> HarnessResult<()> {
        self.recorded(&format!("Ошибка при нажатии на ссылку '{}'", text), |ctx| {
            ctx.report.info(&format!("Нажатие на ссылку '{}'...", text));
            let link = LocatorChain::new(format!("Ссылка '{}'", text))
                .then(By::link_text(text))
                .then_with_text(By::css("a"), text)
                .find(ctx.driver, ctx.report)?;
            link.click()?;
            ctx.report.success(&format!("Ссылка '{}' нажата", text));
            Ok(())
        })
    }

    /// User menu -> Logout, then wait for the login page
    pub fn logout(&mut self) -> HarnessResult<()> {
        self.open_user_menu()?;
        self.recorded("Ошибка при выходе из системы", |ctx| {
            ctx.report.info("Выход из системы...");
            LocatorChain::new("Logout")
                .then(By::link_text("Logout"))
                .then_with_text(By::css("a"), "logout")
                .find(ctx.driver, ctx.report)?
                .click()?;
            ctx.wait.until_url_contains(ctx.driver, "login")?;
            ctx.report.success("Выход выполнен успешно");
            Ok(())
        })
    }

    /// Logged in: off the login page with the user menu shown
    pub fn validate_login_success(&mut self) -> HarnessResult<()> {
        self.recorded("Ошибка при проверке входа", |ctx| {
            ctx.assert_url_not_contains("login")?;
            ctx.wait.until_visible(ctx.driver, &By::css(LOGGED_IN_MARKERS))?;
            ctx.report.success("Вход подтвержден: меню пользователя отображается");
            Ok(())
        })
    }

    /// Logged out: back on the login page with the form shown
    pub fn validate_logout_success(&mut self) -> HarnessResult<()> {
        self.recorded("Ошибка при проверке выхода", |ctx| {
            ctx.assert_url_contains("login")?;
            ctx.wait.until_visible(ctx.driver, &By::id(LOGIN_INPUT))?;
            ctx.report.success("Выход подтвержден: форма входа отображается");
            Ok(())
        })
    }

    pub fn set_browser_size(&mut self) -> HarnessResult<()> {
        let (width, height) = BROWSER_SIZE;
        self.recorded("Ошибка при изменении размера окна", |ctx| {
            ctx.driver.set_window_size(width, height)?;
            ctx.report
                .info(&format!("Размер окна браузера: {}x{}", width, height));
            Ok(())
        })
    }
}

/// Hide a secret for logging
///
/// Keeps the first and last two characters; four characters or fewer are
/// masked entirely and an empty value becomes six stars.
pub fn mask_sensitive_data(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    match chars.len() {
        0 => "******".to_string(),
        n if n <= 4 => "*".repeat(n),
        n => {
            let head: String = chars[..2].iter().collect();
            let tail: String = chars[n - 2..].iter().collect();
            format!("{}{}{}", head, "*".repeat(n - 4), tail)
        }
    }
}
