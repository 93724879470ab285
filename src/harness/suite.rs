//! Built-in end-to-end scenarios and the suite runner.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;
use tracing::info;

use super::base::TestBase;
use super::context::TestContext;
use super::types::{HarnessResult, TestOutcome};
use crate::driver::By;
use crate::pages::{MODEL_PATH, REQUEST_INPUT};
use crate::runner::SuiteResult;

/// Body of a scenario
pub type ScenarioFn = fn(&mut TestContext<'_>) -> HarnessResult<()>;

/// A named test in the catalogue
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub body: ScenarioFn,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish()
    }
}

/// Every built-in scenario, in run order
pub fn catalogue() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "AuthorizationLogInTest",
            description: "Вход в систему с корректными учетными данными",
            body: authorization_login,
        },
        Scenario {
            name: "UserMenuFunctionality",
            description: "Открытие меню пользователя и поиск Account settings",
            body: user_menu,
        },
        Scenario {
            name: "AccountSettingsNavigation",
            description: "Переход на страницу настроек аккаунта",
            body: account_settings,
        },
        Scenario {
            name: "ChatGPTNavigation",
            description: "Навигация к странице ChatGPT через меню",
            body: chatgpt_navigation,
        },
        Scenario {
            name: "TextInputAndClear",
            description: "Ввод текста и очистка поля запроса",
            body: text_input_and_clear,
        },
        Scenario {
            name: "UnicodeTextInput",
            description: "Ввод Unicode текста",
            body: unicode_text_input,
        },
        Scenario {
            name: "SendRequestAndGetResponse",
            description: "Отправка запроса и получение ответа",
            body: send_request_and_get_response,
        },
        Scenario {
            name: "SliderAdjustments",
            description: "Работа со слайдерами Temperature и TopP",
            body: slider_adjustments,
        },
        Scenario {
            name: "MultipleSequentialRequests",
            description: "Несколько последовательных запросов",
            body: multiple_sequential_requests,
        },
        Scenario {
            name: "LogoutFunctionality",
            description: "Выход из системы",
            body: logout,
        },
        Scenario {
            name: "CompleteWorkflow",
            description: "Полный рабочий процесс приложения",
            body: complete_workflow,
        },
    ]
}

/// Scenarios whose name contains `filter` (case-insensitive)
pub fn select(filter: Option<&str>) -> Vec<Scenario> {
    let filter = filter.map(str::to_lowercase);
    catalogue()
        .into_iter()
        .filter(|s| filter.as_ref().is_none_or(|f| s.name.to_lowercase().contains(f)))
        .collect()
}

/// Run `scenarios` on `workers` threads (at least one)
///
/// Outcomes come back in catalogue order whatever the scheduling was.
pub fn run_suite(base: &TestBase, scenarios: &[Scenario], workers: usize) -> SuiteResult {
    let started = Instant::now();
    let workers = workers.clamp(1, scenarios.len().max(1));
    info!("Running {} scenarios on {} worker(s)", scenarios.len(), workers);

    let outcomes: Vec<TestOutcome> = if workers == 1 {
        scenarios.iter().map(|s| base.run(s.name, s.body)).collect()
    } else {
        let next = AtomicUsize::new(0);
        let slots: Mutex<Vec<Option<TestOutcome>>> = Mutex::new(vec![None; scenarios.len()]);
        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        let Some(scenario) = scenarios.get(index) else {
                            break;
                        };
                        let outcome = base.run(scenario.name, scenario.body);
                        if let Ok(mut slots) = slots.lock() {
                            slots[index] = Some(outcome);
                        }
                    }
                });
            }
        });
        slots
            .into_inner()
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .collect()
    };

    SuiteResult::new(outcomes, started.elapsed(), base.aggregator().current_report_path())
}

fn authorization_login(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.perform_login(None)?;
    ctx.validate_login_success()
}

fn user_menu(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.perform_login(None)?;
    ctx.open_user_menu()?;
    ctx.find_account_settings_button()?;
    Ok(())
}

fn account_settings(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.perform_login(None)?;
    ctx.set_browser_size()?;
    ctx.navigate_to_account_settings()?;
    let profile = ctx.config.site.profile_path.clone();
    ctx.assert_url_contains(&profile)
}

fn chatgpt_navigation(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.perform_login(None)?;
    ctx.navigate_to_account_settings()?;
    ctx.navigate_to_chatgpt()?;
    ctx.assert_url_contains(MODEL_PATH)?;
    ctx.recorded("Поле запроса не отображается", |ctx| {
        ctx.wait.until_visible(ctx.driver, &By::id(REQUEST_INPUT))?;
        ctx.report.success("Поле запроса отображается");
        Ok(())
    })
}

fn text_input_and_clear(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.perform_login(None)?;
    ctx.navigate_to_chatgpt()?;
    ctx.report.info("Проверка функциональности ввода и очистки текста");
    ctx.enter_text_and_verify("Привет!", None)?;
    ctx.clear_request()?;
    ctx.enter_text_and_verify("Привет. Как дела?", None)
}

fn unicode_text_input(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.perform_login(None)?;
    ctx.navigate_to_chatgpt()?;
    ctx.enter_text_and_verify("Привет! Чем могу помочь?", None)?;
    ctx.report.success("Unicode текст корректно обрабатывается");
    Ok(())
}

fn send_request_and_get_response(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.perform_login(None)?;
    ctx.navigate_to_chatgpt()?;
    ctx.send_request("Привет. Как дела?")?;
    ctx.copy_answer()?;
    Ok(())
}

fn slider_adjustments(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.perform_login(None)?;
    ctx.navigate_to_chatgpt()?;
    let moved = [
        ctx.interact_with_slider("noui-connect-lower-temperature")?,
        ctx.interact_with_slider("noui-connect-lower-topp")?,
    ];
    let count = moved.iter().filter(|m| **m).count();
    ctx.report.add_data("Активировано слайдеров", &count.to_string());
    Ok(())
}

fn multiple_sequential_requests(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.perform_login(None)?;
    ctx.navigate_to_chatgpt()?;
    for (n, request) in ["Привет", "Как дела?", "Расскажи о себе"].iter().enumerate() {
        ctx.report.info(&format!("Запрос {} из 3", n + 1));
        ctx.send_request(request)?;
    }
    ctx.report.success("Все последовательные запросы обработаны");
    Ok(())
}

fn logout(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.perform_login(None)?;
    ctx.logout()?;
    ctx.validate_logout_success()
}

fn complete_workflow(ctx: &mut TestContext<'_>) -> HarnessResult<()> {
    ctx.report.info("Запуск полного рабочего процесса");
    ctx.perform_login(None)?;
    ctx.navigate_to_chatgpt()?;
    ctx.send_request("Привет! Это тестовое сообщение для проверки полного workflow.")?;
    ctx.navigate_to_account_settings()?;
    ctx.navigate_home()?;
    ctx.logout()?;
    ctx.validate_logout_success()?;
    ctx.report.success("Полный рабочий процесс завершен успешно");
    Ok(())
}
