//! The model (ChatGPT) page: request input, sliders, sending and answers.

use std::time::Duration;

use super::{CLEAR_BUTTON, MODEL_PATH, REQUEST_INPUT, SEND_BUTTON};
use crate::driver::{By, WebElement, find, find_visible};
use crate::harness::TestContext;
use crate::harness::types::{HarnessError, HarnessResult};
use crate::wait::{self, COPY_BUTTON, ResponseEvidence};

/// Handle inside a noUiSlider track
pub const SLIDER_HANDLE: &str = ".noUi-handle";

/// Clickable label of the send button
pub const SEND_LABEL: &str = ".ladda-label";

/// Number of answer characters echoed into the report
const ANSWER_PREVIEW_CHARS: usize = 50;

impl<'a> TestContext<'a> {
    /// Type `text` into the input `element_id` (default: the request
    /// textarea) and check it reads back unchanged
    pub fn enter_text_and_verify(&mut self, text: &str, element_id: Option<&str>) -> HarnessResult<()> {
        let id = element_id.unwrap_or(REQUEST_INPUT);

        self.recorded("Ошибка при вводе текста", |ctx| {
            ctx.report.info(&format!("Ввод текста: {}", text));
            let input = ctx.find(&By::id(id))?;
            input.click()?;
            input.clear()?;
            input.send_keys(text)?;

            let actual = input.value()?;
            if actual != text {
                return Err(HarnessError::TextMismatch {
                    expected: text.to_string(),
                    actual,
                });
            }
            ctx.pause(ctx.config.waits.input_pause_ms);
            ctx.report
                .success(&format!("Текст '{}' успешно введен и проверен", text));
            Ok(())
        })
    }

    /// Click the handle of the slider with CSS class `class`
    ///
    /// A missing slider is a warning, not a failure; returns whether the
    /// handle was clicked.
    pub fn interact_with_slider(&mut self, class: &str) -> HarnessResult<bool> {
        self.report
            .info(&format!("Взаимодействие со слайдером: {}", class));

        let handle = find(self.driver, &By::css(format!(".{}", class)))
            .and_then(|slider| slider.find(&By::css(SLIDER_HANDLE)));
        let handle = match handle {
            Ok(handle) => handle,
            Err(e) if e.is_no_such_element() => {
                self.report
                    .warning(&format!("Слайдер '{}' не найден: {}", class, e));
                return Ok(false);
            }
            Err(e) => return self.recorded("Ошибка при поиске слайдера", |_| Err(e.into())),
        };

        self.recorded(&format!("Ошибка при работе со слайдером '{}'", class), |ctx| {
            handle.click()?;
            ctx.pause(ctx.config.waits.input_pause_ms);
            ctx.report.success(&format!("Слайдер '{}' активирован", class));
            Ok(true)
        })
    }

    /// Wait for the model's answer (default timeout from the config)
    pub fn wait_for_response(&mut self, timeout: Option<Duration>) -> HarnessResult<ResponseEvidence> {
        let timeout = timeout.unwrap_or_else(|| self.config.waits.response_timeout());
        let poll = Duration::from_millis(self.config.waits.response_poll_ms);

        self.recorded("Ошибка при ожидании ответа", |ctx| {
            ctx.report
                .info(&format!("Ожидание ответа (таймаут: {} секунд)...", timeout.as_secs()));
            let evidence = wait::wait_for_response(ctx.driver, timeout, poll)?;
            match &evidence {
                ResponseEvidence::Text(text) => {
                    let preview: String = text.chars().take(ANSWER_PREVIEW_CHARS).collect();
                    ctx.report.success(&format!("Ответ получен: {}...", preview));
                }
                ResponseEvidence::CopyButtonReady => {
                    ctx.report
                        .success("Индикаторы загрузки исчезли, ответ предположительно получен");
                }
            }
            Ok(evidence)
        })
    }

    /// Wait for `button` to become enabled (default timeout from the config)
    pub fn wait_for_button_enabled(&mut self, button: &WebElement<'_>, timeout: Option<Duration>) -> HarnessResult<()> {
        let timeout = timeout.unwrap_or_else(|| self.config.waits.button_enable_timeout());
        let poll = Duration::from_millis(self.config.waits.button_poll_ms);

        self.recorded("Ошибка при ожидании активации кнопки", |ctx| {
            ctx.report.info(&format!(
                "Ожидание активации кнопки (таймаут: {} секунд)...",
                timeout.as_secs()
            ));
            wait::wait_for_button_enabled(button, timeout, poll)?;
            ctx.report.success("Кнопка снова активна");
            Ok(())
        })
    }

    /// Menu -> ChatGPT; nothing to do when already on the model page
    pub fn navigate_to_chatgpt(&mut self) -> HarnessResult<()> {
        if self.current_url().contains(MODEL_PATH) {
            self.report.info("Страница ChatGPT уже открыта");
            return Ok(());
        }

        self.recorded("Ошибка при навигации к ChatGPT", |ctx| {
            ctx.report.info("Навигация к ChatGPT");
            ctx.find(&By::link_text("Menu"))?.click()?;
            ctx.pause(ctx.config.waits.input_pause_ms);
            ctx.wait
                .until_visible(ctx.driver, &By::link_text("ChatGPT"))?
                .click()?;
            ctx.wait.until_url_contains(ctx.driver, MODEL_PATH)?;
            ctx.report.success("Навигация к ChatGPT завершена");
            Ok(())
        })
    }

    /// Open the model page by URL
    pub fn open_model_page(&mut self) -> HarnessResult<()> {
        let url = self.config.site.model_url.clone();
        self.recorded("Ошибка при открытии страницы модели", |ctx| {
            ctx.report.info(&format!("Переход на страницу модели: {}", url));
            ctx.goto(&url)?;
            ctx.wait.until_visible(ctx.driver, &By::id(REQUEST_INPUT))?;
            ctx.report.success("Страница модели загружена");
            Ok(())
        })
    }

    /// Press "Clear" and check the request textarea is empty
    pub fn clear_request(&mut self) -> HarnessResult<()> {
        self.recorded("Ошибка при очистке поля ввода", |ctx| {
            ctx.report.info("Нажатие кнопки 'Clear Input'");
            ctx.find(&By::id(CLEAR_BUTTON))?.click()?;
            ctx.report.success("Текст очищен");

            let remaining = ctx.find(&By::id(REQUEST_INPUT))?.value()?;
            ctx.ensure(remaining.is_empty(), "Текст не был очищен")?;
            ctx.report.success("Поле ввода успешно очищено");
            Ok(())
        })
    }

    /// Press "Send Request"; returns the send button for re-enable waits
    pub fn submit_request(&mut self) -> HarnessResult<WebElement<'a>> {
        self.recorded("Ошибка при отправке запроса", |ctx| {
            ctx.report.info("Нажатие кнопки 'Send Request'");
            ctx.find(&By::css(SEND_LABEL))?.click()?;
            ctx.report.success("Запрос отправлен");
            ctx.find(&By::id(SEND_BUTTON))
        })
    }

    /// Enter `text`, send it, and wait for both the answer and the button
    pub fn send_request(&mut self, text: &str) -> HarnessResult<ResponseEvidence> {
        self.enter_text_and_verify(text, None)?;
        let button = self.submit_request()?;
        let evidence = self.wait_for_response(None)?;
        self.wait_for_button_enabled(&button, None)?;
        Ok(evidence)
    }

    /// Click "Copy Answer" when it is shown
    ///
    /// A missing button is only a warning; returns whether it was clicked.
    pub fn copy_answer(&mut self) -> HarnessResult<bool> {
        self.recorded("Ошибка при копировании ответа", |ctx| {
            ctx.report.info("Проверка кнопки 'Copy Answer'");
            let Some(button) = find_visible(ctx.driver, &By::css(COPY_BUTTON))? else {
                ctx.report
                    .warning("Кнопка 'Copy Answer' не найдена, возможно ответ еще не готов");
                return Ok(false);
            };
            if !button.is_enabled()? {
                return Err(HarnessError::ElementDisabled("Copy Answer".to_string()));
            }
            button.click()?;
            ctx.report.success("Кнопка 'Copy Answer' нажата успешно");
            Ok(true)
        })
    }

    /// Current text of the answer area
    pub fn response_text(&self) -> HarnessResult<String> {
        Ok(self.find(&By::id("response_div"))?.text()?)
    }
}
