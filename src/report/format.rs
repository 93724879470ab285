//! Text layout of the aggregate report file.
//!
//! Everything here is pure string building; the aggregator decides when
//! and where the pieces are written.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

use super::step::STEP_TIMESTAMP_FORMAT;

/// Marker separating the header banner from the test log
pub const TESTS_MARKER: &str = "ТЕСТЫ:";

/// Inner width of the banner box
const BOX_WIDTH: usize = 78;

/// Running totals of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Counters {
    pub fn record(&mut self, passed: bool) {
        self.total += 1;
        if passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Percentage of passed tests; 0.0 when nothing ran
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 * 100.0 / self.total as f64
        }
    }
}

/// Figures of one finished test
#[derive(Debug, Clone)]
pub struct TestSummary<'a> {
    pub name: &'a str,
    pub passed: bool,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
    pub total_steps: usize,
    pub successes: usize,
    pub errors: usize,
    pub warnings: usize,
}

pub fn status_label(passed: bool) -> &'static str {
    if passed { "ПРОЙДЕН" } else { "ПРОВАЛЕН" }
}

fn rule(c: char) -> String {
    std::iter::repeat_n(c, 80).collect()
}

fn boxed_line(out: &mut String, content: &str) {
    let _ = writeln!(out, "║ {:<width$} ║", content, width = BOX_WIDTH - 2);
}

/// Banner with counts, followed by the tests section marker
pub fn header(created: DateTime<Local>, directory: &str, counters: &Counters) -> String {
    let border = "═".repeat(BOX_WIDTH);
    let mut out = String::new();

    let _ = writeln!(out, "╔{}╗", border);
    let _ = writeln!(out, "║{:^width$}║", "ОБЩИЙ ОТЧЕТ ТЕСТОВ", width = BOX_WIDTH);
    let _ = writeln!(out, "╠{}╣", border);
    boxed_line(&mut out, &format!("Создан: {}", created.format("%Y-%m-%d %H:%M:%S")));
    boxed_line(&mut out, &format!("Директория: {}", directory));
    let _ = writeln!(out, "╠{}╣", border);
    boxed_line(&mut out, &format!("Всего тестов: {}", counters.total));
    boxed_line(&mut out, &format!("Пройдено:     {}", counters.passed));
    boxed_line(&mut out, &format!("Провалено:    {}", counters.failed));
    boxed_line(&mut out, &format!("Успешность:   {:.1}%", counters.success_rate()));
    let _ = writeln!(out, "╚{}╝", border);
    out.push('\n');
    let _ = writeln!(out, "{}", TESTS_MARKER);
    let _ = writeln!(out, "{}", rule('='));
    out.push('\n');
    out
}

/// Replace the banner of `content` with the banner of `new_header`
///
/// Returns `None` when either text lacks the tests marker.
pub fn replace_header(content: &str, new_header: &str) -> Option<String> {
    let body = content.find(TESTS_MARKER)?;
    let banner = new_header.find(TESTS_MARKER)?;
    Some(format!("{}{}", &new_header[..banner], &content[body..]))
}

/// Dashed per-test summary block
pub fn summary_block(summary: &TestSummary<'_>) -> String {
    let duration = (summary.end - summary.start).to_std().unwrap_or_default();
    let mut out = String::new();

    out.push('\n');
    let _ = writeln!(out, "{}", rule('-'));
    let _ = writeln!(out, "ИТОГ ТЕСТА: {}", summary.name);
    let _ = writeln!(out, "СТАТУС: {}", status_label(summary.passed));
    let _ = writeln!(out, "ВРЕМЯ НАЧАЛА: {}", summary.start.format(STEP_TIMESTAMP_FORMAT));
    let _ = writeln!(out, "ВРЕМЯ ОКОНЧАНИЯ: {}", summary.end.format(STEP_TIMESTAMP_FORMAT));
    let _ = writeln!(out, "ПРОДОЛЖИТЕЛЬНОСТЬ: {:.2} секунд", duration.as_secs_f64());
    let _ = writeln!(out, "ВСЕГО ШАГОВ: {}", summary.total_steps);
    let _ = writeln!(out, "УСПЕШНЫХ: {}", summary.successes);
    let _ = writeln!(out, "ОШИБОК: {}", summary.errors);
    let _ = writeln!(out, "ПРЕДУПРЕЖДЕНИЙ: {}", summary.warnings);
    let _ = writeln!(out, "{}", rule('-'));
    out
}

/// Result list entry of a running test
pub fn started_entry(name: &str) -> String {
    format!("🔹 {} - ЗАПУЩЕН", name)
}

/// Result list entry of a finished test
pub fn finished_entry(name: &str, passed: bool, duration: Duration) -> String {
    let icon = if passed { "✅" } else { "❌" };
    format!("{} {} - {} ({:.1} сек)", icon, name, status_label(passed), duration.as_secs_f64())
}

/// Session footer listing every test
pub fn footer(finished: DateTime<Local>, results: &[String], counters: &Counters) -> String {
    let mut out = String::new();

    out.push('\n');
    let _ = writeln!(out, "{}", rule('='));
    let _ = writeln!(out, "СЕССИЯ ТЕСТИРОВАНИЯ ЗАВЕРШЕНА");
    let _ = writeln!(out, "Время завершения: {}", finished.format("%Y-%m-%d %H:%M:%S"));
    out.push('\n');
    let _ = writeln!(out, "СПИСОК ТЕСТОВ:");
    for result in results {
        let _ = writeln!(out, "{}", result);
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "ИТОГО: всего {}, пройдено {}, провалено {} (успешность {:.1}%)",
        counters.total,
        counters.passed,
        counters.failed,
        counters.success_rate()
    );
    let _ = writeln!(out, "{}", rule('='));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(sec: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 0, sec).unwrap()
    }

    #[test]
    fn test_header_layout() {
        let counters = Counters { total: 4, passed: 3, failed: 1 };
        let header = header(at(0), "Reports", &counters);
        let lines: Vec<&str> = header.lines().collect();

        assert!(lines[1].contains("ОБЩИЙ ОТЧЕТ ТЕСТОВ"));
        assert!(lines[3].contains("Создан: 2024-05-01 12:00:00"));
        assert!(lines[4].contains("Директория: Reports"));
        assert!(lines[6].contains("Всего тестов: 4"));
        assert!(lines[9].contains("Успешность:   75.0%"));
        assert_eq!(lines[12], "ТЕСТЫ:");
        assert_eq!(lines[13], "=".repeat(80));

        // Every box line has the same width in characters
        for line in &lines[..11] {
            assert_eq!(line.chars().count(), 80, "{}", line);
        }
    }

    #[test]
    fn test_success_rate_without_tests() {
        assert_eq!(Counters::default().success_rate(), 0.0);
        assert!(header(at(0), "Reports", &Counters::default()).contains("Успешность:   0.0%"));
    }

    #[test]
    fn test_replace_header_keeps_body() {
        let old = format!("{}[step] one\n", header(at(0), "Reports", &Counters::default()));
        let updated = replace_header(&old, &header(at(0), "Reports", &Counters { total: 1, passed: 1, failed: 0 })).unwrap();
        assert!(updated.contains("Всего тестов: 1"));
        assert!(updated.ends_with("[step] one\n"));
        assert_eq!(updated.matches(TESTS_MARKER).count(), 1);
        assert!(replace_header("no marker", &updated).is_none());
    }

    #[test]
    fn test_summary_block() {
        let block = summary_block(&TestSummary {
            name: "AuthorizationLogInTest",
            passed: false,
            start: at(0),
            end: at(3),
            total_steps: 9,
            successes: 2,
            errors: 1,
            warnings: 0,
        });
        let expected = format!(
            "\n{dash}\nИТОГ ТЕСТА: AuthorizationLogInTest\nСТАТУС: ПРОВАЛЕН\n\
             ВРЕМЯ НАЧАЛА: 2024-05-01 12:00:00.000\nВРЕМЯ ОКОНЧАНИЯ: 2024-05-01 12:00:03.000\n\
             ПРОДОЛЖИТЕЛЬНОСТЬ: 3.00 секунд\nВСЕГО ШАГОВ: 9\nУСПЕШНЫХ: 2\nОШИБОК: 1\n\
             ПРЕДУПРЕЖДЕНИЙ: 0\n{dash}\n",
            dash = "-".repeat(80)
        );
        assert_eq!(block, expected);
    }

    #[test]
    fn test_result_entries() {
        assert_eq!(started_entry("Login"), "🔹 Login - ЗАПУЩЕН");
        assert_eq!(
            finished_entry("Login", true, Duration::from_millis(2340)),
            "✅ Login - ПРОЙДЕН (2.3 сек)"
        );
        assert_eq!(
            finished_entry("Login", false, Duration::from_secs(1)),
            "❌ Login - ПРОВАЛЕН (1.0 сек)"
        );
    }

    #[test]
    fn test_footer() {
        let results = vec!["✅ A - ПРОЙДЕН (1.0 сек)".to_string()];
        let footer = footer(at(9), &results, &Counters { total: 1, passed: 1, failed: 0 });
        assert!(footer.contains("СЕССИЯ ТЕСТИРОВАНИЯ ЗАВЕРШЕНА"));
        assert!(footer.contains("Время завершения: 2024-05-01 12:00:09"));
        assert!(footer.contains("СПИСОК ТЕСТОВ:\n✅ A - ПРОЙДЕН (1.0 сек)\n"));
        assert!(footer.contains("ИТОГО: всего 1, пройдено 1, провалено 0"));
    }
}
