//! Aggregate report behaviour across several tests and threads.

use ecosystem_autotests::report::{Aggregator, Severity, TestReport};
use pretty_assertions::assert_eq;
use std::fs;
use std::sync::Arc;
use std::thread;

fn aggregator(dir: &tempfile::TempDir) -> Arc<Aggregator> {
    Arc::new(Aggregator::new(dir.path().join("Reports")).with_console(false))
}

fn read(agg: &Aggregator) -> String {
    fs::read_to_string(agg.current_report_path().expect("report file")).unwrap()
}

#[test]
fn test_single_passing_test() {
    let dir = tempfile::tempdir().unwrap();
    let agg = aggregator(&dir);

    let mut report = TestReport::new("AuthorizationLogInTest", agg.clone());
    report.success("Авторизация выполнена");
    report.finalize();
    agg.finalize_session();

    let content = read(&agg);
    assert!(content.contains("Всего тестов: 1"));
    assert!(content.contains("Пройдено:     1"));
    assert!(content.contains("Провалено:    0"));
    assert!(content.contains("СТАТУС: ПРОЙДЕН"));
    assert!(content.contains("✅ AuthorizationLogInTest - ПРОЙДЕН ("));
    assert!(content.contains("ИТОГО: всего 1, пройдено 1, провалено 0"));
}

#[test]
fn test_summaries_keep_completion_order() {
    let dir = tempfile::tempdir().unwrap();
    let agg = aggregator(&dir);

    let mut first = TestReport::new("First", agg.clone());
    first.success("ok");
    first.finalize();

    let mut second = TestReport::new("Second", agg.clone());
    second.error("broken");
    second.finalize();

    let counters = agg.counters();
    assert_eq!((counters.total, counters.passed, counters.failed), (2, 1, 1));

    let content = read(&agg);
    let first_summary = content.find("ИТОГ ТЕСТА: First").unwrap();
    let second_summary = content.find("ИТОГ ТЕСТА: Second").unwrap();
    assert!(first_summary < second_summary);
    assert!(content.contains("Успешность:   50.0%"));

    // Header is rewritten in place: exactly one banner
    assert_eq!(content.matches("ОБЩИЙ ОТЧЕТ ТЕСТОВ").count(), 1);
}

#[test]
fn test_concurrent_reports_stay_well_formed() {
    let dir = tempfile::tempdir().unwrap();
    let agg = aggregator(&dir);

    let handles: Vec<_> = (0..3)
        .map(|i| {
            let agg = agg.clone();
            thread::spawn(move || {
                let name = format!("Concurrent{}", i);
                let mut report = TestReport::new(&name, agg);
                for step in 0..25 {
                    report.info(&format!("{} step {}", name, step));
                }
                if i == 2 {
                    report.error(&format!("{} failed", name));
                }
                report.finalize();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let counters = agg.counters();
    assert_eq!(counters.total, 3);
    assert_eq!(counters.passed + counters.failed, counters.total);
    assert_eq!(counters.failed, 1);

    let content = read(&agg);
    for i in 0..3 {
        let name = format!("Concurrent{}", i);
        let summary = content.find(&format!("ИТОГ ТЕСТА: {}", name)).unwrap();
        // Every step line of the test is intact and precedes its summary
        for step in 0..25 {
            let line = format!("[ИНФО] {} step {}", name, step);
            let at = content.find(&line).unwrap_or_else(|| panic!("missing '{}'", line));
            assert!(at < summary, "step after summary: {}", line);
        }
    }

    // Summary blocks are contiguous: the dashed rule closes each one
    let blocks = content.split("ИТОГ ТЕСТА: ").skip(1);
    for block in blocks {
        let lines: Vec<&str> = block.lines().take(10).collect();
        assert!(lines[1].starts_with("СТАТУС: "));
        assert!(lines[8].starts_with("ПРЕДУПРЕЖДЕНИЙ: "));
        assert_eq!(lines[9], "-".repeat(80));
    }
}

#[test]
fn test_steps_after_session_end_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let agg = aggregator(&dir);

    let mut report = TestReport::new("Late", agg.clone());
    report.info("before");
    assert!(agg.finalize_session());
    let size = fs::metadata(agg.current_report_path().unwrap()).unwrap().len();

    report.info("after");
    report.error("after");
    report.finalize();
    assert!(!agg.finalize_session());

    let after = fs::metadata(agg.current_report_path().unwrap()).unwrap().len();
    assert_eq!(size, after);
    assert!(!report.steps().iter().any(|s| s.message == "after"));
    assert!(report.steps().iter().all(|s| s.severity != Severity::Error));
}

#[test]
fn test_new_session_starts_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let agg = aggregator(&dir);

    let mut report = TestReport::new("One", agg.clone());
    report.finalize();
    agg.finalize_session();
    let first = agg.current_report_path().unwrap();

    agg.start_new_session();
    assert!(agg.current_report_path().is_none());
    assert_eq!(agg.counters().total, 0);
    assert!(!agg.is_finalized());

    // Same-second sessions must not overwrite each other
    let mut report = TestReport::new("Two", agg.clone());
    report.finalize();
    let second = agg.current_report_path().unwrap();

    assert_ne!(first, second);
    assert!(fs::read_to_string(&first).unwrap().contains("ИТОГ ТЕСТА: One"));
    let content = fs::read_to_string(&second).unwrap();
    assert!(content.contains("ИТОГ ТЕСТА: Two"));
    assert!(!content.contains("ИТОГ ТЕСТА: One"));
}
