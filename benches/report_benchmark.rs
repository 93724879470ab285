use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ecosystem_autotests::report::{Aggregator, Counters, Severity, Step, TestReport, format};
use std::sync::Arc;

fn benchmark_step_line(c: &mut Criterion) {
    c.bench_function("step_line", |b| {
        b.iter(|| {
            let step = Step::new(Severity::Success, black_box("Текст 'Привет' успешно введен и проверен"));
            black_box(step.line())
        })
    });
}

fn benchmark_header(c: &mut Criterion) {
    let counters = Counters {
        total: 11,
        passed: 10,
        failed: 1,
    };

    c.bench_function("report_header", |b| {
        b.iter(|| black_box(format::header(chrono::Local::now(), "Reports", black_box(&counters))))
    });
}

fn benchmark_test_report(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    let agg = Arc::new(Aggregator::new(dir.path()).with_console(false));

    c.bench_function("test_report_50_steps", |b| {
        b.iter(|| {
            let mut report = TestReport::new("Benchmark", agg.clone());
            for i in 0..50 {
                report.info(black_box(&format!("step {}", i)));
            }
            report.finalize();
            agg.start_new_session();
        })
    });
}

criterion_group!(benches, benchmark_step_line, benchmark_header, benchmark_test_report);
criterion_main!(benches);
