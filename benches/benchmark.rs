use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;
use viewshot::{classify, CaptureRequest, DeviceCategory, DeviceProfile, TimeoutBudget};

// Fast settings for all benchmarks
fn configure_fast_group(group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>) {
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_millis(500));
    group.sample_size(20);
}

fn bench_device() -> DeviceProfile {
    DeviceProfile {
        name: "Bench Phone".to_string(),
        width: 390,
        height: 844,
        scale_factor: 3.0,
        category: DeviceCategory::Phone,
    }
}

fn benchmark_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    configure_fast_group(&mut group);

    let signals = [
        "net::ERR_NAME_NOT_RESOLVED",
        "Timeout 30000ms exceeded",
        "503 Service Unavailable",
        "some entirely unclassified failure text",
    ];

    group.bench_function("rule_table", |b| {
        b.iter(|| {
            for signal in &signals {
                black_box(classify(Some(black_box(signal))));
            }
        });
    });

    group.finish();
}

fn benchmark_request_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture_request");
    configure_fast_group(&mut group);

    let device = bench_device();
    group.bench_function("creation", |b| {
        b.iter(|| {
            let request = CaptureRequest::new("https://example.com", device.clone());
            black_box(request);
        });
    });

    group.finish();
}

fn benchmark_budget_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("timeout_budget");
    configure_fast_group(&mut group);

    let budget = TimeoutBudget::default();
    let total = Duration::from_secs(30);
    group.bench_function("split", |b| {
        b.iter(|| {
            black_box(budget.navigation(black_box(total)));
            black_box(budget.stabilize(black_box(total)));
            black_box(budget.capture(black_box(total)));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_classification,
    benchmark_request_creation,
    benchmark_budget_split
);
criterion_main!(benches);
