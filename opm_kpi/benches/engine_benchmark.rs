//! KPI engine micro-benchmark.
//!
//! Measures the two aggregation paths over a simulator-generated dataset:
//! - full-fleet KPI rows for a one-month window
//! - reason rollup for the same window

use chrono::NaiveDate;
use criterion::{Criterion, criterion_group, criterion_main};

use opm_common::store::Dataset;
use opm_common::window::Window;
use opm_kpi::{machine_kpis, reason_rollup};
use opm_simulator::config::SimulationConfig;

fn bench_dataset() -> Dataset {
    let mut cfg = SimulationConfig::default();
    cfg.simulation.machine_count = 10;
    cfg.simulation.seed = 2023;
    // Keep the sensor table small; the engine never reads it.
    cfg.sensors.reading_frequency_seconds = 3600;
    opm_simulator::generate_dataset(&cfg).expect("bench dataset")
}

fn january() -> Window {
    let t0 = NaiveDate::from_ymd_opt(2023, 1, 1)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time");
    let t1 = NaiveDate::from_ymd_opt(2023, 2, 1)
        .expect("valid date")
        .and_hms_opt(0, 0, 0)
        .expect("valid time");
    Window::new(t0, t1).expect("window")
}

fn bench_machine_kpis(c: &mut Criterion) {
    let dataset = bench_dataset();
    let window = january();
    c.bench_function("machine_kpis_month_fleet", |b| {
        b.iter(|| machine_kpis(&dataset, &window, None));
    });
    c.bench_function("machine_kpis_month_single", |b| {
        b.iter(|| machine_kpis(&dataset, &window, Some("MCH003")));
    });
}

fn bench_reason_rollup(c: &mut Criterion) {
    let dataset = bench_dataset();
    let window = january();
    c.bench_function("reason_rollup_month_fleet", |b| {
        b.iter(|| reason_rollup(&dataset, &window, None));
    });
}

criterion_group!(benches, bench_machine_kpis, bench_reason_rollup);
criterion_main!(benches);
