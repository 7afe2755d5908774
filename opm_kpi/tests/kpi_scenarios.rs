//! # KPI engine scenario tests
//!
//! Literal boundary scenarios (clipping, incident counting, degenerate
//! denominators) against hand-built datasets, plus property checks against
//! a simulator-generated dataset.

use chrono::{NaiveDate, NaiveDateTime};
use opm_common::records::{
    DowntimeCategory, DowntimeInterval, Equipment, ProductionRecord,
};
use opm_common::store::Dataset;
use opm_common::window::Window;
use opm_kpi::{machine_kpis, reason_rollup};

// ─── Builders ───────────────────────────────────────────────────────

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .expect("valid date")
        .and_hms_opt(h, mi, 0)
        .expect("valid time")
}

fn window(from: NaiveDateTime, to: NaiveDateTime) -> Window {
    Window::new(from, to).expect("valid window")
}

fn machine(id: &str, ideal_cycle_time_seconds: u32) -> Equipment {
    Equipment {
        equipment_id: id.into(),
        equipment_name: format!("Machine {id}"),
        equipment_type: "Usinage".into(),
        production_line_id: "LINE_A".into(),
        ideal_cycle_time_seconds,
        location: "Lyon".into(),
        installation_date: ts(2020, 6, 1, 0, 0),
    }
}

fn downtime(
    id: u64,
    equipment: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    category: DowntimeCategory,
    reason: &str,
) -> DowntimeInterval {
    DowntimeInterval {
        downtime_id: id,
        equipment_id: equipment.into(),
        start_time: start,
        end_time: end,
        downtime_category: category,
        downtime_reason: reason.into(),
    }
}

fn production(
    equipment: &str,
    timestamp: NaiveDateTime,
    produced: u64,
    rejected: u64,
    running_seconds: f64,
) -> ProductionRecord {
    ProductionRecord {
        timestamp,
        equipment_id: equipment.into(),
        product_id: "PROD_500".into(),
        quantity_produced: produced,
        quantity_rejected: rejected,
        running_duration_seconds: running_seconds,
    }
}

// ─── Clipping scenarios ─────────────────────────────────────────────

#[test]
fn downtime_straddling_both_edges_is_clipped_to_the_window() {
    let ds = Dataset {
        equipments: vec![machine("MCH001", 10)],
        downtimes: vec![downtime(
            1,
            "MCH001",
            ts(2023, 1, 15, 0, 0),
            ts(2023, 2, 5, 0, 0),
            DowntimeCategory::UnplannedBreakdown,
            "Mechanical Failure",
        )],
        ..Default::default()
    };
    let w = window(ts(2023, 1, 20, 0, 0), ts(2023, 2, 1, 0, 0));

    let rows = reason_rollup(&ds, &w, None);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].effective_duration_seconds, 1_036_800); // 12 days
    // Started before the window: duration counts, the incident does not.
    assert_eq!(rows[0].incident_count, 0);

    let kpis = machine_kpis(&ds, &w, None);
    assert_eq!(kpis[0].total_unplanned_downtime_seconds, 1_036_800);
    assert_eq!(kpis[0].unplanned_incident_count, 0);
    assert!(kpis[0].mttr_seconds.is_nan());
}

#[test]
fn disjoint_downtime_is_omitted_entirely() {
    let ds = Dataset {
        equipments: vec![machine("MCH001", 10)],
        downtimes: vec![downtime(
            1,
            "MCH001",
            ts(2023, 3, 1, 0, 0),
            ts(2023, 3, 2, 0, 0),
            DowntimeCategory::UnplannedProcess,
            "Tooling Issue",
        )],
        ..Default::default()
    };
    let w = window(ts(2023, 4, 1, 0, 0), ts(2023, 5, 1, 0, 0));

    assert!(reason_rollup(&ds, &w, None).is_empty());
    let kpis = machine_kpis(&ds, &w, None);
    assert_eq!(kpis[0].total_downtime_seconds, 0);
}

// ─── OEE scenarios ──────────────────────────────────────────────────

#[test]
fn perfect_machine_scores_one_everywhere() {
    let w = window(ts(2023, 1, 2, 8, 0), ts(2023, 1, 2, 9, 0));
    let ds = Dataset {
        equipments: vec![machine("MCH001", 10)],
        production: vec![production("MCH001", ts(2023, 1, 2, 8, 59), 360, 0, 3600.0)],
        ..Default::default()
    };
    let rows = machine_kpis(&ds, &w, None);
    let row = &rows[0];
    assert_eq!(row.availability, 1.0);
    assert_eq!(row.performance, 1.0);
    assert_eq!(row.quality, 1.0);
    assert_eq!(row.oee, 1.0);
    assert_eq!(row.reject_rate, 0.0);
    assert_eq!(row.throughput_per_hour, 360.0);
    assert_eq!(row.avg_actual_cycle_time_seconds, 10.0);
}

#[test]
fn planned_downtime_does_not_hurt_availability() {
    let w = window(ts(2023, 1, 2, 8, 0), ts(2023, 1, 2, 9, 0));
    let ds = Dataset {
        equipments: vec![machine("MCH001", 10)],
        downtimes: vec![downtime(
            1,
            "MCH001",
            ts(2023, 1, 2, 8, 0),
            ts(2023, 1, 2, 8, 30),
            DowntimeCategory::PlannedMaintenance,
            "Calibration",
        )],
        production: vec![production("MCH001", ts(2023, 1, 2, 8, 59), 180, 0, 1800.0)],
        ..Default::default()
    };
    let row = &machine_kpis(&ds, &w, None)[0];
    assert_eq!(row.planned_production_time_seconds, 1800);
    assert_eq!(row.run_time_seconds, 1800);
    assert_eq!(row.availability, 1.0);
    assert_eq!(row.performance, 1.0); // 180 × 10 s over 1800 s of run time
    assert_eq!(row.unplanned_incident_count, 0);
}

#[test]
fn zero_production_yields_policy_zeros_and_nan_means() {
    let w = window(ts(2023, 1, 2, 8, 0), ts(2023, 1, 2, 9, 0));
    let ds = Dataset {
        equipments: vec![machine("MCH001", 10)],
        ..Default::default()
    };
    let row = &machine_kpis(&ds, &w, None)[0];
    assert_eq!(row.quality, 0.0);
    assert_eq!(row.performance, 0.0);
    assert_eq!(row.oee, 0.0);
    assert_eq!(row.reject_rate, 0.0);
    assert!(row.throughput_per_hour.is_nan());
    assert!(row.avg_actual_cycle_time_seconds.is_nan());
    // Structurally complete even with no data at all.
    assert_eq!(row.total_produced, 0);
    assert_eq!(row.total_downtime_seconds, 0);
    assert!(row.mtbf_seconds.is_nan());
}

#[test]
fn incident_count_is_start_based_but_mttr_uses_clipped_durations() {
    let w = window(ts(2023, 1, 2, 8, 0), ts(2023, 1, 2, 20, 0));
    let ds = Dataset {
        equipments: vec![machine("MCH001", 10)],
        downtimes: vec![
            // Starts before the window, ends one hour into it.
            downtime(
                1,
                "MCH001",
                ts(2023, 1, 2, 6, 0),
                ts(2023, 1, 2, 9, 0),
                DowntimeCategory::UnplannedBreakdown,
                "Electrical Fault",
            ),
            // Fully inside the window.
            downtime(
                2,
                "MCH001",
                ts(2023, 1, 2, 12, 0),
                ts(2023, 1, 2, 13, 0),
                DowntimeCategory::UnplannedProcess,
                "Operator Error",
            ),
        ],
        ..Default::default()
    };
    let row = &machine_kpis(&ds, &w, None)[0];
    assert_eq!(row.unplanned_incident_count, 1);
    // Clipped: 1 h of the straddler + 1 h inside = 7200 s, over one incident.
    assert_eq!(row.total_unplanned_downtime_seconds, 7200);
    assert_eq!(row.mttr_seconds, 7200.0);
    assert_eq!(row.mtbf_seconds, row.run_time_seconds as f64);
}

#[test]
fn reason_rollup_keeps_categories_and_reasons_apart() {
    let w = window(ts(2023, 1, 1, 0, 0), ts(2023, 2, 1, 0, 0));
    let ds = Dataset {
        equipments: vec![machine("MCH001", 10), machine("MCH002", 15)],
        downtimes: vec![
            downtime(
                1,
                "MCH001",
                ts(2023, 1, 5, 0, 0),
                ts(2023, 1, 5, 2, 0),
                DowntimeCategory::UnplannedBreakdown,
                "Hydraulic Leak",
            ),
            downtime(
                2,
                "MCH001",
                ts(2023, 1, 9, 0, 0),
                ts(2023, 1, 9, 3, 0),
                DowntimeCategory::UnplannedBreakdown,
                "Hydraulic Leak",
            ),
            downtime(
                3,
                "MCH001",
                ts(2023, 1, 11, 0, 0),
                ts(2023, 1, 11, 1, 0),
                DowntimeCategory::Changeover,
                "Product Changeover",
            ),
            downtime(
                4,
                "MCH002",
                ts(2023, 1, 20, 0, 0),
                ts(2023, 1, 20, 8, 0),
                DowntimeCategory::PlannedMaintenance,
                "Routine Check",
            ),
        ],
        ..Default::default()
    };
    let rows = reason_rollup(&ds, &w, None);
    assert_eq!(rows.len(), 3);

    let leak = rows
        .iter()
        .find(|r| r.downtime_reason == "Hydraulic Leak")
        .expect("leak row");
    assert_eq!(leak.incident_count, 2);
    assert_eq!(leak.effective_duration_seconds, 5 * 3600);

    let filtered = reason_rollup(&ds, &w, Some("MCH002"));
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].downtime_category, DowntimeCategory::PlannedMaintenance);
}

// ─── Properties over a simulated dataset ────────────────────────────

fn simulated() -> Dataset {
    let mut cfg = opm_simulator::config::SimulationConfig::default();
    cfg.simulation.machine_count = 4;
    cfg.simulation.start = ts(2023, 1, 1, 7, 0);
    cfg.simulation.end = ts(2023, 2, 28, 17, 0);
    cfg.simulation.seed = 77;
    cfg.lifecycle.avg_mtbf_hours = 30.0;
    // The engine never reads the sensor table; keep it tiny.
    cfg.sensors.reading_frequency_seconds = 3600;
    opm_simulator::generate_dataset(&cfg).expect("simulated dataset")
}

#[test]
fn factors_stay_in_unit_range_and_oee_is_their_product() {
    let ds = simulated();
    for days in [1, 7, 30, 59] {
        let w = window(
            ts(2023, 1, 1, 0, 0),
            ts(2023, 1, 1, 0, 0) + chrono::Duration::days(days),
        );
        for row in machine_kpis(&ds, &w, None) {
            for factor in [row.availability, row.performance, row.quality, row.oee] {
                assert!(factor.is_nan() || (0.0..=1.0).contains(&factor));
            }
            if !row.oee.is_nan() {
                let product = row.availability * row.performance * row.quality;
                assert!((row.oee - product).abs() < 1e-9);
            }
            assert_eq!(row.total_good + row.total_rejected, row.total_produced);
            assert!(row.run_time_seconds <= row.planned_production_time_seconds);
            assert!(row.planned_production_time_seconds <= w.duration_seconds());
        }
    }
}

#[test]
fn incident_counts_are_monotone_in_window_expansion() {
    let ds = simulated();
    let t0 = ts(2023, 1, 1, 0, 0);
    let mut previous: Option<Vec<u64>> = None;
    for days in 1..=14 {
        let w = window(t0, t0 + chrono::Duration::days(days));
        let counts: Vec<u64> = machine_kpis(&ds, &w, None)
            .iter()
            .map(|r| r.unplanned_incident_count)
            .collect();
        if let Some(prev) = &previous {
            for (now, before) in counts.iter().zip(prev) {
                assert!(now >= before, "incident count shrank on window expansion");
            }
        }
        previous = Some(counts);
    }
}

#[test]
fn engine_is_idempotent_over_the_same_store() {
    let ds = simulated();
    let w = window(ts(2023, 1, 10, 0, 0), ts(2023, 2, 10, 0, 0));
    let a = serde_json::to_string(&machine_kpis(&ds, &w, None)).expect("serialize");
    let b = serde_json::to_string(&machine_kpis(&ds, &w, None)).expect("serialize");
    assert_eq!(a, b);
    let ra = serde_json::to_string(&reason_rollup(&ds, &w, None)).expect("serialize");
    let rb = serde_json::to_string(&reason_rollup(&ds, &w, None)).expect("serialize");
    assert_eq!(ra, rb);
}

#[test]
fn clipped_downtime_never_exceeds_the_window() {
    let ds = simulated();
    let w = window(ts(2023, 1, 15, 0, 0), ts(2023, 1, 16, 0, 0));
    for row in machine_kpis(&ds, &w, None) {
        assert!(row.total_downtime_seconds <= w.duration_seconds());
        assert!(row.total_downtime_seconds >= 0);
    }
}
