//! Per-machine KPI computation.
//!
//! One pass over the downtime log (clipped to the window, split
//! planned/unplanned, incidents counted by start time) and one pass over
//! the production table (inclusive timestamp bounds), then the OEE
//! decomposition per machine. The engine never mutates its inputs and is
//! deterministic: the same dataset and window always produce identical
//! rows.
//!
//! NaN policy: a ratio whose denominator means "no activity" (no planned
//! time, no incidents, no production time) is NaN; a ratio whose
//! denominator is meaningfully zero while data exists is 0. All four OEE
//! factors are clamped to `[0, 1]`.

use std::collections::HashMap;

use opm_common::records::Equipment;
use opm_common::store::Dataset;
use opm_common::window::Window;
use serde::Serialize;

/// One output row of the KPI query, durations in seconds.
#[derive(Debug, Clone, Serialize)]
pub struct KpiRow {
    pub equipment_id: String,
    pub equipment_name: String,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
    pub total_produced: u64,
    pub total_good: u64,
    pub total_rejected: u64,
    pub reject_rate: f64,
    pub total_downtime_seconds: i64,
    pub total_planned_downtime_seconds: i64,
    pub total_unplanned_downtime_seconds: i64,
    pub planned_production_time_seconds: i64,
    pub run_time_seconds: i64,
    /// Unplanned intervals whose start lies inside the window.
    pub unplanned_incident_count: u64,
    pub mtbf_seconds: f64,
    pub mttr_seconds: f64,
    pub avg_actual_cycle_time_seconds: f64,
    pub throughput_per_hour: f64,
}

/// Per-machine accumulator filled by the table passes.
#[derive(Debug, Default, Clone, Copy)]
struct Acc {
    planned_downtime: i64,
    unplanned_downtime: i64,
    incidents: u64,
    produced: u64,
    rejected: u64,
    running_seconds: f64,
}

/// Clamp a factor into `[0, 1]`, letting NaN through untouched.
#[inline]
fn clamp_factor(x: f64) -> f64 {
    if x.is_nan() { x } else { x.clamp(0.0, 1.0) }
}

/// Compute one KPI row per in-scope machine.
///
/// Machines with no data in the window still get a row: counts are zero
/// and the no-activity means are NaN, so the output schema never changes
/// shape.
pub fn machine_kpis(
    dataset: &Dataset,
    window: &Window,
    equipment_id: Option<&str>,
) -> Vec<KpiRow> {
    let scope: Vec<&Equipment> = dataset
        .equipments
        .iter()
        .filter(|e| equipment_id.is_none_or(|id| e.equipment_id == id))
        .collect();

    let mut accs: HashMap<&str, Acc> = scope
        .iter()
        .map(|e| (e.equipment_id.as_str(), Acc::default()))
        .collect();

    for dt in &dataset.downtimes {
        let Some(acc) = accs.get_mut(dt.equipment_id.as_str()) else {
            continue;
        };
        let clipped = window.clip(dt.start_time, dt.end_time);
        if clipped > 0 {
            if dt.downtime_category.is_planned() {
                acc.planned_downtime += clipped;
            } else {
                acc.unplanned_downtime += clipped;
            }
        }
        // Incident counting is start-based, unlike duration aggregation:
        // an interval belongs to exactly one window, so counts never
        // double across adjacent queries.
        if !dt.downtime_category.is_planned() && window.contains(dt.start_time) {
            acc.incidents += 1;
        }
    }

    for rec in &dataset.production {
        if rec.timestamp < window.start() || rec.timestamp > window.end() {
            continue;
        }
        let Some(acc) = accs.get_mut(rec.equipment_id.as_str()) else {
            continue;
        };
        acc.produced += rec.quantity_produced;
        acc.rejected += rec.quantity_rejected;
        acc.running_seconds += rec.running_duration_seconds;
    }

    scope
        .iter()
        .map(|equip| {
            let acc = accs
                .get(equip.equipment_id.as_str())
                .copied()
                .unwrap_or_default();
            build_row(equip, acc, window)
        })
        .collect()
}

fn build_row(equip: &Equipment, acc: Acc, window: &Window) -> KpiRow {
    let period = window.duration_seconds();
    let planned_production_time = period - acc.planned_downtime;
    let run_time = (planned_production_time - acc.unplanned_downtime).max(0);

    let produced = acc.produced as f64;
    let good = acc.produced.saturating_sub(acc.rejected);

    let availability = if planned_production_time > 0 {
        clamp_factor(run_time as f64 / planned_production_time as f64)
    } else {
        f64::NAN
    };
    let performance = if run_time > 0 {
        clamp_factor(produced * f64::from(equip.ideal_cycle_time_seconds) / run_time as f64)
    } else {
        0.0
    };
    let quality = if acc.produced > 0 {
        clamp_factor(good as f64 / produced)
    } else {
        0.0
    };
    let oee = clamp_factor(availability * performance * quality);

    let reject_rate = if acc.produced > 0 {
        acc.rejected as f64 / produced
    } else {
        0.0
    };
    let avg_actual_cycle_time_seconds = if acc.produced > 0 {
        acc.running_seconds / produced
    } else {
        f64::NAN
    };
    let throughput_per_hour = if acc.running_seconds > 0.0 {
        produced / (acc.running_seconds / 3600.0)
    } else {
        f64::NAN
    };

    let mtbf_seconds = if acc.incidents > 0 {
        run_time as f64 / acc.incidents as f64
    } else {
        f64::NAN
    };
    let mttr_seconds = if acc.incidents > 0 {
        acc.unplanned_downtime as f64 / acc.incidents as f64
    } else {
        f64::NAN
    };

    KpiRow {
        equipment_id: equip.equipment_id.clone(),
        equipment_name: equip.equipment_name.clone(),
        availability,
        performance,
        quality,
        oee,
        total_produced: acc.produced,
        total_good: good,
        total_rejected: acc.rejected,
        reject_rate,
        total_downtime_seconds: acc.planned_downtime + acc.unplanned_downtime,
        total_planned_downtime_seconds: acc.planned_downtime,
        total_unplanned_downtime_seconds: acc.unplanned_downtime,
        planned_production_time_seconds: planned_production_time,
        run_time_seconds: run_time,
        unplanned_incident_count: acc.incidents,
        mtbf_seconds,
        mttr_seconds,
        avg_actual_cycle_time_seconds,
        throughput_per_hour,
    }
}
