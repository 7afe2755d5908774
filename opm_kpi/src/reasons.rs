//! Downtime rollup by (equipment, category, reason).
//!
//! Durations are overlap-based (clipped to the window); incident counts
//! are start-based. Intervals disjoint from the window contribute nothing
//! and produce no row.

use std::collections::BTreeMap;

use opm_common::records::DowntimeCategory;
use opm_common::store::Dataset;
use opm_common::window::Window;
use serde::Serialize;

/// One output row of the downtime-reasons query.
#[derive(Debug, Clone, Serialize)]
pub struct ReasonRow {
    pub equipment_id: String,
    pub downtime_category: DowntimeCategory,
    pub downtime_reason: String,
    /// Intervals of this kind whose start lies inside the window.
    pub incident_count: u64,
    /// Window-clipped downtime of this kind [s].
    pub effective_duration_seconds: i64,
}

/// Aggregate the downtime log for the window, one row per
/// `(equipment, category, reason)` with a non-zero clipped duration.
///
/// An interval that started before the window but reaches into it adds
/// duration without adding an incident, so a row can carry
/// `incident_count = 0`.
pub fn reason_rollup(
    dataset: &Dataset,
    window: &Window,
    equipment_id: Option<&str>,
) -> Vec<ReasonRow> {
    let mut rollup: BTreeMap<(&str, DowntimeCategory, &str), (u64, i64)> = BTreeMap::new();

    for dt in &dataset.downtimes {
        if equipment_id.is_some_and(|id| dt.equipment_id != id) {
            continue;
        }
        let clipped = window.clip(dt.start_time, dt.end_time);
        if clipped == 0 {
            continue;
        }
        let entry = rollup
            .entry((
                dt.equipment_id.as_str(),
                dt.downtime_category,
                dt.downtime_reason.as_str(),
            ))
            .or_default();
        entry.1 += clipped;
        if window.contains(dt.start_time) {
            entry.0 += 1;
        }
    }

    rollup
        .into_iter()
        .map(|((equipment_id, category, reason), (incidents, duration))| ReasonRow {
            equipment_id: equipment_id.to_string(),
            downtime_category: category,
            downtime_reason: reason.to_string(),
            incident_count: incidents,
            effective_duration_seconds: duration,
        })
        .collect()
}
