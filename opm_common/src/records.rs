//! Record types for the five operational tables.
//!
//! These mirror the tabular store schemas (`equipments`, `machine_events`,
//! `downtime_logs`, `production_output`, `sensor_readings`). Records are
//! immutable once written; the analytics side never mutates them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Serde adapter for the tabular timestamp format `YYYY-MM-DD HH:MM:SS`.
///
/// All timestamps in dumped tables use this wall-clock format (no zone,
/// no sub-second part). Apply with `#[serde(with = "wire_time")]`.
pub mod wire_time {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Timestamp format shared by every table column.
    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Static per-machine attributes. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    /// Opaque unique id, e.g. `MCH001`.
    pub equipment_id: String,
    pub equipment_name: String,
    pub equipment_type: String,
    pub production_line_id: String,
    /// Ideal time to produce one unit [s]. Always ≥ 1.
    pub ideal_cycle_time_seconds: u32,
    pub location: String,
    #[serde(with = "wire_time")]
    pub installation_date: NaiveDateTime,
}

/// Point-in-time machine transition or alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Start,
    Stop,
    Alarm,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Start => write!(f, "START"),
            EventType::Stop => write!(f, "STOP"),
            EventType::Alarm => write!(f, "ALARM"),
        }
    }
}

/// One row of the `machine_events` table.
///
/// Per machine, events are strictly ordered by timestamp and START/STOP
/// alternate, beginning with the bootstrap START. `details` carries the
/// originating cause for STOP events as `Stop: <category> (<reason>)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineEvent {
    /// Monotonic id, assigned in the order events were recorded.
    pub event_id: u64,
    #[serde(with = "wire_time")]
    pub timestamp: NaiveDateTime,
    pub equipment_id: String,
    pub event_type: EventType,
    pub details: String,
}

/// Downtime classification.
///
/// Planned Maintenance and Changeover count as *planned* time for
/// availability purposes; the two Unplanned variants drive MTBF/MTTR.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum DowntimeCategory {
    #[serde(rename = "Changeover")]
    Changeover,
    #[serde(rename = "Planned Maintenance")]
    PlannedMaintenance,
    #[serde(rename = "Unplanned - Breakdown")]
    UnplannedBreakdown,
    #[serde(rename = "Unplanned - Process")]
    UnplannedProcess,
}

impl DowntimeCategory {
    /// True for categories that count as planned production loss
    /// (excluded from availability's unplanned downtime).
    #[inline]
    pub const fn is_planned(self) -> bool {
        matches!(
            self,
            DowntimeCategory::PlannedMaintenance | DowntimeCategory::Changeover
        )
    }

    /// The label used in tables and event details.
    pub const fn label(self) -> &'static str {
        match self {
            DowntimeCategory::Changeover => "Changeover",
            DowntimeCategory::PlannedMaintenance => "Planned Maintenance",
            DowntimeCategory::UnplannedBreakdown => "Unplanned - Breakdown",
            DowntimeCategory::UnplannedProcess => "Unplanned - Process",
        }
    }
}

impl std::fmt::Display for DowntimeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the `downtime_logs` table. Half-open `[start_time, end_time)`.
///
/// Intervals for the same machine never overlap. Every interval is framed
/// by a STOP event at `start_time` and a START at `end_time`, except the
/// final one of a run, which may be closed at the simulation end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DowntimeInterval {
    pub downtime_id: u64,
    pub equipment_id: String,
    #[serde(with = "wire_time")]
    pub start_time: NaiveDateTime,
    #[serde(with = "wire_time")]
    pub end_time: NaiveDateTime,
    pub downtime_category: DowntimeCategory,
    pub downtime_reason: String,
}

impl DowntimeInterval {
    /// Raw interval length [s]. Non-negative by construction.
    #[inline]
    pub fn duration_seconds(&self) -> i64 {
        (self.end_time - self.start_time).num_seconds()
    }
}

/// Hourly production rollup, emitted only for segments where the machine
/// was RUNNING. `timestamp` marks the end of the reporting segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    #[serde(with = "wire_time")]
    pub timestamp: NaiveDateTime,
    pub equipment_id: String,
    pub product_id: String,
    pub quantity_produced: u64,
    /// Always ≤ `quantity_produced`.
    pub quantity_rejected: u64,
    /// Intersection of the reporting segment with the RUNNING interval [s].
    /// Positive and at most 3600.
    pub running_duration_seconds: f64,
}

/// Periodic per-sensor sample. Emitted at a fixed cadence regardless of
/// machine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(with = "wire_time")]
    pub timestamp: NaiveDateTime,
    pub equipment_id: String,
    pub sensor_type: String,
    /// Clamped to ≥ 0.
    pub value: f64,
    pub unit: String,
}
