//! Query surface over a loaded dataset.
//!
//! The four operations the HTTP adapter (out of tree) maps onto:
//! equipment listing, KPI computation, downtime reason rollup, and raw
//! sensor retrieval. Date parameters arrive as strings and are validated
//! here; malformed input never produces a partial result.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use opm_common::records::{Equipment, SensorReading};
use opm_common::store::{Dataset, StoreError};
use opm_common::window::{InvalidWindow, Window};
use thiserror::Error;

use crate::engine::{KpiRow, machine_kpis};
use crate::reasons::{ReasonRow, reason_rollup};

/// Date-only input format for the KPI and reasons queries.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Timestamped input format for the sensor query.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors surfaced to query callers.
#[derive(Error, Debug)]
pub enum QueryError {
    /// A date parameter did not match the expected format.
    #[error("invalid date '{value}': expected {expected}")]
    InvalidDate {
        /// Rejected raw input
        value: String,
        /// Human-readable expected format
        expected: &'static str,
    },

    /// The window bounds are reversed.
    #[error("invalid window: {source}")]
    Window {
        /// Source window error
        #[from]
        source: InvalidWindow,
    },

    /// The equipment filter matches no catalog entry.
    #[error("unknown equipment: {0}")]
    UnknownEquipment(String),

    /// Store error
    #[error("store error: {source}")]
    Store {
        /// Source store error
        #[from]
        source: StoreError,
    },
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

fn parse_date(raw: &str) -> QueryResult<NaiveDateTime> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| QueryError::InvalidDate {
            value: raw.to_string(),
            expected: "YYYY-MM-DD",
        })
}

fn parse_datetime(raw: &str) -> QueryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map_err(|_| QueryError::InvalidDate {
        value: raw.to_string(),
        expected: "YYYY-MM-DD HH:MM:SS",
    })
}

fn check_equipment(dataset: &Dataset, equipment_id: Option<&str>) -> QueryResult<()> {
    if let Some(id) = equipment_id {
        if !dataset.equipments.iter().any(|e| e.equipment_id == id) {
            return Err(QueryError::UnknownEquipment(id.to_string()));
        }
    }
    Ok(())
}

/// All catalog entries.
pub fn list_equipments(dataset: &Dataset) -> Vec<Equipment> {
    dataset.equipments.clone()
}

/// Per-machine KPI rows for `[from, to)`, dates as `YYYY-MM-DD`.
pub fn compute_kpis(
    dataset: &Dataset,
    from: &str,
    to: &str,
    equipment_id: Option<&str>,
) -> QueryResult<Vec<KpiRow>> {
    let window = Window::new(parse_date(from)?, parse_date(to)?)?;
    check_equipment(dataset, equipment_id)?;
    Ok(machine_kpis(dataset, &window, equipment_id))
}

/// Downtime rollup rows for `[from, to)`, dates as `YYYY-MM-DD`.
pub fn downtime_reasons(
    dataset: &Dataset,
    from: &str,
    to: &str,
    equipment_id: Option<&str>,
) -> QueryResult<Vec<ReasonRow>> {
    let window = Window::new(parse_date(from)?, parse_date(to)?)?;
    check_equipment(dataset, equipment_id)?;
    Ok(reason_rollup(dataset, &window, equipment_id))
}

/// Sensor readings in `[from, to)`, timestamps as `YYYY-MM-DD HH:MM:SS`,
/// ordered by timestamp ascending.
pub fn sensor_data(
    dataset: &Dataset,
    from: &str,
    to: &str,
    equipment_id: Option<&str>,
    sensor_type: Option<&str>,
) -> QueryResult<Vec<SensorReading>> {
    let window = Window::new(parse_datetime(from)?, parse_datetime(to)?)?;
    check_equipment(dataset, equipment_id)?;

    let mut readings: Vec<SensorReading> = dataset
        .sensors
        .iter()
        .filter(|r| window.contains(r.timestamp))
        .filter(|r| equipment_id.is_none_or(|id| r.equipment_id == id))
        .filter(|r| sensor_type.is_none_or(|st| r.sensor_type == st))
        .cloned()
        .collect();
    readings.sort_by_key(|r| r.timestamp);
    Ok(readings)
}
