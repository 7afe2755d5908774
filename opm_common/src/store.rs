//! In-memory tabular store and CSV codec.
//!
//! The relational store proper lives outside this workspace; the core
//! consumes and produces the five tables as plain rows. [`Dataset`] is the
//! in-memory form, and the CSV codec is the concrete seed-load format the
//! simulator dumps and the query tools read back.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::records::{
    DowntimeInterval, Equipment, MachineEvent, ProductionRecord, SensorReading,
};

/// Errors that can occur against the tabular store.
///
/// A failing store operation surfaces as a single error; callers never fall
/// back to partial computation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {source}")]
    Io {
        /// Source IO error
        #[from]
        source: std::io::Error,
    },

    /// CSV encoding/decoding error
    #[error("CSV error: {source}")]
    Csv {
        /// Source CSV error
        #[from]
        source: csv::Error,
    },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// File name of the equipments table.
pub const EQUIPMENTS_CSV: &str = "equipments.csv";
/// File name of the machine events table.
pub const MACHINE_EVENTS_CSV: &str = "machine_events.csv";
/// File name of the downtime log table.
pub const DOWNTIME_LOGS_CSV: &str = "downtime_logs.csv";
/// File name of the production output table.
pub const PRODUCTION_OUTPUT_CSV: &str = "production_output.csv";
/// File name of the sensor readings table.
pub const SENSOR_READINGS_CSV: &str = "sensor_readings.csv";

/// The five operational tables, loaded in memory.
///
/// The simulator owns creation; the analytics layer only reads.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub equipments: Vec<Equipment>,
    pub events: Vec<MachineEvent>,
    pub downtimes: Vec<DowntimeInterval>,
    pub production: Vec<ProductionRecord>,
    pub sensors: Vec<SensorReading>,
}

impl Dataset {
    /// Dump all five tables as CSV files under `dir` (created if missing).
    pub fn write_csv_dir(&self, dir: &Path) -> StoreResult<()> {
        std::fs::create_dir_all(dir)?;
        write_table(&dir.join(EQUIPMENTS_CSV), &self.equipments)?;
        write_table(&dir.join(MACHINE_EVENTS_CSV), &self.events)?;
        write_table(&dir.join(DOWNTIME_LOGS_CSV), &self.downtimes)?;
        write_table(&dir.join(PRODUCTION_OUTPUT_CSV), &self.production)?;
        write_table(&dir.join(SENSOR_READINGS_CSV), &self.sensors)?;
        Ok(())
    }

    /// Load all five tables from CSV files under `dir`.
    pub fn read_csv_dir(dir: &Path) -> StoreResult<Self> {
        Ok(Self {
            equipments: read_table(&dir.join(EQUIPMENTS_CSV))?,
            events: read_table(&dir.join(MACHINE_EVENTS_CSV))?,
            downtimes: read_table(&dir.join(DOWNTIME_LOGS_CSV))?,
            production: read_table(&dir.join(PRODUCTION_OUTPUT_CSV))?,
            sensors: read_table(&dir.join(SENSOR_READINGS_CSV))?,
        })
    }
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> StoreResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "table written");
    Ok(())
}

fn read_table<T: DeserializeOwned>(path: &Path) -> StoreResult<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()?;
    debug!(path = %path.display(), rows = rows.len(), "table read");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{DowntimeCategory, EventType};
    use chrono::NaiveDate;
    use chrono::NaiveDateTime;

    fn ts(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, d)
            .expect("valid date")
            .and_hms_opt(h, 0, 0)
            .expect("valid time")
    }

    fn sample_dataset() -> Dataset {
        Dataset {
            equipments: vec![Equipment {
                equipment_id: "MCH001".into(),
                equipment_name: "Presse Machine A-1".into(),
                equipment_type: "Usinage".into(),
                production_line_id: "LINE_A".into(),
                ideal_cycle_time_seconds: 12,
                location: "Lyon".into(),
                installation_date: ts(1, 0),
            }],
            events: vec![MachineEvent {
                event_id: 1,
                timestamp: ts(1, 7),
                equipment_id: "MCH001".into(),
                event_type: EventType::Start,
                details: "Initial startup".into(),
            }],
            downtimes: vec![DowntimeInterval {
                downtime_id: 1,
                equipment_id: "MCH001".into(),
                start_time: ts(2, 3),
                end_time: ts(2, 7),
                downtime_category: DowntimeCategory::UnplannedBreakdown,
                downtime_reason: "Hydraulic Leak".into(),
            }],
            production: vec![ProductionRecord {
                timestamp: ts(1, 8) - chrono::Duration::seconds(1),
                equipment_id: "MCH001".into(),
                product_id: "PROD_421".into(),
                quantity_produced: 280,
                quantity_rejected: 3,
                running_duration_seconds: 3600.0,
            }],
            sensors: vec![SensorReading {
                timestamp: ts(1, 7),
                equipment_id: "MCH001".into(),
                sensor_type: "Vibration_Bearing".into(),
                value: 3.2,
                unit: "g".into(),
            }],
        }
    }

    #[test]
    fn csv_round_trip_preserves_all_tables() {
        let dir = tempfile::tempdir().expect("temp dir");
        let ds = sample_dataset();
        ds.write_csv_dir(dir.path()).expect("write");

        let back = Dataset::read_csv_dir(dir.path()).expect("read");
        assert_eq!(back.equipments, ds.equipments);
        assert_eq!(back.events, ds.events);
        assert_eq!(back.downtimes, ds.downtimes);
        assert_eq!(back.production, ds.production);
        assert_eq!(back.sensors, ds.sensors);
    }

    #[test]
    fn category_labels_survive_csv() {
        let dir = tempfile::tempdir().expect("temp dir");
        sample_dataset().write_csv_dir(dir.path()).expect("write");
        let raw = std::fs::read_to_string(dir.path().join(DOWNTIME_LOGS_CSV)).expect("read");
        assert!(raw.contains("Unplanned - Breakdown"));
    }

    #[test]
    fn missing_table_file_is_a_store_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = Dataset::read_csv_dir(dir.path()).unwrap_err();
        // csv::Reader wraps the underlying open failure in its own error type.
        assert!(matches!(err, StoreError::Csv { .. } | StoreError::Io { .. }));
    }
}
