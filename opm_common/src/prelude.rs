//! Prelude module for common re-exports.
//!
//! Consumers can do `use opm_common::prelude::*;` and get the most
//! important types without listing individual paths.

// ─── Records ────────────────────────────────────────────────────────
pub use crate::records::{
    DowntimeCategory, DowntimeInterval, Equipment, EventType, MachineEvent,
    ProductionRecord, SensorReading,
};

// ─── Query window ───────────────────────────────────────────────────
pub use crate::window::{InvalidWindow, Window};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader};

// ─── Store ──────────────────────────────────────────────────────────
pub use crate::store::{Dataset, StoreError, StoreResult};
