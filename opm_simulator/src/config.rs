//! Simulation configuration.
//!
//! Every tunable of the synthesis pipeline lives here, loaded from a single
//! TOML file via [`ConfigLoader`]. Each field has a default, so an empty
//! file (or no file at all) yields the reference parameter set.

use chrono::{NaiveDate, NaiveDateTime};
use opm_common::config::{ConfigError, ConfigLoader};
use opm_common::records::{DowntimeCategory, wire_time};
use serde::Deserialize;

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub simulation: SimulationSection,
    pub catalog: CatalogParams,
    pub lifecycle: LifecycleParams,
    pub production: ProductionParams,
    pub sensors: SensorParams,
}

/// Run window, fleet size and RNG seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    /// Number of machines in the fleet.
    pub machine_count: u32,
    /// First instant of the simulated window (typical shift start).
    #[serde(with = "wire_time")]
    pub start: NaiveDateTime,
    /// Last instant of the simulated window.
    #[serde(with = "wire_time")]
    pub end: NaiveDateTime,
    /// Seed for the ChaCha stream. A fixed seed reproduces the run exactly.
    pub seed: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            machine_count: 10,
            start: ymd_hms(2023, 1, 1, 7),
            end: ymd_hms(2023, 12, 31, 17),
            seed: 42,
        }
    }
}

/// Equipment catalog synthesis parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogParams {
    /// Mean ideal cycle time [s].
    pub ideal_cycle_time_mean: f64,
    /// Std-dev of ideal cycle time [s].
    pub ideal_cycle_time_std: f64,
}

impl Default for CatalogParams {
    fn default() -> Self {
        Self {
            ideal_cycle_time_mean: 15.0,
            ideal_cycle_time_std: 5.0,
        }
    }
}

/// Lifecycle (event/downtime) parameters.
///
/// MTBF and MTTR means feed exponential sampling; planned categories use
/// `mean × uniform(0.8, 1.2)` instead, giving them a more predictable
/// duration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleParams {
    /// Mean time between failures [h]: time RUNNING before the next stop.
    pub avg_mtbf_hours: f64,
    /// Mean repair time for hard breakdowns [h].
    pub avg_mttr_hours_breakdown: f64,
    /// Mean repair time for process issues [h].
    pub avg_mttr_hours_process: f64,
    /// Mean changeover duration [h].
    pub avg_mttr_hours_changeover: f64,
    /// Mean planned maintenance duration [h].
    pub avg_mttr_hours_maintenance: f64,
    /// Probability the pre-classified cause is Planned Maintenance.
    pub prob_stop_is_planned_maint: f64,
    /// Given not planned maintenance, probability of a Changeover.
    pub prob_changeover: f64,
    /// Given not planned and not changeover, probability of a process issue
    /// (vs a hard breakdown).
    pub prob_breakdown_is_process: f64,
    pub downtime_reasons: DowntimeReasons,
}

impl Default for LifecycleParams {
    fn default() -> Self {
        Self {
            avg_mtbf_hours: 150.0,
            avg_mttr_hours_breakdown: 4.0,
            avg_mttr_hours_process: 1.0,
            avg_mttr_hours_changeover: 0.5,
            avg_mttr_hours_maintenance: 8.0,
            prob_stop_is_planned_maint: 0.05,
            prob_changeover: 0.15,
            prob_breakdown_is_process: 0.3,
            downtime_reasons: DowntimeReasons::default(),
        }
    }
}

/// Reason catalog, one list per downtime category. Reasons are drawn
/// uniformly within the scheduled category.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DowntimeReasons {
    pub planned_maintenance: Vec<String>,
    pub breakdown: Vec<String>,
    pub process: Vec<String>,
    pub changeover: Vec<String>,
}

impl Default for DowntimeReasons {
    fn default() -> Self {
        let list = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
        Self {
            planned_maintenance: list(&["Routine Check", "Calibration", "Software Update"]),
            breakdown: list(&[
                "Mechanical Failure",
                "Electrical Fault",
                "Hydraulic Leak",
                "Sensor Error",
                "Other Breakdown",
            ]),
            process: list(&[
                "Material Shortage",
                "Tooling Issue",
                "Operator Error",
                "Quality Issue",
            ]),
            changeover: list(&["Product Changeover", "Setup Adjustment"]),
        }
    }
}

impl DowntimeReasons {
    /// The reason list for one category.
    pub fn for_category(&self, category: DowntimeCategory) -> &[String] {
        match category {
            DowntimeCategory::PlannedMaintenance => &self.planned_maintenance,
            DowntimeCategory::UnplannedBreakdown => &self.breakdown,
            DowntimeCategory::UnplannedProcess => &self.process,
            DowntimeCategory::Changeover => &self.changeover,
        }
    }

    /// Whether `reason` belongs to `category`'s list.
    pub fn contains(&self, category: DowntimeCategory, reason: &str) -> bool {
        self.for_category(category).iter().any(|r| r == reason)
    }
}

/// Hourly production synthesis parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductionParams {
    /// Mean of the per-hour performance factor (ideal/actual cycle ratio).
    pub performance_factor_mean: f64,
    pub performance_factor_std: f64,
    /// Maximum performance drop reached right before an unplanned stop.
    pub performance_drop_factor: f64,
    /// Window before an unplanned stop in which performance degrades [h].
    pub performance_drop_window_hours: f64,
    /// Baseline probability of a unit being rejected.
    pub quality_reject_rate_base: f64,
    /// Additional reject rate reached right before an unplanned stop.
    pub quality_reject_rate_increase: f64,
    /// Window before an unplanned stop in which rejects ramp up [h].
    pub quality_reject_window_hours: f64,
}

impl Default for ProductionParams {
    fn default() -> Self {
        Self {
            performance_factor_mean: 0.98,
            performance_factor_std: 0.02,
            performance_drop_factor: 0.15,
            performance_drop_window_hours: 2.0,
            quality_reject_rate_base: 0.01,
            quality_reject_rate_increase: 0.03,
            quality_reject_window_hours: 1.0,
        }
    }
}

/// Sensor synthesis parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorParams {
    /// Sampling cadence [s].
    pub reading_frequency_seconds: u32,
    /// Window before a linked unplanned stop in which values trend [h].
    pub pre_trend_window_hours: f64,
    pub profiles: Vec<SensorProfile>,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            reading_frequency_seconds: 30,
            pre_trend_window_hours: 8.0,
            profiles: SensorProfile::reference_set(),
        }
    }
}

/// Trend shape applied inside the pre-trend window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendType {
    /// Drift proportional to progress through the window.
    Linear,
    /// Drift proportional to progress squared (accelerating).
    Exponential,
}

/// One simulated sensor per machine.
///
/// A profile correlates with exactly one `(category, reason)` pair; its
/// values drift toward the anomaly only when that failure is upcoming.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorProfile {
    pub sensor_type: String,
    pub base: f64,
    pub noise_std: f64,
    pub unit: String,
    pub trend_type: TrendType,
    /// Signed drift magnitude reached at the stop instant. Negative values
    /// model sensors that fall toward failure (e.g. hydraulic pressure).
    pub trend_strength: f64,
    pub related_downtime_category: DowntimeCategory,
    pub related_downtime_reason: String,
}

impl SensorProfile {
    /// The four reference sensors.
    pub fn reference_set() -> Vec<Self> {
        vec![
            SensorProfile {
                sensor_type: "Temperature_Motor".into(),
                base: 60.0,
                noise_std: 2.0,
                unit: "°C".into(),
                trend_type: TrendType::Linear,
                trend_strength: 8.0,
                related_downtime_category: DowntimeCategory::UnplannedBreakdown,
                related_downtime_reason: "Electrical Fault".into(),
            },
            SensorProfile {
                sensor_type: "Vibration_Bearing".into(),
                base: 3.0,
                noise_std: 0.8,
                unit: "g".into(),
                trend_type: TrendType::Exponential,
                trend_strength: 1.5,
                related_downtime_category: DowntimeCategory::UnplannedBreakdown,
                related_downtime_reason: "Mechanical Failure".into(),
            },
            SensorProfile {
                sensor_type: "Pressure_Hydraulic".into(),
                base: 10.0,
                noise_std: 0.5,
                unit: "bar".into(),
                trend_type: TrendType::Linear,
                trend_strength: -4.0,
                related_downtime_category: DowntimeCategory::UnplannedBreakdown,
                related_downtime_reason: "Hydraulic Leak".into(),
            },
            SensorProfile {
                sensor_type: "Current_Consumption".into(),
                base: 15.0,
                noise_std: 1.0,
                unit: "A".into(),
                trend_type: TrendType::Linear,
                trend_strength: 5.0,
                related_downtime_category: DowntimeCategory::UnplannedProcess,
                related_downtime_reason: "Tooling Issue".into(),
            },
        ]
    }
}

impl ConfigLoader for SimulationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.simulation.machine_count == 0 {
            return fail("machine_count must be at least 1".into());
        }
        if self.simulation.end <= self.simulation.start {
            return fail("simulation end must be after start".into());
        }
        for (name, value) in [
            ("avg_mtbf_hours", self.lifecycle.avg_mtbf_hours),
            ("avg_mttr_hours_breakdown", self.lifecycle.avg_mttr_hours_breakdown),
            ("avg_mttr_hours_process", self.lifecycle.avg_mttr_hours_process),
            ("avg_mttr_hours_changeover", self.lifecycle.avg_mttr_hours_changeover),
            ("avg_mttr_hours_maintenance", self.lifecycle.avg_mttr_hours_maintenance),
            ("ideal_cycle_time_mean", self.catalog.ideal_cycle_time_mean),
        ] {
            if value <= 0.0 {
                return fail(format!("{name} must be positive (got {value})"));
            }
        }
        for (name, prob) in [
            ("prob_stop_is_planned_maint", self.lifecycle.prob_stop_is_planned_maint),
            ("prob_changeover", self.lifecycle.prob_changeover),
            ("prob_breakdown_is_process", self.lifecycle.prob_breakdown_is_process),
        ] {
            if !(0.0..=1.0).contains(&prob) {
                return fail(format!("{name} must lie in [0, 1] (got {prob})"));
            }
        }
        for category in [
            DowntimeCategory::PlannedMaintenance,
            DowntimeCategory::UnplannedBreakdown,
            DowntimeCategory::UnplannedProcess,
            DowntimeCategory::Changeover,
        ] {
            if self.lifecycle.downtime_reasons.for_category(category).is_empty() {
                return fail(format!("downtime reason list for '{category}' is empty"));
            }
        }
        if self.catalog.ideal_cycle_time_std < 0.0
            || self.production.performance_factor_std < 0.0
        {
            return fail("standard deviations must be non-negative".into());
        }
        if self.production.performance_drop_window_hours < 0.0
            || self.production.quality_reject_window_hours < 0.0
        {
            return fail("degradation windows must be non-negative".into());
        }
        if self.sensors.reading_frequency_seconds == 0 {
            return fail("reading_frequency_seconds must be at least 1".into());
        }
        if self.sensors.pre_trend_window_hours <= 0.0 {
            return fail("pre_trend_window_hours must be positive".into());
        }
        for profile in &self.sensors.profiles {
            if profile.noise_std < 0.0 {
                return fail(format!(
                    "sensor '{}': noise_std must be non-negative",
                    profile.sensor_type
                ));
            }
            if profile.related_downtime_category.is_planned() {
                return fail(format!(
                    "sensor '{}': trends correlate with unplanned stops only",
                    profile.sensor_type
                ));
            }
            if !self.lifecycle.downtime_reasons.contains(
                profile.related_downtime_category,
                &profile.related_downtime_reason,
            ) {
                return fail(format!(
                    "sensor '{}': reason '{}' is not in the '{}' reason list",
                    profile.sensor_type,
                    profile.related_downtime_reason,
                    profile.related_downtime_category
                ));
            }
        }
        Ok(())
    }
}

fn ymd_hms(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    // Only called with literal in-range arguments.
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, 0, 0))
        .expect("valid built-in date")
}
