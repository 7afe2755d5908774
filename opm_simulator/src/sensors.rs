//! Periodic sensor synthesis with pre-failure trending.
//!
//! Every (machine, profile) pair is sampled at a fixed cadence across the
//! whole window, machine state notwithstanding. When a sample falls inside
//! the pre-trend window of an upcoming unplanned stop whose (category,
//! reason) matches the profile, the value drifts toward the anomaly; the
//! stop list is the simulator's own downtime log.

use chrono::{Duration, NaiveDateTime};
use opm_common::records::{DowntimeInterval, Equipment, SensorReading};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::config::{SensorParams, TrendType};
use crate::error::{SimError, SimResult};

/// First stop strictly after `t`, from a sorted list.
///
/// A sample lying in `[stop − w, stop)` can only match the *first* stop
/// after it, so one lookup settles the trend ("first match wins").
fn upcoming_stop(stops: &[NaiveDateTime], t: NaiveDateTime) -> Option<NaiveDateTime> {
    let idx = stops.partition_point(|s| *s <= t);
    stops.get(idx).copied()
}

/// Generate readings for the whole fleet across `[start, end]`.
pub fn generate_sensor_readings(
    fleet: &[Equipment],
    downtimes: &[DowntimeInterval],
    start: NaiveDateTime,
    end: NaiveDateTime,
    params: &SensorParams,
    rng: &mut ChaCha8Rng,
) -> SimResult<Vec<SensorReading>> {
    let noise: Vec<Normal<f64>> = params
        .profiles
        .iter()
        .map(|p| {
            Normal::new(p.base, p.noise_std).map_err(|e| SimError::Distribution(e.to_string()))
        })
        .collect::<SimResult<_>>()?;

    // Per (machine, profile): sorted start times of the linked unplanned stops.
    let linked_stops: Vec<Vec<Vec<NaiveDateTime>>> = fleet
        .iter()
        .map(|equip| {
            params
                .profiles
                .iter()
                .map(|profile| {
                    let mut stops: Vec<NaiveDateTime> = downtimes
                        .iter()
                        .filter(|d| {
                            d.equipment_id == equip.equipment_id
                                && d.downtime_category == profile.related_downtime_category
                                && d.downtime_reason == profile.related_downtime_reason
                        })
                        .map(|d| d.start_time)
                        .collect();
                    stops.sort_unstable();
                    stops
                })
                .collect()
        })
        .collect();

    let window_seconds = params.pre_trend_window_hours * 3600.0;
    let step = Duration::seconds(i64::from(params.reading_frequency_seconds));

    let mut readings = Vec::new();
    let mut now = start;
    while now <= end {
        for (ei, equip) in fleet.iter().enumerate() {
            for (pi, profile) in params.profiles.iter().enumerate() {
                let mut value = noise[pi].sample(rng);

                if let Some(stop) = upcoming_stop(&linked_stops[ei][pi], now) {
                    let lead_seconds = (stop - now).num_seconds() as f64;
                    if lead_seconds <= window_seconds {
                        let progress = 1.0 - lead_seconds / window_seconds;
                        value += match profile.trend_type {
                            TrendType::Linear => progress * profile.trend_strength,
                            TrendType::Exponential => {
                                progress * progress * profile.trend_strength
                            }
                        };
                    }
                }

                readings.push(SensorReading {
                    timestamp: now,
                    equipment_id: equip.equipment_id.clone(),
                    sensor_type: profile.sensor_type.clone(),
                    value: value.max(0.0),
                    unit: profile.unit.clone(),
                });
            }
        }
        now += step;
    }

    readings.sort_by(|a, b| {
        a.equipment_id
            .cmp(&b.equipment_id)
            .then(a.timestamp.cmp(&b.timestamp))
    });
    debug!(readings = readings.len(), "sensor synthesis complete");
    Ok(readings)
}
