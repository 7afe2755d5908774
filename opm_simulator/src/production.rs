//! Hourly production synthesis over RUNNING intervals.
//!
//! Reconstructs each machine's RUNNING/STOPPED timeline from the event
//! stream, then walks it in wall-clock-hour chunks. Performance sags and
//! rejects ramp up as the machine approaches its next unplanned stop; the
//! stop times come from the authoritative downtime log, never re-derived
//! from event text.

use chrono::{Duration, NaiveDateTime, Timelike};
use opm_common::records::{
    DowntimeInterval, Equipment, EventType, MachineEvent, ProductionRecord,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use crate::config::ProductionParams;
use crate::error::{SimError, SimResult};

/// Performance never sags below this floor while the machine runs.
const PERFORMANCE_FLOOR: f64 = 0.1;
/// Reject rate cap, ramp included.
const REJECT_RATE_CAP: f64 = 0.1;

/// One stretch of constant machine state (and product) on the timeline.
#[derive(Debug, Clone)]
struct Segment {
    start: NaiveDateTime,
    end: NaiveDateTime,
    running: bool,
    product: Option<String>,
}

fn fresh_product_id(rng: &mut ChaCha8Rng) -> String {
    format!("PROD_{}", rng.gen_range(100..=999))
}

/// Walk one machine's events into segments covering `[start, end]`.
///
/// Before the first event the machine is STOPPED with no product. A fresh
/// product id is assigned at the first START, and again at any START that
/// follows a changeover STOP.
fn reconstruct_segments(
    events: &[&MachineEvent],
    start: NaiveDateTime,
    end: NaiveDateTime,
    rng: &mut ChaCha8Rng,
) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = start;
    let mut running = false;
    let mut product: Option<String> = None;
    let mut changeover_pending = false;

    for ev in events {
        if ev.timestamp > cursor {
            segments.push(Segment {
                start: cursor,
                end: ev.timestamp,
                running,
                product: product.clone(),
            });
            cursor = ev.timestamp;
        }
        match ev.event_type {
            EventType::Start => {
                if product.is_none() || changeover_pending {
                    product = Some(fresh_product_id(rng));
                }
                changeover_pending = false;
                running = true;
            }
            EventType::Stop => {
                running = false;
                changeover_pending = ev.details.contains("Changeover");
            }
            EventType::Alarm => {}
        }
    }
    if end > cursor {
        segments.push(Segment {
            start: cursor,
            end,
            running,
            product,
        });
    }
    segments
}

/// Align down to the top of the hour. Timestamps are second-aligned.
fn floor_to_hour(t: NaiveDateTime) -> NaiveDateTime {
    let past_hour = i64::from(t.time().num_seconds_from_midnight() % 3600);
    t - Duration::seconds(past_hour)
}

/// First stop strictly after `t`, from a sorted list.
fn next_stop_after(stops: &[NaiveDateTime], t: NaiveDateTime) -> Option<NaiveDateTime> {
    let idx = stops.partition_point(|s| *s <= t);
    stops.get(idx).copied()
}

/// Generate hourly production records for the whole fleet.
pub fn generate_production(
    fleet: &[Equipment],
    events: &[MachineEvent],
    downtimes: &[DowntimeInterval],
    start: NaiveDateTime,
    end: NaiveDateTime,
    params: &ProductionParams,
    rng: &mut ChaCha8Rng,
) -> SimResult<Vec<ProductionRecord>> {
    let performance = Normal::new(
        params.performance_factor_mean,
        params.performance_factor_std,
    )
    .map_err(|e| SimError::Distribution(e.to_string()))?;

    let mut records = Vec::new();
    for equip in fleet {
        let mut machine_events: Vec<&MachineEvent> = events
            .iter()
            .filter(|e| e.equipment_id == equip.equipment_id)
            .collect();
        machine_events.sort_by_key(|e| (e.timestamp, e.event_id));

        let mut unplanned_stops: Vec<NaiveDateTime> = downtimes
            .iter()
            .filter(|d| d.equipment_id == equip.equipment_id && !d.downtime_category.is_planned())
            .map(|d| d.start_time)
            .collect();
        unplanned_stops.sort_unstable();

        for segment in reconstruct_segments(&machine_events, start, end, rng) {
            if !segment.running {
                continue;
            }
            emit_segment(equip, &segment, &unplanned_stops, params, &performance, rng, &mut records);
        }
    }

    debug!(records = records.len(), "production synthesis complete");
    Ok(records)
}

/// Step one RUNNING segment in hour-aligned chunks and emit records.
fn emit_segment(
    equip: &Equipment,
    segment: &Segment,
    unplanned_stops: &[NaiveDateTime],
    params: &ProductionParams,
    performance: &Normal<f64>,
    rng: &mut ChaCha8Rng,
    records: &mut Vec<ProductionRecord>,
) {
    let product = segment
        .product
        .as_deref()
        .expect("RUNNING segment always carries a product");

    let mut cursor = floor_to_hour(segment.start);
    while cursor < segment.end {
        let u = cursor.max(segment.start);
        let v = (cursor + Duration::hours(1)).min(segment.end);
        cursor += Duration::hours(1);
        if v <= u {
            continue;
        }
        let duration_seconds = (v - u).num_seconds() as f64;

        // Hours from the chunk end to the next unplanned stop, if any.
        let hours_to_stop = next_stop_after(unplanned_stops, u)
            .map(|stop| (stop - v).num_seconds() as f64 / 3600.0);

        let mut perf = performance.sample(rng);
        if let Some(tau) = hours_to_stop {
            if (0.0..params.performance_drop_window_hours).contains(&tau) {
                perf -= (1.0 - tau / params.performance_drop_window_hours)
                    * params.performance_drop_factor;
            }
        }
        let perf = perf.clamp(PERFORMANCE_FLOOR, 1.0);

        let theoretical_units = duration_seconds / f64::from(equip.ideal_cycle_time_seconds);
        let quantity_produced =
            (theoretical_units * perf * rng.gen_range(0.98..1.02)).floor() as u64;

        let mut reject_rate = params.quality_reject_rate_base;
        if let Some(tau) = hours_to_stop {
            if (0.0..params.quality_reject_window_hours).contains(&tau) {
                reject_rate = (reject_rate
                    + (1.0 - tau / params.quality_reject_window_hours)
                        * params.quality_reject_rate_increase)
                    .min(REJECT_RATE_CAP);
            }
        }
        let quantity_rejected = ((quantity_produced as f64)
            * reject_rate
            * rng.gen_range(0.8..1.5))
        .floor() as u64;
        let quantity_rejected = quantity_rejected.min(quantity_produced);

        if quantity_produced > 0 || quantity_rejected > 0 {
            records.push(ProductionRecord {
                timestamp: v - Duration::seconds(1),
                equipment_id: equip.equipment_id.clone(),
                product_id: product.to_string(),
                quantity_produced,
                quantity_rejected,
                running_duration_seconds: duration_seconds,
            });
        }
    }
}
