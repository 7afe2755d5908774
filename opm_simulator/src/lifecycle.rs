//! Discrete-event lifecycle simulator.
//!
//! Produces the START/STOP/ALARM event stream and the downtime log for the
//! whole fleet from one global event queue. The cause of every STOP is
//! decided when the STOP is *scheduled* (at the preceding START), so that
//! downstream generators can backdate sensor trends and performance
//! degradation toward the failure.
//!
//! The queue is a min-heap keyed `(timestamp, equipment_id, seq)`; `seq`
//! is a monotone enqueue counter, so coincident events for one machine pop
//! in the order they were scheduled.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use chrono::{Duration, NaiveDateTime};
use opm_common::records::{DowntimeCategory, DowntimeInterval, EventType, MachineEvent};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};
use tracing::debug;

use crate::config::LifecycleParams;
use crate::error::{SimError, SimResult};

/// Event stream + downtime log for one simulated run.
#[derive(Debug, Clone)]
pub struct LifecycleOutput {
    /// All recorded events, sorted by `(equipment_id, timestamp)`.
    pub events: Vec<MachineEvent>,
    /// All downtime intervals, sorted by `(equipment_id, start_time)`.
    pub downtimes: Vec<DowntimeInterval>,
}

// ─── Event queue ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled {
    timestamp: NaiveDateTime,
    equipment_id: String,
    seq: u64,
    event_type: EventType,
    details: String,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.equipment_id.cmp(&other.equipment_id))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ─── Per-machine state ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Stopped,
}

#[derive(Debug, Clone)]
struct StopCause {
    category: DowntimeCategory,
    reason: String,
}

#[derive(Debug)]
struct MachineSim {
    state: RunState,
    /// Cause classified when the next STOP was scheduled.
    pending_cause: Option<StopCause>,
    /// Index into the downtime log of the interval opened by the last STOP.
    open_downtime: Option<usize>,
}

impl MachineSim {
    const fn new() -> Self {
        Self {
            state: RunState::Stopped,
            pending_cause: None,
            open_downtime: None,
        }
    }
}

// ─── Distributions ──────────────────────────────────────────────────

struct LifecycleDists {
    time_to_stop: Exp<f64>,
    repair_breakdown: Exp<f64>,
    repair_process: Exp<f64>,
}

impl LifecycleDists {
    fn new(params: &LifecycleParams) -> SimResult<Self> {
        let exp_with_mean = |mean_hours: f64| {
            Exp::new(1.0 / mean_hours).map_err(|e| SimError::Distribution(e.to_string()))
        };
        Ok(Self {
            time_to_stop: exp_with_mean(params.avg_mtbf_hours)?,
            repair_breakdown: exp_with_mean(params.avg_mttr_hours_breakdown)?,
            repair_process: exp_with_mean(params.avg_mttr_hours_process)?,
        })
    }
}

/// Convert sampled hours to a second-aligned offset.
fn hours(h: f64) -> Duration {
    Duration::seconds((h * 3600.0).round() as i64)
}

fn schedule(
    heap: &mut BinaryHeap<Reverse<Scheduled>>,
    seq: &mut u64,
    timestamp: NaiveDateTime,
    equipment_id: &str,
    event_type: EventType,
    details: String,
) {
    *seq += 1;
    heap.push(Reverse(Scheduled {
        timestamp,
        equipment_id: equipment_id.to_string(),
        seq: *seq,
        event_type,
        details,
    }));
}

fn classify_stop(params: &LifecycleParams, rng: &mut ChaCha8Rng) -> StopCause {
    let category = if rng.gen_bool(params.prob_stop_is_planned_maint) {
        DowntimeCategory::PlannedMaintenance
    } else if rng.gen_bool(params.prob_changeover) {
        DowntimeCategory::Changeover
    } else if rng.gen_bool(params.prob_breakdown_is_process) {
        DowntimeCategory::UnplannedProcess
    } else {
        DowntimeCategory::UnplannedBreakdown
    };
    let reasons = params.downtime_reasons.for_category(category);
    // Reason lists are validated non-empty at config load.
    let reason = reasons[rng.gen_range(0..reasons.len())].clone();
    StopCause { category, reason }
}

/// Run the discrete-event loop over `[start, end]` for every machine id.
///
/// Events scheduled past `end` are pruned when popped; any downtime still
/// open at loop exit is closed at `end`. Deterministic for a fixed RNG
/// state.
pub fn simulate_lifecycle(
    equipment_ids: &[String],
    params: &LifecycleParams,
    start: NaiveDateTime,
    end: NaiveDateTime,
    rng: &mut ChaCha8Rng,
) -> SimResult<LifecycleOutput> {
    let dists = LifecycleDists::new(params)?;

    let mut heap: BinaryHeap<Reverse<Scheduled>> = BinaryHeap::new();
    let mut seq: u64 = 0;

    let mut machines: HashMap<String, MachineSim> = HashMap::new();
    for id in equipment_ids {
        machines.insert(id.clone(), MachineSim::new());
        // Bootstrap: each machine comes online shortly after the window opens.
        let first_start = start + Duration::minutes(rng.gen_range(1..=60));
        schedule(
            &mut heap,
            &mut seq,
            first_start,
            id,
            EventType::Start,
            "Initial startup".to_string(),
        );
    }

    let mut events: Vec<MachineEvent> = Vec::new();
    let mut downtimes: Vec<DowntimeInterval> = Vec::new();
    let mut event_id: u64 = 0;
    let mut downtime_id: u64 = 0;

    while let Some(Reverse(ev)) = heap.pop() {
        if ev.timestamp > end {
            continue;
        }

        event_id += 1;
        events.push(MachineEvent {
            event_id,
            timestamp: ev.timestamp,
            equipment_id: ev.equipment_id.clone(),
            event_type: ev.event_type,
            details: ev.details.clone(),
        });

        let machine = machines
            .get_mut(&ev.equipment_id)
            .expect("every scheduled event belongs to a known machine");

        match ev.event_type {
            EventType::Start if machine.state == RunState::Stopped => {
                machine.state = RunState::Running;

                // This START terminates the downtime opened by the last STOP.
                if let Some(idx) = machine.open_downtime.take() {
                    let interval = &mut downtimes[idx];
                    interval.end_time = ev.timestamp;
                    assert!(
                        interval.end_time >= interval.start_time,
                        "negative downtime interval for {}",
                        interval.equipment_id
                    );
                }

                // Schedule the next STOP and classify its cause now, so the
                // failure's precursors can be synthesized later.
                let stop_at = ev.timestamp + hours(dists.time_to_stop.sample(rng));
                let cause = classify_stop(params, rng);
                if cause.category == DowntimeCategory::UnplannedBreakdown {
                    schedule(
                        &mut heap,
                        &mut seq,
                        stop_at,
                        &ev.equipment_id,
                        EventType::Alarm,
                        format!("Pre-stop alarm: {}", cause.reason),
                    );
                }
                schedule(
                    &mut heap,
                    &mut seq,
                    stop_at,
                    &ev.equipment_id,
                    EventType::Stop,
                    format!("Stop: {} ({})", cause.category, cause.reason),
                );
                machine.pending_cause = Some(cause);
            }

            EventType::Stop if machine.state == RunState::Running => {
                machine.state = RunState::Stopped;
                let cause = machine
                    .pending_cause
                    .take()
                    .expect("STOP fires only with a pre-classified cause");

                downtime_id += 1;
                downtimes.push(DowntimeInterval {
                    downtime_id,
                    equipment_id: ev.equipment_id.clone(),
                    start_time: ev.timestamp,
                    // Placeholder until the next START (or finalization).
                    end_time: ev.timestamp,
                    downtime_category: cause.category,
                    downtime_reason: cause.reason.clone(),
                });
                machine.open_downtime = Some(downtimes.len() - 1);

                // Planned stops have a bounded, more predictable duration;
                // unplanned repairs are exponential.
                let repair_hours = match cause.category {
                    DowntimeCategory::UnplannedBreakdown => dists.repair_breakdown.sample(rng),
                    DowntimeCategory::UnplannedProcess => dists.repair_process.sample(rng),
                    DowntimeCategory::PlannedMaintenance => {
                        params.avg_mttr_hours_maintenance * rng.gen_range(0.8..1.2)
                    }
                    DowntimeCategory::Changeover => {
                        params.avg_mttr_hours_changeover * rng.gen_range(0.8..1.2)
                    }
                };
                schedule(
                    &mut heap,
                    &mut seq,
                    ev.timestamp + hours(repair_hours),
                    &ev.equipment_id,
                    EventType::Start,
                    format!("Restart after {}", cause.category),
                );
            }

            // ALARMs carry no state change; the coincident STOP does the work.
            EventType::Alarm => {}

            _ => unreachable!("START/STOP alternation violated for {}", ev.equipment_id),
        }
    }

    // Close anything still open at the simulation end.
    for machine in machines.values_mut() {
        if let Some(idx) = machine.open_downtime.take() {
            let interval = &mut downtimes[idx];
            // A STOP is only recorded at or before `end`, but clamp anyway.
            interval.end_time = end.max(interval.start_time);
        }
    }

    debug!(
        events = events.len(),
        downtimes = downtimes.len(),
        "lifecycle simulation complete"
    );

    events.sort_by(|a, b| {
        a.equipment_id
            .cmp(&b.equipment_id)
            .then(a.timestamp.cmp(&b.timestamp))
            .then(a.event_id.cmp(&b.event_id))
    });
    downtimes.sort_by(|a, b| {
        a.equipment_id
            .cmp(&b.equipment_id)
            .then(a.start_time.cmp(&b.start_time))
    });

    Ok(LifecycleOutput { events, downtimes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;

    fn ts(m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, m, d)
            .expect("valid date")
            .and_hms_opt(h, 0, 0)
            .expect("valid time")
    }

    fn run_default(seed: u64) -> LifecycleOutput {
        let params = LifecycleParams::default();
        let ids = vec!["MCH001".to_string(), "MCH002".to_string()];
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        simulate_lifecycle(&ids, &params, ts(1, 1, 7), ts(3, 31, 17), &mut rng).expect("simulate")
    }

    #[test]
    fn heap_orders_by_timestamp_then_machine_then_seq() {
        let a = Scheduled {
            timestamp: ts(1, 1, 8),
            equipment_id: "MCH002".into(),
            seq: 1,
            event_type: EventType::Stop,
            details: String::new(),
        };
        let b = Scheduled {
            timestamp: ts(1, 1, 8),
            equipment_id: "MCH001".into(),
            seq: 2,
            event_type: EventType::Start,
            details: String::new(),
        };
        let c = Scheduled {
            timestamp: ts(1, 1, 7),
            equipment_id: "MCH009".into(),
            seq: 3,
            event_type: EventType::Start,
            details: String::new(),
        };
        let mut heap = BinaryHeap::from([Reverse(a), Reverse(b), Reverse(c)]);
        let order: Vec<String> = std::iter::from_fn(|| heap.pop().map(|Reverse(s)| s.equipment_id))
            .collect();
        assert_eq!(order, ["MCH009", "MCH001", "MCH002"]);
    }

    #[test]
    fn first_event_per_machine_is_start() {
        let out = run_default(11);
        for id in ["MCH001", "MCH002"] {
            let first = out
                .events
                .iter()
                .find(|e| e.equipment_id == id)
                .expect("machine has events");
            assert_eq!(first.event_type, EventType::Start);
            assert_eq!(first.details, "Initial startup");
        }
    }

    #[test]
    fn start_stop_strictly_alternate() {
        let out = run_default(12);
        for id in ["MCH001", "MCH002"] {
            let mut expect_start = true;
            for ev in out
                .events
                .iter()
                .filter(|e| e.equipment_id == id && e.event_type != EventType::Alarm)
            {
                let expected = if expect_start {
                    EventType::Start
                } else {
                    EventType::Stop
                };
                assert_eq!(ev.event_type, expected, "at event {}", ev.event_id);
                expect_start = !expect_start;
            }
        }
    }

    #[test]
    fn downtimes_are_framed_and_disjoint() {
        let out = run_default(13);
        for id in ["MCH001", "MCH002"] {
            let mut last_end: Option<NaiveDateTime> = None;
            for dt in out.downtimes.iter().filter(|d| d.equipment_id == id) {
                assert!(dt.end_time >= dt.start_time);
                if let Some(prev) = last_end {
                    assert!(dt.start_time >= prev, "overlapping downtimes for {id}");
                }
                last_end = Some(dt.end_time);
                // Framing STOP at the interval start.
                assert!(out.events.iter().any(|e| e.equipment_id == *id
                    && e.event_type == EventType::Stop
                    && e.timestamp == dt.start_time));
            }
        }
    }

    #[test]
    fn breakdown_stops_carry_a_coincident_alarm() {
        let out = run_default(14);
        for dt in out
            .downtimes
            .iter()
            .filter(|d| d.downtime_category == DowntimeCategory::UnplannedBreakdown)
        {
            // The final interval may have been cut off before its STOP? No:
            // intervals only open at a recorded STOP, so the alarm is there too.
            assert!(
                out.events.iter().any(|e| e.equipment_id == dt.equipment_id
                    && e.event_type == EventType::Alarm
                    && e.timestamp == dt.start_time),
                "no alarm for breakdown at {}",
                dt.start_time
            );
        }
    }

    #[test]
    fn stop_details_embed_category_and_reason() {
        let out = run_default(15);
        for ev in out
            .events
            .iter()
            .filter(|e| e.event_type == EventType::Stop)
        {
            assert!(ev.details.starts_with("Stop: "), "details: {}", ev.details);
            let dt = out
                .downtimes
                .iter()
                .find(|d| d.equipment_id == ev.equipment_id && d.start_time == ev.timestamp)
                .expect("every STOP opens a downtime");
            assert!(ev.details.contains(dt.downtime_category.label()));
            assert!(ev.details.contains(&dt.downtime_reason));
        }
    }

    #[test]
    fn identical_seed_reproduces_run() {
        let a = run_default(99);
        let b = run_default(99);
        assert_eq!(a.events, b.events);
        assert_eq!(a.downtimes, b.downtimes);
    }

    #[test]
    fn no_event_or_interval_escapes_the_window() {
        let out = run_default(21);
        let (s, e) = (ts(1, 1, 7), ts(3, 31, 17));
        for ev in &out.events {
            assert!(ev.timestamp >= s && ev.timestamp <= e);
        }
        for dt in &out.downtimes {
            assert!(dt.start_time >= s && dt.end_time <= e);
        }
    }
}
