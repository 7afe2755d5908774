//! Equipment catalog synthesis.
//!
//! Builds the static fleet the rest of the pipeline runs against. Ids are
//! `MCH001…`; everything else is drawn from small fixed pools plus a
//! normally distributed ideal cycle time (floored at 1 s).

use chrono::Duration;
use opm_common::records::Equipment;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};

const EQUIPMENT_TYPES: &[&str] = &[
    "Assemblage",
    "Emballage",
    "Usinage",
    "Peinture",
    "Contrôle",
    "Soudage",
];

const NAME_WORDS: &[&str] = &[
    "Presse", "Fraiseuse", "Convoyeur", "Robot", "Tour", "Cellule", "Poste", "Centre",
];

const PRODUCTION_LINES: &[&str] = &["A", "B", "C", "D"];

const LOCATIONS: &[&str] = &[
    "Lyon",
    "Grenoble",
    "Toulouse",
    "Nantes",
    "Lille",
    "Valence",
    "Mulhouse",
    "Besançon",
];

fn pick<'a>(pool: &'a [&'a str], rng: &mut ChaCha8Rng) -> &'a str {
    pool[rng.gen_range(0..pool.len())]
}

/// Generate the fleet described by the catalog section of `cfg`.
///
/// Installation dates land between five years and one year before the
/// simulated window, so every machine predates its own history.
pub fn generate_fleet(cfg: &SimulationConfig, rng: &mut ChaCha8Rng) -> SimResult<Vec<Equipment>> {
    let cycle_time = Normal::new(
        cfg.catalog.ideal_cycle_time_mean,
        cfg.catalog.ideal_cycle_time_std,
    )
    .map_err(|e| SimError::Distribution(e.to_string()))?;

    let fleet = (0..cfg.simulation.machine_count)
        .map(|i| {
            let letter = char::from(b'A' + rng.gen_range(0..26u8));
            Equipment {
                equipment_id: format!("MCH{:03}", i + 1),
                equipment_name: format!("{} Machine {}-{}", pick(NAME_WORDS, rng), letter, i + 1),
                equipment_type: pick(EQUIPMENT_TYPES, rng).to_string(),
                production_line_id: format!("LINE_{}", pick(PRODUCTION_LINES, rng)),
                ideal_cycle_time_seconds: cycle_time.sample(rng).round().max(1.0) as u32,
                location: pick(LOCATIONS, rng).to_string(),
                installation_date: cfg.simulation.start - Duration::days(rng.gen_range(365..=1825)),
            }
        })
        .collect();
    Ok(fleet)
}
