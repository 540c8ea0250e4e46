//! In-process encounter generator.
//!
//! Rolls encounters from per-map species tables with a seedable PCG
//! generator. Longer streaks of completed sessions raise both the chance of
//! an encounter and the chance of a shiny; a partner native to the map
//! doubles the shiny odds.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_pcg::Mcg128Xsl64;

use super::generator::EncounterGenerator;
use super::types::{EncounterRequest, GeneratorVerdict};
use crate::error::GeneratorError;

const VIRIDIAN_FOREST: &[&str] = &["Caterpie", "Metapod", "Weedle", "Kakuna", "Pidgey", "Pikachu"];
const MT_MOON: &[&str] = &["Zubat", "Geodude", "Paras", "Clefairy"];
const ROUTE_GRASS: &[&str] = &["Rattata", "Pidgey", "Spearow", "Nidoran"];

const MAX_ENCOUNTER_CHANCE: f64 = 0.9;
const BASE_SHINY_ODDS: u64 = 64;
const MIN_SHINY_ODDS: u64 = 16;

/// Species that can appear on `map`.
fn habitat(map: &str) -> &'static [&'static str] {
    match map.trim().to_ascii_lowercase().as_str() {
        "viridian forest" => VIRIDIAN_FOREST,
        "mt. moon" | "mt moon" | "mount moon" => MT_MOON,
        _ => ROUTE_GRASS,
    }
}

fn base_encounter_chance(map: &str) -> f64 {
    match map.trim().to_ascii_lowercase().as_str() {
        "viridian forest" => 0.6,
        "mt. moon" | "mt moon" | "mount moon" => 0.45,
        _ => 0.5,
    }
}

/// Probability that a request produces any encounter.
pub(crate) fn encounter_chance(request: &EncounterRequest) -> f64 {
    let streak_bonus = 0.05 * request.session_count().min(8) as f64;
    (base_encounter_chance(request.task_map()) + streak_bonus).min(MAX_ENCOUNTER_CHANCE)
}

/// Probability that an encounter is the rare variant.
pub(crate) fn shiny_chance(request: &EncounterRequest) -> f64 {
    let odds = BASE_SHINY_ODDS
        .saturating_sub(request.session_count().saturating_mul(4))
        .max(MIN_SHINY_ODDS);
    let native_partner = habitat(request.task_map())
        .iter()
        .any(|s| s.eq_ignore_ascii_case(request.partner_identifier().trim()));
    let chance = 1.0 / odds as f64;
    if native_partner {
        chance * 2.0
    } else {
        chance
    }
}

pub struct LocalGenerator {
    rng: Mutex<Mcg128Xsl64>,
}

impl LocalGenerator {
    /// Seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(Mcg128Xsl64::from_entropy()),
        }
    }

    /// Deterministic sequence for replays and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(Mcg128Xsl64::seed_from_u64(seed)),
        }
    }

    /// Roll one verdict synchronously.
    pub fn roll(&self, request: &EncounterRequest) -> GeneratorVerdict {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        if !rng.gen_bool(encounter_chance(request)) {
            return GeneratorVerdict::nothing();
        }
        let species = habitat(request.task_map());
        let name = species[rng.gen_range(0..species.len())];
        let shiny = rng.gen_bool(shiny_chance(request));
        GeneratorVerdict::appeared(name, shiny)
    }
}

impl Default for LocalGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EncounterGenerator for LocalGenerator {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(
        &self,
        request: &EncounterRequest,
    ) -> Result<GeneratorVerdict, GeneratorError> {
        Ok(self.roll(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(map: &str, partner: &str, sessions: u64) -> EncounterRequest {
        EncounterRequest::new(map, partner, sessions, 25)
    }

    #[test]
    fn same_seed_same_verdicts() {
        let a = LocalGenerator::seeded(7);
        let b = LocalGenerator::seeded(7);
        for n in 1..20 {
            let req = request("Viridian Forest", "Pikachu", n);
            assert_eq!(a.roll(&req), b.roll(&req));
        }
    }

    #[test]
    fn encounters_come_from_the_map_table() {
        let generator = LocalGenerator::seeded(42);
        let req = request("Mt. Moon", "Pikachu", 4);
        for _ in 0..200 {
            let verdict = generator.roll(&req);
            if verdict.encounter_occurs {
                let name = verdict.encountered_pokemon.as_deref().unwrap();
                assert!(MT_MOON.contains(&name), "{name} does not live in Mt. Moon");
                assert!(verdict.shiny.is_some());
            } else {
                assert!(verdict.encountered_pokemon.is_none());
            }
        }
    }

    #[test]
    fn unknown_maps_fall_back_to_route_grass() {
        assert_eq!(habitat("Cerulean Cave"), ROUTE_GRASS);
        assert_eq!(habitat("  viridian FOREST "), VIRIDIAN_FOREST);
    }

    #[test]
    fn streaks_raise_encounter_chance_up_to_cap() {
        let first = encounter_chance(&request("Viridian Forest", "Pikachu", 1));
        let fourth = encounter_chance(&request("Viridian Forest", "Pikachu", 4));
        let hundredth = encounter_chance(&request("Viridian Forest", "Pikachu", 100));
        assert!(first < fourth);
        assert_eq!(hundredth, MAX_ENCOUNTER_CHANCE);
    }

    #[test]
    fn native_partner_doubles_shiny_chance() {
        let native = shiny_chance(&request("Viridian Forest", "pikachu", 0));
        let visitor = shiny_chance(&request("Viridian Forest", "Bulbasaur", 0));
        assert!((native - 2.0 * visitor).abs() < f64::EPSILON);
        assert!((visitor - 1.0 / 64.0).abs() < f64::EPSILON);
    }

    #[test]
    fn shiny_odds_bottom_out() {
        let chance = shiny_chance(&request("Route 1", "Eevee", 1_000));
        assert!((chance - 1.0 / MIN_SHINY_ODDS as f64).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn generate_never_fails() {
        let generator = LocalGenerator::seeded(1);
        let verdict = generator.generate(&request("Route 1", "Eevee", 2)).await;
        assert!(verdict.is_ok());
    }
}
