use crate::fitness::FitnessScores;
use crate::genomics::{Organism, OrganismId};
use crate::populations::{PopulationError, Specie};

use log::debug;
use serde::{Deserialize, Serialize};

use std::fmt;

/// A strategy for choosing which organisms
/// survive into the next generation.
pub trait Selector: fmt::Debug {
    /// Returns the ids of the surviving organisms.
    fn select_survivors(
        &self,
        species: &[Specie],
        organisms: &[Organism],
        fitness: &FitnessScores,
        generation: u64,
    ) -> Result<Vec<OrganismId>, PopulationError>;
}

/// Per-specie truncation selection.
///
/// Species stagnant for `stagnation_limit` generations or more are
/// dropped entirely, unless they hold the population's champion.
/// Every other specie keeps its fittest members: the top
/// `survival_rate` fraction (rounded up), and never fewer than
/// `elitism` members while it has them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NaturalSelection {
    pub survival_rate: f64,
    pub elitism: usize,
    pub stagnation_limit: Option<usize>,
}

impl Default for NaturalSelection {
    fn default() -> NaturalSelection {
        NaturalSelection {
            survival_rate: 0.2,
            elitism: 1,
            stagnation_limit: Some(15),
        }
    }
}

impl NaturalSelection {
    fn survivor_count(&self, members: usize) -> usize {
        let by_rate = (members as f64 * self.survival_rate.clamp(0.0, 1.0)).ceil() as usize;
        by_rate.max(self.elitism).min(members)
    }
}

impl Selector for NaturalSelection {
    fn select_survivors(
        &self,
        species: &[Specie],
        organisms: &[Organism],
        fitness: &FitnessScores,
        generation: u64,
    ) -> Result<Vec<OrganismId>, PopulationError> {
        let mut champion: Option<(&Organism, f64)> = None;
        for organism in organisms {
            let score = fitness.peek_fitness(organism.id())?;
            if champion.map_or(true, |(_, best)| score > best) {
                champion = Some((organism, score));
            }
        }
        let champion_specie = champion.and_then(|(organism, _)| organism.specie());

        let mut survivors = vec![];
        for specie in species {
            if let Some(limit) = self.stagnation_limit {
                if specie.time_stagnated() >= limit && champion_specie != Some(specie.id()) {
                    debug!(
                        "generation {}: dropping specie {} after {} stagnant generations",
                        generation,
                        specie.id(),
                        specie.time_stagnated()
                    );
                    continue;
                }
            }
            let mut ranked = Vec::with_capacity(specie.len());
            for &member in specie.members() {
                ranked.push((member, fitness.peek_fitness(member)?));
            }
            // Stable: equally fit members keep their order.
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            let kept = self.survivor_count(ranked.len());
            survivors.extend(ranked[..kept].iter().map(|(id, _)| *id));
        }
        Ok(survivors)
    }
}
