//! Generations of organisms, grouped into species,
//! and the selection, speciation and offspring
//! allotment strategies that move them forward.
mod config;
mod errors;
mod logging;
mod offspring_factory;
mod selection;
mod speciation;
mod species;

pub use config::PopulationConfig;
pub use errors::*;
pub use logging::*;
pub(crate) use offspring_factory::OffspringFactory;
pub use selection::*;
pub use speciation::*;
pub use species::{Specie, SpecieId};

use crate::fitness::FitnessScores;
use crate::genomics::{Gene, Organism, OrganismId};
use crate::Innovation;

use serde::{Deserialize, Serialize};

/// An immutable snapshot of the population at the end of a cycle:
/// its species, its organisms in arrival order, and the last id
/// issued when it was taken.
///
/// Deserialized generations go through [`Generation::new`],
/// so stored state with disagreeing memberships is rejected.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "GenerationRecord", into = "GenerationRecord")]
pub struct Generation {
    number: u64,
    species: Vec<Specie>,
    organisms: Vec<Organism>,
    last_innovation: Innovation,
}

impl Generation {
    /// Assembles a generation, checking that every organism and
    /// the specie it points to agree on membership.
    pub fn new(
        number: u64,
        species: Vec<Specie>,
        organisms: Vec<Organism>,
        last_innovation: Innovation,
    ) -> Result<Generation, PopulationError> {
        let generation = Generation {
            number,
            species,
            organisms,
            last_innovation,
        };
        generation.check_membership()?;
        Ok(generation)
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn species(&self) -> &[Specie] {
        &self.species
    }

    pub fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    /// The last id issued by the run when the generation
    /// was recorded; resumed runs continue after it.
    pub fn last_innovation(&self) -> Innovation {
        self.last_innovation
    }

    pub fn organism(&self, id: OrganismId) -> Option<&Organism> {
        self.organisms.iter().find(|o| o.id() == id)
    }

    pub fn specie(&self, id: SpecieId) -> Option<&Specie> {
        self.species.iter().find(|s| s.id() == id)
    }

    /// Returns the fittest organism, the earliest on ties.
    pub fn champion(&self, fitness: &FitnessScores) -> Result<Option<&Organism>, PopulationError> {
        let mut champion: Option<(&Organism, f64)> = None;
        for organism in &self.organisms {
            let score = fitness.peek_fitness(organism.id())?;
            if champion.map_or(true, |(_, best)| score > best) {
                champion = Some((organism, score));
            }
        }
        Ok(champion.map(|(organism, _)| organism))
    }

    /// Copies of every gene of every organism.
    pub fn genes(&self) -> impl Iterator<Item = Gene> + '_ {
        self.organisms.iter().flat_map(Organism::genes)
    }

    pub(crate) fn into_parts(self) -> (Vec<Specie>, Vec<Organism>) {
        (self.species, self.organisms)
    }

    fn check_membership(&self) -> Result<(), PopulationError> {
        for organism in &self.organisms {
            if let Some(specie) = organism.specie() {
                if !self.specie(specie).map_or(false, |s| s.contains(organism.id())) {
                    return Err(PopulationError::InconsistentMembership {
                        organism: organism.id(),
                        specie,
                    });
                }
            }
        }
        for specie in &self.species {
            for &member in specie.members() {
                if self.organism(member).and_then(Organism::specie) != Some(specie.id()) {
                    return Err(PopulationError::InconsistentMembership {
                        organism: member,
                        specie: specie.id(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GenerationRecord {
    number: u64,
    species: Vec<Specie>,
    organisms: Vec<Organism>,
    last_innovation: Innovation,
}

impl From<Generation> for GenerationRecord {
    fn from(generation: Generation) -> GenerationRecord {
        GenerationRecord {
            number: generation.number,
            species: generation.species,
            organisms: generation.organisms,
            last_innovation: generation.last_innovation,
        }
    }
}

impl TryFrom<GenerationRecord> for Generation {
    type Error = PopulationError;

    fn try_from(record: GenerationRecord) -> Result<Generation, PopulationError> {
        Generation::new(
            record.number,
            record.species,
            record.organisms,
            record.last_innovation,
        )
    }
}
