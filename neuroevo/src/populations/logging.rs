use crate::fitness::FitnessScores;
use crate::genomics::{Organism, OrganismId};
use crate::interfaces::{EvolutionEvent, GenerationListener};
use crate::populations::{PopulationError, Specie, SpecieId};

use log::warn;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Clones the entire generation.
    AllOrganisms,
    /// Clones species champions.
    SpecieChampions,
    /// Clones only the generation champion.
    PopulationChampion,
    /// Clones no organisms.
    NoOrganisms,
}

/// A snapshot of a generation.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: u64,
    pub generation_sample: GenerationMemberRecord,
    pub species_count: usize,
    pub organism_stats: Vec<(String, Stats)>,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {}", self.species_count)?;
        for (name, stats) in &self.organism_stats {
            writeln!(f, "\t{}: {}", name, stats)?;
        }
        write!(f, "}}")
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// An empty sequence yields all zeroes.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::Stats;
    ///
    /// let stats = Stats::of([-2.0, -1.0, 0.5, 1.0, 1.5]);
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn of(data: impl IntoIterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.into_iter().collect();
        if data.is_empty() {
            return Stats {
                maximum: 0.0,
                minimum: 0.0,
                mean: 0.0,
                median: 0.0,
            };
        }
        data.sort_by(f64::total_cmp);
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f64>() / data.len() as f64,
            median,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "max {:.3}, min {:.3}, mean {:.3}, median {:.3}",
            self.maximum, self.minimum, self.mean, self.median
        )
    }
}

/// A reporting-level dependant store
/// of organisms from a generation.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Specie ids, members and stagnation level.
    Species(Vec<(SpecieId, Vec<Organism>, usize)>),
    /// Only specie ids, specie champions, and stagnation level.
    SpecieChampions(Vec<(SpecieId, Organism, usize)>),
    /// Only the generation champion.
    PopulationChampion(Organism),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
///
/// The logger is a [`GenerationListener`], recording a
/// snapshot at the end of every generation it is notified of.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Stores a snapshot of a generation, with fitness,
    /// neuron count and connection count statistics.
    pub fn log(
        &mut self,
        generation_number: u64,
        species: &[Specie],
        organisms: &[Organism],
        fitness: &FitnessScores,
    ) -> Result<(), PopulationError> {
        let mut scores = Vec::with_capacity(organisms.len());
        for organism in organisms {
            scores.push(fitness.peek_fitness(organism.id())?);
        }
        let organism_stats = vec![
            ("fitness".to_string(), Stats::of(scores.iter().copied())),
            (
                "neurons".to_string(),
                Stats::of(organisms.iter().map(|o| o.neuron_count() as f64)),
            ),
            (
                "connections".to_string(),
                Stats::of(organisms.iter().map(|o| o.connection_count() as f64)),
            ),
        ];
        let find = |id: OrganismId| organisms.iter().find(|o| o.id() == id).cloned();
        let generation_sample = match self.reporting_level {
            ReportingLevel::AllOrganisms => GenerationMemberRecord::Species(
                species
                    .iter()
                    .map(|s| {
                        let members = s.members().iter().filter_map(|&id| find(id)).collect();
                        (s.id(), members, s.time_stagnated())
                    })
                    .collect(),
            ),
            ReportingLevel::SpecieChampions => {
                let mut champions = vec![];
                for specie in species {
                    if let Some(champion) = specie.champion(fitness)?.and_then(find) {
                        champions.push((specie.id(), champion, specie.time_stagnated()));
                    }
                }
                GenerationMemberRecord::SpecieChampions(champions)
            }
            ReportingLevel::PopulationChampion => {
                let mut champion: Option<(usize, f64)> = None;
                for (i, score) in scores.iter().enumerate() {
                    if champion.map_or(true, |(_, best)| *score > best) {
                        champion = Some((i, *score));
                    }
                }
                match champion {
                    Some((i, _)) => GenerationMemberRecord::PopulationChampion(organisms[i].clone()),
                    None => GenerationMemberRecord::None,
                }
            }
            ReportingLevel::NoOrganisms => GenerationMemberRecord::None,
        };
        self.logs.push(Log {
            generation_number,
            generation_sample,
            species_count: species.len(),
            organism_stats,
        });
        Ok(())
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }

    /// The most recent snapshot.
    pub fn last(&self) -> Option<&Log> {
        self.logs.last()
    }
}

impl GenerationListener for EvolutionLogger {
    fn on_event(&mut self, event: &EvolutionEvent<'_>) {
        if let EvolutionEvent::EndGeneration {
            number,
            species,
            organisms,
            fitness,
        } = event
        {
            if let Err(e) = self.log(*number, species, organisms, fitness) {
                warn!("could not log generation {}: {}", number, e);
            }
        }
    }
}
