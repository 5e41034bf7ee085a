//! Bounded store of organism fitness scores.

use crate::genomics::OrganismId;

use ahash::RandomState;
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::collections::{BTreeMap, HashMap};

/// Errors raised when recording or looking up fitness scores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FitnessError {
    /// The organism has no recorded score, either because it was
    /// never evaluated or because its score was evicted.
    #[error("no fitness recorded for organism {0}")]
    Unscored(OrganismId),
    #[error("fitness of organism {0} is not a number")]
    NotANumber(OrganismId),
}

/// Fitness scores keyed by organism id, bounded to a fixed capacity.
///
/// Recording or reading a score marks it as most recently used.
/// When the store grows past its capacity, the least recently
/// used scores are evicted.
///
/// # Examples
/// ```
/// use neuroevo::{FitnessScores, OrganismId};
///
/// let mut scores = FitnessScores::new(2);
/// scores.set_fitness(OrganismId(1), 1.0).unwrap();
/// scores.set_fitness(OrganismId(2), 2.0).unwrap();
///
/// // Reading #1 makes #2 the eviction candidate.
/// assert_eq!(scores.get_fitness(OrganismId(1)), Ok(1.0));
/// scores.set_fitness(OrganismId(3), 3.0).unwrap();
///
/// assert!(scores.contains(OrganismId(1)));
/// assert!(!scores.contains(OrganismId(2)));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "ScoresRecord", into = "ScoresRecord")]
pub struct FitnessScores {
    capacity: usize,
    clock: u64,
    scores: HashMap<OrganismId, (f64, u64), RandomState>,
    recency: BTreeMap<u64, OrganismId>,
}

impl FitnessScores {
    /// Returns an empty store holding at most `capacity` scores.
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> FitnessScores {
        FitnessScores {
            capacity: capacity.max(1),
            clock: 0,
            scores: HashMap::default(),
            recency: BTreeMap::new(),
        }
    }

    /// Returns a store large enough to hold the scores
    /// of `generations` generations of `population_size`.
    pub fn for_generations(population_size: usize, generations: usize) -> FitnessScores {
        Self::new(population_size.saturating_mul(generations))
    }

    /// Records the fitness of `organism`, replacing any previous
    /// score, and evicts the least recently used scores if the
    /// store is over capacity.
    ///
    /// # Errors
    ///
    /// Returns [`NotANumber`] if `fitness` is NaN.
    ///
    /// [`NotANumber`]: FitnessError::NotANumber
    pub fn set_fitness(&mut self, organism: OrganismId, fitness: f64) -> Result<(), FitnessError> {
        if fitness.is_nan() {
            return Err(FitnessError::NotANumber(organism));
        }
        let tick = self.tick();
        if let Some((_, previous)) = self.scores.insert(organism, (fitness, tick)) {
            self.recency.remove(&previous);
        }
        self.recency.insert(tick, organism);
        while self.scores.len() > self.capacity {
            let Some((_, evicted)) = self.recency.pop_first() else {
                break;
            };
            trace!("evicting fitness of organism {}", evicted);
            self.scores.remove(&evicted);
        }
        Ok(())
    }

    /// Returns the fitness of `organism`, marking it as recently used.
    pub fn get_fitness(&mut self, organism: OrganismId) -> Result<f64, FitnessError> {
        let tick = self.tick();
        let (fitness, used) = self
            .scores
            .get_mut(&organism)
            .ok_or(FitnessError::Unscored(organism))?;
        let previous = std::mem::replace(used, tick);
        let fitness = *fitness;
        self.recency.remove(&previous);
        self.recency.insert(tick, organism);
        Ok(fitness)
    }

    /// Returns the fitness of `organism` without affecting eviction order.
    pub fn peek_fitness(&self, organism: OrganismId) -> Result<f64, FitnessError> {
        self.scores
            .get(&organism)
            .map(|(fitness, _)| *fitness)
            .ok_or(FitnessError::Unscored(organism))
    }

    pub fn contains(&self, organism: OrganismId) -> bool {
        self.scores.contains_key(&organism)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterates over recorded scores, least recently used first.
    pub fn iter(&self) -> impl Iterator<Item = (OrganismId, f64)> + '_ {
        self.recency
            .values()
            .filter_map(move |id| self.scores.get(id).map(|(fitness, _)| (*id, *fitness)))
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ScoresRecord {
    capacity: usize,
    scores: Vec<(OrganismId, f64)>,
}

impl From<FitnessScores> for ScoresRecord {
    fn from(scores: FitnessScores) -> ScoresRecord {
        ScoresRecord {
            capacity: scores.capacity,
            scores: scores.iter().collect(),
        }
    }
}

impl TryFrom<ScoresRecord> for FitnessScores {
    type Error = FitnessError;

    fn try_from(record: ScoresRecord) -> Result<FitnessScores, FitnessError> {
        let mut scores = FitnessScores::new(record.capacity);
        for (organism, fitness) in record.scores {
            scores.set_fitness(organism, fitness)?;
        }
        Ok(scores)
    }
}
