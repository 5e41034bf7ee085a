use crate::fitness::FitnessError;
use crate::genomics::GenomicsError;
use crate::interfaces::BoxError;
use crate::populations::{PopulationError, SpeciationError};

use thiserror::Error;

/// Errors aborting an evolutionary run.
#[derive(Debug, Error)]
pub enum EvolverError {
    #[error(transparent)]
    Genomics(#[from] GenomicsError),
    #[error(transparent)]
    Speciation(#[from] SpeciationError),
    #[error(transparent)]
    Population(#[from] PopulationError),
    #[error(transparent)]
    Fitness(#[from] FitnessError),
    #[error("phenotype construction failed: {0}")]
    Phenotype(#[source] BoxError),
    #[error("fitness evaluation failed: {0}")]
    Evaluation(#[source] BoxError),
    #[error("persistence failed: {0}")]
    Persistence(#[source] BoxError),
    #[error("fitness function returned {actual} scores for {expected} organisms")]
    ScoreCountMismatch { expected: usize, actual: usize },
    #[error("the population is empty")]
    EmptyPopulation,
    #[error("evolution has already terminated")]
    Terminated,
}
