use crate::fitness::FitnessError;
use crate::genomics::OrganismId;
use crate::populations::SpecieId;

use thiserror::Error;

/// Errors arising from survivor selection,
/// specie bookkeeping and reproduction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopulationError {
    #[error("specie {0} has no members to take a representative from")]
    EmptySpecie(SpecieId),
    #[error("no surviving organisms are available as parents")]
    NoParents,
    #[error("no reproduction operator has a positive slice")]
    NoReproductionOperators,
    #[error("reproduction stalled with {produced} of {required} offspring produced")]
    ReproductionStalled { produced: usize, required: usize },
    #[error("organism {organism} and specie {specie} disagree on membership")]
    InconsistentMembership {
        organism: OrganismId,
        specie: SpecieId,
    },
    #[error(transparent)]
    Fitness(#[from] FitnessError),
}
