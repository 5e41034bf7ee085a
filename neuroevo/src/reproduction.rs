//! Operators producing offspring from surviving parents.

mod clone;
mod crossover;

pub use clone::*;
pub use crossover::*;

use crate::fitness::FitnessScores;
use crate::genomics::{IdAllocator, Organism};
use crate::populations::PopulationError;

use rand::RngCore;

use std::fmt;

/// Shared state available to reproduction operators.
pub struct ReproductionContext<'a> {
    /// Fitness of the parents, as evaluated last generation.
    pub fitness: &'a FitnessScores,
    /// Source of offspring ids.
    pub ids: &'a mut IdAllocator,
    pub rng: &'a mut dyn RngCore,
}

/// A way of producing offspring from the survivors of one specie.
///
/// Each operator receives a `slice` of every generation's offspring
/// deficit, proportional to its slice among all configured operators.
pub trait ReproductionOperator: fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Relative share of offspring produced by this operator.
    fn slice(&self) -> f64;

    /// Produces `count` offspring from `parents`, all
    /// members of the same specie.
    ///
    /// Offspring have fresh ids, no specie, and an ancestry
    /// listing the parents they were derived from.
    fn reproduce(
        &self,
        parents: &[&Organism],
        count: usize,
        ctx: &mut ReproductionContext<'_>,
    ) -> Result<Vec<Organism>, PopulationError>;
}

/// The stock reproduction operators: crossover for
/// most offspring, and cloning for the rest.
pub fn default_operators() -> Vec<Box<dyn ReproductionOperator>> {
    vec![
        Box::new(CrossoverReproduction::default()),
        Box::new(CloneReproduction::default()),
    ]
}
