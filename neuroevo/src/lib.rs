//! A generational implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Organisms are neural network genotypes made of neuron and connection genes,
//! each tagged with a globally unique innovation id. Structural mutations are
//! recorded in a shared [`Innovations`] registry, so that identical changes
//! made independently by different organisms receive the same ids and remain
//! comparable during speciation and crossover.
//!
//! Every step of the evolutionary cycle is pluggable: mutation and
//! reproduction operators, survivor selection, speciation, phenotype
//! construction, fitness evaluation, persistence and termination are all
//! supplied to the [`Evolver`] as trait objects, with stock implementations
//! provided for everything except the problem-specific parts.
//!
//! # Example usage: growing networks towards a connection count
//! ```
//! use neuroevo::{
//!     BoxError, Evolver, EvolverConfig, FitnessFunction, GenerationLimit,
//!     GeneticConfig, Organism, PhenotypeBuilder, PopulationConfig,
//! };
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::num::NonZeroUsize;
//!
//! // The "network" is just the count of enabled connections.
//! struct ConnectionCounter;
//!
//! impl PhenotypeBuilder for ConnectionCounter {
//!     type Network = usize;
//!
//!     fn build_network(&self, organism: &Organism) -> Result<usize, BoxError> {
//!         Ok(organism.connections().filter(|c| c.enabled()).count())
//!     }
//! }
//!
//! struct PreferLarger;
//!
//! impl FitnessFunction<usize> for PreferLarger {
//!     fn evaluate(&mut self, subjects: &[(&Organism, usize)]) -> Result<Vec<f64>, BoxError> {
//!         Ok(subjects.iter().map(|(_, count)| *count as f64).collect())
//!     }
//! }
//!
//! let config = EvolverConfig {
//!     termination: Box::new(GenerationLimit(5)),
//!     ..EvolverConfig::new(
//!         PopulationConfig {
//!             size: NonZeroUsize::new(20).unwrap(),
//!             ..PopulationConfig::default()
//!         },
//!         GeneticConfig {
//!             input_count: NonZeroUsize::new(2).unwrap(),
//!             output_count: NonZeroUsize::new(1).unwrap(),
//!             ..GeneticConfig::default()
//!         },
//!         Box::new(ChaCha8Rng::seed_from_u64(7)),
//!         Box::new(PreferLarger),
//!         Box::new(ConnectionCounter),
//!     )
//! };
//!
//! let mut evolver = Evolver::new(config).unwrap();
//! let champion = evolver.run().unwrap();
//! assert_eq!(evolver.generation().number(), 5);
//! assert!(champion.connection_count() >= 2);
//! ```

pub mod evolver;
pub mod fitness;
pub mod genomics;
pub mod interfaces;
pub mod mutations;
pub mod persistence;
pub mod populations;
pub mod reproduction;
mod rng;

pub use evolver::*;
pub use fitness::{FitnessError, FitnessScores};
pub use genomics::*;
pub use interfaces::*;
pub use persistence::InMemoryPersistence;
pub use populations::*;

/// Globally unique identifier of a gene.
///
/// Innovation ids are allocated by an [`IdAllocator`], which also
/// hands out the numeric part of organism and specie ids, so no two
/// entities of a run ever share a number.
pub type Innovation = u64;
