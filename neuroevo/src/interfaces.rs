//! Extension points through which problem-specific
//! collaborators plug into the evolutionary cycle.

use crate::fitness::FitnessScores;
use crate::genomics::{Innovations, Organism};
use crate::populations::{Generation, PopulationConfig, Specie};

use std::error::Error;

/// Boxed error returned by user-supplied collaborators.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Builds the runnable phenotype of an organism.
pub trait PhenotypeBuilder {
    /// The phenotype type produced.
    type Network;

    fn build_network(&self, organism: &Organism) -> Result<Self::Network, BoxError>;
}

/// Scores organisms through their phenotypes.
pub trait FitnessFunction<N> {
    /// Evaluates a batch of organisms, returning one score per
    /// subject in the same order. Scores may be any number
    /// other than NaN; greater is fitter.
    fn evaluate(&mut self, subjects: &[(&Organism, N)]) -> Result<Vec<f64>, BoxError>;
}

/// Durable storage for a run, consulted when an evolver is
/// created and written to at the end of every generation.
pub trait Persistence {
    fn load_innovations(&mut self) -> Result<Innovations, BoxError>;

    /// Loads the generation numbered `number`, whose
    /// genes are all present in `innovations`.
    fn load_generation(&mut self, number: u64, innovations: &Innovations)
        -> Result<Generation, BoxError>;

    fn load_fitness_scores(&mut self) -> Result<FitnessScores, BoxError>;

    /// Records a completed generation along with
    /// the registry and fitness scores at that point.
    fn add_generation(
        &mut self,
        innovations: &Innovations,
        generation: &Generation,
        fitness: &FitnessScores,
    ) -> Result<(), BoxError>;

    /// Number of generations recorded so far.
    fn generation_count(&self) -> Result<u64, BoxError>;
}

/// Decides when a run is over. Consulted before every cycle.
pub trait TerminationCondition {
    fn exit_criteria_met(
        &self,
        config: &PopulationConfig,
        generation_number: u64,
        generation: &Generation,
        fitness: &FitnessScores,
    ) -> bool;
}

/// Events published to [`GenerationListener`]s during a cycle.
#[derive(Clone, Copy, Debug)]
pub enum EvolutionEvent<'a> {
    StartGeneration {
        number: u64,
    },
    /// Published once the new generation is evaluated and speciated.
    EndGeneration {
        number: u64,
        species: &'a [Specie],
        organisms: &'a [Organism],
        fitness: &'a FitnessScores,
    },
}

impl EvolutionEvent<'_> {
    pub fn generation_number(&self) -> u64 {
        match self {
            EvolutionEvent::StartGeneration { number }
            | EvolutionEvent::EndGeneration { number, .. } => *number,
        }
    }
}

/// Observer of the evolutionary cycle.
pub trait GenerationListener {
    fn on_event(&mut self, event: &EvolutionEvent<'_>);
}
