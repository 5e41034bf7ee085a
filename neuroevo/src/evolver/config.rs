use crate::evolver::GenerationLimit;
use crate::genomics::{GeneticConfig, IdAllocator};
use crate::interfaces::{
    FitnessFunction, GenerationListener, Persistence, PhenotypeBuilder, TerminationCondition,
};
use crate::mutations::{self, MutationOperator};
use crate::persistence::InMemoryPersistence;
use crate::populations::{
    CompatibilitySpeciator, NaturalSelection, PopulationConfig, ReportingLevel, Selector, Speciator,
};
use crate::reproduction::{self, ReproductionOperator};

use rand::RngCore;

/// Everything an [`Evolver`] is built from.
///
/// [`EvolverConfig::new`] fills in the stock collaborators, which
/// can then be replaced individually with struct update syntax.
///
/// [`Evolver`]: crate::Evolver
pub struct EvolverConfig<N> {
    pub population: PopulationConfig,
    pub genetics: GeneticConfig,
    /// The run's only source of randomness.
    pub rng: Box<dyn RngCore>,
    /// Applied to every offspring, in order.
    pub mutation_operators: Vec<Box<dyn MutationOperator>>,
    pub reproduction_operators: Vec<Box<dyn ReproductionOperator>>,
    pub selector: Box<dyn Selector>,
    pub speciator: Box<dyn Speciator>,
    pub fitness_function: Box<dyn FitnessFunction<N>>,
    pub phenotype_builder: Box<dyn PhenotypeBuilder<Network = N>>,
    pub persistence: Box<dyn Persistence>,
    pub termination: Box<dyn TerminationCondition>,
    /// Issues ids for fresh runs; resumed runs continue after
    /// the last id recorded by persistence.
    pub ids: IdAllocator,
    pub listeners: Vec<Box<dyn GenerationListener>>,
    /// When set, the evolver keeps an [`EvolutionLogger`]
    /// at this level.
    ///
    /// [`EvolutionLogger`]: crate::EvolutionLogger
    pub reporting_level: Option<ReportingLevel>,
}

impl<N> EvolverConfig<N> {
    /// Returns a configuration using the stock mutation and
    /// reproduction operators, [`NaturalSelection`],
    /// a [`CompatibilitySpeciator`], [`InMemoryPersistence`]
    /// and a limit of 100 generations.
    pub fn new(
        population: PopulationConfig,
        genetics: GeneticConfig,
        rng: Box<dyn RngCore>,
        fitness_function: Box<dyn FitnessFunction<N>>,
        phenotype_builder: Box<dyn PhenotypeBuilder<Network = N>>,
    ) -> EvolverConfig<N> {
        EvolverConfig {
            population,
            genetics,
            rng,
            mutation_operators: mutations::default_operators(),
            reproduction_operators: reproduction::default_operators(),
            selector: Box::new(NaturalSelection::default()),
            speciator: Box::new(CompatibilitySpeciator::default()),
            fitness_function,
            phenotype_builder,
            persistence: Box::new(InMemoryPersistence::new()),
            termination: Box::new(GenerationLimit(100)),
            ids: IdAllocator::new(),
            listeners: vec![],
            reporting_level: None,
        }
    }
}
