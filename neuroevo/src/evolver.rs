//! The generational evolution loop.

mod config;
mod errors;
mod termination;

pub use config::*;
pub use errors::*;
pub use termination::*;

use crate::fitness::FitnessScores;
use crate::genomics::{Gene, GeneticConfig, IdAllocator, Innovations, NeuronGene, Organism, OrganismId};
use crate::interfaces::{
    EvolutionEvent, FitnessFunction, GenerationListener, Persistence, PhenotypeBuilder,
    TerminationCondition,
};
use crate::mutations::{apply_mutations, MutationContext, MutationOperator};
use crate::populations::{
    EvolutionLogger, Generation, OffspringFactory, PopulationConfig, Selector, Specie, Speciator,
    Stats,
};
use crate::reproduction::{ReproductionContext, ReproductionOperator};

use ahash::RandomState;
use log::{debug, info};
use rand::RngCore;

use std::collections::HashSet;

/// Lifecycle of an [`Evolver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvolverState {
    /// Generation 0 exists, either freshly seeded or resumed
    /// from persistence, and no cycle has run yet.
    Seeded,
    Running,
    /// The termination condition was met, or a cycle failed.
    Terminated,
}

/// Drives a population through generations of evaluation,
/// selection, reproduction, mutation and speciation.
///
/// A cycle consists of:
/// 1. Publishing the start of the generation and aging every specie.
/// 2. Selecting survivors and culling everything else from the species.
/// 3. Producing offspring to refill the population.
/// 4. Mutating the offspring, never the survivors.
/// 5. Evaluating every organism's fitness through its phenotype.
/// 6. Respeciating the whole population and updating stagnation.
/// 7. Publishing the end of the generation.
/// 8. Registering the new generation's genes and persisting it.
///
/// All randomness comes from the configured generator, so runs
/// with the same seed and collaborators are reproducible.
pub struct Evolver<N> {
    population_config: PopulationConfig,
    rng: Box<dyn RngCore>,
    mutation_operators: Vec<Box<dyn MutationOperator>>,
    reproduction_operators: Vec<Box<dyn ReproductionOperator>>,
    selector: Box<dyn Selector>,
    speciator: Box<dyn Speciator>,
    fitness_function: Box<dyn FitnessFunction<N>>,
    phenotype_builder: Box<dyn PhenotypeBuilder<Network = N>>,
    persistence: Box<dyn Persistence>,
    termination: Box<dyn TerminationCondition>,
    listeners: Vec<Box<dyn GenerationListener>>,
    logger: Option<EvolutionLogger>,
    ids: IdAllocator,
    innovations: Innovations,
    fitness: FitnessScores,
    generation: Generation,
    state: EvolverState,
}

impl<N> Evolver<N> {
    /// Creates an evolver, resuming from the configured persistence
    /// if it holds any generation, and seeding a fully connected,
    /// evaluated and speciated generation 0 otherwise.
    ///
    /// Speciator state is not persisted: a resumed run starts from
    /// the configured speciator's threshold, even if the stored run
    /// had adjusted its own.
    pub fn new(config: EvolverConfig<N>) -> Result<Evolver<N>, EvolverError> {
        let EvolverConfig {
            population,
            genetics,
            rng,
            mutation_operators,
            reproduction_operators,
            selector,
            speciator,
            fitness_function,
            phenotype_builder,
            persistence,
            termination,
            ids,
            listeners,
            reporting_level,
        } = config;
        let fitness = FitnessScores::for_generations(
            population.size.get(),
            population.fitness_generations.get(),
        );
        let mut evolver = Evolver {
            population_config: population,
            rng,
            mutation_operators,
            reproduction_operators,
            selector,
            speciator,
            fitness_function,
            phenotype_builder,
            persistence,
            termination,
            listeners,
            logger: reporting_level.map(EvolutionLogger::new),
            ids,
            innovations: Innovations::new(),
            fitness,
            generation: Generation::new(0, vec![], vec![], 0)?,
            state: EvolverState::Seeded,
        };

        let stored = evolver
            .persistence
            .generation_count()
            .map_err(EvolverError::Persistence)?;
        if stored > 0 {
            evolver.resume(stored - 1)?;
        } else {
            evolver.seed(&genetics)?;
        }
        Ok(evolver)
    }

    fn resume(&mut self, last: u64) -> Result<(), EvolverError> {
        self.innovations = self
            .persistence
            .load_innovations()
            .map_err(EvolverError::Persistence)?;
        self.generation = self
            .persistence
            .load_generation(last, &self.innovations)
            .map_err(EvolverError::Persistence)?;
        self.fitness = self
            .persistence
            .load_fitness_scores()
            .map_err(EvolverError::Persistence)?;
        for organism in self.generation.organisms() {
            self.fitness.peek_fitness(organism.id())?;
        }
        self.ids.observe(self.generation.last_innovation());
        self.ids.observe(self.innovations.max_innovation());
        info!(
            "resumed at generation {} with {} organisms in {} species",
            self.generation.number(),
            self.generation.organisms().len(),
            self.generation.species().len()
        );
        Ok(())
    }

    fn seed(&mut self, genetics: &GeneticConfig) -> Result<(), EvolverError> {
        let response = genetics.activation_response;
        let inputs: Vec<NeuronGene> = (0..genetics.input_count.get())
            .map(|_| NeuronGene::input(self.ids.next_id(), response))
            .collect();
        let outputs: Vec<NeuronGene> = (0..genetics.output_count.get())
            .map(|_| NeuronGene::output(self.ids.next_id(), response))
            .collect();
        self.innovations
            .register_all(inputs.iter().chain(&outputs).cloned().map(Gene::Neuron))?;

        let mut organisms = Vec::with_capacity(self.population_config.size.get());
        for _ in 0..self.population_config.size.get() {
            organisms.push(Organism::fully_connected(
                OrganismId(self.ids.next_id()),
                &inputs,
                &outputs,
                &mut self.innovations,
                &mut self.ids,
                genetics.weight_bound,
                self.rng.as_mut(),
            )?);
        }
        self.evaluate(&organisms)?;
        let mut species = vec![];
        self.speciator
            .speciate(&mut species, &mut organisms, &mut self.ids)?;
        for specie in species.iter_mut() {
            specie.update_stagnation(&self.fitness)?;
        }
        info!(
            "seeded generation 0 with {} organisms in {} species",
            organisms.len(),
            species.len()
        );
        self.conclude(0, species, organisms)
    }

    /// Runs a single generation cycle, returning the new generation.
    ///
    /// # Errors
    ///
    /// Any failure aborts the cycle and terminates the evolver;
    /// the previous generation is kept. Stepping a terminated
    /// evolver returns [`EvolverError::Terminated`].
    pub fn step(&mut self) -> Result<&Generation, EvolverError> {
        if self.state == EvolverState::Terminated {
            return Err(EvolverError::Terminated);
        }
        self.state = EvolverState::Running;
        if let Err(e) = self.cycle() {
            self.state = EvolverState::Terminated;
            return Err(e);
        }
        Ok(&self.generation)
    }

    /// Steps until the termination condition is met,
    /// and returns the final generation's champion.
    pub fn run(&mut self) -> Result<Organism, EvolverError> {
        while self.state != EvolverState::Terminated {
            if self.termination.exit_criteria_met(
                &self.population_config,
                self.generation.number(),
                &self.generation,
                &self.fitness,
            ) {
                info!("terminating after generation {}", self.generation.number());
                self.state = EvolverState::Terminated;
            } else {
                self.step()?;
            }
        }
        self.champion()?
            .cloned()
            .ok_or(EvolverError::EmptyPopulation)
    }

    fn cycle(&mut self) -> Result<(), EvolverError> {
        let number = self.generation.number() + 1;
        let (mut species, mut organisms) = self.generation.clone().into_parts();
        for specie in species.iter_mut() {
            specie.start_generation();
        }
        self.publish(&EvolutionEvent::StartGeneration { number });

        let survivors: HashSet<OrganismId, RandomState> = self
            .selector
            .select_survivors(&species, &organisms, &self.fitness, number)?
            .into_iter()
            .collect();
        for specie in species.iter_mut() {
            specie.cull(&survivors, &mut organisms)?;
        }
        species.retain(|s| !s.is_dead());
        organisms.retain(|o| survivors.contains(&o.id()));
        debug!(
            "generation {}: {} survivors in {} species",
            number,
            organisms.len(),
            species.len()
        );

        let required = self
            .population_config
            .size
            .get()
            .saturating_sub(organisms.len());
        let mut offspring = OffspringFactory::new(&self.reproduction_operators, &self.population_config)
            .fill(
                &species,
                &organisms,
                required,
                &mut ReproductionContext {
                    fitness: &self.fitness,
                    ids: &mut self.ids,
                    rng: self.rng.as_mut(),
                },
            )?;
        let mut ctx = MutationContext {
            innovations: &mut self.innovations,
            ids: &mut self.ids,
            rng: self.rng.as_mut(),
        };
        let mut mutations = 0;
        for child in offspring.iter_mut() {
            mutations += apply_mutations(&self.mutation_operators, child, &mut ctx)?;
        }
        debug!(
            "generation {}: {} offspring with {} mutations",
            number,
            offspring.len(),
            mutations
        );
        organisms.append(&mut offspring);

        self.evaluate(&organisms)?;
        self.speciator
            .speciate(&mut species, &mut organisms, &mut self.ids)?;
        for specie in species.iter_mut() {
            specie.update_stagnation(&self.fitness)?;
        }
        self.conclude(number, species, organisms)
    }

    /// Publishes the end of generation `number`, then
    /// records and persists it as the current generation.
    fn conclude(
        &mut self,
        number: u64,
        species: Vec<Specie>,
        organisms: Vec<Organism>,
    ) -> Result<(), EvolverError> {
        let event = EvolutionEvent::EndGeneration {
            number,
            species: &species,
            organisms: &organisms,
            fitness: &self.fitness,
        };
        if let Some(logger) = self.logger.as_mut() {
            logger.on_event(&event);
        }
        for listener in self.listeners.iter_mut() {
            listener.on_event(&event);
        }
        let fitness = Stats::of(
            organisms
                .iter()
                .filter_map(|o| self.fitness.peek_fitness(o.id()).ok()),
        );
        info!(
            "generation {}: {} species, fitness {}",
            number,
            species.len(),
            fitness
        );

        let generation = Generation::new(number, species, organisms, self.ids.last_issued())?;
        self.innovations.register_all(generation.genes())?;
        self.persistence
            .add_generation(&self.innovations, &generation, &self.fitness)
            .map_err(EvolverError::Persistence)?;
        self.generation = generation;
        Ok(())
    }

    fn evaluate(&mut self, organisms: &[Organism]) -> Result<(), EvolverError> {
        let mut subjects = Vec::with_capacity(organisms.len());
        for organism in organisms {
            let network = self
                .phenotype_builder
                .build_network(organism)
                .map_err(EvolverError::Phenotype)?;
            subjects.push((organism, network));
        }
        let scores = self
            .fitness_function
            .evaluate(&subjects)
            .map_err(EvolverError::Evaluation)?;
        if scores.len() != subjects.len() {
            return Err(EvolverError::ScoreCountMismatch {
                expected: subjects.len(),
                actual: scores.len(),
            });
        }
        for ((organism, _), score) in subjects.iter().zip(scores) {
            self.fitness.set_fitness(organism.id(), score)?;
        }
        Ok(())
    }

    fn publish(&mut self, event: &EvolutionEvent<'_>) {
        if let Some(logger) = self.logger.as_mut() {
            logger.on_event(event);
        }
        for listener in self.listeners.iter_mut() {
            listener.on_event(event);
        }
    }

    /// The fittest organism of the current generation.
    pub fn champion(&self) -> Result<Option<&Organism>, EvolverError> {
        Ok(self.generation.champion(&self.fitness)?)
    }

    /// The most recently completed generation.
    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub fn innovations(&self) -> &Innovations {
        &self.innovations
    }

    pub fn fitness_scores(&self) -> &FitnessScores {
        &self.fitness
    }

    pub fn state(&self) -> EvolverState {
        self.state
    }

    /// Current compatibility threshold of the speciator.
    pub fn speciation_threshold(&self) -> f64 {
        self.speciator.threshold()
    }

    /// The built-in logger, if a reporting level was configured.
    pub fn logger(&self) -> Option<&EvolutionLogger> {
        self.logger.as_ref()
    }

    pub fn persistence(&self) -> &dyn Persistence {
        self.persistence.as_ref()
    }

    /// Consumes the evolver, returning its persistence
    /// so that another evolver may resume from it.
    pub fn into_persistence(self) -> Box<dyn Persistence> {
        self.persistence
    }
}
