//! Volatile storage for runs that need not outlive the process.

use crate::fitness::FitnessScores;
use crate::genomics::Innovations;
use crate::interfaces::{BoxError, Persistence};
use crate::populations::Generation;

/// Keeps every generation in memory, along with the
/// latest registry and fitness scores.
///
/// Stored generations are checked against the registry
/// when loaded, so an inconsistent pair is reported
/// instead of resumed from.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPersistence {
    innovations: Option<Innovations>,
    fitness: Option<FitnessScores>,
    generations: Vec<Generation>,
}

impl InMemoryPersistence {
    pub fn new() -> InMemoryPersistence {
        InMemoryPersistence::default()
    }

    /// All stored generations, oldest first.
    pub fn generations(&self) -> &[Generation] {
        &self.generations
    }
}

impl Persistence for InMemoryPersistence {
    fn load_innovations(&mut self) -> Result<Innovations, BoxError> {
        self.innovations
            .clone()
            .ok_or_else(|| "no innovations have been stored".into())
    }

    fn load_generation(
        &mut self,
        number: u64,
        innovations: &Innovations,
    ) -> Result<Generation, BoxError> {
        let generation = self
            .generations
            .iter()
            .find(|g| g.number() == number)
            .ok_or_else(|| format!("generation {} has not been stored", number))?;
        if let Some(gene) = generation
            .genes()
            .find(|gene| innovations.gene(gene.innovation()).is_none())
        {
            return Err(format!(
                "gene {} of generation {} is not in the registry",
                gene.innovation(),
                number
            )
            .into());
        }
        Ok(generation.clone())
    }

    fn load_fitness_scores(&mut self) -> Result<FitnessScores, BoxError> {
        self.fitness
            .clone()
            .ok_or_else(|| "no fitness scores have been stored".into())
    }

    fn add_generation(
        &mut self,
        innovations: &Innovations,
        generation: &Generation,
        fitness: &FitnessScores,
    ) -> Result<(), BoxError> {
        self.innovations = Some(innovations.clone());
        self.fitness = Some(fitness.clone());
        self.generations.push(generation.clone());
        Ok(())
    }

    fn generation_count(&self) -> Result<u64, BoxError> {
        Ok(self.generations.len() as u64)
    }
}
