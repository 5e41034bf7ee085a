use crate::fitness::FitnessScores;
use crate::interfaces::TerminationCondition;
use crate::populations::{Generation, PopulationConfig};

/// Ends the run once the given generation number is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerationLimit(pub u64);

impl TerminationCondition for GenerationLimit {
    fn exit_criteria_met(
        &self,
        _: &PopulationConfig,
        generation_number: u64,
        _: &Generation,
        _: &FitnessScores,
    ) -> bool {
        generation_number >= self.0
    }
}

/// Ends the run once any organism reaches the target fitness.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitnessTarget(pub f64);

impl TerminationCondition for FitnessTarget {
    fn exit_criteria_met(
        &self,
        _: &PopulationConfig,
        _: u64,
        generation: &Generation,
        fitness: &FitnessScores,
    ) -> bool {
        generation
            .organisms()
            .iter()
            .filter_map(|o| fitness.peek_fitness(o.id()).ok())
            .any(|score| score >= self.0)
    }
}

/// Ends the run as soon as any of its conditions is met.
pub struct AnyOf(pub Vec<Box<dyn TerminationCondition>>);

impl TerminationCondition for AnyOf {
    fn exit_criteria_met(
        &self,
        config: &PopulationConfig,
        generation_number: u64,
        generation: &Generation,
        fitness: &FitnessScores,
    ) -> bool {
        self.0
            .iter()
            .any(|c| c.exit_criteria_met(config, generation_number, generation, fitness))
    }
}
