//! Operators altering the structure and parameters of offspring.

mod activation_response;
mod add_connection;
mod add_neuron;
mod weight;

pub use activation_response::*;
pub use add_connection::*;
pub use add_neuron::*;
pub use weight::*;

use crate::genomics::{GenomicsError, IdAllocator, Innovations, Organism};
use crate::rng::gen_chance;

use log::trace;
use rand::RngCore;

use std::fmt;

/// Shared state available to mutation operators.
pub struct MutationContext<'a> {
    /// Registry consulted for every structural change, so that
    /// identical mutations receive identical innovation ids.
    pub innovations: &'a mut Innovations,
    pub ids: &'a mut IdAllocator,
    pub rng: &'a mut dyn RngCore,
}

/// A single kind of mutation.
pub trait MutationOperator: fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Chance of the mutation being attempted
    /// on each organism, once per generation.
    fn probability(&self) -> f64;

    /// Attempts the mutation, returning whether
    /// the organism was modified.
    ///
    /// Mutations must leave the organism's structural
    /// invariants intact.
    fn mutate(
        &self,
        organism: &mut Organism,
        ctx: &mut MutationContext<'_>,
    ) -> Result<bool, GenomicsError>;
}

/// Attempts every operator on `organism` in order, each with an
/// independent draw against its probability. Returns the number
/// of mutations which modified the organism.
pub fn apply_mutations(
    operators: &[Box<dyn MutationOperator>],
    organism: &mut Organism,
    ctx: &mut MutationContext<'_>,
) -> Result<usize, GenomicsError> {
    let mut applied = 0;
    for operator in operators {
        if gen_chance(ctx.rng, operator.probability()) && operator.mutate(organism, ctx)? {
            trace!("applied {} mutation to {}", operator.name(), organism.id());
            applied += 1;
        }
    }
    Ok(applied)
}

/// The stock mutation operators, in the order they are applied.
pub fn default_operators() -> Vec<Box<dyn MutationOperator>> {
    vec![
        Box::new(AddConnectionMutation::default()),
        Box::new(AddNeuronMutation::default()),
        Box::new(WeightMutation::default()),
        Box::new(ActivationResponseMutation::default()),
    ]
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[derive(Debug)]
    struct Marker(f64);

    impl MutationOperator for Marker {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn probability(&self) -> f64 {
            self.0
        }

        fn mutate(
            &self,
            organism: &mut Organism,
            _: &mut MutationContext<'_>,
        ) -> Result<bool, GenomicsError> {
            for connection in organism.connections_mut() {
                connection.set_weight(connection.weight() + 1.0);
            }
            Ok(true)
        }
    }

    #[test]
    fn operators_draw_independently() {
        let mut innovations = Innovations::new();
        let mut organism = test_support::organism(&mut innovations);
        let mut ids = IdAllocator::resume_after(6);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = MutationContext {
            innovations: &mut innovations,
            ids: &mut ids,
            rng: &mut rng,
        };
        let operators: Vec<Box<dyn MutationOperator>> = vec![
            Box::new(Marker(1.0)),
            Box::new(Marker(0.0)),
            Box::new(Marker(1.0)),
        ];
        assert_eq!(apply_mutations(&operators, &mut organism, &mut ctx), Ok(2));
        assert_eq!(organism.connection(5).unwrap().weight(), 2.5);
    }
}
