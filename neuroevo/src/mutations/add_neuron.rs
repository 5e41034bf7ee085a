use crate::genomics::{GenomicsError, NeuronGene, Organism};
use crate::mutations::{MutationContext, MutationOperator};
use crate::rng::gen_index;
use crate::Innovation;

use log::debug;
use serde::{Deserialize, Serialize};

/// Splits an enabled connection in two by inserting a hidden neuron.
///
/// The split connection is disabled and replaced by a connection into
/// the new neuron, with weight 1, and a connection out of it carrying
/// the original weight. The neuron and both connections are taken from
/// the innovation registry, so every organism splitting the same
/// connection gains identically numbered genes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddNeuronMutation {
    pub probability: f64,
    /// Activation response of newly created neurons.
    pub activation_response: f64,
}

impl Default for AddNeuronMutation {
    fn default() -> AddNeuronMutation {
        AddNeuronMutation {
            probability: 0.03,
            activation_response: 1.0,
        }
    }
}

impl MutationOperator for AddNeuronMutation {
    fn name(&self) -> &'static str {
        "add neuron"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn mutate(
        &self,
        organism: &mut Organism,
        ctx: &mut MutationContext<'_>,
    ) -> Result<bool, GenomicsError> {
        let candidates: Vec<Innovation> = organism
            .connections()
            .filter(|c| c.enabled())
            .map(|c| c.innovation())
            .collect();
        if candidates.is_empty() {
            return Ok(false);
        }
        let split_id = candidates[gen_index(ctx.rng, candidates.len())];
        let (origin, endpoint, weight) = match organism.connection(split_id) {
            Some(split) => (split.origin(), split.endpoint(), split.weight()),
            None => return Ok(false),
        };

        let activation_response = self.activation_response;
        let mut neuron = ctx
            .innovations
            .get_or_create_split_neuron(split_id, ctx.ids, |id| {
                NeuronGene::hidden(id, activation_response)
            })?
            .clone();
        if organism.contains_neuron(neuron.innovation()) {
            debug!(
                "{} already holds the neuron splitting connection {}",
                organism.id(),
                split_id
            );
            return Ok(false);
        }
        neuron.set_enabled(true);

        let mut incoming = ctx
            .innovations
            .get_or_create_connection(origin, neuron.innovation(), ctx.ids, || 1.0)?
            .clone();
        incoming.set_weight(1.0);
        incoming.set_enabled(true);
        let mut outgoing = ctx
            .innovations
            .get_or_create_connection(neuron.innovation(), endpoint, ctx.ids, || weight)?
            .clone();
        outgoing.set_weight(weight);
        outgoing.set_enabled(true);

        if let Some(split) = organism.connection_mut(split_id) {
            split.set_enabled(false);
        }
        organism.add_neuron(neuron)?;
        organism.add_connection(incoming)?;
        organism.add_connection(outgoing)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{IdAllocator, Innovations, NeuronRole, OrganismId};
    use crate::mutations::test_support;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn splits_enabled_connection() {
        let mut innovations = Innovations::new();
        let mut organism = test_support::organism(&mut innovations);
        organism.connection_mut(6).unwrap().set_enabled(false);
        let mut ids = IdAllocator::resume_after(6);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = MutationContext {
            innovations: &mut innovations,
            ids: &mut ids,
            rng: &mut rng,
        };
        assert_eq!(AddNeuronMutation::default().mutate(&mut organism, &mut ctx), Ok(true));

        // Only connection 5 (1 -> 3, weight 0.5) was eligible.
        assert!(!organism.connection(5).unwrap().enabled());
        let neuron = organism.neuron(7).unwrap();
        assert_eq!(neuron.role(), NeuronRole::Hidden);
        let incoming = organism.connection(8).unwrap();
        assert_eq!(incoming.endpoints(), (1, 7));
        assert_eq!(incoming.weight(), 1.0);
        let outgoing = organism.connection(9).unwrap();
        assert_eq!(outgoing.endpoints(), (7, 3));
        assert_eq!(outgoing.weight(), 0.5);
        assert!(organism.validate().is_ok());
    }

    #[test]
    fn independent_splits_converge() {
        let mut innovations = Innovations::new();
        let mut a = test_support::organism(&mut innovations);
        a.connection_mut(6).unwrap().set_enabled(false);
        let mut b = a.offspring(OrganismId(101), vec![]);
        b.connection_mut(5).unwrap().set_weight(-2.0);
        let mut ids = IdAllocator::resume_after(6);

        for (organism, seed) in [(&mut a, 3), (&mut b, 8)] {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut ctx = MutationContext {
                innovations: &mut innovations,
                ids: &mut ids,
                rng: &mut rng,
            };
            assert_eq!(AddNeuronMutation::default().mutate(organism, &mut ctx), Ok(true));
        }

        let a_ids: Vec<Innovation> = a.genes().iter().map(|g| g.innovation()).collect();
        let b_ids: Vec<Innovation> = b.genes().iter().map(|g| g.innovation()).collect();
        assert_eq!(a_ids, b_ids);
        assert_eq!(ids.last_issued(), 9);
        assert_eq!(b.connection(9).unwrap().weight(), -2.0);
    }

    #[test]
    fn repeated_split_is_skipped() {
        let mut innovations = Innovations::new();
        let mut organism = test_support::organism(&mut innovations);
        organism.connection_mut(6).unwrap().set_enabled(false);
        let mut ids = IdAllocator::resume_after(6);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = MutationContext {
            innovations: &mut innovations,
            ids: &mut ids,
            rng: &mut rng,
        };
        let mutation = AddNeuronMutation::default();
        mutation.mutate(&mut organism, &mut ctx).unwrap();

        // Re-enable the split connection and disable the new ones.
        organism.connection_mut(5).unwrap().set_enabled(true);
        organism.connection_mut(8).unwrap().set_enabled(false);
        organism.connection_mut(9).unwrap().set_enabled(false);
        let before = organism.genes();
        assert_eq!(mutation.mutate(&mut organism, &mut ctx), Ok(false));
        assert_eq!(organism.genes(), before);
        assert!(organism.connection(5).unwrap().enabled());
    }

    #[test]
    fn nothing_to_split() {
        let mut innovations = Innovations::new();
        let mut organism = test_support::organism(&mut innovations);
        organism.connection_mut(5).unwrap().set_enabled(false);
        organism.connection_mut(6).unwrap().set_enabled(false);
        let mut ids = IdAllocator::resume_after(6);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = MutationContext {
            innovations: &mut innovations,
            ids: &mut ids,
            rng: &mut rng,
        };
        assert_eq!(AddNeuronMutation::default().mutate(&mut organism, &mut ctx), Ok(false));
        assert_eq!(ids.last_issued(), 6);
    }
}
