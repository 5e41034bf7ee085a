use crate::genomics::{GenomicsError, NeuronRole, Organism};
use crate::mutations::{MutationContext, MutationOperator};
use crate::rng::{gen_index, gen_symmetric};
use crate::Innovation;

use log::debug;
use serde::{Deserialize, Serialize};

/// Adds new connections between previously unconnected neurons.
///
/// Neuron pairs are sampled uniformly. A pair is rejected if both
/// neurons are inputs or both are outputs, if they are already
/// connected in either direction, or if the pair was already picked
/// during the same mutation. Connections always leave input neurons
/// and arrive at output neurons.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddConnectionMutation {
    pub probability: f64,
    /// Maximum number of sampled pairs before giving up.
    pub max_attempts: usize,
    /// Number of connections added by a single mutation.
    pub connections_per_mutation: usize,
    /// Maximum magnitude of the new connections' weights.
    pub weight_bound: f64,
}

impl Default for AddConnectionMutation {
    fn default() -> AddConnectionMutation {
        AddConnectionMutation {
            probability: 0.05,
            max_attempts: 20,
            connections_per_mutation: 1,
            weight_bound: 5.0,
        }
    }
}

impl AddConnectionMutation {
    /// Orders a pair of neurons as `(origin, endpoint)`,
    /// or rejects it if no connection may join them.
    fn orient(
        first: (Innovation, NeuronRole),
        second: (Innovation, NeuronRole),
    ) -> Option<(Innovation, Innovation)> {
        use NeuronRole::*;
        match (first.1, second.1) {
            (Input, Input) | (Output, Output) => None,
            (_, Input) | (Output, _) => Some((second.0, first.0)),
            _ => Some((first.0, second.0)),
        }
    }
}

impl MutationOperator for AddConnectionMutation {
    fn name(&self) -> &'static str {
        "add connection"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn mutate(
        &self,
        organism: &mut Organism,
        ctx: &mut MutationContext<'_>,
    ) -> Result<bool, GenomicsError> {
        let neurons: Vec<(Innovation, NeuronRole)> = organism
            .neurons()
            .map(|n| (n.innovation(), n.role()))
            .collect();
        if neurons.len() < 2 {
            return Ok(false);
        }

        let mut staged: Vec<(Innovation, Innovation)> = vec![];
        let mut attempts = 0;
        while staged.len() < self.connections_per_mutation && attempts < self.max_attempts {
            attempts += 1;
            let first = neurons[gen_index(ctx.rng, neurons.len())];
            let second = neurons[gen_index(ctx.rng, neurons.len())];
            if first.0 == second.0 {
                continue;
            }
            if let Some((origin, endpoint)) = Self::orient(first, second) {
                let picked = staged
                    .iter()
                    .any(|&(a, b)| (a == origin && b == endpoint) || (a == endpoint && b == origin));
                if !picked && !organism.connects(origin, endpoint) {
                    staged.push((origin, endpoint));
                }
            }
        }
        if staged.is_empty() {
            debug!(
                "no connection added to {} after {} attempts",
                organism.id(),
                attempts
            );
            return Ok(false);
        }

        for (origin, endpoint) in staged {
            let weight = gen_symmetric(ctx.rng, self.weight_bound);
            let mut connection = ctx
                .innovations
                .get_or_create_connection(origin, endpoint, ctx.ids, || weight)?
                .clone();
            connection.set_weight(weight);
            connection.set_enabled(true);
            organism.add_connection(connection)?;
        }
        Ok(true)
    }
}
