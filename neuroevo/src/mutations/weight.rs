use crate::genomics::{GenomicsError, Organism};
use crate::mutations::{MutationContext, MutationOperator};
use crate::rng::{gen_chance, gen_symmetric};

use serde::{Deserialize, Serialize};

/// Perturbs the weight of every connection.
///
/// Each weight is either replaced by a new random weight, with
/// `replace_chance`, or nudged by a random amount in
/// `±perturbation`. Weights never exceed `±weight_bound`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WeightMutation {
    pub probability: f64,
    pub replace_chance: f64,
    pub perturbation: f64,
    pub weight_bound: f64,
}

impl Default for WeightMutation {
    fn default() -> WeightMutation {
        WeightMutation {
            probability: 0.8,
            replace_chance: 0.1,
            perturbation: 0.5,
            weight_bound: 5.0,
        }
    }
}

impl MutationOperator for WeightMutation {
    fn name(&self) -> &'static str {
        "weight"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn mutate(
        &self,
        organism: &mut Organism,
        ctx: &mut MutationContext<'_>,
    ) -> Result<bool, GenomicsError> {
        if organism.connection_count() == 0 {
            return Ok(false);
        }
        let bound = self.weight_bound.abs();
        for connection in organism.connections_mut() {
            let weight = if gen_chance(ctx.rng, self.replace_chance) {
                gen_symmetric(ctx.rng, bound)
            } else {
                connection.weight() + gen_symmetric(ctx.rng, self.perturbation)
            };
            connection.set_weight(weight.clamp(-bound, bound));
        }
        Ok(true)
    }
}
