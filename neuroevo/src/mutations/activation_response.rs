use crate::genomics::{GenomicsError, Organism};
use crate::mutations::{MutationContext, MutationOperator};
use crate::rng::{gen_index, gen_symmetric};
use crate::Innovation;

use serde::{Deserialize, Serialize};

/// Nudges the activation response of one random hidden neuron.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivationResponseMutation {
    pub probability: f64,
    pub perturbation: f64,
}

impl Default for ActivationResponseMutation {
    fn default() -> ActivationResponseMutation {
        ActivationResponseMutation {
            probability: 0.1,
            perturbation: 0.1,
        }
    }
}

impl MutationOperator for ActivationResponseMutation {
    fn name(&self) -> &'static str {
        "activation response"
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn mutate(
        &self,
        organism: &mut Organism,
        ctx: &mut MutationContext<'_>,
    ) -> Result<bool, GenomicsError> {
        let hidden: Vec<Innovation> = organism.hidden().map(|n| n.innovation()).collect();
        if hidden.is_empty() {
            return Ok(false);
        }
        let chosen = hidden[gen_index(ctx.rng, hidden.len())];
        let delta = gen_symmetric(ctx.rng, self.perturbation);
        match organism.neuron_mut(chosen) {
            Some(neuron) => {
                neuron.set_activation_response(neuron.activation_response() + delta);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
