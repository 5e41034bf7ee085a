use crate::genomics::{Organism, OrganismId};
use crate::populations::PopulationError;
use crate::reproduction::{ReproductionContext, ReproductionOperator};
use crate::rng::gen_index;

use serde::{Deserialize, Serialize};

/// Asexual reproduction: each offspring is an
/// exact copy of a uniformly chosen parent.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CloneReproduction {
    pub slice: f64,
}

impl Default for CloneReproduction {
    fn default() -> CloneReproduction {
        CloneReproduction { slice: 0.2 }
    }
}

impl CloneReproduction {
    pub(crate) fn clone_parents(
        parents: &[&Organism],
        count: usize,
        ctx: &mut ReproductionContext<'_>,
    ) -> Result<Vec<Organism>, PopulationError> {
        if count == 0 {
            return Ok(vec![]);
        }
        if parents.is_empty() {
            return Err(PopulationError::NoParents);
        }
        let mut offspring = Vec::with_capacity(count);
        for _ in 0..count {
            let parent = parents[gen_index(ctx.rng, parents.len())];
            offspring.push(parent.offspring(OrganismId(ctx.ids.next_id()), vec![parent.id()]));
        }
        Ok(offspring)
    }
}

impl ReproductionOperator for CloneReproduction {
    fn name(&self) -> &'static str {
        "clone"
    }

    fn slice(&self) -> f64 {
        self.slice
    }

    fn reproduce(
        &self,
        parents: &[&Organism],
        count: usize,
        ctx: &mut ReproductionContext<'_>,
    ) -> Result<Vec<Organism>, PopulationError> {
        Self::clone_parents(parents, count, ctx)
    }
}
