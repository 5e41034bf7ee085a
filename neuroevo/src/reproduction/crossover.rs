use crate::genomics::{Organism, OrganismId};
use crate::populations::PopulationError;
use crate::reproduction::{CloneReproduction, ReproductionContext, ReproductionOperator};
use crate::rng::{gen_chance, gen_index};
use crate::Innovation;

use ahash::RandomState;
use log::trace;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// Sexual reproduction between two distinct parents.
///
/// The child inherits the full structure of the fitter (dominant)
/// parent. Each of its connections then has an even chance of taking
/// the weight of the structurally equal connection in the other
/// (recessive) parent, when there is one. Structural equality is
/// undirected, so matching does not depend on innovation ids.
///
/// With fewer than two parents available, offspring
/// are produced by cloning instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrossoverReproduction {
    pub slice: f64,
}

impl Default for CrossoverReproduction {
    fn default() -> CrossoverReproduction {
        CrossoverReproduction { slice: 0.8 }
    }
}

impl CrossoverReproduction {
    /// Mates two parents. The mother is dominant
    /// unless the father is strictly fitter.
    pub fn mate(
        mother: &Organism,
        father: &Organism,
        ctx: &mut ReproductionContext<'_>,
    ) -> Result<Organism, PopulationError> {
        let (dominant, recessive) =
            if ctx.fitness.peek_fitness(father.id())? > ctx.fitness.peek_fitness(mother.id())? {
                (father, mother)
            } else {
                (mother, father)
            };
        let mut child = dominant.offspring(
            OrganismId(ctx.ids.next_id()),
            vec![mother.id(), father.id()],
        );

        let mut recessive_weights: HashMap<(Innovation, Innovation), f64, RandomState> =
            HashMap::default();
        for connection in recessive.connections() {
            recessive_weights
                .entry(connection.unordered_endpoints())
                .or_insert(connection.weight());
        }
        for connection in child.connections_mut() {
            if gen_chance(ctx.rng, 0.5) {
                if let Some(&weight) = recessive_weights.get(&connection.unordered_endpoints()) {
                    connection.set_weight(weight);
                }
            }
        }
        trace!(
            "mated {} with {} into {}",
            mother.id(),
            father.id(),
            child.id()
        );
        Ok(child)
    }
}

impl ReproductionOperator for CrossoverReproduction {
    fn name(&self) -> &'static str {
        "crossover"
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
        if parents.len() < 2 {
            return CloneReproduction::clone_parents(parents, count, ctx);
        }
        let mut offspring = Vec::with_capacity(count);
        for _ in 0..count {
            let mother = gen_index(ctx.rng, parents.len());
            let mut father = gen_index(ctx.rng, parents.len() - 1);
            if father >= mother {
                father += 1;
            }
            offspring.push(Self::mate(parents[mother], parents[father], ctx)?);
        }
        Ok(offspring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::FitnessScores;
    use crate::genomics::{ConnectionGene, Gene, IdAllocator, NeuronGene};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn organism(id: u64, connections: &[(Innovation, Innovation, Innovation, f64)]) -> Organism {
        let mut genes = vec![
            Gene::from(NeuronGene::input(1, 1.0)),
            Gene::from(NeuronGene::input(2, 1.0)),
            Gene::from(NeuronGene::output(3, 1.0)),
            Gene::from(NeuronGene::output(4, 1.0)),
        ];
        for &(innovation, origin, endpoint, weight) in connections {
            genes.push(Gene::from(ConnectionGene::new(innovation, origin, endpoint, weight)));
        }
        Organism::from_genes(OrganismId(id), genes, vec![]).unwrap()
    }

    #[test]
    fn child_takes_dominant_structure() {
        let fit = organism(100, &[(5, 1, 3, 1.0), (6, 1, 4, 1.0), (7, 2, 3, 1.0)]);
        let weak = organism(101, &[(6, 1, 4, 5.0)]);
        let mut fitness = FitnessScores::new(10);
        fitness.set_fitness(fit.id(), 2.0).unwrap();
        fitness.set_fitness(weak.id(), 1.0).unwrap();
        let mut ids = IdAllocator::resume_after(200);

        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut ctx = ReproductionContext {
                fitness: &fitness,
                ids: &mut ids,
                rng: &mut rng,
            };
            let child = CrossoverReproduction::mate(&weak, &fit, &mut ctx).unwrap();

            assert_eq!(child.ancestry(), &[weak.id(), fit.id()]);
            let structure: Vec<Innovation> = child.connections().map(|c| c.innovation()).collect();
            assert_eq!(structure, vec![5, 6, 7]);
            let shared = child.connection(6).unwrap().weight();
            assert!(shared == 1.0 || shared == 5.0);
            assert_eq!(child.connection(5).unwrap().weight(), 1.0);
            assert_eq!(child.connection(7).unwrap().weight(), 1.0);
        }
    }

    #[test]
    fn matching_ignores_ids_and_direction() {
        let dominant = organism(100, &[(5, 1, 3, 1.0)]);
        let recessive = organism(101, &[(9, 3, 1, -4.0)]);
        let mut fitness = FitnessScores::new(10);
        fitness.set_fitness(dominant.id(), 1.0).unwrap();
        fitness.set_fitness(recessive.id(), 1.0).unwrap();
        let mut ids = IdAllocator::resume_after(200);

        let mut inherited = false;
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut ctx = ReproductionContext {
                fitness: &fitness,
                ids: &mut ids,
                rng: &mut rng,
            };
            // Equal fitness: the mother is dominant.
            let child = CrossoverReproduction::mate(&dominant, &recessive, &mut ctx).unwrap();
            assert!(child.connection(9).is_none());
            inherited |= child.connection(5).unwrap().weight() == -4.0;
        }
        assert!(inherited);
    }

    #[test]
    fn single_parent_falls_back_to_cloning() {
        let parent = organism(100, &[(5, 1, 3, 1.0)]);
        let fitness = FitnessScores::new(10);
        let mut ids = IdAllocator::resume_after(200);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = ReproductionContext {
            fitness: &fitness,
            ids: &mut ids,
            rng: &mut rng,
        };
        let offspring = CrossoverReproduction::default()
            .reproduce(&[&parent], 2, &mut ctx)
            .unwrap();
        assert_eq!(offspring.len(), 2);
        assert!(offspring.iter().all(|o| o.ancestry() == [parent.id()]));
    }

    #[test]
    fn parents_are_distinct() {
        let a = organism(100, &[(5, 1, 3, 1.0)]);
        let b = organism(101, &[(5, 1, 3, 2.0)]);
        let mut fitness = FitnessScores::new(10);
        fitness.set_fitness(a.id(), 1.0).unwrap();
        fitness.set_fitness(b.id(), 1.0).unwrap();
        let mut ids = IdAllocator::resume_after(200);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut ctx = ReproductionContext {
            fitness: &fitness,
            ids: &mut ids,
            rng: &mut rng,
        };
        let offspring = CrossoverReproduction::default()
            .reproduce(&[&a, &b], 10, &mut ctx)
            .unwrap();
        for child in offspring {
            let ancestry = child.ancestry();
            assert_eq!(ancestry.len(), 2);
            assert_ne!(ancestry[0], ancestry[1]);
        }
    }

    #[test]
    fn unscored_parents_are_an_error() {
        let a = organism(100, &[]);
        let b = organism(101, &[]);
        let fitness = FitnessScores::new(10);
        let mut ids = IdAllocator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = ReproductionContext {
            fitness: &fitness,
            ids: &mut ids,
            rng: &mut rng,
        };
        assert!(matches!(
            CrossoverReproduction::mate(&a, &b, &mut ctx),
            Err(PopulationError::Fitness(_))
        ));
    }
}
