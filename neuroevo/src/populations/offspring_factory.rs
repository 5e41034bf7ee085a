use crate::genomics::{Organism, OrganismId};
use crate::populations::{PopulationConfig, PopulationError, Specie};
use crate::reproduction::{ReproductionContext, ReproductionOperator};
use crate::rng::gen_index;

use ahash::RandomState;
use log::debug;

use std::collections::HashMap;

/// Auxiliary type for offspring generation. Splits the
/// population's offspring deficit across reproduction
/// operators and species, and runs the operators until
/// the deficit is covered.
pub(crate) struct OffspringFactory<'a> {
    operators: &'a [Box<dyn ReproductionOperator>],
    config: &'a PopulationConfig,
}

impl<'a> OffspringFactory<'a> {
    pub(crate) fn new(
        operators: &'a [Box<dyn ReproductionOperator>],
        config: &'a PopulationConfig,
    ) -> OffspringFactory<'a> {
        OffspringFactory { operators, config }
    }

    /// Produces exactly `required` offspring from the members
    /// of `species` found among `survivors`.
    ///
    /// Each pass splits the remaining deficit across operators by
    /// slice, and each operator's share across species either evenly
    /// or by fitness share. Passes repeat until the deficit is covered;
    /// any surplus from rounding is then removed at random.
    pub(crate) fn fill(
        &self,
        species: &[Specie],
        survivors: &[Organism],
        required: usize,
        ctx: &mut ReproductionContext<'_>,
    ) -> Result<Vec<Organism>, PopulationError> {
        if required == 0 {
            return Ok(vec![]);
        }
        let total_slice: f64 = self
            .operators
            .iter()
            .map(|operator| operator.slice().max(0.0))
            .sum();
        if total_slice <= 0.0 || !total_slice.is_finite() {
            return Err(PopulationError::NoReproductionOperators);
        }

        let by_id: HashMap<OrganismId, &Organism, RandomState> =
            survivors.iter().map(|o| (o.id(), o)).collect();
        let pools: Vec<Vec<&Organism>> = species
            .iter()
            .map(|s| {
                s.members()
                    .iter()
                    .filter_map(|id| by_id.get(id).copied())
                    .collect::<Vec<&Organism>>()
            })
            .filter(|pool| !pool.is_empty())
            .collect();
        if pools.is_empty() {
            return Err(PopulationError::NoParents);
        }
        let shares = self.pool_shares(&pools, ctx)?;

        let mut offspring = Vec::with_capacity(required);
        while offspring.len() < required {
            let deficit = required - offspring.len();
            let produced_before = offspring.len();
            for operator in self.operators {
                let slice = operator.slice().max(0.0);
                let target = (deficit as f64 * slice / total_slice).ceil();
                if target < 1.0 {
                    continue;
                }
                let allotted: Vec<f64> = shares.iter().map(|share| share * target).collect();
                for (pool, count) in pools.iter().zip(round_retain_sum(&allotted)) {
                    if count > 0 {
                        offspring.extend(operator.reproduce(pool, count, ctx)?);
                    }
                }
            }
            if offspring.len() == produced_before {
                return Err(PopulationError::ReproductionStalled {
                    produced: produced_before,
                    required,
                });
            }
        }

        if offspring.len() > required {
            debug!(
                "removing {} surplus offspring",
                offspring.len() - required
            );
        }
        while offspring.len() > required {
            let surplus = gen_index(ctx.rng, offspring.len());
            offspring.remove(surplus);
        }
        Ok(offspring)
    }

    /// Fraction of every operator's offspring allotted to each pool.
    fn pool_shares(
        &self,
        pools: &[Vec<&Organism>],
        ctx: &ReproductionContext<'_>,
    ) -> Result<Vec<f64>, PopulationError> {
        let even = vec![1.0 / pools.len() as f64; pools.len()];
        if !self.config.fitness_bias {
            return Ok(even);
        }
        let mut sums = Vec::with_capacity(pools.len());
        for pool in pools {
            let mut sum = 0.0;
            for organism in pool {
                sum += ctx.fitness.peek_fitness(organism.id())?.max(0.0);
            }
            sums.push(sum);
        }
        let total: f64 = sums.iter().sum();
        if total > 0.0 && total.is_finite() {
            Ok(sums.into_iter().map(|sum| sum / total).collect())
        } else {
            Ok(even)
        }
    }
}

/// Rounds `values` to whole numbers such that
/// the rounded total matches the original total
/// (rounded). Values with the greatest fractional
/// parts are rounded up first, earliest first on ties.
pub(crate) fn round_retain_sum(values: &[f64]) -> Vec<usize> {
    let total_sum = values.iter().sum::<f64>().round().max(0.0) as usize;
    let mut truncated: Vec<(usize, usize, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let u = f.max(0.0).floor();
            (i, u as usize, f.max(0.0) - u)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let remainder = total_sum.saturating_sub(truncated_sum).min(truncated.len());
    // Stable sort: ties keep index order.
    truncated.sort_by(|a, b| b.2.total_cmp(&a.2));
    for (_, u, _) in &mut truncated[..remainder] {
        *u += 1;
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::FitnessScores;
    use crate::genomics::{Gene, IdAllocator, NeuronGene};
    use crate::populations::SpecieId;
    use crate::reproduction::{CloneReproduction, CrossoverReproduction};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::num::NonZeroUsize;

    #[test]
    fn round_retain_sum() {
        let v = [5.2, 9.5, 2.8, 1.3, 2.2, 2.7, 6.3, 1.0000000000001, 0.9999999999999];
        let w = super::round_retain_sum(&v);
        assert_eq!(w.iter().sum::<usize>(), 32);
        assert_eq!(w, [5, 10, 3, 1, 2, 3, 6, 1, 1]);
        assert_eq!(super::round_retain_sum(&[0.5, 0.5]), [1, 0]);
        assert!(super::round_retain_sum(&[]).is_empty());
    }

    fn organism(id: u64) -> Organism {
        Organism::from_genes(
            OrganismId(id),
            vec![
                Gene::from(NeuronGene::input(1, 1.0)),
                Gene::from(NeuronGene::output(2, 1.0)),
            ],
            vec![],
        )
        .unwrap()
    }

    fn two_species(organisms: &mut [Organism]) -> Vec<Specie> {
        let (first, second) = organisms.split_at_mut(2);
        let mut a = Specie::new(SpecieId(50), &mut first[0]);
        a.add(&mut first[1]);
        let b = Specie::new(SpecieId(51), &mut second[0]);
        vec![a, b]
    }

    fn config(fitness_bias: bool) -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(10).unwrap(),
            fitness_bias,
            ..PopulationConfig::zero()
        }
    }

    #[test]
    fn fills_exact_deficit() {
        let mut survivors = vec![organism(1), organism(2), organism(3)];
        let species = two_species(&mut survivors);
        let mut fitness = FitnessScores::new(10);
        for (id, score) in [(1, 1.0), (2, 2.0), (3, 3.0)] {
            fitness.set_fitness(OrganismId(id), score).unwrap();
        }
        let operators: Vec<Box<dyn ReproductionOperator>> = vec![
            Box::new(CrossoverReproduction::default()),
            Box::new(CloneReproduction::default()),
        ];
        let mut ids = IdAllocator::resume_after(10);

        for bias in [false, true] {
            for required in [1, 7, 13] {
                let config = config(bias);
                let mut rng = ChaCha8Rng::seed_from_u64(required as u64);
                let mut ctx = ReproductionContext {
                    fitness: &fitness,
                    ids: &mut ids,
                    rng: &mut rng,
                };
                let offspring = OffspringFactory::new(&operators, &config)
                    .fill(&species, &survivors, required, &mut ctx)
                    .unwrap();
                assert_eq!(offspring.len(), required);
                assert!(offspring.iter().all(|o| o.specie().is_none()));
                assert!(offspring.iter().all(|o| o.id().0 > 10));
            }
        }
    }

    #[test]
    fn zero_fitness_splits_evenly() {
        let mut survivors = vec![organism(1), organism(2), organism(3)];
        let species = two_species(&mut survivors);
        let mut fitness = FitnessScores::new(10);
        for id in 1..=3 {
            fitness.set_fitness(OrganismId(id), 0.0).unwrap();
        }
        let operators: Vec<Box<dyn ReproductionOperator>> =
            vec![Box::new(CloneReproduction { slice: 1.0 })];
        let config = config(true);
        let mut ids = IdAllocator::resume_after(10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = ReproductionContext {
            fitness: &fitness,
            ids: &mut ids,
            rng: &mut rng,
        };
        let offspring = OffspringFactory::new(&operators, &config)
            .fill(&species, &survivors, 4, &mut ctx)
            .unwrap();
        let from_second = offspring
            .iter()
            .filter(|o| o.ancestry() == [OrganismId(3)])
            .count();
        assert_eq!(from_second, 2);
    }

    #[test]
    fn fitness_share_splits_offspring() {
        let mut survivors = vec![organism(1), organism(2), organism(3)];
        let species = two_species(&mut survivors);
        let mut fitness = FitnessScores::new(10);
        for (id, score) in [(1, 0.5), (2, 0.5), (3, 3.0)] {
            fitness.set_fitness(OrganismId(id), score).unwrap();
        }
        let operators: Vec<Box<dyn ReproductionOperator>> =
            vec![Box::new(CloneReproduction { slice: 1.0 })];
        let config = config(true);
        let mut ids = IdAllocator::resume_after(10);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = ReproductionContext {
            fitness: &fitness,
            ids: &mut ids,
            rng: &mut rng,
        };
        let offspring = OffspringFactory::new(&operators, &config)
            .fill(&species, &survivors, 8, &mut ctx)
            .unwrap();
        let from_second = offspring
            .iter()
            .filter(|o| o.ancestry() == [OrganismId(3)])
            .count();
        assert_eq!(offspring.len(), 8);
        assert_eq!(from_second, 6);
    }

    #[test]
    fn requires_operators_and_parents() {
        let mut survivors = vec![organism(1), organism(2), organism(3)];
        let species = two_species(&mut survivors);
        let fitness = FitnessScores::new(10);
        let config = config(false);
        let mut ids = IdAllocator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = ReproductionContext {
            fitness: &fitness,
            ids: &mut ids,
            rng: &mut rng,
        };

        let none: Vec<Box<dyn ReproductionOperator>> = vec![Box::new(CloneReproduction { slice: 0.0 })];
        assert!(matches!(
            OffspringFactory::new(&none, &config).fill(&species, &survivors, 3, &mut ctx),
            Err(PopulationError::NoReproductionOperators)
        ));

        let clones: Vec<Box<dyn ReproductionOperator>> = vec![Box::new(CloneReproduction::default())];
        assert!(matches!(
            OffspringFactory::new(&clones, &config).fill(&species, &[], 3, &mut ctx),
            Err(PopulationError::NoParents)
        ));
    }
}
