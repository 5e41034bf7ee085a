use crate::genomics::{Gene, IdAllocator, Organism, OrganismId};
use crate::populations::{Specie, SpecieId};

use ahash::RandomState;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::collections::HashMap;
use std::fmt;

/// Errors arising during speciation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeciationError {
    #[error("genetic distance between {0} and {1} is not a number")]
    UndefinedDistance(OrganismId, OrganismId),
    #[error("representative {representative} of specie {specie} is not in the population")]
    MissingRepresentative {
        specie: SpecieId,
        representative: OrganismId,
    },
}

/// Coefficients of the genetic distance formula.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DistanceConfig {
    /// Weight of genes past the end of the shorter genome.
    pub excess_multiplier: f64,
    /// Weight of mismatched genes within both genomes' range.
    pub disjoint_multiplier: f64,
    /// Weight of the summed weight difference of matched connections.
    pub matched_multiplier: f64,
    /// Whether excess and disjoint counts are divided by the
    /// gene count of the larger genome.
    pub normalize: bool,
}

impl DistanceConfig {
    /// Returns a configuration with every coefficient set to 0.
    pub const fn zero() -> DistanceConfig {
        DistanceConfig {
            excess_multiplier: 0.0,
            disjoint_multiplier: 0.0,
            matched_multiplier: 0.0,
            normalize: false,
        }
    }
}

impl Default for DistanceConfig {
    fn default() -> DistanceConfig {
        DistanceConfig {
            excess_multiplier: 1.0,
            disjoint_multiplier: 1.0,
            matched_multiplier: 0.4,
            normalize: false,
        }
    }
}

/// Returns the genetic distance between two organisms.
///
/// Both organisms' genes, neurons and connections alike, are walked
/// in innovation order. Genes present in both are _matched_ and
/// contribute the absolute difference of their weights (zero for
/// neurons). Unmatched genes past the end of either organism's genes
/// are _excess_, and the remaining unmatched genes are _disjoint_:
///
/// `distance = excess_multiplier * excess + disjoint_multiplier * disjoint
///             + matched_multiplier * weight_difference / matched`
///
/// The distance of an organism to itself is 0.
///
/// Neuron genes take part in the walk on purpose. Counting only
/// connections would leave organisms with entirely different
/// connections with nothing matched, and so with no distance at
/// all; shared neurons keep `matched` positive for any two
/// organisms with the same inputs and outputs, at the cost of a
/// larger `matched` denominator than connections alone give.
///
/// # Errors
///
/// Returns [`UndefinedDistance`] if the result is NaN,
/// as happens when no gene is matched.
///
/// [`UndefinedDistance`]: SpeciationError::UndefinedDistance
///
/// # Examples
/// ```
/// use neuroevo::{genetic_distance, DistanceConfig, Gene, NeuronGene, Organism, OrganismId};
///
/// let organism = Organism::from_genes(
///     OrganismId(1),
///     vec![
///         Gene::from(NeuronGene::input(1, 1.0)),
///         Gene::from(NeuronGene::output(2, 1.0)),
///     ],
///     vec![],
/// )
/// .unwrap();
///
/// let distance = genetic_distance(&organism, &organism, &DistanceConfig::default()).unwrap();
/// assert_eq!(distance, 0.0);
/// ```
pub fn genetic_distance(
    first: &Organism,
    second: &Organism,
    config: &DistanceConfig,
) -> Result<f64, SpeciationError> {
    let a = first.genes();
    let b = second.genes();
    let (mut i, mut j) = (0, 0);
    let mut disjoint = 0usize;
    let mut matched = 0usize;
    let mut weight_difference = 0.0;
    while i < a.len() && j < b.len() {
        let (x, y) = (&a[i], &b[j]);
        match x.innovation().cmp(&y.innovation()) {
            std::cmp::Ordering::Equal => {
                if let (Gene::Connection(x), Gene::Connection(y)) = (x, y) {
                    weight_difference += (x.weight() - y.weight()).abs();
                }
                matched += 1;
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                disjoint += 1;
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                disjoint += 1;
                j += 1;
            }
        }
    }
    let excess = (a.len() - i) + (b.len() - j);

    let normalizer = if config.normalize {
        a.len().max(b.len()).max(1) as f64
    } else {
        1.0
    };
    let distance = (config.excess_multiplier * excess as f64
        + config.disjoint_multiplier * disjoint as f64)
        / normalizer
        + config.matched_multiplier * (weight_difference / matched as f64);
    if distance.is_nan() {
        Err(SpeciationError::UndefinedDistance(first.id(), second.id()))
    } else {
        Ok(distance)
    }
}

/// A strategy for grouping organisms into species.
pub trait Speciator: fmt::Debug {
    /// Distance below which an organism joins a specie.
    fn threshold(&self) -> f64;

    /// Assigns every organism to exactly one specie, updating
    /// `species` in place. Existing species keep their id and
    /// representative but start with no members; species left
    /// without members are removed, and new species are created
    /// with ids drawn from `ids` as needed.
    fn speciate(
        &mut self,
        species: &mut Vec<Specie>,
        organisms: &mut [Organism],
        ids: &mut IdAllocator,
    ) -> Result<(), SpeciationError>;
}

/// First-fit speciation with a fixed compatibility threshold.
///
/// Organisms are visited in order. An organism which is some
/// specie's representative joins that specie; any other organism
/// joins the first specie whose representative is closer than the
/// threshold, or founds a new specie if there is none.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompatibilitySpeciator {
    pub threshold: f64,
    pub distance: DistanceConfig,
}

impl Default for CompatibilitySpeciator {
    fn default() -> CompatibilitySpeciator {
        CompatibilitySpeciator {
            threshold: 3.0,
            distance: DistanceConfig::default(),
        }
    }
}

impl Speciator for CompatibilitySpeciator {
    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn speciate(
        &mut self,
        species: &mut Vec<Specie>,
        organisms: &mut [Organism],
        ids: &mut IdAllocator,
    ) -> Result<(), SpeciationError> {
        cluster(species, organisms, ids, self.threshold, &self.distance)
    }
}

/// First-fit speciation that adjusts its threshold until the
/// number of species falls within `[min_species, max_species]`.
///
/// After each clustering pass the threshold is raised if there
/// are too many species and lowered (down to `min_threshold`) if
/// there are too few, and the organisms are clustered again from
/// the previous generation's species. The adjusted threshold is
/// kept for later generations. After `max_adjustments` passes the
/// last clustering is kept as is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DynamicThresholdSpeciator {
    pub threshold: f64,
    pub distance: DistanceConfig,
    pub min_species: usize,
    pub max_species: usize,
    pub adjustment: f64,
    pub min_threshold: f64,
    pub max_adjustments: usize,
}

impl Default for DynamicThresholdSpeciator {
    fn default() -> DynamicThresholdSpeciator {
        DynamicThresholdSpeciator {
            threshold: 3.0,
            distance: DistanceConfig::default(),
            min_species: 5,
            max_species: 15,
            adjustment: 0.3,
            min_threshold: 0.3,
            max_adjustments: 100,
        }
    }
}

impl Speciator for DynamicThresholdSpeciator {
    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn speciate(
        &mut self,
        species: &mut Vec<Specie>,
        organisms: &mut [Organism],
        ids: &mut IdAllocator,
    ) -> Result<(), SpeciationError> {
        let previous = species.clone();
        let mut adjustments = 0;
        loop {
            cluster(species, organisms, ids, self.threshold, &self.distance)?;
            let count = species.len();
            if count > self.max_species {
                self.threshold += self.adjustment;
            } else if count < self.min_species && self.threshold > self.min_threshold {
                self.threshold = (self.threshold - self.adjustment).max(self.min_threshold);
            } else {
                return Ok(());
            }
            adjustments += 1;
            debug!(
                "{} species outside [{}, {}], threshold adjusted to {:.3}",
                count, self.min_species, self.max_species, self.threshold
            );
            if adjustments >= self.max_adjustments {
                warn!(
                    "species count still {} after {} threshold adjustments",
                    count, adjustments
                );
                return Ok(());
            }
            *species = previous.clone();
        }
    }
}

fn cluster(
    species: &mut Vec<Specie>,
    organisms: &mut [Organism],
    ids: &mut IdAllocator,
    threshold: f64,
    distance: &DistanceConfig,
) -> Result<(), SpeciationError> {
    let mut index: HashMap<OrganismId, usize, RandomState> = HashMap::default();
    for (i, organism) in organisms.iter_mut().enumerate() {
        organism.set_specie(None);
        index.insert(organism.id(), i);
    }
    let mut anchors = Vec::with_capacity(species.len());
    for specie in species.iter_mut() {
        specie.clear_members();
        let representative = *index.get(&specie.representative()).ok_or(
            SpeciationError::MissingRepresentative {
                specie: specie.id(),
                representative: specie.representative(),
            },
        )?;
        anchors.push(representative);
    }

    for i in 0..organisms.len() {
        let mut assigned = anchors.iter().position(|&anchor| anchor == i);
        if assigned.is_none() {
            for (s, &anchor) in anchors.iter().enumerate() {
                if genetic_distance(&organisms[i], &organisms[anchor], distance)? < threshold {
                    assigned = Some(s);
                    break;
                }
            }
        }
        match assigned {
            Some(s) => species[s].add(&mut organisms[i]),
            None => {
                species.push(Specie::new(SpecieId(ids.next_id()), &mut organisms[i]));
                anchors.push(i);
            }
        }
    }

    let before = species.len();
    species.retain(|s| !s.is_empty());
    if species.len() < before {
        debug!("{} species left without members", before - species.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ConnectionGene, NeuronGene};
    use crate::Innovation;

    fn organism(id: u64, connections: &[(Innovation, f64)]) -> Organism {
        // Neurons 1 and 2 are shared; connection genes all join them.
        let mut genes = vec![
            Gene::from(NeuronGene::input(1, 1.0)),
            Gene::from(NeuronGene::output(2, 1.0)),
        ];
        for &(innovation, weight) in connections {
            genes.push(Gene::from(ConnectionGene::new(innovation, 1, 2, weight)));
        }
        Organism::from_genes(OrganismId(id), genes, vec![]).unwrap()
    }

    #[test]
    fn distance_counts() {
        let config = DistanceConfig {
            excess_multiplier: 1.0,
            disjoint_multiplier: 10.0,
            matched_multiplier: 100.0,
            normalize: false,
        };
        let a = organism(1, &[(3, 1.0), (4, 1.0), (6, 1.0)]);
        let b = organism(2, &[(3, 1.5), (5, 1.0), (7, 1.0), (8, 1.0)]);
        // Matched: 1, 2, 3. Disjoint: 4, 5, 6. Excess: 7, 8.
        let distance = genetic_distance(&a, &b, &config).unwrap();
        assert!((distance - (2.0 + 30.0 + 100.0 * 0.5 / 3.0)).abs() < 1e-9);
        assert_eq!(distance, genetic_distance(&b, &a, &config).unwrap());
    }

    #[test]
    fn distance_is_reflexive() {
        let a = organism(1, &[(3, 1.0), (4, -2.0)]);
        assert_eq!(genetic_distance(&a, &a, &DistanceConfig::default()).unwrap(), 0.0);
    }

    #[test]
    fn normalized_distance() {
        let config = DistanceConfig {
            normalize: true,
            ..DistanceConfig::default()
        };
        let a = organism(1, &[(3, 1.0)]);
        let b = organism(2, &[(3, 1.0), (4, 1.0), (5, 1.0), (6, 1.0)]);
        // Three excess genes over six in the larger genome.
        assert!((genetic_distance(&a, &b, &config).unwrap() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn nan_distance_is_an_error() {
        let a = organism(1, &[(3, f64::INFINITY)]);
        let b = organism(2, &[(3, f64::INFINITY)]);
        assert_eq!(
            genetic_distance(&a, &b, &DistanceConfig::default()),
            Err(SpeciationError::UndefinedDistance(OrganismId(1), OrganismId(2)))
        );
    }

    #[test]
    fn shared_neurons_match_across_disjoint_connections() {
        let config = DistanceConfig {
            excess_multiplier: 1.0,
            disjoint_multiplier: 10.0,
            matched_multiplier: 100.0,
            normalize: false,
        };
        let a = organism(1, &[(3, 1.0)]);
        let b = organism(2, &[(4, -3.0)]);
        // Matched: neurons 1 and 2, with no weight difference.
        assert_eq!(genetic_distance(&a, &b, &config), Ok(11.0));
    }

    #[test]
    fn nothing_matched_is_an_error() {
        let a = organism(1, &[]);
        let b = Organism::from_genes(
            OrganismId(2),
            vec![
                Gene::from(NeuronGene::input(5, 1.0)),
                Gene::from(NeuronGene::output(6, 1.0)),
            ],
            vec![],
        )
        .unwrap();
        assert_eq!(
            genetic_distance(&a, &b, &DistanceConfig::default()),
            Err(SpeciationError::UndefinedDistance(OrganismId(1), OrganismId(2)))
        );
    }

    #[test]
    fn first_fit_clustering() {
        let mut organisms = vec![
            organism(10, &[(3, 1.0)]),
            organism(11, &[(3, 1.5)]),
            organism(12, &[(4, 1.0), (5, 1.0), (6, 1.0), (7, 1.0)]),
            organism(13, &[(4, 1.0), (5, 1.0), (6, 1.0), (7, 2.0)]),
        ];
        let mut species = vec![];
        let mut ids = IdAllocator::resume_after(100);
        let mut speciator = CompatibilitySpeciator::default();
        speciator.speciate(&mut species, &mut organisms, &mut ids).unwrap();

        assert_eq!(species.len(), 2);
        assert_eq!(species[0].id(), SpecieId(101));
        assert_eq!(species[0].members(), &[OrganismId(10), OrganismId(11)]);
        assert_eq!(species[1].members(), &[OrganismId(12), OrganismId(13)]);
        assert_eq!(species[1].representative(), OrganismId(12));
        for (organism, expected) in organisms.iter().zip([101, 101, 102, 102]) {
            assert_eq!(organism.specie(), Some(SpecieId(expected)));
        }
    }

    #[test]
    fn representatives_anchor_existing_species() {
        let mut organisms = vec![organism(10, &[(3, 1.0)]), organism(11, &[(3, 1.0)])];
        let mut ids = IdAllocator::resume_after(100);
        let mut speciator = CompatibilitySpeciator::default();
        let mut species = vec![];
        speciator.speciate(&mut species, &mut organisms, &mut ids).unwrap();
        assert_eq!(species.len(), 1);

        // The representative arrives last, yet the specie survives.
        organisms.reverse();
        organisms.push(organism(12, &[(3, 1.0)]));
        speciator.speciate(&mut species, &mut organisms, &mut ids).unwrap();
        assert_eq!(species.len(), 1);
        assert_eq!(species[0].id(), SpecieId(101));
        assert_eq!(species[0].representative(), OrganismId(10));
        assert_eq!(species[0].members(), &[OrganismId(11), OrganismId(10), OrganismId(12)]);
    }

    #[test]
    fn missing_representative_is_an_error() {
        let mut organisms = vec![organism(10, &[])];
        let mut ids = IdAllocator::resume_after(100);
        let mut speciator = CompatibilitySpeciator::default();
        let mut species = vec![];
        speciator.speciate(&mut species, &mut organisms, &mut ids).unwrap();

        let mut replacements = vec![organism(11, &[])];
        assert_eq!(
            speciator.speciate(&mut species, &mut replacements, &mut ids),
            Err(SpeciationError::MissingRepresentative {
                specie: SpecieId(101),
                representative: OrganismId(10),
            })
        );
    }

    #[test]
    fn dynamic_threshold_converges() {
        // Every organism differs from the others by two disjoint genes.
        let mut organisms: Vec<Organism> = (0..6)
            .map(|k| organism(10 + k, &[(3 + k, 1.0)]))
            .collect();
        let mut ids = IdAllocator::resume_after(100);
        let mut speciator = DynamicThresholdSpeciator {
            threshold: 0.5,
            min_species: 1,
            max_species: 2,
            adjustment: 1.0,
            ..DynamicThresholdSpeciator::default()
        };
        let mut species = vec![];
        speciator.speciate(&mut species, &mut organisms, &mut ids).unwrap();

        assert!(species.len() <= 2);
        assert!(speciator.threshold() > 2.0);
        let assigned: usize = species.iter().map(Specie::len).sum();
        assert_eq!(assigned, organisms.len());
        assert!(organisms.iter().all(|o| o.specie().is_some()));
    }

    #[test]
    fn dynamic_threshold_gives_up() {
        let mut organisms: Vec<Organism> = (0..4)
            .map(|k| organism(10 + k, &[(3 + k, 1.0)]))
            .collect();
        let mut ids = IdAllocator::resume_after(100);
        let mut speciator = DynamicThresholdSpeciator {
            threshold: 0.5,
            min_species: 1,
            max_species: 1,
            adjustment: 0.1,
            max_adjustments: 3,
            ..DynamicThresholdSpeciator::default()
        };
        let mut species = vec![];
        speciator.speciate(&mut species, &mut organisms, &mut ids).unwrap();
        assert_eq!(species.len(), 4);
        assert!((speciator.threshold() - 0.8).abs() < 1e-9);
    }
}
