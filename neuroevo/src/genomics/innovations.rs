use crate::genomics::{ConnectionGene, Gene, GenomicsError, IdAllocator, NeuronGene};
use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// Registry of every structural innovation of a run.
///
/// Identical structural mutations arising independently in
/// different organisms are assigned the same innovation ids:
/// a connection is identified by its directed `(origin, endpoint)`
/// pair, and the hidden neuron created by splitting a connection
/// is identified by the split connection's id.
///
/// Registry contents are never overwritten. Registering a gene
/// whose id is already present is a no-op, unless the stored gene
/// is structurally different, which is an error.
///
/// # Examples
/// ```
/// use neuroevo::{IdAllocator, Innovations};
///
/// let mut ids = IdAllocator::resume_after(10);
/// let mut innovations = Innovations::new();
///
/// let first = innovations
///     .get_or_create_connection(1, 2, &mut ids, || 0.5)
///     .unwrap()
///     .innovation();
/// let second = innovations
///     .get_or_create_connection(1, 2, &mut ids, || -2.0)
///     .unwrap()
///     .innovation();
///
/// assert_eq!(first, second);
/// assert_eq!(ids.last_issued(), 11);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(try_from = "RegistryRecord", into = "RegistryRecord")]
pub struct Innovations {
    genes: HashMap<Innovation, Gene, RandomState>,
    connections: HashMap<(Innovation, Innovation), ConnectionGene, RandomState>,
    splits: HashMap<Innovation, NeuronGene, RandomState>,
}

impl Innovations {
    /// Returns an empty registry.
    pub fn new() -> Innovations {
        Innovations::default()
    }

    /// Returns the connection gene registered for `origin -> endpoint`,
    /// creating and registering one with a fresh id and a weight drawn
    /// from `weight` if there is none yet.
    ///
    /// The returned gene is the canonical registry copy; callers
    /// should clone it and set their own weight and enabled flag.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictingInnovation`] if the freshly issued id
    /// is already registered, which means `ids` lags the registry.
    ///
    /// [`ConflictingInnovation`]: GenomicsError::ConflictingInnovation
    pub fn get_or_create_connection<F>(
        &mut self,
        origin: Innovation,
        endpoint: Innovation,
        ids: &mut IdAllocator,
        weight: F,
    ) -> Result<&ConnectionGene, GenomicsError>
    where
        F: FnOnce() -> f64,
    {
        let genes = &mut self.genes;
        match self.connections.entry((origin, endpoint)) {
            Entry::Occupied(stored) => Ok(&*stored.into_mut()),
            Entry::Vacant(slot) => {
                let innovation = ids.next_id();
                if genes.contains_key(&innovation) {
                    return Err(GenomicsError::ConflictingInnovation(innovation));
                }
                let gene = ConnectionGene::new(innovation, origin, endpoint, weight());
                genes.insert(innovation, Gene::Connection(gene.clone()));
                Ok(&*slot.insert(gene))
            }
        }
    }

    /// Returns the hidden neuron created by splitting `connection`,
    /// creating it from `neuron` with a fresh id if the connection
    /// was never split before.
    pub fn get_or_create_split_neuron<F>(
        &mut self,
        connection: Innovation,
        ids: &mut IdAllocator,
        neuron: F,
    ) -> Result<&NeuronGene, GenomicsError>
    where
        F: FnOnce(Innovation) -> NeuronGene,
    {
        let genes = &mut self.genes;
        match self.splits.entry(connection) {
            Entry::Occupied(stored) => Ok(&*stored.into_mut()),
            Entry::Vacant(slot) => {
                let created = neuron(ids.next_id());
                if genes.contains_key(&created.innovation()) {
                    return Err(GenomicsError::ConflictingInnovation(created.innovation()));
                }
                genes.insert(created.innovation(), Gene::Neuron(created.clone()));
                Ok(&*slot.insert(created))
            }
        }
    }

    /// Records `gene` under its own id.
    ///
    /// # Errors
    ///
    /// Returns [`ConflictingInnovation`] if a structurally
    /// different gene already holds the id.
    ///
    /// [`ConflictingInnovation`]: GenomicsError::ConflictingInnovation
    pub fn register(&mut self, gene: Gene) -> Result<(), GenomicsError> {
        match self.genes.entry(gene.innovation()) {
            Entry::Occupied(stored) => {
                if stored.get().conflicts_with(&gene) {
                    Err(GenomicsError::ConflictingInnovation(gene.innovation()))
                } else {
                    Ok(())
                }
            }
            Entry::Vacant(slot) => {
                if let Gene::Connection(connection) = &gene {
                    self.connections
                        .entry(connection.endpoints())
                        .or_insert_with(|| connection.clone());
                }
                slot.insert(gene);
                Ok(())
            }
        }
    }

    /// Registers every gene in `genes`, stopping at the first conflict.
    pub fn register_all<I>(&mut self, genes: I) -> Result<(), GenomicsError>
    where
        I: IntoIterator<Item = Gene>,
    {
        genes.into_iter().try_for_each(|gene| self.register(gene))
    }

    /// Returns the gene registered under `innovation`.
    pub fn gene(&self, innovation: Innovation) -> Option<&Gene> {
        self.genes.get(&innovation)
    }

    /// Returns the connection registered for `origin -> endpoint`.
    pub fn connection_between(
        &self,
        origin: Innovation,
        endpoint: Innovation,
    ) -> Option<&ConnectionGene> {
        self.connections.get(&(origin, endpoint))
    }

    /// Returns the hidden neuron that splits `connection`, if any.
    pub fn split_neuron_of(&self, connection: Innovation) -> Option<&NeuronGene> {
        self.splits.get(&connection)
    }

    /// Number of registered genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Greatest registered innovation id, or `0` if empty.
    pub fn max_innovation(&self) -> Innovation {
        self.genes.keys().copied().max().unwrap_or(0)
    }
}

/// Flat, id-ordered form of the registry, as tuple-keyed
/// maps can't be represented in most formats.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct RegistryRecord {
    genes: Vec<Gene>,
    splits: Vec<(Innovation, Innovation)>,
}

impl From<Innovations> for RegistryRecord {
    fn from(innovations: Innovations) -> RegistryRecord {
        let mut genes: Vec<Gene> = innovations.genes.into_values().collect();
        genes.sort_by_key(Gene::innovation);
        let mut splits: Vec<(Innovation, Innovation)> = innovations
            .splits
            .into_iter()
            .map(|(connection, neuron)| (connection, neuron.innovation()))
            .collect();
        splits.sort_unstable();
        RegistryRecord { genes, splits }
    }
}

impl TryFrom<RegistryRecord> for Innovations {
    type Error = GenomicsError;

    fn try_from(record: RegistryRecord) -> Result<Innovations, GenomicsError> {
        let mut innovations = Innovations::new();
        innovations.register_all(record.genes)?;
        for (connection, neuron) in record.splits {
            match innovations.gene(neuron) {
                Some(Gene::Neuron(split)) => {
                    let split = split.clone();
                    innovations.splits.insert(connection, split);
                }
                _ => return Err(GenomicsError::ConflictingInnovation(neuron)),
            }
        }
        Ok(innovations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connections_are_shared_per_direction() {
        let mut ids = IdAllocator::new();
        let mut innovations = Innovations::new();
        let forward = innovations
            .get_or_create_connection(1, 2, &mut ids, || 1.0)
            .unwrap()
            .innovation();
        let again = innovations
            .get_or_create_connection(1, 2, &mut ids, || 3.0)
            .unwrap()
            .clone();
        let backward = innovations
            .get_or_create_connection(2, 1, &mut ids, || 1.0)
            .unwrap()
            .innovation();

        assert_eq!(forward, again.innovation());
        assert_eq!(again.weight(), 1.0);
        assert_ne!(forward, backward);
        assert_eq!(innovations.len(), 2);
        assert_eq!(innovations.max_innovation(), backward);
    }

    #[test]
    fn split_neurons_are_shared() {
        let mut ids = IdAllocator::resume_after(5);
        let mut innovations = Innovations::new();
        let first = innovations
            .get_or_create_split_neuron(3, &mut ids, |id| NeuronGene::hidden(id, 1.0))
            .unwrap()
            .innovation();
        let second = innovations
            .get_or_create_split_neuron(3, &mut ids, |id| NeuronGene::hidden(id, 2.0))
            .unwrap()
            .innovation();
        assert_eq!(first, 6);
        assert_eq!(first, second);
        assert_eq!(innovations.split_neuron_of(3).map(|n| n.innovation()), Some(6));
        assert!(innovations.split_neuron_of(4).is_none());
    }

    #[test]
    fn stale_allocator_is_an_error() {
        let mut innovations = Innovations::new();
        innovations
            .register(Gene::from(ConnectionGene::new(1, 5, 4, 1.0)))
            .unwrap();
        assert_eq!(
            innovations
                .get_or_create_connection(4, 5, &mut IdAllocator::new(), || 1.0)
                .map(ConnectionGene::innovation),
            Err(GenomicsError::ConflictingInnovation(1))
        );
        assert!(innovations.connection_between(4, 5).is_none());

        assert_eq!(
            innovations
                .get_or_create_split_neuron(1, &mut IdAllocator::new(), |id| {
                    NeuronGene::hidden(id, 1.0)
                })
                .map(NeuronGene::innovation),
            Err(GenomicsError::ConflictingInnovation(1))
        );
        assert!(innovations.split_neuron_of(1).is_none());
        assert_eq!(innovations.len(), 1);
    }

    #[test]
    fn register_is_idempotent() {
        let mut innovations = Innovations::new();
        let gene = Gene::from(ConnectionGene::new(4, 1, 2, 1.0));
        innovations.register(gene.clone()).unwrap();
        innovations.register(gene).unwrap();
        assert_eq!(innovations.len(), 1);
        assert_eq!(innovations.connection_between(1, 2).unwrap().innovation(), 4);
    }

    #[test]
    fn register_rejects_conflicts() {
        let mut innovations = Innovations::new();
        innovations
            .register(Gene::from(ConnectionGene::new(4, 1, 2, 1.0)))
            .unwrap();
        assert_eq!(
            innovations.register(Gene::from(ConnectionGene::new(4, 1, 3, 1.0))),
            Err(GenomicsError::ConflictingInnovation(4))
        );
        assert_eq!(
            innovations.register(Gene::from(NeuronGene::hidden(4, 1.0))),
            Err(GenomicsError::ConflictingInnovation(4))
        );
        assert_eq!(innovations.connection_between(1, 2).unwrap().innovation(), 4);
    }

    #[test]
    fn serialization_round_trip() {
        let mut ids = IdAllocator::new();
        let mut innovations = Innovations::new();
        innovations
            .register_all([
                Gene::from(NeuronGene::input(1, 1.0)),
                Gene::from(NeuronGene::output(2, 1.0)),
            ])
            .unwrap();
        ids.observe(2);
        let connection = innovations
            .get_or_create_connection(1, 2, &mut ids, || 0.25)
            .unwrap()
            .innovation();
        innovations
            .get_or_create_split_neuron(connection, &mut ids, |id| NeuronGene::hidden(id, 1.0))
            .unwrap();

        let json = serde_json::to_string(&innovations).unwrap();
        let restored: Innovations = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.len(), innovations.len());
        assert_eq!(
            restored.connection_between(1, 2).unwrap().innovation(),
            connection
        );
        assert_eq!(
            restored.split_neuron_of(connection).unwrap().innovation(),
            innovations.split_neuron_of(connection).unwrap().innovation()
        );
        assert_eq!(restored.max_innovation(), ids.last_issued());
    }
}
