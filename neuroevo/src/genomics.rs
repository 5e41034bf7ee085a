//! Organism genotypes and the genes that compose them.

mod config;
mod errors;
mod genes;
mod ids;
mod innovations;
mod neurons;

pub use config::*;
pub use errors::*;
pub use genes::*;
pub use ids::*;
pub use innovations::*;
pub use neurons::*;

use crate::populations::SpecieId;
use crate::rng::gen_symmetric;
use crate::Innovation;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

/// Organism identifier, unique within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OrganismId(pub u64);

impl fmt::Display for OrganismId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The genotype of a single neural network.
///
/// Neurons are kept in three id-ordered collections by role,
/// and connections in a fourth. An organism always has at least
/// one input and one output neuron, never holds two genes with
/// the same id, and every connection joins two of its own neurons.
///
/// Organisms also remember the specie they currently belong to
/// and the ids of the organisms they were derived from.
///
/// Organisms are serialized as a flat gene list, and rebuilt
/// through [`Organism::from_genes`] when deserialized, so
/// stored organisms breaking these invariants are rejected.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "OrganismRecord", into = "OrganismRecord")]
pub struct Organism {
    id: OrganismId,
    inputs: BTreeMap<Innovation, NeuronGene>,
    hidden: BTreeMap<Innovation, NeuronGene>,
    outputs: BTreeMap<Innovation, NeuronGene>,
    connections: BTreeMap<Innovation, ConnectionGene>,
    specie: Option<SpecieId>,
    ancestry: Vec<OrganismId>,
}

impl Organism {
    /// Creates an organism connecting every neuron in `inputs` to
    /// every neuron in `outputs`. Connection ids come from the
    /// registry, while each connection gets its own random weight
    /// in `±weight_bound`.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::{IdAllocator, Innovations, NeuronGene, Organism, OrganismId};
    /// use rand::SeedableRng;
    /// use rand_chacha::ChaCha8Rng;
    ///
    /// let inputs = [NeuronGene::input(1, 1.0), NeuronGene::input(2, 1.0)];
    /// let outputs = [NeuronGene::output(3, 1.0)];
    /// let mut ids = IdAllocator::resume_after(3);
    /// let mut innovations = Innovations::new();
    /// let mut rng = ChaCha8Rng::seed_from_u64(0);
    ///
    /// let organism = Organism::fully_connected(
    ///     OrganismId(100),
    ///     &inputs,
    ///     &outputs,
    ///     &mut innovations,
    ///     &mut ids,
    ///     5.0,
    ///     &mut rng,
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(organism.connection_count(), 2);
    /// assert!(organism.connects(1, 3));
    /// assert!(organism.connects(3, 2));
    /// ```
    pub fn fully_connected(
        id: OrganismId,
        inputs: &[NeuronGene],
        outputs: &[NeuronGene],
        innovations: &mut Innovations,
        ids: &mut IdAllocator,
        weight_bound: f64,
        rng: &mut dyn RngCore,
    ) -> Result<Organism, GenomicsError> {
        let mut genes: Vec<Gene> = inputs
            .iter()
            .chain(outputs)
            .cloned()
            .map(Gene::Neuron)
            .collect();
        for input in inputs {
            for output in outputs {
                let weight = gen_symmetric(rng, weight_bound);
                let mut connection = innovations
                    .get_or_create_connection(
                        input.innovation(),
                        output.innovation(),
                        ids,
                        || weight,
                    )?
                    .clone();
                connection.set_weight(weight);
                connection.set_enabled(true);
                genes.push(Gene::Connection(connection));
            }
        }
        Organism::from_genes(id, genes, vec![])
    }

    /// Assembles an organism from a list of genes.
    ///
    /// # Errors
    ///
    /// Fails if two genes share an id, if there are no input or
    /// no output neurons, or if a connection references a neuron
    /// which is not among the genes.
    pub fn from_genes<I>(
        id: OrganismId,
        genes: I,
        ancestry: Vec<OrganismId>,
    ) -> Result<Organism, GenomicsError>
    where
        I: IntoIterator<Item = Gene>,
    {
        let mut organism = Organism {
            id,
            inputs: BTreeMap::new(),
            hidden: BTreeMap::new(),
            outputs: BTreeMap::new(),
            connections: BTreeMap::new(),
            specie: None,
            ancestry,
        };
        let mut connections = vec![];
        for gene in genes {
            match gene {
                Gene::Neuron(neuron) => organism.insert_neuron(neuron)?,
                Gene::Connection(connection) => connections.push(connection),
            }
        }
        for connection in connections {
            organism.add_connection(connection)?;
        }
        organism.validate()?;
        Ok(organism)
    }

    /// Returns a copy of this organism under a new id, with no
    /// specie and the given ancestry.
    pub fn offspring(&self, id: OrganismId, ancestry: Vec<OrganismId>) -> Organism {
        Organism {
            id,
            specie: None,
            ancestry,
            ..self.clone()
        }
    }

    /// Checks the organism's structural invariants.
    pub fn validate(&self) -> Result<(), GenomicsError> {
        if self.inputs.is_empty() {
            return Err(GenomicsError::MissingInputs(self.id));
        }
        if self.outputs.is_empty() {
            return Err(GenomicsError::MissingOutputs(self.id));
        }
        for connection in self.connections.values() {
            self.check_endpoints(connection)?;
        }
        Ok(())
    }

    pub fn id(&self) -> OrganismId {
        self.id
    }

    /// The specie the organism is currently assigned to.
    pub fn specie(&self) -> Option<SpecieId> {
        self.specie
    }

    pub(crate) fn set_specie(&mut self, specie: Option<SpecieId>) {
        self.specie = specie;
    }

    /// Ids of the organisms this one was derived from:
    /// empty for initial organisms, one parent for clones,
    /// and `[mother, father]` for crossover offspring.
    pub fn ancestry(&self) -> &[OrganismId] {
        &self.ancestry
    }

    pub fn inputs(&self) -> impl Iterator<Item = &NeuronGene> {
        self.inputs.values()
    }

    pub fn hidden(&self) -> impl Iterator<Item = &NeuronGene> {
        self.hidden.values()
    }

    pub fn outputs(&self) -> impl Iterator<Item = &NeuronGene> {
        self.outputs.values()
    }

    /// All neurons: inputs, then hidden, then outputs,
    /// each group in id order.
    pub fn neurons(&self) -> impl Iterator<Item = &NeuronGene> {
        self.inputs().chain(self.hidden()).chain(self.outputs())
    }

    /// Connections in id order.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    pub(crate) fn connections_mut(&mut self) -> impl Iterator<Item = &mut ConnectionGene> {
        self.connections.values_mut()
    }

    pub fn neuron(&self, innovation: Innovation) -> Option<&NeuronGene> {
        self.inputs
            .get(&innovation)
            .or_else(|| self.hidden.get(&innovation))
            .or_else(|| self.outputs.get(&innovation))
    }

    pub(crate) fn neuron_mut(&mut self, innovation: Innovation) -> Option<&mut NeuronGene> {
        if let Some(neuron) = self.inputs.get_mut(&innovation) {
            return Some(neuron);
        }
        if let Some(neuron) = self.hidden.get_mut(&innovation) {
            return Some(neuron);
        }
        self.outputs.get_mut(&innovation)
    }

    pub fn connection(&self, innovation: Innovation) -> Option<&ConnectionGene> {
        self.connections.get(&innovation)
    }

    pub(crate) fn connection_mut(&mut self, innovation: Innovation) -> Option<&mut ConnectionGene> {
        self.connections.get_mut(&innovation)
    }

    pub fn contains_neuron(&self, innovation: Innovation) -> bool {
        self.neuron(innovation).is_some()
    }

    pub fn contains_gene(&self, innovation: Innovation) -> bool {
        self.contains_neuron(innovation) || self.connections.contains_key(&innovation)
    }

    /// Returns whether any connection, enabled or not,
    /// joins `a` and `b` in either direction.
    pub fn connects(&self, a: Innovation, b: Innovation) -> bool {
        self.connections().any(|c| c.is_between(a, b))
    }

    pub fn neuron_count(&self) -> usize {
        self.inputs.len() + self.hidden.len() + self.outputs.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of genes of either kind.
    pub fn gene_count(&self) -> usize {
        self.neuron_count() + self.connection_count()
    }

    /// Copies of every gene, in id order.
    pub fn genes(&self) -> Vec<Gene> {
        let mut genes: Vec<Gene> = self
            .neurons()
            .cloned()
            .map(Gene::Neuron)
            .chain(self.connections().cloned().map(Gene::Connection))
            .collect();
        genes.sort_by_key(Gene::innovation);
        genes
    }

    /// Adds a neuron gene.
    pub fn add_neuron(&mut self, neuron: NeuronGene) -> Result<&NeuronGene, GenomicsError> {
        let innovation = neuron.innovation();
        self.insert_neuron(neuron)?;
        self.neuron(innovation)
            .ok_or(GenomicsError::DuplicateGene(self.id, innovation))
    }

    /// Adds a connection gene between two neurons
    /// already present in the organism.
    pub fn add_connection(
        &mut self,
        connection: ConnectionGene,
    ) -> Result<&ConnectionGene, GenomicsError> {
        let innovation = connection.innovation();
        if self.contains_gene(innovation) {
            return Err(GenomicsError::DuplicateGene(self.id, innovation));
        }
        self.check_endpoints(&connection)?;
        Ok(self.connections.entry(innovation).or_insert(connection))
    }

    fn insert_neuron(&mut self, neuron: NeuronGene) -> Result<(), GenomicsError> {
        let innovation = neuron.innovation();
        if self.contains_gene(innovation) {
            return Err(GenomicsError::DuplicateGene(self.id, innovation));
        }
        let group = match neuron.role() {
            NeuronRole::Input => &mut self.inputs,
            NeuronRole::Hidden => &mut self.hidden,
            NeuronRole::Output => &mut self.outputs,
        };
        group.insert(innovation, neuron);
        Ok(())
    }

    fn check_endpoints(&self, connection: &ConnectionGene) -> Result<(), GenomicsError> {
        for neuron in [connection.origin(), connection.endpoint()] {
            if !self.contains_neuron(neuron) {
                return Err(GenomicsError::DanglingConnection {
                    organism: self.id,
                    connection: connection.innovation(),
                    neuron,
                });
            }
        }
        Ok(())
    }
}

/// Stored form of an organism.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct OrganismRecord {
    id: OrganismId,
    genes: Vec<Gene>,
    specie: Option<SpecieId>,
    ancestry: Vec<OrganismId>,
}

impl From<Organism> for OrganismRecord {
    fn from(organism: Organism) -> OrganismRecord {
        OrganismRecord {
            genes: organism.genes(),
            id: organism.id,
            specie: organism.specie,
            ancestry: organism.ancestry,
        }
    }
}

impl TryFrom<OrganismRecord> for Organism {
    type Error = GenomicsError;

    fn try_from(record: OrganismRecord) -> Result<Organism, GenomicsError> {
        let mut organism = Organism::from_genes(record.id, record.genes, record.ancestry)?;
        organism.specie = record.specie;
        Ok(organism)
    }
}

impl fmt::Display for Organism {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Organism {} {{", self.id)?;
        if let Some(specie) = self.specie {
            writeln!(f, "\tspecie: {}", specie)?;
        }
        writeln!(f, "\tneurons: [")?;
        for neuron in self.neurons() {
            writeln!(f, "\t\t{}", neuron)?;
        }
        writeln!(f, "\t]")?;
        writeln!(f, "\tconnections: [")?;
        for connection in self.connections() {
            writeln!(f, "\t\t{}", connection)?;
        }
        writeln!(f, "\t]")?;
        write!(f, "}}")
    }
}
