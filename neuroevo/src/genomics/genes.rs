use crate::genomics::NeuronGene;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::hash::{Hash, Hasher};

/// A connection gene between two neurons. It becomes
/// a weighted synapse in the organism's phenotype.
///
/// Equality is _structural and undirected_: two connection
/// genes are equal when they join the same pair of neurons,
/// in either direction, regardless of id or weight.
///
/// # Examples
/// ```
/// use neuroevo::ConnectionGene;
///
/// let forward = ConnectionGene::new(10, 1, 2, 0.5);
/// let backward = ConnectionGene::new(11, 2, 1, -3.0);
/// assert_eq!(forward, backward);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionGene {
    innovation: Innovation,
    origin: Innovation,
    endpoint: Innovation,
    weight: f64,
    enabled: bool,
}

impl ConnectionGene {
    /// Returns a new _enabled_ connection gene.
    pub fn new(
        innovation: Innovation,
        origin: Innovation,
        endpoint: Innovation,
        weight: f64,
    ) -> ConnectionGene {
        ConnectionGene {
            innovation,
            origin,
            endpoint,
            weight,
            enabled: true,
        }
    }

    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Id of the neuron the connection leaves from.
    pub fn origin(&self) -> Innovation {
        self.origin
    }

    /// Id of the neuron the connection arrives at.
    pub fn endpoint(&self) -> Innovation {
        self.endpoint
    }

    pub fn endpoints(&self) -> (Innovation, Innovation) {
        (self.origin, self.endpoint)
    }

    /// The endpoint pair with the smaller id first, shared by
    /// both orientations of the same connection.
    pub fn unordered_endpoints(&self) -> (Innovation, Innovation) {
        if self.origin <= self.endpoint {
            (self.origin, self.endpoint)
        } else {
            (self.endpoint, self.origin)
        }
    }

    /// Returns whether the gene joins `a` and `b`, in any direction.
    pub fn is_between(&self, a: Innovation, b: Innovation) -> bool {
        (self.origin == a && self.endpoint == b) || (self.origin == b && self.endpoint == a)
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns a copy of this gene carrying a different id.
    pub fn with_innovation(&self, innovation: Innovation) -> ConnectionGene {
        ConnectionGene {
            innovation,
            ..self.clone()
        }
    }
}

impl PartialEq for ConnectionGene {
    fn eq(&self, other: &Self) -> bool {
        self.unordered_endpoints() == other.unordered_endpoints()
    }
}

impl Eq for ConnectionGene {}

// Must agree with the undirected equality above.
impl Hash for ConnectionGene {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unordered_endpoints().hash(state);
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Connection({}, {} -> {}, weight: {:.3}{})",
            self.innovation,
            self.origin,
            self.endpoint,
            self.weight,
            if self.enabled { "" } else { ", disabled" }
        )
    }
}

/// Either kind of gene, as stored in the innovation registry
/// and compared during genetic distance computation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gene {
    Neuron(NeuronGene),
    Connection(ConnectionGene),
}

impl Gene {
    pub fn innovation(&self) -> Innovation {
        match self {
            Gene::Neuron(neuron) => neuron.innovation(),
            Gene::Connection(connection) => connection.innovation(),
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            Gene::Neuron(neuron) => neuron.enabled(),
            Gene::Connection(connection) => connection.enabled(),
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        match self {
            Gene::Neuron(neuron) => neuron.set_enabled(enabled),
            Gene::Connection(connection) => connection.set_enabled(enabled),
        }
    }

    pub fn with_innovation(&self, innovation: Innovation) -> Gene {
        match self {
            Gene::Neuron(neuron) => Gene::Neuron(neuron.with_innovation(innovation)),
            Gene::Connection(connection) => Gene::Connection(connection.with_innovation(innovation)),
        }
    }

    /// Returns whether two genes claiming the same id describe
    /// different structures: a different neuron role, different
    /// endpoints, or a different kind of gene altogether.
    pub(crate) fn conflicts_with(&self, other: &Gene) -> bool {
        match (self, other) {
            (Gene::Neuron(a), Gene::Neuron(b)) => a.role() != b.role(),
            (Gene::Connection(a), Gene::Connection(b)) => a != b,
            _ => true,
        }
    }
}

impl From<NeuronGene> for Gene {
    fn from(neuron: NeuronGene) -> Gene {
        Gene::Neuron(neuron)
    }
}

impl From<ConnectionGene> for Gene {
    fn from(connection: ConnectionGene) -> Gene {
        Gene::Connection(connection)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Gene::Neuron(neuron) => neuron.fmt(f),
            Gene::Connection(connection) => connection.fmt(f),
        }
    }
}
