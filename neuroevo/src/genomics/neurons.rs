use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::hash::{Hash, Hasher};

/// Structural role of a neuron in an organism.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronRole {
    Input,
    Hidden,
    Output,
}

/// A neuron gene. Neurons are identified solely by their
/// innovation id: two neuron genes with the same id are
/// equal regardless of their activation response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NeuronGene {
    innovation: Innovation,
    role: NeuronRole,
    activation_response: f64,
    enabled: bool,
}

impl NeuronGene {
    /// Returns a new enabled neuron gene.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::{NeuronGene, NeuronRole};
    ///
    /// let neuron = NeuronGene::new(4, NeuronRole::Hidden, 1.0);
    /// assert_eq!(neuron.innovation(), 4);
    /// assert!(neuron.enabled());
    /// ```
    pub fn new(innovation: Innovation, role: NeuronRole, activation_response: f64) -> NeuronGene {
        NeuronGene {
            innovation,
            role,
            activation_response,
            enabled: true,
        }
    }

    /// Shorthand for a new input neuron.
    pub fn input(innovation: Innovation, activation_response: f64) -> NeuronGene {
        Self::new(innovation, NeuronRole::Input, activation_response)
    }

    /// Shorthand for a new hidden neuron.
    pub fn hidden(innovation: Innovation, activation_response: f64) -> NeuronGene {
        Self::new(innovation, NeuronRole::Hidden, activation_response)
    }

    /// Shorthand for a new output neuron.
    pub fn output(innovation: Innovation, activation_response: f64) -> NeuronGene {
        Self::new(innovation, NeuronRole::Output, activation_response)
    }

    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    pub fn role(&self) -> NeuronRole {
        self.role
    }

    /// Steepness multiplier applied to the neuron's
    /// activation function by phenotypes.
    pub fn activation_response(&self) -> f64 {
        self.activation_response
    }

    pub fn set_activation_response(&mut self, activation_response: f64) {
        self.activation_response = activation_response;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns a copy of this neuron carrying a different id.
    pub fn with_innovation(&self, innovation: Innovation) -> NeuronGene {
        NeuronGene {
            innovation,
            ..self.clone()
        }
    }
}

impl PartialEq for NeuronGene {
    fn eq(&self, other: &Self) -> bool {
        self.innovation == other.innovation
    }
}

impl Eq for NeuronGene {}

impl Hash for NeuronGene {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.innovation.hash(state);
    }
}

impl fmt::Display for NeuronGene {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Neuron({}, {:?}, response: {:.3}{})",
            self.innovation,
            self.role,
            self.activation_response,
            if self.enabled { "" } else { ", disabled" }
        )
    }
}
