//! A `RealTimeNetwork` is a near-isomorphism of an organism,
//! generated as its phenotype, with disabled genes being
//! ignored. Connection genes are converted into weighted
//! links, and neuron genes into network nodes.

use neuroevo::{BoxError, Innovation, NeuronRole, Organism, PhenotypeBuilder};

use ahash::RandomState;

use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Link {
    output: usize,
    weight: f64,
}

/// An arbitrarily-structured neural network.
#[derive(Clone, Debug)]
pub struct RealTimeNetwork {
    input_count: usize,
    output_count: usize,
    node_ids: Box<[Innovation]>,
    input_sums: Box<[f64]>,
    activation_levels: Box<[f64]>,
    activation_responses: Box<[f64]>,
    links: Box<[Box<[Link]>]>,
}

impl RealTimeNetwork {
    /// Generates a new network from the passed organism.
    pub fn new(organism: &Organism) -> RealTimeNetwork {
        let mut input_nodes = vec![];
        let mut output_nodes = vec![];
        let mut hidden_nodes = vec![];

        for neuron in organism.neurons().filter(|n| n.enabled()) {
            match neuron.role() {
                NeuronRole::Input => &mut input_nodes,
                NeuronRole::Output => &mut output_nodes,
                NeuronRole::Hidden => &mut hidden_nodes,
            }
            .push((neuron.innovation(), neuron.activation_response()));
        }
        input_nodes.sort_unstable_by_key(|(id, _)| *id);
        output_nodes.sort_unstable_by_key(|(id, _)| *id);
        hidden_nodes.sort_unstable_by_key(|(id, _)| *id);
        let (node_ids, activation_responses): (Vec<_>, Vec<_>) = input_nodes
            .iter()
            .chain(&output_nodes)
            .chain(&hidden_nodes)
            .copied()
            .unzip();

        let node_index_from_id: HashMap<Innovation, usize, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();
        let mut links = vec![vec![]; node_ids.len()];
        for connection in organism.connections().filter(|c| c.enabled()) {
            // Connections to disabled neurons carry no signal.
            if let (Some(&from), Some(&to)) = (
                node_index_from_id.get(&connection.origin()),
                node_index_from_id.get(&connection.endpoint()),
            ) {
                links[from].push(Link {
                    output: to,
                    weight: connection.weight(),
                });
            }
        }

        RealTimeNetwork {
            input_count: input_nodes.len(),
            output_count: output_nodes.len(),
            input_sums: vec![0.0; node_ids.len()].into(),
            activation_levels: vec![0.0; node_ids.len()].into(),
            node_ids: node_ids.into(),
            activation_responses: activation_responses.into(),
            links: links.into_iter().map(|v| v.into()).collect(),
        }
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Fires all nodes, propagating all activations
    /// (including set inputs), and then computing
    /// new activation levels.
    pub fn activate(&mut self) {
        self.fire_nodes();
        self.compute_activations();
    }

    fn fire_nodes(&mut self) {
        for (activation, links) in self.activation_levels.iter().zip(self.links.iter()) {
            for link in links.iter() {
                self.input_sums[link.output] += *activation * link.weight;
            }
        }
    }

    fn compute_activations(&mut self) {
        for ((input_sum, activation_level), response) in self.input_sums[self.input_count..]
            .iter_mut()
            .zip(&mut self.activation_levels[self.input_count..])
            .zip(&self.activation_responses[self.input_count..])
        {
            *activation_level = sigmoid(*input_sum, *response);
            *input_sum = 0.0;
        }
    }

    /// Clears the activation state of all nodes.
    pub fn clear_state(&mut self) {
        for (input_sum, activation) in self
            .input_sums
            .iter_mut()
            .zip(self.activation_levels.iter_mut())
        {
            *input_sum = 0.0;
            *activation = 0.0;
        }
    }

    /// Sets the activation level of each input node
    /// to the corresponding value in the passed slice.
    ///
    /// # Panics
    /// Panics if the length of the passed slice is not
    /// equal to the number of inputs in the network.
    pub fn set_inputs(&mut self, values: &[f64]) {
        self.activation_levels[..self.input_count].copy_from_slice(values);
    }

    /// Returns the current output node activation levels.
    pub fn outputs(&self) -> Vec<f64> {
        self.activation_levels[self.input_count..self.input_count + self.output_count].to_vec()
    }

    /// Clears the network, then activates it with `inputs` often
    /// enough for a signal to cross every hidden node once.
    pub fn evaluate_at(&mut self, inputs: &[f64]) -> Vec<f64> {
        self.clear_state();
        self.set_inputs(inputs);
        let depth = self.node_ids.len() - self.input_count - self.output_count + 1;
        for _ in 0..depth {
            self.activate();
        }
        self.outputs()
    }
}

/// Steepened sigmoid, scaled by the neuron's activation response.
fn sigmoid(input_sum: f64, response: f64) -> f64 {
    1.0 / (1.0 + (-4.9 * response * input_sum).exp())
}

impl fmt::Display for RealTimeNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}

/// Builds a [`RealTimeNetwork`] for every organism.
#[derive(Clone, Copy, Debug, Default)]
pub struct NetworkBuilder;

impl PhenotypeBuilder for NetworkBuilder {
    type Network = RealTimeNetwork;

    fn build_network(&self, organism: &Organism) -> Result<RealTimeNetwork, BoxError> {
        Ok(RealTimeNetwork::new(organism))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroevo::{ConnectionGene, Gene, NeuronGene, OrganismId};

    fn organism(genes: Vec<Gene>) -> Organism {
        Organism::from_genes(OrganismId(100), genes, vec![]).unwrap()
    }

    fn plain(x: f64) -> f64 {
        sigmoid(x, 1.0)
    }

    #[test]
    fn from() {
        let mut disabled = ConnectionGene::new(8, 1, 3, -1.0);
        disabled.set_enabled(false);
        let network = RealTimeNetwork::new(&organism(vec![
            NeuronGene::input(1, 1.0).into(),
            NeuronGene::input(2, 1.0).into(),
            NeuronGene::output(3, 0.5).into(),
            NeuronGene::hidden(4, 2.0).into(),
            ConnectionGene::new(5, 1, 4, 1.0).into(),
            ConnectionGene::new(6, 4, 3, 2.5).into(),
            ConnectionGene::new(7, 2, 4, -2.0).into(),
            disabled.into(),
        ]));

        assert_eq!(network.input_count, 2);
        assert_eq!(network.output_count, 1);
        assert_eq!(&*network.node_ids, &[1, 2, 3, 4]);
        assert_eq!(&*network.activation_responses, &[1.0, 1.0, 0.5, 2.0]);
        assert_eq!(&*network.links[0], &[Link { output: 3, weight: 1.0 }]);
        assert_eq!(&*network.links[1], &[Link { output: 3, weight: -2.0 }]);
        assert_eq!(&*network.links[3], &[Link { output: 2, weight: 2.5 }]);
    }

    #[test]
    fn activate_single() {
        let mut network = RealTimeNetwork::new(&organism(vec![
            NeuronGene::input(1, 1.0).into(),
            NeuronGene::output(2, 1.0).into(),
            ConnectionGene::new(3, 1, 2, 1.0).into(),
        ]));
        for input in -20..=20 {
            let input = input as f64 / 10.0;
            network.clear_state();
            network.set_inputs(&[input]);
            network.activate();
            assert_eq!(network.outputs()[0], plain(input));
        }
    }

    #[test]
    fn activate_double() {
        let mut network = RealTimeNetwork::new(&organism(vec![
            NeuronGene::input(1, 1.0).into(),
            NeuronGene::output(2, 1.0).into(),
            NeuronGene::hidden(3, 1.0).into(),
            ConnectionGene::new(4, 1, 3, 1.0).into(),
            ConnectionGene::new(5, 3, 2, 1.0).into(),
        ]));
        for input in -20..=20 {
            let input = input as f64 / 10.0;
            assert_eq!(network.evaluate_at(&[input])[0], plain(plain(input)));
        }
    }

    #[test]
    fn activation_response_steepens() {
        let mut network = RealTimeNetwork::new(&organism(vec![
            NeuronGene::input(1, 1.0).into(),
            NeuronGene::output(2, 2.0).into(),
            ConnectionGene::new(3, 1, 2, 1.0).into(),
        ]));
        assert_eq!(network.evaluate_at(&[0.5])[0], plain(1.0));
    }
}
