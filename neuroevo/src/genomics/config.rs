use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for the initial population's genomes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of input neurons in every organism.
    pub input_count: NonZeroUsize,
    /// Number of output neurons in every organism.
    pub output_count: NonZeroUsize,
    /// Maximum magnitude of the random weights
    /// given to the initial connections.
    pub weight_bound: f64,
    /// Activation response of the initial input
    /// and output neurons.
    pub activation_response: f64,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration:
    /// a single input and output, and all numeric
    /// values set to 0.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::GeneticConfig;
    ///
    /// let config = GeneticConfig::zero();
    /// assert_eq!(config.input_count.get(), 1);
    /// assert_eq!(config.weight_bound, 0.0);
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            weight_bound: 0.0,
            activation_response: 0.0,
        }
    }
}

impl Default for GeneticConfig {
    fn default() -> GeneticConfig {
        GeneticConfig {
            weight_bound: 5.0,
            activation_response: 1.0,
            ..GeneticConfig::zero()
        }
    }
}
