use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population evolution.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of organisms in every generation.
    pub size: NonZeroUsize,
    /// Whether species receive offspring in proportion to their
    /// share of the total fitness, instead of an even split.
    pub fitness_bias: bool,
    /// Number of generations worth of fitness scores
    /// retained by the evolver.
    pub fitness_generations: NonZeroUsize,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are false or, in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::PopulationConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = PopulationConfig {
    ///     size: NonZeroUsize::new(50).unwrap(),
    ///     ..PopulationConfig::zero()
    /// };
    /// assert!(!config.fitness_bias);
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            fitness_bias: false,
            fitness_generations: NonZeroUsize::MIN,
        }
    }
}

impl Default for PopulationConfig {
    /// 150 organisms, fitness-biased allotment,
    /// and two generations of fitness history.
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN.saturating_add(149),
            fitness_bias: true,
            fitness_generations: NonZeroUsize::MIN.saturating_add(1),
        }
    }
}
