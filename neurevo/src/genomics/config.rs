use crate::genomics::Activation;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of input nodes in a genome.
    pub input_count: NonZeroUsize,
    /// Number of output nodes in a genome.
    pub output_count: NonZeroUsize,
    /// Possible activation functions for hidden nodes
    /// created by node-addition mutations. If an empty
    /// vector is given, hidden nodes default to [`Sigmoid`].
    ///
    /// [`Sigmoid`]: crate::genomics::Activation
    pub activation_types: Vec<Activation>,
    /// Activation function of output nodes.
    pub output_activation: Activation,
    /// Mean of the normal distribution used to sample
    /// fresh weights and biases.
    pub init_mean: f64,
    /// Standard deviation of the normal distribution used
    /// to sample fresh weights and biases.
    pub init_stdev: f64,
    /// Lower clamp bound for all weights and biases.
    pub value_min: f64,
    /// Upper clamp bound for all weights and biases.
    pub value_max: f64,
    /// Chance that any given weight or bias is mutated
    /// during a mutation pass.
    pub mutation_rate: f64,
    /// Standard deviation of the Gaussian noise added to
    /// a weight or bias when it is perturbed.
    pub mutation_power: f64,
    /// Chance that a mutated weight or bias is replaced with
    /// a fresh sample from the init distribution, instead of
    /// being perturbed.
    pub replace_rate: f64,
    /// Chance that any given connection's enabled flag is
    /// flipped during a mutation pass.
    pub toggle_chance: f64,
    /// Chance of a connection-addition mutation per mutation pass.
    pub connection_addition_mutation_chance: f64,
    /// Chance of a connection-removal mutation per mutation pass.
    pub connection_removal_mutation_chance: f64,
    /// Chance of a node-addition mutation per mutation pass.
    pub node_addition_mutation_chance: f64,
    /// Chance of a node-removal mutation per mutation pass.
    pub node_removal_mutation_chance: f64,
    /// Weight of the disjoint-connection count in compatibility distance.
    pub disjoint_factor: f64,
    /// Weight of the common-connection weight difference in
    /// compatibility distance.
    pub weight_factor: f64,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1. `output_activation` is
    /// [`Identity`].
    ///
    /// [`Identity`]: crate::genomics::Activation
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::GeneticConfig;
    ///
    /// let cfg1 = GeneticConfig::zero();
    ///
    /// let cfg2 = GeneticConfig {
    ///     // Specify some values here...
    ///     mutation_rate: 0.8,
    ///     replace_rate: 0.1,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            // SAFETY: 1 is a valid NonZeroUsize. Replace this with
            // NonZeroUsize::new(1).unwrap() once const Option::unwrap
            // becomes stable.
            input_count: unsafe { NonZeroUsize::new_unchecked(1) },
            output_count: unsafe { NonZeroUsize::new_unchecked(1) },
            activation_types: vec![],
            output_activation: Activation::Identity,
            init_mean: 0.0,
            init_stdev: 0.0,
            value_min: 0.0,
            value_max: 0.0,
            mutation_rate: 0.0,
            mutation_power: 0.0,
            replace_rate: 0.0,
            toggle_chance: 0.0,
            connection_addition_mutation_chance: 0.0,
            connection_removal_mutation_chance: 0.0,
            node_addition_mutation_chance: 0.0,
            node_removal_mutation_chance: 0.0,
            disjoint_factor: 0.0,
            weight_factor: 0.0,
        }
    }

    /// Clamps a weight or bias into `[value_min, value_max]`.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::GeneticConfig;
    ///
    /// let config = GeneticConfig {
    ///     value_min: -1.0,
    ///     value_max: 1.0,
    ///     ..GeneticConfig::zero()
    /// };
    ///
    /// assert_eq!(config.clamp(3.0), 1.0);
    /// assert_eq!(config.clamp(-3.0), -1.0);
    /// assert_eq!(config.clamp(0.5), 0.5);
    /// ```
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.value_min, self.value_max)
    }

    /// Samples a fresh weight or bias from the configured
    /// init distribution, clamped into `[value_min, value_max]`.
    pub fn sample_init(&self, rng: &mut impl Rng) -> f64 {
        let dist = Normal::new(self.init_mean, self.init_stdev)
            .unwrap_or_else(|_| panic!("invalid init distribution stdev {}", self.init_stdev));
        self.clamp(dist.sample(rng))
    }

    /// Perturbs a weight or bias with Gaussian noise of
    /// [`mutation_power`], clamping the result into
    /// `[value_min, value_max]`.
    ///
    /// [`mutation_power`]: GeneticConfig::mutation_power
    pub fn perturb(&self, rng: &mut impl Rng, value: f64) -> f64 {
        let dist = Normal::new(0.0, self.mutation_power)
            .unwrap_or_else(|_| panic!("invalid mutation power {}", self.mutation_power));
        self.clamp(value + dist.sample(rng))
    }
}
