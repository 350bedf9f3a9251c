use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;
use std::path::PathBuf;

/// The policy used to pick each species' representative
/// genome at the end of a generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepresentativePolicy {
    /// A uniformly random member of the species.
    Random,
    /// The species' fittest member.
    Fittest,
}

/// Periodic champion-saving configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Number of generations between checkpoints.
    pub interval: NonZeroUsize,
    /// File the champion genome is written to, overwriting
    /// any previous checkpoint.
    pub path: PathBuf,
}

/// Configuration data for population-level evolution.
///
/// # Note
/// All quantities expressing proportions or probabilities
/// should be in the range [0.0, 1.0]. Using values that are
/// not in this bound may result in odd behaviours and/or
/// incorrect programs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals in the population. Held
    /// constant across generations.
    pub size: NonZeroUsize,
    /// Compatibility-distance threshold below which a genome
    /// joins an existing species.
    pub distance_threshold: f64,
    /// Maximum number of concurrent species. When exceeded,
    /// the species with the lowest adjusted fitness are
    /// removed first.
    pub max_species: NonZeroUsize,
    /// Number of consecutive non-improving generations after
    /// which a species is removed.
    pub stagnation_threshold: NonZeroUsize,
    /// Proportion of each species' members cloned unmutated
    /// into the next generation, rounded up and capped by the
    /// species' offspring quota.
    pub elite_fraction: f64,
    /// How species representatives are reselected each generation.
    pub representative_policy: RepresentativePolicy,
    /// Periodic champion saving. `None` disables checkpointing.
    pub checkpoint: Option<CheckpointConfig>,
    /// Seed for the population's reproduction RNG. `None`
    /// seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, `None`, or in the case of
    /// `NonZeroUsize`s, 1. `representative_policy` is
    /// [`Random`].
    ///
    /// [`Random`]: RepresentativePolicy::Random
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use neurevo::populations::PopulationConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = PopulationConfig {
    ///     // Specify some values here...
    ///     size: NonZeroUsize::new(100).unwrap(),
    ///     distance_threshold: 1.5,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            // SAFETY: 1 is a valid NonZeroUsize. Replace this with
            // NonZeroUsize::new(1).unwrap() once const Option::unwrap
            // becomes stable.
            size: unsafe { NonZeroUsize::new_unchecked(1) },
            distance_threshold: 0.0,
            max_species: unsafe { NonZeroUsize::new_unchecked(1) },
            stagnation_threshold: unsafe { NonZeroUsize::new_unchecked(1) },
            elite_fraction: 0.0,
            representative_policy: RepresentativePolicy::Random,
            checkpoint: None,
            rng_seed: None,
        }
    }
}
