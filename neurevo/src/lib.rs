//! Evolution of neural-network topology and weights, without
//! gradient descent: genomes are mutable directed acyclic graphs
//! that are mutated, crossed over and selected across generations.
//!
//! The crate is split into two halves:
//! - [`genomics`] holds the evolvable network graph ([`Genome`]),
//!   its mutations, crossover, compatibility distance and binary
//!   persistence.
//! - [`populations`] holds the generational engine: individuals
//!   bound to an [`Environment`], speciation, reproduction and
//!   checkpointing.
//!
//! Fitness comes from user-supplied [`Environment`]s, which score a
//! genome over one or more trials. Evaluation runs in parallel; all
//! other phases are sequential and drive a single seedable generator,
//! so runs can be reproduced by fixing [`PopulationConfig::rng_seed`].
//!
//! [`Genome`]: crate::genomics::Genome
//! [`PopulationConfig::rng_seed`]: crate::populations::PopulationConfig::rng_seed
//!
//! # Example usage: evolving a constant-zero approximator
//! ```
//! use neurevo::genomics::{Activation, GeneticConfig, Genome};
//! use neurevo::populations::{Population, PopulationConfig};
//! use neurevo::Environment;
//! use std::num::NonZeroUsize;
//!
//! struct ZeroTask;
//!
//! impl Environment for ZeroTask {
//!     fn evaluate(&mut self, controller: &Genome) -> f64 {
//!         let outputs = controller.evaluate(&[1.0, -1.0]).unwrap();
//!         1.0 / (1.0 + outputs[0].abs())
//!     }
//! }
//!
//! let genetic_config = GeneticConfig {
//!     input_count: NonZeroUsize::new(2).unwrap(),
//!     output_count: NonZeroUsize::new(1).unwrap(),
//!     activation_types: vec![Activation::Tanh],
//!     output_activation: Activation::Identity,
//!     init_stdev: 1.0,
//!     value_min: -5.0,
//!     value_max: 5.0,
//!     mutation_rate: 0.3,
//!     mutation_power: 0.5,
//!     replace_rate: 0.1,
//!     disjoint_factor: 1.0,
//!     ..GeneticConfig::zero()
//! };
//! let population_config = PopulationConfig {
//!     size: NonZeroUsize::new(20).unwrap(),
//!     distance_threshold: 1.0,
//!     max_species: NonZeroUsize::new(5).unwrap(),
//!     stagnation_threshold: NonZeroUsize::new(10).unwrap(),
//!     elite_fraction: 0.1,
//!     rng_seed: Some(42),
//!     ..PopulationConfig::zero()
//! };
//!
//! let mut population = Population::new(population_config, genetic_config, || ZeroTask);
//! for _ in 0..5 {
//!     population.evaluate_fitness();
//!     population.evolve().unwrap();
//! }
//! assert!(population.fittest().fitness() > 0.0);
//! ```

pub mod genomics;
pub mod populations;

mod environment;
mod rng;

pub use environment::{argmax, Environment};
pub use rng::EmptyCollectionError;

/// Identifier of a node within a genome. Assigned monotonically
/// by the owning genome and never reused.
pub type NodeId = u32;
