//! A population hosts and evolves a collection of genomes,
//! clustered into species by compatibility distance.
//!
//! Each generation runs in two phases: a parallel evaluation
//! phase, in which every individual is scored against its own
//! environment instance with no shared mutable state, and a
//! sequential evolution phase, in which speciation and
//! reproduction draw from a single reproduction RNG. Seeding
//! that RNG makes the evolution phase reproducible; perfect
//! bit-reproducibility of whole runs is not a goal.

mod config;
mod errors;
mod individual;
pub mod logging;
mod species;

pub use config::{CheckpointConfig, PopulationConfig, RepresentativePolicy};
pub use errors::EvolutionError;
pub use individual::Individual;
pub use species::{Species, SpeciesID};

use crate::genomics::{GeneticConfig, Genome};
use crate::rng::{choose_uniform, choose_weighted};
use crate::Environment;

use rand::prelude::{IteratorRandom, SeedableRng};
use rand::rngs::StdRng;
use rayon::prelude::*;

use std::fs::File;
use std::io::{BufWriter, Write};

/// A population of genomes, clustered into species and paired
/// one-to-one with fitness-evaluation environments built by the
/// population's environment factory.
///
/// # Examples
/// ```
/// use neurevo::genomics::{GeneticConfig, Genome};
/// use neurevo::populations::{Population, PopulationConfig};
/// use neurevo::Environment;
/// use std::num::NonZeroUsize;
///
/// struct WideGenomesFavoured;
///
/// impl Environment for WideGenomesFavoured {
///     fn evaluate(&mut self, genome: &Genome) -> f64 {
///         genome.connections().filter(|c| c.enabled()).count() as f64
///     }
/// }
///
/// let population_config = PopulationConfig {
///     size: NonZeroUsize::new(20).unwrap(),
///     distance_threshold: 1.0,
///     max_species: NonZeroUsize::new(4).unwrap(),
///     stagnation_threshold: NonZeroUsize::new(10).unwrap(),
///     elite_fraction: 0.1,
///     rng_seed: Some(42),
///     ..PopulationConfig::zero()
/// };
/// let genetic_config = GeneticConfig {
///     input_count: NonZeroUsize::new(2).unwrap(),
///     output_count: NonZeroUsize::new(1).unwrap(),
///     init_stdev: 1.0,
///     value_min: -3.0,
///     value_max: 3.0,
///     mutation_rate: 0.5,
///     mutation_power: 0.3,
///     connection_addition_mutation_chance: 0.1,
///     ..GeneticConfig::zero()
/// };
///
/// let mut population = Population::new(population_config, genetic_config, || WideGenomesFavoured);
///
/// for _ in 0..10 {
///     population.evaluate_fitness();
///     population.evolve().unwrap();
/// }
///
/// assert_eq!(population.generation(), 10);
/// assert_eq!(population.genomes().count(), 20);
/// ```
pub struct Population<E, F> {
    individuals: Vec<Individual<E>>,
    species: Vec<Species>,
    generation: usize,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
    environment_factory: F,
    rng: StdRng,
}

impl<E, F> Population<E, F>
where
    E: Environment,
    F: Fn() -> E,
{
    /// Creates a new population of randomly generated genomes,
    /// each paired with a fresh environment instance from
    /// `environment_factory`.
    pub fn new(
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        environment_factory: F,
    ) -> Population<E, F> {
        let mut rng = Self::seeded_rng(&population_config);
        let individuals = (0..population_config.size.get())
            .map(|_| {
                Individual::new(
                    Genome::new(&genetic_config, &mut rng),
                    environment_factory(),
                )
            })
            .collect();

        Population {
            individuals,
            species: Vec::new(),
            generation: 0,
            population_config,
            genetic_config,
            environment_factory,
            rng,
        }
    }

    /// Creates a new population seeded with the passed genomes,
    /// filling any remainder with randomly generated ones.
    ///
    /// Returns `None` if more genomes are passed than the
    /// configured population size, or if any genome's input or
    /// output count disagrees with the genetic configuration.
    pub fn with_genomes(
        genomes: Vec<Genome>,
        population_config: PopulationConfig,
        genetic_config: GeneticConfig,
        environment_factory: F,
    ) -> Option<Population<E, F>> {
        if genomes.len() > population_config.size.get() {
            return None;
        }
        if !genomes.iter().all(|g| g.conforms_to(&genetic_config)) {
            return None;
        }

        let mut rng = Self::seeded_rng(&population_config);
        let remainder = population_config.size.get() - genomes.len();
        let individuals = genomes
            .into_iter()
            .chain((0..remainder).map(|_| Genome::new(&genetic_config, &mut rng)))
            .map(|genome| Individual::new(genome, environment_factory()))
            .collect();

        Some(Population {
            individuals,
            species: Vec::new(),
            generation: 0,
            population_config,
            genetic_config,
            environment_factory,
            rng,
        })
    }

    fn seeded_rng(population_config: &PopulationConfig) -> StdRng {
        match population_config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Evaluates every individual's fitness against its own
    /// environment instance, in parallel. Each genome's fitness
    /// is reset before scoring, so nothing carries over from
    /// earlier generations.
    pub fn evaluate_fitness(&mut self) {
        self.individuals
            .par_iter_mut()
            .for_each(Individual::evaluate);
    }

    /// Advances the population by one generation: respeciates
    /// the current individuals, breeds the next generation,
    /// writes a champion checkpoint if one is due, and reselects
    /// species representatives.
    ///
    /// Current fitnesses are read throughout; call
    /// [`evaluate_fitness`] first.
    ///
    /// # Errors
    /// Returns an error if a due champion checkpoint cannot be
    /// written, or if reproduction finds no individuals to draw
    /// parents from.
    ///
    /// [`evaluate_fitness`]: Population::evaluate_fitness
    pub fn evolve(&mut self) -> Result<(), EvolutionError> {
        let fitnesses: Vec<f64> = self.individuals.iter().map(Individual::fitness).collect();

        self.speciate(&fitnesses);
        let offspring = self.reproduce(&fitnesses)?;
        self.checkpoint()?;
        self.reselect_representatives(&fitnesses);

        self.individuals = offspring
            .into_iter()
            .map(|genome| Individual::new(genome, (self.environment_factory)()))
            .collect();
        self.generation += 1;

        Ok(())
    }

    /// Reclusters the current individuals around the existing
    /// species' representatives: each genome joins the first
    /// species whose representative lies within the distance
    /// threshold, or founds a new species with itself as
    /// representative. Stagnant and empty species are then
    /// removed, and the species count is capped by removing the
    /// lowest-adjusted-fitness species first.
    fn speciate(&mut self, fitnesses: &[f64]) {
        for species in &mut self.species {
            species.clear_members();
        }

        let mut founded = 0;
        for index in 0..self.individuals.len() {
            let genome = self.individuals[index].genome();
            let home = self.species.iter_mut().find(|species| {
                species
                    .representative()
                    .compatibility_distance(genome, &self.genetic_config)
                    < self.population_config.distance_threshold
            });
            match home {
                Some(species) => species.add_member(index),
                None => {
                    let id = SpeciesID(self.generation, founded);
                    let mut species = Species::new(id, genome.clone());
                    species.add_member(index);
                    self.species.push(species);
                    founded += 1;
                }
            }
        }

        for species in &mut self.species {
            if !species.is_empty() {
                let best = species.best_fitness(fitnesses);
                species.record_generation(best);
            }
        }

        let stagnation_threshold = self.population_config.stagnation_threshold.get();
        self.species
            .retain(|species| !species.is_empty() && species.time_stagnated() <= stagnation_threshold);

        if self.species.len() > self.population_config.max_species.get() {
            self.species.sort_unstable_by(|a, b| {
                b.total_adjusted_fitness(fitnesses)
                    .partial_cmp(&a.total_adjusted_fitness(fitnesses))
                    .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
            });
            self.species.truncate(self.population_config.max_species.get());
            self.species.sort_unstable_by_key(Species::id);
        }
    }

    /// Breeds the next generation's genomes. Each species
    /// receives an offspring quota proportional to its share of
    /// the population's total adjusted fitness; quotas are
    /// filled first by cloning the species' elite unmutated,
    /// then by mutated crossover of fitness-weighted parent
    /// pairs. Any shortfall (all-zero fitnesses, rounding, every
    /// species extinct) is topped up with mutated clones of
    /// random current individuals.
    fn reproduce(&mut self, fitnesses: &[f64]) -> Result<Vec<Genome>, EvolutionError> {
        let size = self.population_config.size.get();
        let mut offspring = Vec::with_capacity(size);

        let adjusted: Vec<f64> = self
            .species
            .iter()
            .map(|species| species.total_adjusted_fitness(fitnesses))
            .collect();
        let adjusted_sum: f64 = adjusted.iter().sum();

        if adjusted_sum > 0.0 {
            let shares: Vec<f64> = adjusted
                .iter()
                .map(|fitness| fitness / adjusted_sum * size as f64)
                .collect();
            let quotas = round_retain_sum(&shares);

            for (species, &quota) in self.species.iter().zip(&quotas) {
                let mut members: Vec<usize> = species.members().collect();
                members.sort_unstable_by(|&a, &b| {
                    fitnesses[b]
                        .partial_cmp(&fitnesses[a])
                        .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
                });
                let weights: Vec<f64> = members.iter().map(|&m| fitnesses[m]).collect();

                let elite_count = (self.population_config.elite_fraction * members.len() as f64)
                    .ceil() as usize;
                let elite_count = elite_count.min(quota).min(members.len());
                for &member in &members[..elite_count] {
                    offspring.push(self.individuals[member].genome().clone());
                }

                for _ in elite_count..quota {
                    let first =
                        *choose_weighted(&members, &weights, &mut self.rng, "species members")?;
                    let second =
                        *choose_weighted(&members, &weights, &mut self.rng, "species members")?;
                    let mut child = self.individuals[first]
                        .genome()
                        .crossover(self.individuals[second].genome(), &mut self.rng);
                    child.mutate(&mut self.rng, &self.genetic_config);
                    offspring.push(child);
                }
            }
        }

        while offspring.len() < size {
            let donor = choose_uniform(&self.individuals, &mut self.rng, "individuals")?;
            let mut clone = donor.genome().clone();
            clone.mutate(&mut self.rng, &self.genetic_config);
            offspring.push(clone);
        }
        offspring.truncate(size);

        Ok(offspring)
    }

    /// Writes the current champion genome to the configured
    /// checkpoint file if a checkpoint is due this generation.
    fn checkpoint(&self) -> Result<(), EvolutionError> {
        if let Some(checkpoint) = &self.population_config.checkpoint {
            if (self.generation + 1) % checkpoint.interval.get() == 0 {
                let file = File::create(&checkpoint.path)?;
                let mut writer = BufWriter::new(file);
                self.fittest().genome().save(&mut writer)?;
                writer.flush()?;
            }
        }
        Ok(())
    }

    /// Reselects each surviving species' representative from
    /// its current members, per the configured policy. The
    /// clone is frozen: next generation's clustering compares
    /// against it, not against any live genome.
    fn reselect_representatives(&mut self, fitnesses: &[f64]) {
        for species in &mut self.species {
            let pick = match self.population_config.representative_policy {
                RepresentativePolicy::Random => species.members().choose(&mut self.rng),
                RepresentativePolicy::Fittest => species.champion_index(fitnesses),
            };
            if let Some(index) = pick {
                species.set_representative(self.individuals[index].genome().clone());
            }
        }
    }

    /// Returns the population's fittest individual, first-seen
    /// on ties.
    pub fn fittest(&self) -> &Individual<E> {
        self.individuals
            .iter()
            .reduce(|best, candidate| {
                if candidate.fitness() > best.fitness() {
                    candidate
                } else {
                    best
                }
            })
            .unwrap_or_else(|| panic!("empty population has no fittest individual"))
    }

    /// Returns the population's champion genome.
    pub fn champion_genome(&self) -> &Genome {
        self.fittest().genome()
    }

    /// Returns an iterator over the current generation's genomes.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.individuals.iter().map(Individual::genome)
    }

    /// Returns an iterator over the population's current species.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Replaces every individual with a randomly generated one
    /// and clears all species data, in place. The generation
    /// counter restarts at 0; the reproduction RNG's stream
    /// continues uninterrupted.
    pub fn reset(&mut self) {
        self.individuals = (0..self.population_config.size.get())
            .map(|_| {
                Individual::new(
                    Genome::new(&self.genetic_config, &mut self.rng),
                    (self.environment_factory)(),
                )
            })
            .collect();
        self.species.clear();
        self.generation = 0;
    }
}

/// Rounds all values to integers, preserving their total sum,
/// which is assumed to be integral. Rounds the largest
/// fractional parts up first, until the remainder is exhausted.
fn round_retain_sum(values: &[f64]) -> Vec<usize> {
    let total: f64 = values.iter().sum();
    let mut truncated: Vec<(usize, usize, f64)> = values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            let whole = value.floor();
            (index, whole as usize, value - whole)
        })
        .collect();

    let mut remainder = (total.round() as usize)
        - truncated.iter().map(|&(_, whole, _)| whole).sum::<usize>();
    truncated.sort_unstable_by(|(_, _, a), (_, _, b)| {
        b.partial_cmp(a)
            .unwrap_or_else(|| panic!("invalid offspring share detected (NaN)"))
    });
    for entry in &mut truncated {
        if remainder == 0 {
            break;
        }
        entry.1 += 1;
        remainder -= 1;
    }

    truncated.sort_unstable_by_key(|&(index, _, _)| index);
    truncated.into_iter().map(|(_, whole, _)| whole).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::Activation;
    use std::num::NonZeroUsize;

    /// Scores every genome with a fixed constant.
    struct ConstEnvironment(f64);

    impl Environment for ConstEnvironment {
        fn evaluate(&mut self, _: &Genome) -> f64 {
            self.0
        }
    }

    /// Rewards genomes for carrying enabled connections.
    struct ConnectionCountEnvironment;

    impl Environment for ConnectionCountEnvironment {
        fn evaluate(&mut self, genome: &Genome) -> f64 {
            genome.connections().filter(|c| c.enabled()).count() as f64
        }
    }

    fn test_population_config(size: usize) -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(size).unwrap(),
            distance_threshold: 1.0,
            max_species: NonZeroUsize::new(5).unwrap(),
            stagnation_threshold: NonZeroUsize::new(10).unwrap(),
            elite_fraction: 0.1,
            representative_policy: RepresentativePolicy::Random,
            checkpoint: None,
            rng_seed: Some(7),
        }
    }

    fn test_genetic_config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            activation_types: vec![Activation::Sigmoid, Activation::Tanh],
            init_stdev: 1.0,
            value_min: -3.0,
            value_max: 3.0,
            mutation_rate: 0.5,
            mutation_power: 0.4,
            replace_rate: 0.1,
            toggle_chance: 0.02,
            connection_addition_mutation_chance: 0.1,
            connection_removal_mutation_chance: 0.05,
            node_addition_mutation_chance: 0.05,
            node_removal_mutation_chance: 0.02,
            disjoint_factor: 1.0,
            weight_factor: 0.4,
            ..GeneticConfig::zero()
        }
    }

    #[test]
    fn size_is_constant_across_generations() {
        let mut population = Population::new(
            test_population_config(30),
            test_genetic_config(),
            || ConnectionCountEnvironment,
        );

        for generation in 0..10 {
            assert_eq!(population.genomes().count(), 30);
            assert_eq!(population.generation(), generation);
            population.evaluate_fitness();
            population.evolve().unwrap();
        }
        assert_eq!(population.genomes().count(), 30);
        assert_eq!(population.generation(), 10);
    }

    #[test]
    fn degenerate_generation_is_topped_up() {
        // All-zero fitnesses: no species earns a quota, so the
        // whole generation comes from the asexual top-up path.
        let mut population = Population::new(
            test_population_config(15),
            test_genetic_config(),
            || ConstEnvironment(0.0),
        );

        for _ in 0..5 {
            population.evaluate_fitness();
            population.evolve().unwrap();
            assert_eq!(population.genomes().count(), 15);
        }
    }

    #[test]
    fn identical_genomes_form_one_species() {
        // Zero init distribution: every genome is identical, so
        // all pairwise distances are 0.
        let genetic_config = GeneticConfig {
            init_stdev: 0.0,
            ..test_genetic_config()
        };
        let mut population = Population::new(
            test_population_config(20),
            GeneticConfig {
                mutation_rate: 0.0,
                connection_addition_mutation_chance: 0.0,
                connection_removal_mutation_chance: 0.0,
                node_addition_mutation_chance: 0.0,
                node_removal_mutation_chance: 0.0,
                toggle_chance: 0.0,
                ..genetic_config
            },
            || ConstEnvironment(1.0),
        );

        population.evaluate_fitness();
        population.evolve().unwrap();
        assert_eq!(population.species().count(), 1);
        assert_eq!(
            population.species().next().unwrap().member_count(),
            20
        );
    }

    #[test]
    fn fittest_is_first_seen_on_ties() {
        let mut population = Population::new(
            test_population_config(10),
            test_genetic_config(),
            || ConstEnvironment(2.5),
        );
        population.evaluate_fitness();

        assert!(std::ptr::eq(
            population.fittest(),
            &population.individuals[0]
        ));
        assert_eq!(population.fittest().fitness(), 2.5);
    }

    #[test]
    fn with_genomes_seeds_and_validates() {
        let genetic_config = test_genetic_config();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let seeds: Vec<Genome> = (0..3)
            .map(|_| Genome::new(&genetic_config, &mut rng))
            .collect();

        let population = Population::with_genomes(
            seeds.clone(),
            test_population_config(10),
            genetic_config.clone(),
            || ConstEnvironment(1.0),
        )
        .unwrap();
        assert_eq!(population.genomes().count(), 10);
        assert_eq!(population.genomes().next().unwrap(), &seeds[0]);

        // More seed genomes than the configured size.
        let oversized: Vec<Genome> = (0..4)
            .map(|_| Genome::new(&genetic_config, &mut rng))
            .collect();
        assert!(Population::<ConstEnvironment, _>::with_genomes(
            oversized,
            test_population_config(3),
            genetic_config.clone(),
            || ConstEnvironment(1.0),
        )
        .is_none());

        // Seed genome disagreeing with the genetic configuration.
        let mismatched_config = GeneticConfig {
            input_count: NonZeroUsize::new(5).unwrap(),
            ..genetic_config
        };
        assert!(Population::<ConstEnvironment, _>::with_genomes(
            seeds,
            test_population_config(10),
            mismatched_config,
            || ConstEnvironment(1.0),
        )
        .is_none());
    }

    #[test]
    fn checkpoint_writes_loadable_champion() {
        let path = std::env::temp_dir().join("neurevo_checkpoint_test.bin");
        let population_config = PopulationConfig {
            checkpoint: Some(CheckpointConfig {
                interval: NonZeroUsize::new(1).unwrap(),
                path: path.clone(),
            }),
            ..test_population_config(10)
        };
        let mut population = Population::new(
            population_config,
            test_genetic_config(),
            || ConnectionCountEnvironment,
        );

        population.evaluate_fitness();
        let champion = population.champion_genome().clone();
        population.evolve().unwrap();

        let mut file = File::open(&path).unwrap();
        let loaded = Genome::load(&mut file).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, champion);
    }

    #[test]
    fn reset_restarts_the_population() {
        let mut population = Population::new(
            test_population_config(12),
            test_genetic_config(),
            || ConnectionCountEnvironment,
        );
        for _ in 0..3 {
            population.evaluate_fitness();
            population.evolve().unwrap();
        }
        assert_eq!(population.generation(), 3);

        population.reset();
        assert_eq!(population.generation(), 0);
        assert_eq!(population.species().count(), 0);
        assert_eq!(population.genomes().count(), 12);
    }

    #[test]
    fn round_retain_sum_preserves_the_total() {
        assert_eq!(round_retain_sum(&[2.5, 3.25, 4.25]), vec![3, 3, 4]);
        assert_eq!(round_retain_sum(&[0.3, 0.3, 0.4]), vec![0, 0, 1]);
        assert_eq!(round_retain_sum(&[5.0]), vec![5]);
        assert_eq!(round_retain_sum(&[]), Vec::<usize>::new());

        let values = [1.9, 2.8, 0.2, 4.1, 1.0];
        let rounded = round_retain_sum(&values);
        assert_eq!(rounded.iter().sum::<usize>(), 10);
    }
}
