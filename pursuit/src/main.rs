//! One-dimensional target pursuit, solved by evolving network
//! controllers. Each trial places a target at a random offset
//! from the agent; the controller reads the signed offset and
//! its magnitude, picks a move each step, and is scored by how
//! close to the target it stays.

use neurevo::genomics::{Activation, GeneticConfig, Genome};
use neurevo::populations::logging::{EvolutionLogger, ReportingLevel};
use neurevo::populations::{CheckpointConfig, Population, PopulationConfig, RepresentativePolicy};
use neurevo::{argmax, Environment};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use std::fs::File;
use std::io::{BufWriter, Write};
use std::num::NonZeroUsize;

const TRIALS: usize = 2;
const STEPS: usize = 40;
const STEP_SIZE: f64 = 0.1;

const GENERATIONS: usize = 200;
const TARGET_FITNESS: f64 = 0.95;
const CHAMPION_PATH: &str = "pursuit_champion.bin";

struct PursuitEnvironment {
    rng: SmallRng,
}

impl PursuitEnvironment {
    fn new() -> PursuitEnvironment {
        PursuitEnvironment {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Runs one pursuit episode and returns the mean per-step
    /// closeness to the target, in [0, 1].
    fn run_trial(&mut self, controller: &Genome) -> f64 {
        let target: f64 = self.rng.gen_range(-1.0..=1.0);
        let mut position = 0.0;
        let mut score = 0.0;

        for _ in 0..STEPS {
            let offset: f64 = target - position;
            let outputs = controller
                .evaluate(&[offset.clamp(-1.0, 1.0), offset.abs().min(1.0)])
                .expect("pursuit controller input size mismatch");
            match argmax(&outputs) {
                Some(0) => position -= STEP_SIZE,
                Some(2) => position += STEP_SIZE,
                // Action 1 (or an empty output vector) holds still.
                _ => {}
            }
            score += (1.0 - (target - position).abs()).max(0.0);
        }

        score / STEPS as f64
    }
}

impl Environment for PursuitEnvironment {
    fn evaluate(&mut self, controller: &Genome) -> f64 {
        let total: f64 = (0..TRIALS).map(|_| self.run_trial(controller)).sum();
        total / TRIALS as f64
    }
}

fn main() {
    let genetic_config = GeneticConfig {
        input_count: NonZeroUsize::new(2).unwrap(),
        output_count: NonZeroUsize::new(3).unwrap(),
        activation_types: vec![Activation::Tanh, Activation::Sigmoid, Activation::ReLU],
        output_activation: Activation::Identity,
        init_mean: 0.0,
        init_stdev: 1.0,
        value_min: -5.0,
        value_max: 5.0,
        mutation_rate: 0.8,
        mutation_power: 0.5,
        replace_rate: 0.1,
        toggle_chance: 0.01,
        connection_addition_mutation_chance: 0.05,
        connection_removal_mutation_chance: 0.01,
        node_addition_mutation_chance: 0.03,
        node_removal_mutation_chance: 0.01,
        disjoint_factor: 1.0,
        weight_factor: 0.4,
    };

    let population_config = PopulationConfig {
        size: NonZeroUsize::new(150).unwrap(),
        distance_threshold: 1.2,
        max_species: NonZeroUsize::new(10).unwrap(),
        stagnation_threshold: NonZeroUsize::new(15).unwrap(),
        elite_fraction: 0.1,
        representative_policy: RepresentativePolicy::Random,
        checkpoint: Some(CheckpointConfig {
            interval: NonZeroUsize::new(25).unwrap(),
            path: CHAMPION_PATH.into(),
        }),
        rng_seed: None,
    };

    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);
    let mut population = Population::new(population_config, genetic_config, PursuitEnvironment::new);

    for _ in 0..GENERATIONS {
        population.evaluate_fitness();
        logger.log(&population);

        let best = population.fittest().fitness();
        println!("generation: {} fitness: {:.4}", population.generation(), best);
        if best >= TARGET_FITNESS {
            break;
        }

        if let Err(e) = population.evolve() {
            eprintln!("evolution halted: {}", e);
            break;
        }
    }

    if let Some(last) = logger.iter().last() {
        println!("{}", last);
    }

    let champion = population.champion_genome();
    let file = File::create(CHAMPION_PATH).expect("champion file creation failed");
    let mut writer = BufWriter::new(file);
    champion
        .save(&mut writer)
        .and_then(|_| writer.flush())
        .expect("champion write failed");

    println!(
        "champion: {}",
        ron::to_string(champion).expect("champion serialization failed")
    );
}
