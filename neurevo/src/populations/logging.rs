//! Utilities for logging of population statistics.

use crate::genomics::Genome;
use crate::populations::{Individual, Population, SpeciesID};
use crate::Environment;

use std::fmt;

/// Specifies the amount of genomes logged by an
/// [`EvolutionLogger`] in each snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Log all genomes, grouped by species.
    AllGenomes,
    /// Log each species' champion.
    SpeciesChampions,
    /// Log the population champion.
    PopulationChampion,
    /// Do not log any genomes.
    NoGenomes,
}

/// Summary statistics over one quantity across a generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Computes summary statistics over the passed values.
    ///
    /// # Panics
    /// Panics if the iterator yields no values, or if any
    /// value is NaN.
    pub fn from(values: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = values.collect();
        assert!(!data.is_empty(), "statistics over an empty generation");

        let count = data.len();
        let maximum = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let minimum = data.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = data.iter().sum::<f64>() / count as f64;

        let middle = count / 2;
        let (lesser, upper, _) = data.select_nth_unstable_by(middle, |a, b| {
            a.partial_cmp(b)
                .unwrap_or_else(|| panic!("invalid statistic value detected (NaN)"))
        });
        let mut median = *upper;
        if count % 2 == 0 {
            let lower = lesser.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            median = (lower + median) / 2.0;
        }

        Stats {
            maximum,
            minimum,
            mean,
            median,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[max: {:.3}, min: {:.3}, mean: {:.3}, median: {:.3}]",
            self.maximum, self.minimum, self.mean, self.median,
        )
    }
}

/// The genomes sampled from a generation, as configured by
/// the logger's [`ReportingLevel`].
#[derive(Clone, Debug)]
pub enum GenerationRecord {
    /// All genomes, grouped as `(species, members, stagnation)`.
    Species(Vec<(SpeciesID, Vec<Genome>, usize)>),
    /// Each species' champion, as `(species, champion, stagnation)`.
    SpeciesChampions(Vec<(SpeciesID, Genome, usize)>),
    /// The population champion.
    PopulationChampion(Genome),
    /// No genomes sampled.
    None,
}

/// A snapshot of a population's state at a
/// point in time.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationRecord,
    pub species_count: usize,
    pub fitness: Stats,
    pub node_counts: Stats,
    pub connection_counts: Stats,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generation {}:", self.generation_number)?;
        writeln!(f, "  species: {}", self.species_count)?;
        writeln!(f, "  fitness: {}", self.fitness)?;
        writeln!(f, "  nodes: {}", self.node_counts)?;
        write!(f, "  connections: {}", self.connection_counts)
    }
}

/// A logger of population statistics. Can be configured to
/// snapshot different amounts of genome data using
/// [`ReportingLevel`]s.
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the passed reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: Vec::new(),
        }
    }

    /// Takes a snapshot of the passed population's state.
    /// Genomes are cloned out of the population, so logs
    /// remain valid across later generations.
    pub fn log<E, F>(&mut self, population: &Population<E, F>)
    where
        E: Environment,
        F: Fn() -> E,
    {
        let fitnesses: Vec<f64> = population
            .individuals
            .iter()
            .map(Individual::fitness)
            .collect();

        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample: self.sample(population, &fitnesses),
            species_count: population.species.len(),
            fitness: Stats::from(fitnesses.iter().copied()),
            node_counts: Stats::from(population.genomes().map(|g| g.nodes().count() as f64)),
            connection_counts: Stats::from(
                population.genomes().map(|g| g.connections().count() as f64),
            ),
        })
    }

    /// Returns an iterator over all recorded snapshots,
    /// oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }

    fn sample<E, F>(&self, population: &Population<E, F>, fitnesses: &[f64]) -> GenerationRecord
    where
        E: Environment,
        F: Fn() -> E,
    {
        let member_genome = |index: usize| population.individuals[index].genome().clone();
        match self.reporting_level {
            ReportingLevel::AllGenomes => GenerationRecord::Species(
                population
                    .species
                    .iter()
                    .map(|species| {
                        (
                            species.id(),
                            species.members().map(member_genome).collect(),
                            species.time_stagnated(),
                        )
                    })
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => GenerationRecord::SpeciesChampions(
                population
                    .species
                    .iter()
                    .filter_map(|species| {
                        species.champion_index(fitnesses).map(|champion| {
                            (
                                species.id(),
                                member_genome(champion),
                                species.time_stagnated(),
                            )
                        })
                    })
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => {
                GenerationRecord::PopulationChampion(population.fittest().genome().clone())
            }
            ReportingLevel::NoGenomes => GenerationRecord::None,
        }
    }
}
