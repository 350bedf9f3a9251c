use crate::genomics::Genome;
use crate::Environment;

/// An individual binds one genome to the environment instance
/// that scores it. Each individual owns its environment
/// exclusively, so a whole generation can be evaluated in
/// parallel with no shared mutable state.
pub struct Individual<E> {
    genome: Genome,
    environment: E,
}

impl<E: Environment> Individual<E> {
    /// Binds a genome to an environment instance.
    pub fn new(genome: Genome, environment: E) -> Individual<E> {
        Individual {
            genome,
            environment,
        }
    }

    /// Resets the genome's fitness and re-scores it against
    /// the individual's environment.
    pub fn evaluate(&mut self) {
        self.genome.set_fitness(0.0);
        let fitness = self.environment.evaluate(&self.genome);
        self.genome.set_fitness(fitness);
    }

    /// Returns the individual's genome.
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Returns the genome's current fitness.
    pub fn fitness(&self) -> f64 {
        self.genome.fitness()
    }
}
