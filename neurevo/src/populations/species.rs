use crate::genomics::Genome;

/// An identifier for a species. Contains the generation
/// in which the species was born, and an index to
/// distinguish species originated during the same
/// generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpeciesID(pub usize, pub usize);

/// A species is a collection of individuals close enough in
/// compatibility distance to a shared representative genome.
///
/// The representative is a frozen clone taken at the end of
/// some earlier generation, never a live member, so clustering
/// within a generation is insensitive to evaluation order.
/// Members are stored as indices into the population's current
/// generation; the member list is rebuilt from scratch every
/// time the population respeciates.
#[derive(Clone, Debug)]
pub struct Species {
    id: SpeciesID,
    representative: Genome,
    members: Vec<usize>,
    max_fitness: f64,
    stagnation: usize,
}

impl Species {
    /// Returns a new empty species with the passed
    /// representative.
    pub(super) fn new(id: SpeciesID, representative: Genome) -> Species {
        Species {
            id,
            representative,
            members: Vec::new(),
            max_fitness: f64::NEG_INFINITY,
            stagnation: 0,
        }
    }

    /// Returns the species' identifier.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' representative genome.
    pub fn representative(&self) -> &Genome {
        &self.representative
    }

    pub(super) fn set_representative(&mut self, representative: Genome) {
        self.representative = representative;
    }

    pub(super) fn clear_members(&mut self) {
        self.members.clear();
    }

    pub(super) fn add_member(&mut self, index: usize) {
        self.members.push(index);
    }

    /// Returns an iterator over the species' members, as
    /// indices into the population's current generation.
    pub fn members(&self) -> impl Iterator<Item = usize> + '_ {
        self.members.iter().copied()
    }

    /// Returns the number of members currently in the species.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the species currently has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the highest fitness among current members,
    /// given the population's fitness table.
    pub fn best_fitness(&self, fitnesses: &[f64]) -> f64 {
        self.members
            .iter()
            .map(|&index| fitnesses[index])
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Returns the species' total adjusted fitness: the sum of
    /// member fitnesses, each divided by the member count.
    /// Fitness sharing means large species do not dominate
    /// reproduction by head count alone.
    pub fn total_adjusted_fitness(&self, fitnesses: &[f64]) -> f64 {
        self.members
            .iter()
            .map(|&index| fitnesses[index] / self.members.len() as f64)
            .sum()
    }

    /// Returns the index of the species' fittest member, first
    /// member on ties. `None` if the species is empty.
    pub(super) fn champion_index(&self, fitnesses: &[f64]) -> Option<usize> {
        self.members.iter().copied().reduce(|best, candidate| {
            if fitnesses[candidate] > fitnesses[best] {
                candidate
            } else {
                best
            }
        })
    }

    /// Updates the species' stagnation bookkeeping with the
    /// generation's best member fitness: a strict improvement
    /// over the all-time record resets the counter, anything
    /// else increments it.
    pub(super) fn record_generation(&mut self, best_fitness: f64) {
        if best_fitness > self.max_fitness {
            self.max_fitness = best_fitness;
            self.stagnation = 0;
        } else {
            self.stagnation += 1;
        }
    }

    /// Returns the number of consecutive generations the
    /// species has gone without improving its all-time best
    /// fitness.
    pub fn time_stagnated(&self) -> usize {
        self.stagnation
    }

    /// Returns the species' all-time best member fitness.
    pub fn max_fitness(&self) -> f64 {
        self.max_fitness
    }
}
