use crate::genomics::Genome;

/// A fitness-evaluation environment. Implementors run one or
/// more trials of their task, using the passed genome to drive
/// decisions, and report a score.
///
/// Each individual in a population owns its environment
/// instance exclusively, which is what allows a generation to
/// be evaluated in parallel without synchronization; `Send` is
/// required so instances can move between worker threads.
/// Environments may keep private RNG state or other per-instance
/// scratch data.
pub trait Environment: Send {
    /// Evaluates a genome's fitness. Fitness should
    /// be a non-negative quantity.
    fn evaluate(&mut self, genome: &Genome) -> f64;
}

/// Returns the index of the largest value in `values`, mapping
/// an output vector to a discrete action. Ties resolve to the
/// first maximal index. Returns `None` for an empty slice.
///
/// # Examples
/// ```
/// use neurevo::argmax;
///
/// assert_eq!(argmax(&[0.1, 0.9, 0.3]), Some(1));
/// assert_eq!(argmax(&[0.5, 0.5]), Some(0));
/// assert_eq!(argmax(&[]), None);
/// ```
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, value) in values.iter().enumerate() {
        match best {
            Some(current) if values[current] >= *value => {}
            _ => best = Some(index),
        }
    }
    best
}
