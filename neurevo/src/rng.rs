//! Random-pick helpers shared by the mutation and reproduction
//! machinery. All randomness flows through caller-supplied RNGs,
//! so a seeded run draws from a single reproducible stream.

use rand::distributions::{Distribution, WeightedIndex};
use rand::prelude::{Rng, SliceRandom};

use std::error::Error;
use std::fmt;

/// An error type indicating that a random pick was
/// attempted on an empty collection.
///
/// Carries a description of the collection picked from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmptyCollectionError(pub &'static str);

impl fmt::Display for EmptyCollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "random pick from empty collection of {}", self.0)
    }
}

impl Error for EmptyCollectionError {}

/// Picks a uniformly random element of `items`.
pub(crate) fn choose_uniform<'a, T>(
    items: &'a [T],
    rng: &mut impl Rng,
    description: &'static str,
) -> Result<&'a T, EmptyCollectionError> {
    items.choose(rng).ok_or(EmptyCollectionError(description))
}

/// Picks a random element of `items`, weighted by the parallel
/// `weights` slice. When the weights carry no signal (all zero),
/// falls back to a uniform pick.
pub(crate) fn choose_weighted<'a, T>(
    items: &'a [T],
    weights: &[f64],
    rng: &mut impl Rng,
    description: &'static str,
) -> Result<&'a T, EmptyCollectionError> {
    if items.is_empty() {
        return Err(EmptyCollectionError(description));
    }
    match WeightedIndex::new(weights) {
        Ok(dist) => Ok(&items[dist.sample(rng)]),
        Err(_) => choose_uniform(items, rng, description),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn empty_collections_are_errors() {
        let mut rng = SmallRng::seed_from_u64(0);
        let empty: [u32; 0] = [];

        assert_eq!(
            choose_uniform(&empty, &mut rng, "nothing"),
            Err(EmptyCollectionError("nothing"))
        );
        assert_eq!(
            choose_weighted(&empty, &[], &mut rng, "nothing"),
            Err(EmptyCollectionError("nothing"))
        );
    }

    #[test]
    fn weighted_pick_respects_weights() {
        let mut rng = SmallRng::seed_from_u64(1);
        let items = ['a', 'b', 'c'];
        let weights = [0.0, 1.0, 0.0];

        for _ in 0..100 {
            assert_eq!(choose_weighted(&items, &weights, &mut rng, "items"), Ok(&'b'));
        }
    }

    #[test]
    fn zero_weights_fall_back_to_uniform() {
        let mut rng = SmallRng::seed_from_u64(2);
        let items = [1, 2, 3];
        let weights = [0.0, 0.0, 0.0];

        for _ in 0..100 {
            let pick = choose_weighted(&items, &weights, &mut rng, "items").unwrap();
            assert!(items.contains(pick));
        }
    }
}
