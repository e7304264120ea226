//! Injectable randomness
//!
//! Everything that picks at random takes a [`RandomSource`], so tests can
//! script the picks and the binary can seed them for reproducible runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

pub trait RandomSource: Send {
    /// A uniformly distributed index in `0..len`. Callers guarantee `len > 0`.
    fn index(&mut self, len: usize) -> usize;

    /// A uniformly distributed value in `[0, 1)`.
    fn fraction(&mut self) -> f64;
}

/// Adapts any `rand` generator.
#[derive(Clone, Debug)]
pub struct RngSource<R>(pub R);

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    fn fraction(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }
}

pub fn seeded(seed: u64) -> Box<dyn RandomSource> {
    Box::new(RngSource(StdRng::seed_from_u64(seed)))
}

pub fn from_entropy() -> Box<dyn RandomSource> {
    Box::new(RngSource(StdRng::from_entropy()))
}

/// Seeded when a seed is given, entropy-backed otherwise.
pub fn source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => seeded(seed),
        None => from_entropy(),
    }
}

/// One entry chosen uniformly; `None` for an empty slice. Picks are
/// independent, so the same entry can come up twice in a row.
pub fn pick_one<'a, T>(items: &'a [T], rng: &mut dyn RandomSource) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let index = rng.index(items.len()).min(items.len() - 1);
    items.get(index)
}

/// A duration in `[min, max)`. An inverted range yields `min`.
pub fn delay_between(min: Duration, max: Duration, rng: &mut dyn RandomSource) -> Duration {
    if max <= min {
        return min;
    }
    min + (max - min).mul_f64(rng.fraction())
}


#[cfg(test)]
mod tests {
    use super::testing::Scripted;
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn empty_slice_has_no_pick() {
        let items: [u8; 0] = [];
        assert!(pick_one(&items, &mut *seeded(1)).is_none());
    }

    #[test]
    fn scripted_source_drives_the_pick() {
        let items = ["a", "b", "c"];
        let mut rng = Scripted::new([2, 0]);
        assert_eq!(pick_one(&items, &mut rng), Some(&"c"));
        assert_eq!(pick_one(&items, &mut rng), Some(&"a"));
        assert_eq!(pick_one(&items, &mut rng), Some(&"a"));
    }

    #[test]
    fn same_seed_same_sequence() {
        let catalog = Catalog::builtin().unwrap();
        let mut a = seeded(42);
        let mut b = seeded(42);
        for _ in 0..20 {
            let left = pick_one(catalog.recipes(), &mut *a).unwrap();
            let right = pick_one(catalog.recipes(), &mut *b).unwrap();
            assert_eq!(left.id, right.id);
        }
    }

    #[test]
    fn picks_are_uniform_over_the_catalog() {
        let catalog = Catalog::builtin().unwrap();
        let recipes = catalog.recipes();
        assert_eq!(recipes.len(), 12);

        const DRAWS: usize = 10_000;
        let mut counts = vec![0usize; recipes.len()];
        let mut rng = seeded(7);
        for _ in 0..DRAWS {
            let picked = pick_one(recipes, &mut *rng).unwrap();
            let slot = recipes.iter().position(|r| r.id == picked.id).unwrap();
            counts[slot] += 1;
        }

        let expected = 1.0 / recipes.len() as f64;
        for (slot, count) in counts.iter().enumerate() {
            let observed = *count as f64 / DRAWS as f64;
            assert!(
                (observed - expected).abs() < 0.015,
                "recipe {slot} drawn {observed:.4} of the time, expected {expected:.4}"
            );
        }
    }

    #[test]
    fn delays_stay_in_range() {
        let min = Duration::from_millis(1000);
        let max = Duration::from_millis(2000);
        let mut rng = seeded(3);
        for _ in 0..100 {
            let delay = delay_between(min, max, &mut *rng);
            assert!(delay >= min && delay < max);
        }
        let mut half = Scripted::new([]).with_fraction(0.5);
        assert_eq!(delay_between(min, max, &mut half), Duration::from_millis(1500));
        assert_eq!(delay_between(max, min, &mut half), max);
    }
}
