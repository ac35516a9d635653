//! Random draws for the simulation.
//!
//! Every probabilistic transition goes through [`RandomSource`] so tests
//! can replace the generator with a fixed sequence.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource {
    /// `true` with probability `p` (clamped to [0, 1]).
    fn chance(&mut self, p: f64) -> bool;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn chance(&mut self, p: f64) -> bool {
        (**self).chance(p)
    }
}

/// Seeded `SmallRng`; the same seed replays the same run.
pub struct SeededRandom(SmallRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom(SmallRng::seed_from_u64(seed))
    }

    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        SeededRandom(SmallRng::from_entropy())
    }
}

impl RandomSource for SeededRandom {
    #[inline]
    fn chance(&mut self, p: f64) -> bool {
        // gen_bool panics on NaN
        if p.is_nan() {
            return false;
        }
        self.0.gen_bool(p.clamp(0.0, 1.0))
    }
}

/// Replays a fixed list of uniform draws in [0, 1), cycling.
///
/// A draw `d` succeeds when `d < p`. An empty list never succeeds.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    draws: Vec<f64>,
    cursor: usize,
}

impl FixedSequence {
    pub fn new(draws: Vec<f64>) -> Self {
        Self { draws, cursor: 0 }
    }

    /// Every draw succeeds for any positive probability.
    pub fn always() -> Self {
        Self::new(vec![0.0])
    }

    pub fn never() -> Self {
        Self::new(Vec::new())
    }
}

impl RandomSource for FixedSequence {
    fn chance(&mut self, p: f64) -> bool {
        if self.draws.is_empty() {
            return false;
        }
        let draw = self.draws[self.cursor % self.draws.len()];
        self.cursor = self.cursor.wrapping_add(1);
        draw < p
    }
}
