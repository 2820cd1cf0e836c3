//! Injectable randomness for the simulator
//!
//! The engine draws every random number through [`RandomSource`], so a
//! test can pin the exact sequence and assert exact outputs.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform samples in `[0, 1)`
pub trait RandomSource: Send {
    /// Next sample in `[0, 1)`
    fn next_unit(&mut self) -> f64;

    /// Uniformly pick an index in `0..len`
    ///
    /// `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize {
        let index = (self.next_unit() * len as f64).floor() as usize;
        index.min(len.saturating_sub(1))
    }
}

/// Seeded ChaCha8 generator
///
/// The same seed always reproduces the same simulation.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
    seed: u64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed from `seed`, or from thread entropy when `None`
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        Self::new(seed.unwrap_or_else(|| rand::thread_rng().r#gen()))
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen_range(0.0..1.0)
    }
}

/// Replays a fixed list of samples, cycling when exhausted
///
/// A sample of `0.5` produces a zero delta in every metric of the random
/// walk, which makes this handy for pinning a service in place.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    values: Vec<f64>,
    position: usize,
}

impl FixedSequence {
    /// `values` must be non-empty and each in `[0, 1)`
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            position: 0,
        }
    }

    /// Always returns `value`
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for FixedSequence {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.5;
        }

        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value
    }
}
