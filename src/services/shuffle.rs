// src/services/shuffle.rs

use std::{collections::VecDeque, sync::Mutex};

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Source of uniformly distributed indices.
///
/// The question service only ever needs "an index below `bound`", so this is
/// the whole seam. Swap it out to make shuffles reproducible.
pub trait RandomSource: Send + Sync {
    /// Returns a value in `0..bound`. Callers never pass zero.
    fn index_below(&self, bound: usize) -> usize;
}

/// Non-deterministic source backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn index_below(&self, bound: usize) -> usize {
        rand::rng().random_range(0..bound)
    }
}

/// Reproducible source for a given seed.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn index_below(&self, bound: usize) -> usize {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        rng.random_range(0..bound)
    }
}

/// Replays a fixed list of indices, each reduced modulo the requested bound.
/// Once the list runs out it keeps returning 0.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    script: Mutex<VecDeque<usize>>,
}

impl ScriptedRandom {
    pub fn new(script: impl IntoIterator<Item = usize>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn index_below(&self, bound: usize) -> usize {
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        script.pop_front().unwrap_or(0) % bound
    }
}

/// In-place Fisher–Yates shuffle: walks from the back, swapping each slot
/// with a uniformly chosen slot at or before it.
///
/// `SliceRandom::shuffle` needs a concrete `Rng`; this loop draws from a
/// `RandomSource` so scripted sources give exact orders in tests.
pub fn fisher_yates<T>(items: &mut [T], random: &dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = random.index_below(i + 1);
        items.swap(i, j);
    }
}
