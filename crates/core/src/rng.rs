//! Seeded random stream for in-play decisions (wander deltas, explorer destinations,
//! spawn rolls). Serializes as `(seed, draws)` and restores by replaying draws so a
//! loaded game continues the exact same stream.

use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "RngState", into = "RngState")]
pub struct GameRng {
    seed: u64,
    draws: u64,
    inner: ChaCha8Rng,
}

#[derive(Clone, Copy, Serialize, Deserialize)]
struct RngState {
    seed: u64,
    draws: u64,
}

impl From<RngState> for GameRng {
    fn from(state: RngState) -> Self {
        let mut rng = GameRng::new(state.seed);
        for _ in 0..state.draws {
            rng.next_u64();
        }
        rng
    }
}

impl From<GameRng> for RngState {
    fn from(rng: GameRng) -> Self {
        RngState { seed: rng.seed, draws: rng.draws }
    }
}

impl GameRng {
    pub fn new(seed: u64) -> Self {
        Self { seed, draws: 0, inner: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    pub fn next_u64(&mut self) -> u64 {
        self.draws += 1;
        self.inner.next_u64()
    }

    /// Uniform integer in `[min, max]`, both ends included.
    pub fn range_inclusive(&mut self, min: i32, max: i32) -> i32 {
        debug_assert!(min <= max);
        let span = (i64::from(max) - i64::from(min) + 1) as u64;
        min + (self.next_u64() % span) as i32
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    /// Picks an index with probability proportional to its weight.
    pub fn weighted_index(&mut self, weights: &[u32]) -> usize {
        let total: u32 = weights.iter().sum();
        if total == 0 {
            return 0;
        }
        let dice = self.range_inclusive(1, total as i32) as u32;
        let mut running = 0;
        for (index, weight) in weights.iter().enumerate() {
            running += weight;
            if dice <= running {
                return index;
            }
        }
        weights.len() - 1
    }
}
