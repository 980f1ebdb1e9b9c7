//! Deterministic seed mixing and pseudo-random stream helpers for map generation.

pub(super) fn random_usize(seed: u64, stream: u64, min_value: usize, max_value: usize) -> usize {
    debug_assert!(min_value <= max_value);
    let range_size = max_value - min_value + 1;
    min_value + (mix_seed_stream(seed, stream) as usize % range_size)
}

pub(super) fn mix_seed_stream(seed: u64, stream: u64) -> u64 {
    let mut mixed = seed ^ stream.wrapping_mul(0xD6E8_FD9A_5B89_7A4D);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    mixed ^= mixed >> 33;
    mixed = mixed.wrapping_mul(0xC4CE_B9FE_1A85_EC53);
    mixed ^ (mixed >> 33)
}

/// Seed for one level of a run. Levels are generated lazily, so each depth needs a
/// seed that does not depend on what happened on the levels above it.
pub fn derive_level_seed(run_seed: u64, depth: usize) -> u64 {
    let mut mixed = run_seed ^ 0x9E37_79B9_7F4A_7C15;
    mixed ^= (depth as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 30;
    mixed = mixed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 27;
    mixed = mixed.wrapping_mul(0x94D0_49BB_1331_11EB);
    mixed ^ (mixed >> 31)
}

/// Sequential draws over [`random_usize`], one stream index per draw.
pub(super) struct SeedStream {
    seed: u64,
    next: u64,
}

impl SeedStream {
    pub(super) fn new(seed: u64) -> Self {
        Self { seed, next: 0 }
    }

    pub(super) fn range(&mut self, min_value: usize, max_value: usize) -> usize {
        let value = random_usize(self.seed, self.next, min_value, max_value);
        self.next += 1;
        value
    }

    pub(super) fn coin(&mut self) -> bool {
        self.range(0, 1) == 1
    }

    /// Index chosen with probability proportional to its weight.
    pub(super) fn weighted(&mut self, weights: &[usize]) -> usize {
        let total: usize = weights.iter().sum();
        if total == 0 {
            return 0;
        }
        let dice = self.range(1, total);
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
