//! Random streams for path batches
//!
//! Every batch of paths draws from its own generator, derived from a base
//! seed and the batch index. Output therefore depends only on the seed and
//! the batch size, never on how many worker threads ran the batches.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Capability that hands out one independent generator per path batch
pub trait RandomSource: Sync {
    type Rng: Rng;

    /// Generator for the batch at `batch_index`
    fn batch_rng(&self, batch_index: u64) -> Self::Rng;
}

/// Reproducible streams derived from a fixed base seed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededSource {
    seed: u64,
}

impl SeededSource {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed drawn from the operating system, for non-reproducible runs
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededSource {
    type Rng = StdRng;

    fn batch_rng(&self, batch_index: u64) -> StdRng {
        StdRng::seed_from_u64(batch_seed(self.seed, batch_index))
    }
}

/// SplitMix64 finalizer over the base seed offset by the batch index
fn batch_seed(seed: u64, batch_index: u64) -> u64 {
    let mut z = seed.wrapping_add(batch_index.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
