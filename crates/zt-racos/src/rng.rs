//! Seeded random stream whose position survives serialization.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RngSnapshot", into = "RngSnapshot")]
pub(crate) struct TuneRng {
    inner: ChaCha8Rng,
}

#[derive(Serialize, Deserialize)]
struct RngSnapshot {
    seed: [u8; 32],
    word_pos: u64,
}

impl TuneRng {
    pub(crate) fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform float in [low, high].
    pub(crate) fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.inner.random_range(low..=high)
    }

    /// Uniform float in [low, high). Requires `low < high`.
    pub(crate) fn uniform_open(&mut self, low: f64, high: f64) -> f64 {
        self.inner.random_range(low..high)
    }

    /// Uniform integer in [low, high].
    pub(crate) fn int(&mut self, low: i64, high: i64) -> i64 {
        self.inner.random_range(low..=high)
    }

    pub(crate) fn index(&mut self, len: usize) -> usize {
        self.inner.random_range(0..len)
    }

    pub(crate) fn chance(&mut self, p: f64) -> bool {
        self.inner.random_bool(p)
    }

    /// `amount` distinct indices out of `0..len`.
    pub(crate) fn distinct_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.inner, len, amount.min(len)).into_vec()
    }
}

impl From<RngSnapshot> for TuneRng {
    fn from(snapshot: RngSnapshot) -> Self {
        let mut inner = ChaCha8Rng::from_seed(snapshot.seed);
        inner.set_word_pos(u128::from(snapshot.word_pos));
        Self { inner }
    }
}

impl From<TuneRng> for RngSnapshot {
    fn from(rng: TuneRng) -> Self {
        Self {
            seed: rng.inner.get_seed(),
            word_pos: u64::try_from(rng.inner.get_word_pos()).unwrap_or(u64::MAX),
        }
    }
}
