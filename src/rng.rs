use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The single randomness source of a simulation run.
///
/// Target picking, stat jitter, steering noise and transition rolls all draw
/// from here so a seeded run replays exactly.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: StdRng,
}

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_entropy(),
        }
    }

    /// Uniform sample in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Uniform sample in `[lo, hi]`; collapses to `lo` for an empty range.
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        if !(hi > lo) {
            return lo;
        }
        self.inner.gen_range(lo..=hi)
    }

    /// True with probability `p` (clamped to `[0, 1]`).
    pub fn chance(&mut self, p: f32) -> bool {
        if p <= 0.0 {
            return false;
        }
        self.unit() < p.min(1.0)
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.inner.gen_range(0..items.len()))
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
