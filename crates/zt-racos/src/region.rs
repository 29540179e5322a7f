//! Region learning: shrink the search box around a positive sample until
//! it excludes every negative sample.

use zt_types::{Dimension, DimensionSpec};

use crate::rng::TuneRng;

/// Per-dimension `[low, high]` bounds.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Region {
    bounds: Vec<(f64, f64)>,
}

impl Region {
    pub(crate) fn full(space: &DimensionSpec) -> Self {
        Self {
            bounds: space.iter().map(|def| def.dimension.bounds()).collect(),
        }
    }

    pub(crate) fn contains(&self, x: &[f64]) -> bool {
        self.bounds
            .iter()
            .zip(x)
            .all(|(&(low, high), &v)| v >= low && v <= high)
    }

    pub(crate) fn bounds(&self, k: usize) -> (f64, f64) {
        self.bounds[k]
    }

    /// Learn a region around `anchor` that contains none of `negatives`.
    pub(crate) fn learn(
        space: &DimensionSpec,
        anchor: &[f64],
        negatives: &[&[f64]],
        rng: &mut TuneRng,
    ) -> Self {
        let dims: Vec<&Dimension> = space.iter().map(|def| &def.dimension).collect();
        let mut region = Self::full(space);
        let mut remaining: Vec<&[f64]> = negatives.to_vec();

        loop {
            remaining.retain(|x| region.contains(x));
            if remaining.is_empty() {
                break;
            }

            let pick = rng.index(remaining.len());
            let negative = remaining[pick];
            let differing: Vec<usize> = (0..dims.len())
                .filter(|&k| negative[k] != anchor[k])
                .collect();

            if differing.is_empty() {
                // Same point as the anchor; no cut can separate them.
                remaining.swap_remove(pick);
                continue;
            }

            let k = differing[rng.index(differing.len())];
            region.cut(k, dims[k], anchor[k], negative[k], rng);
        }

        region
    }

    /// Move one bound of dimension `k` so that `neg` falls outside while
    /// `pos` stays inside.
    fn cut(&mut self, k: usize, dim: &Dimension, pos: f64, neg: f64, rng: &mut TuneRng) {
        let bound = &mut self.bounds[k];
        match dim {
            Dimension::Continuous { .. } => {
                if pos < neg {
                    bound.1 = rng.uniform_open(pos, neg);
                } else {
                    let r = rng.uniform_open(neg, pos);
                    bound.0 = if r > neg { r } else { pos };
                }
            }
            Dimension::Discrete { ordered: true, .. } => {
                let (p, n) = (pos as i64, neg as i64);
                if p < n {
                    bound.1 = rng.int(p, n - 1) as f64;
                } else {
                    bound.0 = rng.int(n + 1, p) as f64;
                }
            }
            Dimension::Discrete { ordered: false, .. } => {
                *bound = (pos, pos);
            }
        }
    }
}
