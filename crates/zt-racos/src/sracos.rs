//! Sequential racos tuner driven one suggestion / completion at a time.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use zt_types::{ConfigError, Dimension, DimensionSpec, Optimizer, Solution};

use crate::parameter::RacosParameter;
use crate::region::Region;
use crate::rng::TuneRng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Phase {
    /// Drawing the initial uniform samples.
    Init,
    /// Positive/negative sets are formed; sampling from learned regions.
    Learning,
}

/// Sequential randomized coordinate-shrinking optimizer.
///
/// The first `train_size` candidates are uniform samples. Once all of them
/// are scored the best `positive_size` become the positive set and the rest
/// the negative set. Later candidates are mostly drawn from a region around a
/// random positive sample that excludes every negative sample, and each new
/// score replaces the worst member of the set it qualifies for.
///
/// The whole tuner, random stream position included, is serde-serializable
/// so a restored copy continues the exact same suggestion sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SRacosTune {
    space: DimensionSpec,
    parameter: RacosParameter,
    rng: TuneRng,
    phase: Phase,
    init_data: Vec<Solution>,
    /// Sorted by ascending score.
    positive: Vec<Solution>,
    negative: Vec<Solution>,
    pending: Vec<Solution>,
    best: Option<Solution>,
    init_issued: usize,
    issued: usize,
    next_id: u64,
    /// Set once no distinct candidate can be drawn and nothing is pending.
    #[serde(default)]
    space_exhausted: bool,
}

impl SRacosTune {
    pub fn new(space: DimensionSpec, parameter: RacosParameter) -> Result<Self, ConfigError> {
        space.validate()?;
        parameter.validate()?;

        let rng = TuneRng::new(parameter.seed);
        Ok(Self {
            space,
            parameter,
            rng,
            phase: Phase::Init,
            init_data: Vec::new(),
            positive: Vec::new(),
            negative: Vec::new(),
            pending: Vec::new(),
            best: None,
            init_issued: 0,
            issued: 0,
            next_id: 0,
            space_exhausted: false,
        })
    }

    pub fn space(&self) -> &DimensionSpec {
        &self.space
    }

    pub fn parameter(&self) -> &RacosParameter {
        &self.parameter
    }

    pub fn best(&self) -> Option<&Solution> {
        self.best.as_ref()
    }

    /// Candidates issued so far (released ones are refunded).
    pub fn issued(&self) -> usize {
        self.issued
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Whether region learning has started.
    pub fn is_learning(&self) -> bool {
        self.phase == Phase::Learning
    }

    fn sample_uniform(&mut self) -> Vec<f64> {
        let dims: Vec<Dimension> = self.space.iter().map(|d| d.dimension.clone()).collect();
        dims.iter().map(|dim| sample_within(&mut self.rng, dim, dim.bounds())).collect()
    }

    fn sample_from_region(&mut self) -> Vec<f64> {
        let anchor = self.positive[self.rng.index(self.positive.len())].x.clone();
        let negatives: Vec<&[f64]> = self.negative.iter().map(|s| s.x.as_slice()).collect();
        let region = Region::learn(&self.space, &anchor, &negatives, &mut self.rng);

        let dims = self.space.len();
        let bits = self.parameter.effective_uncertain_bits(dims);
        let mut x = anchor;
        for k in self.rng.distinct_indices(dims, bits) {
            if let Some(def) = self.space.get(k) {
                x[k] = sample_within(&mut self.rng, &def.dimension, region.bounds(k));
            }
        }
        x
    }

    fn is_known(&self, x: &[f64]) -> bool {
        self.init_data
            .iter()
            .chain(&self.positive)
            .chain(&self.negative)
            .chain(&self.pending)
            .any(|s| self.same_point(&s.x, x))
    }

    fn same_point(&self, a: &[f64], b: &[f64]) -> bool {
        self.space
            .iter()
            .zip(a.iter().zip(b))
            .all(|(def, (&u, &v))| def.dimension.same_value(u, v))
    }

    /// Draw until the candidate differs from every known point, giving up
    /// after `max_distinct_retries` redraws.
    fn draw_distinct(&mut self) -> Option<Vec<f64>> {
        for _ in 0..=self.parameter.max_distinct_retries {
            let learned =
                self.phase == Phase::Learning && self.rng.chance(self.parameter.probability);
            let x = if learned {
                self.sample_from_region()
            } else {
                self.sample_uniform()
            };
            if !self.is_known(&x) {
                return Some(x);
            }
        }
        warn!(
            retries = self.parameter.max_distinct_retries,
            pending = self.pending.len(),
            "No distinct candidate found"
        );
        if self.pending.is_empty() {
            self.space_exhausted = true;
            self.select_if_ready();
        }
        None
    }

    /// Pending index of `solution`. Ids alone can collide across a restore,
    /// so the coordinates must match too.
    fn pending_position(&self, solution: &Solution) -> Option<usize> {
        self.pending
            .iter()
            .position(|p| p.id == solution.id && p.x == solution.x)
    }

    /// Start region learning once every initial sample is scored, or once
    /// nothing is pending and no further initial sample can be issued.
    fn select_if_ready(&mut self) {
        if self.phase != Phase::Init || self.init_data.is_empty() {
            return;
        }
        let filled = self.init_data.len() >= self.parameter.effective_train_size();
        let starved = self.pending.is_empty() && self.is_exhausted();
        if filled || starved {
            self.select();
        }
    }

    /// Split the initial samples into positive and negative sets.
    fn select(&mut self) {
        let mut data = std::mem::take(&mut self.init_data);
        data.sort_by(|a, b| score_of(a).total_cmp(&score_of(b)));

        let negative = data.split_off(self.parameter.effective_positive_size().min(data.len()));
        self.positive = data;
        self.negative = negative;
        self.best = self.positive.first().cloned();
        self.phase = Phase::Learning;

        debug!(
            positive = self.positive.len(),
            negative = self.negative.len(),
            best = ?self.best.as_ref().and_then(|s| s.value),
            "Initial samples selected, region learning starts"
        );
    }

    /// Feed a scored learning-phase candidate into the positive/negative sets.
    fn absorb(&mut self, scored: Solution) {
        let score = score_of(&scored);
        if self.best.as_ref().map_or(true, |b| score < score_of(b)) {
            self.best = Some(scored.clone());
        }

        let beats_positive = self.positive.last().is_some_and(|w| score < score_of(w));
        if beats_positive {
            let at = self.positive.partition_point(|s| score_of(s) <= score);
            self.positive.insert(at, scored);
            if let Some(displaced) = self.positive.pop() {
                replace_worst(&mut self.negative, displaced);
            }
        } else {
            replace_worst(&mut self.negative, scored);
        }
    }
}

impl Optimizer for SRacosTune {
    fn suggest(&mut self) -> Option<Solution> {
        if self.is_exhausted() {
            debug!(budget = self.parameter.budget, "Budget exhausted");
            return None;
        }

        if self.phase == Phase::Init && self.init_issued >= self.parameter.effective_train_size() {
            debug!(
                pending = self.pending.len(),
                "Waiting for initial samples to complete"
            );
            return None;
        }

        let x = self.draw_distinct()?;
        if self.phase == Phase::Init {
            self.init_issued += 1;
        }
        self.issued += 1;

        let solution = Solution::new(self.next_id, x);
        self.next_id += 1;
        self.pending.push(solution.clone());

        debug!(id = solution.id, x = ?solution.x, "Suggested candidate");
        Some(solution)
    }

    fn complete(&mut self, solution: &Solution, score: f64) -> Option<Solution> {
        let Some(at) = self.pending_position(solution) else {
            warn!(id = solution.id, "Completion for a candidate that is not pending");
            return self.best.clone();
        };
        let scored = self.pending.remove(at).with_value(score);

        match self.phase {
            Phase::Init => {
                self.init_data.push(scored);
                self.select_if_ready();
            }
            Phase::Learning => self.absorb(scored),
        }

        self.best.clone()
    }

    fn release(&mut self, solution: &Solution) {
        let Some(at) = self.pending_position(solution) else {
            return;
        };
        self.pending.remove(at);
        self.issued = self.issued.saturating_sub(1);
        if self.phase == Phase::Init {
            self.init_issued = self.init_issued.saturating_sub(1);
        }
        debug!(id = solution.id, "Released candidate, budget refunded");
    }

    fn abandon(&mut self, solution: &Solution) {
        let Some(at) = self.pending_position(solution) else {
            return;
        };
        self.pending.remove(at);
        if self.phase == Phase::Init {
            self.init_issued = self.init_issued.saturating_sub(1);
            self.select_if_ready();
        }
        debug!(id = solution.id, "Abandoned candidate");
    }

    fn is_exhausted(&self) -> bool {
        self.space_exhausted || self.issued >= self.parameter.budget
    }

    fn name(&self) -> &str {
        "sracos"
    }
}

fn score_of(solution: &Solution) -> f64 {
    solution.value.unwrap_or(f64::INFINITY)
}

fn sample_within(rng: &mut TuneRng, dim: &Dimension, (low, high): (f64, f64)) -> f64 {
    match dim {
        Dimension::Continuous { .. } => rng.uniform(low, high),
        Dimension::Discrete { .. } => rng.int(low as i64, high as i64) as f64,
    }
}

/// Replace the worst member of `set` with `candidate` if the candidate scores better.
fn replace_worst(set: &mut [Solution], candidate: Solution) {
    let worst = set
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| score_of(a).total_cmp(&score_of(b)))
        .map(|(i, _)| i);

    if let Some(i) = worst {
        if score_of(&candidate) < score_of(&set[i]) {
            set[i] = candidate;
        }
    }
}
