//! Skewed bounded sampling for the `$random` builtin
//!
//! `$random(min, max, mean)` draws from a bounded skew-normal distribution:
//! values always land in `[min, max]` and the empirical mean tracks `mean`.
//! The skew direction follows the position of `mean` inside the range:
//! symmetric at the midpoint, right-skewed below it, left-skewed above it.
//!
//! Samples are produced in batches. Each batch is clipped to the bounds and
//! then recentred onto the target mean; because clipping pushes the mean back,
//! the recentring is iterated until it settles.

use std::collections::HashMap;

use crate::rng::xorshift::SimRng;

/// Values pre-generated per batch.
const BATCH_SIZE: usize = 100;

/// Upper bound on recentring passes per batch.
const MEAN_CORRECTION_ROUNDS: usize = 32;

/// Skewness magnitude is capped so the shape stays well-behaved.
const MAX_SKEW: f64 = 3.0;

/// One bounded skew-normal distribution with a fixed `(min, max, mean)`.
///
/// Callers must uphold `min < max` and `min <= mean <= max`; the expression
/// evaluator validates `$random` arguments before a sampler is built.
#[derive(Debug, Clone)]
pub struct SkewedSampler {
    min: f64,
    max: f64,
    mean: f64,
    /// Skew-normal shape parameter
    alpha: f64,
    /// Location of the underlying skew-normal
    loc: f64,
    /// Scale of the underlying skew-normal
    scale: f64,
    batch: Vec<f64>,
    index: usize,
}

impl SkewedSampler {
    /// Build a sampler for the given bounds and target mean.
    pub fn new(min: f64, max: f64, mean: f64) -> Self {
        debug_assert!(min < max && min <= mean && mean <= max);

        let range = max - min;
        let relative = (mean - min) / range;

        // Shape from the mean's position in the range: below the midpoint
        // skews right (positive alpha), above it skews left.
        let mut alpha = ((0.5 - relative) * 2.0 * MAX_SKEW).clamp(-MAX_SKEW, MAX_SKEW);
        let scale = range / 4.0;
        let loc = if alpha.abs() < 0.1 {
            alpha = 0.1;
            mean
        } else {
            mean - alpha * scale * 0.1
        };

        Self {
            min,
            max,
            mean,
            alpha,
            loc,
            scale,
            batch: Vec::new(),
            index: 0,
        }
    }

    /// Draw the next value, refilling the batch from `rng` when exhausted.
    pub fn sample(&mut self, rng: &mut SimRng) -> f64 {
        if self.index >= self.batch.len() {
            self.refill(rng);
        }
        let value = self.batch[self.index];
        self.index += 1;
        value
    }

    /// Distribution parameters `(alpha, loc, scale)`.
    pub fn params(&self) -> (f64, f64, f64) {
        (self.alpha, self.loc, self.scale)
    }

    fn refill(&mut self, rng: &mut SimRng) {
        let delta = self.alpha / (1.0 + self.alpha * self.alpha).sqrt();
        let tail = (1.0 - delta * delta).sqrt();

        let mut batch = Vec::with_capacity(BATCH_SIZE);
        for _ in 0..BATCH_SIZE {
            // Standard skew-normal draw: |u| weighted by the shape, plus an
            // independent symmetric component.
            let u = rng.next_normal();
            let v = rng.next_normal();
            let z = delta * u.abs() + tail * v;
            batch.push((self.loc + self.scale * z).clamp(self.min, self.max));
        }

        // Recentre onto the target mean. Clipping after the shift moves the
        // mean again, so repeat until the residual is negligible.
        let tolerance = 1e-6 * (self.max - self.min);
        for _ in 0..MEAN_CORRECTION_ROUNDS {
            let current = batch.iter().sum::<f64>() / batch.len() as f64;
            let shift = self.mean - current;
            if shift.abs() <= tolerance {
                break;
            }
            for value in batch.iter_mut() {
                *value = (*value + shift).clamp(self.min, self.max);
            }
        }

        self.batch = batch;
        self.index = 0;
    }
}

/// The engine's random source: a seeded generator plus one cached sampler per
/// distinct `(min, max, mean)` triple, so repeated `$random` calls with equal
/// arguments share a stream.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: SimRng,
    samplers: HashMap<(u64, u64, u64), SkewedSampler>,
}

impl RandomSource {
    /// Create a random source with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SimRng::new(seed),
            samplers: HashMap::new(),
        }
    }

    /// Draw from the bounded skewed distribution for `(min, max, mean)`.
    ///
    /// Arguments must already satisfy `min < max`, `min <= mean <= max`.
    pub fn skewed(&mut self, min: f64, max: f64, mean: f64) -> f64 {
        let key = (min.to_bits(), max.to_bits(), mean.to_bits());
        let sampler = self
            .samplers
            .entry(key)
            .or_insert_with(|| SkewedSampler::new(min, max, mean));
        sampler.sample(&mut self.rng)
    }
}
