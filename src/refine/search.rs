/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Adaptive one-dimensional grid search
//!
//! Each zoom level scores 23 evenly spaced candidates around the current
//! centre, in parallel. The best candidate becomes the new centre. When it is
//! an interior point the step shrinks tenfold; when it sits on the window edge
//! the minimum lies outside and the step grows tenfold instead. Scores above
//! the divergence threshold (or non-finite) mark the parameter region where
//! the pipeline blows up, and candidates from there on are ignored. A final
//! quadratic fit around the best candidate refines the result below the last
//! step size.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::utils::constants::{DIVERGENCE_THRESHOLD, MAX_NO_PEAK, NUM_SAMPLES};
use crate::utils::math::polynomial_fit;

const CENTRE_INDEX: usize = NUM_SAMPLES / 2;
const FIT_POINTS: usize = 5;
const FLAT_TOLERANCE: f64 = 1e-12;

/// Scores this small are rounding noise of a perfect fit
const NEGLIGIBLE_SCORE: f64 = 1e-18;

/// A scalar function to minimize
pub trait Objective: Sync {
    fn score(&self, value: f64) -> f64;
}

impl<F> Objective for F
where
    F: Fn(f64) -> f64 + Sync,
{
    fn score(&self, value: f64) -> f64 {
        self(value)
    }
}

/// Limits of the grid search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub max_zoom_levels: usize,
    pub max_no_peak: usize,
    pub divergence_threshold: f64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_zoom_levels: 20,
            max_no_peak: MAX_NO_PEAK,
            divergence_threshold: DIVERGENCE_THRESHOLD,
        }
    }
}

/// Result of one search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub value: f64,
    pub score: f64,
    /// Zoom levels evaluated
    pub levels: usize,
    /// Levels whose best candidate sat on the window edge
    pub no_peak: usize,
    /// Whether any candidate exceeded the divergence threshold
    pub diverged: bool,
}

/// One evaluated zoom level
struct Level {
    candidates: Vec<f64>,
    scores: Vec<f64>,
    best: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GridSearchOptimizer {
    options: SearchOptions,
}

impl GridSearchOptimizer {
    pub fn new(options: SearchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Minimize `objective` starting at `start` with initial `step`
    ///
    /// The search zooms until a level with `step ≤ end` has been evaluated
    /// with an interior minimum, or a guard (edge hits, level cap,
    /// `lower_bound`) stops it.
    pub fn minimize<O>(
        &self,
        objective: &O,
        start: f64,
        step: f64,
        end: f64,
        lower_bound: Option<f64>,
    ) -> SearchOutcome
    where
        O: Objective + ?Sized,
    {
        let mut centre = start;
        let mut step = step;
        let mut no_peak = 0;
        let mut levels = 0;
        let mut diverged = false;
        let mut last: Option<Level> = None;

        loop {
            if step == 0.0 || !step.is_finite() {
                log::debug!("Grid search step is {}, keeping {}", step, centre);
                break;
            }

            let candidates: Vec<f64> = (0..NUM_SAMPLES)
                .map(|i| centre + (i as f64 - CENTRE_INDEX as f64) * step)
                .collect();
            let scores: Vec<f64> = candidates
                .par_iter()
                .map(|&value| objective.score(value))
                .collect();
            levels += 1;

            let first_divergent = scores.iter().position(|&s| self.is_divergent(s));
            if let Some(index) = first_divergent {
                diverged = true;
                log::warn!(
                    "Grid search diverged at {} (candidate {}), restricting the minimum search",
                    candidates[index],
                    index
                );
            }
            let best = self.best_candidate(&scores, first_divergent);

            if is_flat(&scores) {
                log::debug!("Flat objective around {}, stopping", centre);
                return SearchOutcome {
                    value: centre,
                    score: scores[CENTRE_INDEX],
                    levels,
                    no_peak,
                    diverged,
                };
            }

            let evaluated_step = step;
            let edge = best == 0 || best == NUM_SAMPLES - 1;
            centre = candidates[best];
            if edge {
                step *= 10.0;
                no_peak += 1;
            } else {
                step /= 10.0;
            }
            log::debug!(
                "Zoom level {}: best {} (score {:.6e}), next step {}",
                levels,
                centre,
                scores[best],
                step
            );
            last = Some(Level {
                candidates,
                scores,
                best,
            });

            if let Some(bound) = lower_bound {
                if centre < bound {
                    log::warn!("Grid search left the allowed range at {}", centre);
                    break;
                }
            }
            let keep_zooming = evaluated_step > end || edge;
            if !keep_zooming
                || no_peak >= self.options.max_no_peak
                || levels >= self.options.max_zoom_levels
            {
                break;
            }
        }

        let (mut value, mut score) = match &last {
            Some(level) => (
                self.refine_minimum(level).unwrap_or(level.candidates[level.best]),
                level.scores[level.best],
            ),
            None => (centre, f64::NAN),
        };
        if let Some(bound) = lower_bound {
            value = value.max(bound);
        }
        let best_value = last.as_ref().map(|l| l.candidates[l.best]);
        if best_value != Some(value) {
            score = objective.score(value);
        }

        SearchOutcome {
            value,
            score,
            levels,
            no_peak,
            diverged,
        }
    }

    fn is_divergent(&self, score: f64) -> bool {
        !score.is_finite() || score > self.options.divergence_threshold
    }

    /// Index of the lowest admissible score
    fn best_candidate(&self, scores: &[f64], first_divergent: Option<usize>) -> usize {
        let admissible: Vec<usize> = match first_divergent {
            None => (0..scores.len()).collect(),
            Some(0) => {
                let finite: Vec<usize> = (0..scores.len())
                    .filter(|&i| !self.is_divergent(scores[i]))
                    .collect();
                if finite.is_empty() {
                    (0..scores.len()).collect()
                } else {
                    finite
                }
            }
            Some(index) => (0..index).collect(),
        };
        admissible
            .into_iter()
            .min_by(|&a, &b| ordered(scores[a]).total_cmp(&ordered(scores[b])))
            .unwrap_or(CENTRE_INDEX)
    }

    /// Vertex of a parabola through the five candidates around the best one
    ///
    /// `None` when the fit has no positive curvature or its vertex falls
    /// outside the fitted span.
    fn refine_minimum(&self, level: &Level) -> Option<f64> {
        let lo = level
            .best
            .saturating_sub(FIT_POINTS / 2)
            .min(NUM_SAMPLES - FIT_POINTS);
        let origin = level.candidates[level.best];
        let (x, y): (Vec<f64>, Vec<f64>) = (lo..lo + FIT_POINTS)
            .filter(|&i| !self.is_divergent(level.scores[i]))
            .map(|i| (level.candidates[i] - origin, level.scores[i]))
            .unzip();
        if x.len() < 3 {
            return None;
        }

        let coeffs = polynomial_fit(&x, &y, 2).ok()?;
        if coeffs[2] <= 0.0 {
            return None;
        }
        let vertex = -coeffs[1] / (2.0 * coeffs[2]);
        let (min_x, max_x) = (x[0], x[x.len() - 1]);
        (vertex >= min_x && vertex <= max_x).then_some(origin + vertex)
    }
}

/// NaN sorts after every number
fn ordered(score: f64) -> f64 {
    if score.is_nan() {
        f64::INFINITY
    } else {
        score
    }
}

fn is_flat(scores: &[f64]) -> bool {
    if scores.iter().any(|s| !s.is_finite()) {
        return false;
    }
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    max - min <= FLAT_TOLERANCE * max.abs() || max.abs().max(min.abs()) <= NEGLIGIBLE_SCORE
}
