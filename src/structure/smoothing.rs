/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Spline smoothing and damping of S(Q) before the Fourier step

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::builder::StructureFactor;
use crate::grid::QRanges;
use crate::utils::math::linspace;
use crate::utils::{CubicSpline, Result, UtilsError};

/// Minimum number of low-Q samples that get their own spline
const MIN_LOW_Q_POINTS: usize = 3;

/// Envelope applied to `S(Q) - S∞`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DampingFunction {
    /// `exp(-(d / QmaxIntegrate²) Q²)`
    #[default]
    Exponential,
    /// `sin(πQ/QmaxIntegrate) / (πQ/QmaxIntegrate)`, independent of the damping factor
    Lorch,
}

impl DampingFunction {
    pub fn value(&self, q: f64, q_max_integrate: f64, damping_factor: f64) -> f64 {
        match self {
            DampingFunction::Exponential => {
                let exponent_factor = damping_factor / (q_max_integrate * q_max_integrate);
                (-exponent_factor * q * q).exp()
            }
            DampingFunction::Lorch => {
                let x = PI * q / q_max_integrate;
                if x == 0.0 {
                    1.0
                } else {
                    x.sin() / x
                }
            }
        }
    }
}

/// Smoothing and damping settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingOptions {
    /// Residual budget of the smoothing spline
    pub smoothing_factor: f64,
    /// Number of uniform samples after smoothing, `None` keeps the input count
    pub target_points: Option<usize>,
    pub damping_factor: f64,
    pub damping: DampingFunction,
}

impl Default for SmoothingOptions {
    fn default() -> Self {
        Self {
            smoothing_factor: 0.25,
            target_points: None,
            damping_factor: 0.5,
            damping: DampingFunction::Exponential,
        }
    }
}

/// Damping envelope sampled on `q`
pub fn damping_curve(
    function: DampingFunction,
    q: &[f64],
    q_max_integrate: f64,
    damping_factor: f64,
) -> Vec<f64> {
    q.iter()
        .map(|&qv| function.value(qv, q_max_integrate, damping_factor))
        .collect()
}

/// Uniform Q grid that [`smooth`] produces for input samples `q`
///
/// Spans the same Q range as `q` with `target_points` samples, or with as
/// many samples as `q` has when no target is set.
pub fn smoothed_grid(q: &[f64], options: &SmoothingOptions) -> Vec<f64> {
    match (q.first(), q.last()) {
        (Some(&first), Some(&last)) if q.len() > 1 => {
            let points = options.target_points.unwrap_or(q.len());
            linspace(first, last, points.max(2))
        }
        _ => q.to_vec(),
    }
}

/// Smooth S(Q) with a cubic smoothing spline and resample it
///
/// The spline is fitted on `minQ < Q ≤ maxQ`. Samples at or below `minQ` use
/// a separate spline over that sub-range when it holds enough points and are
/// pinned to 0 otherwise; samples above `QmaxIntegrate` are pinned to S∞.
///
/// # Errors
///
/// Fails when fewer than two samples lie in the smoothing range or when the
/// spline fit itself fails.
pub fn smooth(
    structure_factor: &StructureFactor,
    ranges: &QRanges,
    options: &SmoothingOptions,
) -> Result<StructureFactor> {
    let q = &structure_factor.q;
    let s_q = &structure_factor.s_q;
    if q.len() != s_q.len() {
        return Err(UtilsError::LengthMismatch {
            expected: q.len(),
            found: s_q.len(),
        });
    }

    let low_end = q.partition_point(|&v| v <= ranges.min_q);
    let max_end = q.partition_point(|&v| v <= ranges.max_q);
    if max_end < low_end + 2 {
        return Err(UtilsError::Math(format!(
            "Smoothing needs at least two samples in ({}, {}]",
            ranges.min_q, ranges.max_q
        )));
    }

    let spline = CubicSpline::smoothing(
        &q[low_end..max_end],
        &s_q[low_end..max_end],
        options.smoothing_factor,
    )?;
    let low_spline = if low_end >= MIN_LOW_Q_POINTS {
        Some(CubicSpline::smoothing(
            &q[..low_end],
            &s_q[..low_end],
            options.smoothing_factor,
        )?)
    } else {
        None
    };

    let new_q = smoothed_grid(q, options);

    let asymptote = structure_factor.asymptote;
    let smoothed = new_q
        .iter()
        .map(|&qv| {
            if qv <= ranges.min_q {
                low_spline.as_ref().map_or(0.0, |s| s.evaluate(qv))
            } else if qv <= ranges.q_max_integrate {
                spline.evaluate(qv)
            } else {
                asymptote
            }
        })
        .collect();

    log::debug!(
        "Smoothed S(Q): {} -> {} samples, smoothing factor {}",
        q.len(),
        new_q.len(),
        options.smoothing_factor
    );

    Ok(StructureFactor {
        q: new_q,
        s_q: smoothed,
        alpha: structure_factor.alpha,
        asymptote,
    })
}

/// Apply `(S - S∞)·D(Q) + S∞`
pub fn damp(
    structure_factor: &StructureFactor,
    q_max_integrate: f64,
    options: &SmoothingOptions,
) -> StructureFactor {
    let asymptote = structure_factor.asymptote;
    let s_q = structure_factor
        .q
        .iter()
        .zip(&structure_factor.s_q)
        .map(|(&q, &s)| {
            (s - asymptote) * options.damping.value(q, q_max_integrate, options.damping_factor)
                + asymptote
        })
        .collect();
    StructureFactor {
        q: structure_factor.q.clone(),
        s_q,
        alpha: structure_factor.alpha,
        asymptote,
    }
}
