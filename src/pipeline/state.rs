/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Immutable results of one pipeline evaluation

use serde::{Deserialize, Serialize};

use crate::refine::Parameters;
use crate::structure::StructureFactor;
use crate::transform::{corrected_structure_factor, pair_distribution, QuadratureRule, RealSpaceCurve};

/// Scalars that describe a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarState {
    pub s_inf: f64,
    pub z_total: f64,
    pub density: f64,
    pub scale_factor: f64,
    pub r_min: f64,
    pub damping_factor: f64,
    pub smoothing_factor: f64,
    pub iterations: usize,
}

/// Everything one evaluation produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineState {
    pub parameters: Parameters,
    pub scalars: ScalarState,
    /// Normalization factor α
    pub alpha: f64,
    /// Asymptote S∞ of the chosen formalism
    pub asymptote: f64,
    /// S(Q) on the measurement grid, before smoothing
    pub q: Vec<f64>,
    pub s_q: Vec<f64>,
    /// Smoothed and damped S(Q) on the transform grid
    pub q_smoothed: Vec<f64>,
    pub s_q_smoothed: Vec<f64>,
    /// i(Q) after the Kaplow correction
    pub i_q: Vec<f64>,
    /// F(r) after the Kaplow correction
    pub f_r: RealSpaceCurve,
    /// Deviation from the low-r constraint
    pub delta_f: Vec<f64>,
    pub chi_square: f64,
}

impl PipelineState {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        parameters: Parameters,
        scalars: ScalarState,
        raw: StructureFactor,
        smoothed: StructureFactor,
        i_q: Vec<f64>,
        f_r: RealSpaceCurve,
        delta_f: Vec<f64>,
        chi_square: f64,
    ) -> Self {
        Self {
            parameters,
            scalars,
            alpha: raw.alpha,
            asymptote: raw.asymptote,
            q: raw.q,
            s_q: raw.s_q,
            q_smoothed: smoothed.q,
            s_q_smoothed: smoothed.s_q,
            i_q,
            f_r,
            delta_f,
            chi_square,
        }
    }

    /// Refined S(Q) = i(Q) + S∞ on the transform grid
    pub fn refined_structure_factor(&self) -> Vec<f64> {
        self.i_q.iter().map(|i| i + self.asymptote).collect()
    }

    /// g(r) of the refined F(r)
    pub fn pair_distribution(&self) -> Vec<f64> {
        pair_distribution(&self.f_r, self.parameters.density)
    }

    /// S(Q) back-transformed from the refined F(r)
    pub fn back_transformed_structure_factor(&self, rule: QuadratureRule) -> Vec<f64> {
        corrected_structure_factor(&self.f_r, &self.q_smoothed, self.asymptote, rule)
    }
}
