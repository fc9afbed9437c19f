/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Fourier transforms between reciprocal and real space
//!
//! The reduced pair-distribution function is
//!
//! `F(r) = (2/π) ∫ Q·i(Q)·sin(rQ) dQ`, with `i(Q) = S(Q) - S∞`
//!
//! integrated up to QmaxIntegrate. It can be evaluated by direct quadrature on
//! any r grid or by a zero-padded FFT on the FFT's own grid.

pub mod fft;
pub mod quadrature;
pub mod real_space;

use serde::{Deserialize, Serialize};

pub use fft::{fft_forward, fft_inverse, fft_r_grid, padded_length};
pub use quadrature::{direct_r_grid, direct_transform, inverse_direct_transform, QuadratureRule};
pub use real_space::{corrected_structure_factor, pair_distribution, RealSpaceCurve};

use crate::utils::Result;

/// How the forward transform is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMethod {
    #[default]
    Direct,
    Fft,
}

/// Forward-transform settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    pub method: TransformMethod,
    /// Rule of the direct quadrature, also used by the Kaplow correction
    pub rule: QuadratureRule,
    /// Largest r kept in the output (nm)
    pub max_r: Option<f64>,
}

impl TransformOptions {
    /// r grid the forward transform produces for `q`
    pub fn r_grid(&self, q: &[f64], q_max_integrate: f64) -> Vec<f64> {
        let mut r = match self.method {
            TransformMethod::Direct => direct_r_grid(q),
            TransformMethod::Fft => fft_r_grid(q, q_max_integrate),
        };
        if let Some(max_r) = self.max_r {
            r.truncate(r.partition_point(|&v| v <= max_r));
        }
        r
    }

    /// Forward transform of `i(Q)` onto `r`
    ///
    /// On the FFT path `r` must be a prefix of [`TransformOptions::r_grid`].
    pub fn forward(
        &self,
        q: &[f64],
        i_q: &[f64],
        r: &[f64],
        q_max_integrate: f64,
    ) -> Result<RealSpaceCurve> {
        match self.method {
            TransformMethod::Direct => Ok(RealSpaceCurve::new(
                r.to_vec(),
                direct_transform(q, i_q, r, q_max_integrate, self.rule),
            )),
            TransformMethod::Fft => {
                let mut curve = fft_forward(q, i_q, q_max_integrate)?;
                curve.r.truncate(r.len());
                curve.f.truncate(r.len());
                Ok(curve)
            }
        }
    }
}
