/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Direct sine-transform quadrature between i(Q) and F(r)

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::utils::math::{mean_spacing, simpson};

/// Integration rule of the direct transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuadratureRule {
    /// Rectangle sum with the mean sample spacing
    Riemann,
    /// Composite Simpson rule
    #[default]
    Simpson,
}

impl QuadratureRule {
    /// Integrate sampled `y` over `x`
    pub fn integrate(&self, y: &[f64], x: &[f64]) -> f64 {
        match self {
            QuadratureRule::Riemann => y.iter().sum::<f64>() * mean_spacing(x),
            QuadratureRule::Simpson => simpson(y, x),
        }
    }
}

/// Default real-space grid of the direct transform
///
/// `r_k = k / (N·ΔQ)` for `k < ⌈N/2⌉`, the non-negative frequencies of an
/// `N`-point transform with spacing `ΔQ`.
pub fn direct_r_grid(q: &[f64]) -> Vec<f64> {
    let n = q.len();
    let dq = mean_spacing(q);
    if n < 2 || dq <= 0.0 {
        return vec![0.0];
    }
    let step = 1.0 / (n as f64 * dq);
    (0..n.div_ceil(2)).map(|k| k as f64 * step).collect()
}

/// `F(r) = (2/π) ∫ Q·i(Q)·sin(rQ) dQ` over `Q ≤ q_max_integrate`
pub fn direct_transform(
    q: &[f64],
    i_q: &[f64],
    r: &[f64],
    q_max_integrate: f64,
    rule: QuadratureRule,
) -> Vec<f64> {
    let end = q
        .partition_point(|&v| v <= q_max_integrate)
        .min(i_q.len());
    let q = &q[..end];
    let qi: Vec<f64> = q.iter().zip(&i_q[..end]).map(|(&qv, &i)| qv * i).collect();

    let mut integrand = vec![0.0; end];
    r.iter()
        .map(|&rv| {
            for ((slot, &qv), &qiv) in integrand.iter_mut().zip(q).zip(&qi) {
                *slot = qiv * (rv * qv).sin();
            }
            2.0 / PI * rule.integrate(&integrand, q)
        })
        .collect()
}

/// `Q·i(Q) = ∫ F(r)·sin(Qr) dr` over the full r grid
pub fn inverse_direct_transform(
    r: &[f64],
    f_r: &[f64],
    q: &[f64],
    rule: QuadratureRule,
) -> Vec<f64> {
    let mut integrand = vec![0.0; r.len().min(f_r.len())];
    let r = &r[..integrand.len()];
    q.iter()
        .map(|&qv| {
            for ((slot, &rv), &f) in integrand.iter_mut().zip(r).zip(f_r) {
                *slot = f * (qv * rv).sin();
            }
            rule.integrate(&integrand, r)
        })
        .collect()
}
