/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Real-space curves and quantities derived from F(r)

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use super::quadrature::{inverse_direct_transform, QuadratureRule};

/// A function of r sampled on a uniform grid starting at r = 0 (nm)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RealSpaceCurve {
    pub r: Vec<f64>,
    pub f: Vec<f64>,
}

impl RealSpaceCurve {
    pub fn new(r: Vec<f64>, f: Vec<f64>) -> Self {
        Self { r, f }
    }

    pub fn len(&self) -> usize {
        self.r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    /// Keep only the samples with `r ≤ max_r`
    pub fn truncate(&mut self, max_r: f64) {
        let keep = self.r.partition_point(|&r| r <= max_r);
        self.r.truncate(keep);
        self.f.truncate(keep);
    }
}

/// Pair-distribution function `g(r) = 1 + F(r)/(4πrρ)`
///
/// g(0) is 0, and a vanishing density leaves `g = 1` away from the origin.
pub fn pair_distribution(curve: &RealSpaceCurve, density: f64) -> Vec<f64> {
    curve
        .r
        .iter()
        .zip(&curve.f)
        .map(|(&r, &f)| {
            if r == 0.0 {
                return 0.0;
            }
            let norm = 4.0 * PI * r * density;
            if norm == 0.0 {
                1.0
            } else {
                1.0 + f / norm
            }
        })
        .collect()
}

/// S(Q) implied by F(r): `S = (1/Q)∫F(r) sin(Qr) dr + S∞`
///
/// The Q = 0 sample is set to S∞.
pub fn corrected_structure_factor(
    curve: &RealSpaceCurve,
    q: &[f64],
    asymptote: f64,
    rule: QuadratureRule,
) -> Vec<f64> {
    let qi = inverse_direct_transform(&curve.r, &curve.f, q, rule);
    q.iter()
        .zip(qi)
        .map(|(&qv, qiv)| {
            if qv == 0.0 {
                asymptote
            } else {
                qiv / qv + asymptote
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::quadrature::direct_transform;
    use crate::utils::math::linspace;
    use approx::assert_relative_eq;

    #[test]
    fn test_truncate() {
        let mut curve = RealSpaceCurve::new(linspace(0.0, 1.0, 11), vec![1.0; 11]);
        curve.truncate(0.45);
        assert_eq!(curve.len(), 5);
        assert_eq!(curve.f.len(), 5);
    }

    #[test]
    fn test_pair_distribution() {
        let curve = RealSpaceCurve::new(vec![0.0, 0.5, 1.0], vec![3.0, -2.0 * PI, 0.0]);
        let g = pair_distribution(&curve, 1.0);
        assert_eq!(g[0], 0.0);
        assert_relative_eq!(g[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(g[2], 1.0);
        assert_eq!(pair_distribution(&curve, 0.0)[1], 1.0);
    }

    #[test]
    fn test_corrected_structure_factor_recovers_input() {
        let a = 0.02;
        let q = linspace(0.0, 80.0, 1601);
        let i_q: Vec<f64> = q.iter().map(|&v| (-a * v * v).exp()).collect();
        let r = linspace(0.0, 4.0, 801);
        let f = direct_transform(&q, &i_q, &r, 80.0, QuadratureRule::Simpson);
        let curve = RealSpaceCurve::new(r, f);

        let s = corrected_structure_factor(&curve, &q[..200], 0.8, QuadratureRule::Simpson);
        assert_relative_eq!(s[0], 0.8);
        for (&qv, &sv) in q[1..200].iter().zip(&s[1..]) {
            assert_relative_eq!(sv, (-a * qv * qv).exp() + 0.8, epsilon = 1e-3);
        }
    }
}
