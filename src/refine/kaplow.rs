/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Kaplow correction of the low-r region of F(r)
//!
//! Below the shortest interatomic distance `rmin`, F(r) must equal
//! `Fintra(r) - 4πrρ`. Each iteration measures the deviation
//!
//! `δF(r) = F(r) - (Fintra(r) - 4πrρ)`
//!
//! and removes its sine transform from i(Q):
//!
//! `i'(Q) = i(Q) - (1/Q)·(i(Q)/(S∞ + J(Q)) + 1)·∫₀^rmin δF(r) sin(rQ) dr`
//!
//! after which F(r) is recomputed. There is no internal convergence test;
//! the iteration count is fixed.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::structure::formalism::safe_ratio;
use crate::transform::{direct_transform, QuadratureRule};
use crate::utils::math::simpson;

/// Settings of the low-r refinement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefinementOptions {
    /// Number of Kaplow iterations
    pub iterations: usize,
    /// Shortest interatomic distance (nm)
    pub r_min: f64,
}

impl Default for RefinementOptions {
    fn default() -> Self {
        Self {
            iterations: 2,
            r_min: 0.22,
        }
    }
}

/// Everything one refinement run reads
#[derive(Debug, Clone, Copy)]
pub struct KaplowInput<'a> {
    pub q: &'a [f64],
    /// Initial i(Q) = S(Q) - S∞
    pub i_q: &'a [f64],
    /// Incoherent ratio J(Q) on `q`
    pub j_q: &'a [f64],
    pub r: &'a [f64],
    /// Initial F(r) on `r`
    pub f_r: &'a [f64],
    /// Intramolecular F(r) on `r`
    pub f_intra: &'a [f64],
    pub asymptote: f64,
    pub density: f64,
    pub q_max_integrate: f64,
}

/// Result of a refinement run
#[derive(Debug, Clone, PartialEq)]
pub struct KaplowOutcome {
    pub i_q: Vec<f64>,
    pub f_r: Vec<f64>,
    /// Deviation from the low-r constraint before the last correction
    pub delta_f: Vec<f64>,
}

/// Iterative low-r correction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KaplowRefiner {
    pub iterations: usize,
    pub r_min: f64,
    pub rule: QuadratureRule,
}

impl KaplowRefiner {
    pub fn new(options: RefinementOptions, rule: QuadratureRule) -> Self {
        Self {
            iterations: options.iterations,
            r_min: options.r_min,
            rule,
        }
    }

    /// Run the fixed number of iterations
    ///
    /// With zero iterations the input is returned together with its δF.
    pub fn refine(&self, input: &KaplowInput<'_>) -> KaplowOutcome {
        let r_end = input.r.partition_point(|&r| r < self.r_min);
        let q_end = input.q.partition_point(|&q| q <= input.q_max_integrate);
        let r_low = &input.r[..r_end];

        let mut i_q = input.i_q.to_vec();
        let mut f_r = input.f_r.to_vec();
        let mut delta_f = constraint_deviation(&f_r, input.f_intra, input.r, input.density);

        for iteration in 0..self.iterations {
            if iteration > 0 {
                delta_f = constraint_deviation(&f_r, input.f_intra, input.r, input.density);
            }

            let mut integrand = vec![0.0; r_end];
            for (j, &q) in input.q[..q_end].iter().enumerate() {
                if q == 0.0 {
                    continue;
                }
                for ((slot, &r), &df) in integrand.iter_mut().zip(r_low).zip(&delta_f) {
                    *slot = df * (r * q).sin();
                }
                let integral = simpson(&integrand, r_low);
                let weight = safe_ratio(i_q[j], input.asymptote + input.j_q[j]) + 1.0;
                i_q[j] -= weight * integral / q;
            }

            f_r = direct_transform(input.q, &i_q, input.r, input.q_max_integrate, self.rule);
            log::debug!(
                "Kaplow iteration {}: chi2 = {:.6e}",
                iteration + 1,
                chi_square(input.r, &delta_f, self.r_min)
            );
        }

        KaplowOutcome {
            i_q,
            f_r,
            delta_f,
        }
    }
}

/// `δF(r) = F(r) - (Fintra(r) - 4πrρ)`
pub fn constraint_deviation(f_r: &[f64], f_intra: &[f64], r: &[f64], density: f64) -> Vec<f64> {
    f_r.iter()
        .zip(f_intra)
        .zip(r)
        .map(|((&f, &intra), &rv)| f - (intra - 4.0 * PI * rv * density))
        .collect()
}

/// Mean of `δF²` over the samples with `0 < r < r_min`, 0 when there are none
pub fn chi_square(r: &[f64], delta_f: &[f64], r_min: f64) -> f64 {
    let (sum, count) = r
        .iter()
        .zip(delta_f)
        .filter(|(&rv, _)| rv > 0.0 && rv < r_min)
        .fold((0.0, 0usize), |(sum, count), (_, &df)| (sum + df * df, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::math::linspace;
    use approx::assert_relative_eq;

    #[test]
    fn test_constraint_deviation_and_chi_square() {
        let r = vec![0.0, 0.1, 0.2, 0.3];
        let f = vec![0.0, -4.0 * PI * 0.1, 0.5, 7.0];
        let delta = constraint_deviation(&f, &[0.0; 4], &r, 1.0);
        assert_relative_eq!(delta[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(delta[2], 0.5 + 4.0 * PI * 0.2, epsilon = 1e-12);
        // only r = 0.1 and r = 0.2 lie in (0, 0.25)
        assert_relative_eq!(
            chi_square(&r, &delta, 0.25),
            delta[2] * delta[2] / 2.0,
            epsilon = 1e-12
        );
        assert_eq!(chi_square(&r, &delta, 0.0), 0.0);
    }

    #[test]
    fn test_zero_iterations_return_input() {
        let q = linspace(0.0, 10.0, 11);
        let r = linspace(0.0, 1.0, 11);
        let f = vec![0.3; 11];
        let input = KaplowInput {
            q: &q,
            i_q: &[0.0; 11],
            j_q: &[0.0; 11],
            r: &r,
            f_r: &f,
            f_intra: &[0.0; 11],
            asymptote: 1.0,
            density: 0.0,
            q_max_integrate: 10.0,
        };
        let refiner = KaplowRefiner {
            iterations: 0,
            r_min: 0.5,
            rule: QuadratureRule::Simpson,
        };
        let outcome = refiner.refine(&input);
        assert_eq!(outcome.f_r, f);
        assert_eq!(outcome.delta_f, vec![0.3; 11]);
    }

    #[test]
    fn test_satisfied_constraint_is_a_fixed_point() {
        // ideal gas without density: i = 0 gives F = 0 = Fintra - 4πrρ
        let q = linspace(0.0, 50.0, 501);
        let r = linspace(0.0, 2.0, 101);
        let zeros_q = vec![0.0; q.len()];
        let zeros_r = vec![0.0; r.len()];
        let input = KaplowInput {
            q: &q,
            i_q: &zeros_q,
            j_q: &zeros_q,
            r: &r,
            f_r: &zeros_r,
            f_intra: &zeros_r,
            asymptote: 1.0,
            density: 0.0,
            q_max_integrate: 45.0,
        };
        let outcome = KaplowRefiner::new(
            RefinementOptions {
                iterations: 3,
                r_min: 0.25,
            },
            QuadratureRule::Simpson,
        )
        .refine(&input);
        assert!(outcome.i_q.iter().all(|&v| v == 0.0));
        assert!(outcome.f_r.iter().all(|&v| v == 0.0));
        assert_eq!(chi_square(&r, &outcome.delta_f, 0.25), 0.0);
    }

    #[test]
    fn test_correction_reduces_low_r_error() {
        let density = 20.0;
        let q = linspace(0.0, 60.0, 1201);
        let r = linspace(0.0, 3.0, 301);
        // a smooth i(Q) that violates F = -4πrρ below rmin
        let i_q: Vec<f64> = q.iter().map(|&v| 0.4 * (-0.01 * v * v).exp()).collect();
        let j_q = vec![0.0; q.len()];
        let f_intra = vec![0.0; r.len()];
        let f_r = direct_transform(&q, &i_q, &r, 55.0, QuadratureRule::Simpson);

        let input = KaplowInput {
            q: &q,
            i_q: &i_q,
            j_q: &j_q,
            r: &r,
            f_r: &f_r,
            f_intra: &f_intra,
            asymptote: 1.0,
            density,
            q_max_integrate: 55.0,
        };
        let before = chi_square(&r, &constraint_deviation(&f_r, &f_intra, &r, density), 0.2);
        let refiner = KaplowRefiner {
            iterations: 3,
            r_min: 0.2,
            rule: QuadratureRule::Simpson,
        };
        let outcome = refiner.refine(&input);
        let after = chi_square(
            &r,
            &constraint_deviation(&outcome.f_r, &f_intra, &r, density),
            0.2,
        );
        assert!(after < before, "chi2 {} -> {}", before, after);
    }

    #[test]
    fn test_tail_above_integration_limit_is_untouched() {
        let q = linspace(0.0, 60.0, 601);
        let r = linspace(0.0, 3.0, 301);
        let i_q: Vec<f64> = q.iter().map(|&v| 0.4 * (-0.01 * v * v).exp()).collect();
        let f_r = direct_transform(&q, &i_q, &r, 50.0, QuadratureRule::Simpson);
        let input = KaplowInput {
            q: &q,
            i_q: &i_q,
            j_q: &vec![0.0; q.len()],
            r: &r,
            f_r: &f_r,
            f_intra: &vec![0.0; r.len()],
            asymptote: 1.0,
            density: 20.0,
            q_max_integrate: 50.0,
        };
        let outcome = KaplowRefiner::new(RefinementOptions::default(), QuadratureRule::Simpson)
            .refine(&input);

        let tail = q.partition_point(|&v| v <= 50.0);
        assert!(tail < q.len());
        assert_eq!(&outcome.i_q[tail..], &i_q[tail..]);
        assert!(outcome.i_q[1..tail]
            .iter()
            .zip(&i_q[1..tail])
            .any(|(a, b)| a != b));
    }
}
