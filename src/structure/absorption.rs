/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Sample transmission correction
//!
//! A flat sample of thickness `t` with absorption length `λ_abs` attenuates the
//! beam scattered at `2θ` by `exp(-t / (λ_abs cos 2θ))`. The measured sample
//! intensity is divided by that factor. Thickness is one of the parameters the
//! grid search can refine.

use serde::{Deserialize, Serialize};

use crate::utils::two_theta;

/// Smallest `cos 2θ` used, which bounds the path length at grazing exit
const MIN_COS_TWO_THETA: f64 = 1e-3;

/// Transmission geometry of the sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsorptionCorrection {
    /// X-ray wavelength (nm)
    pub wavelength: f64,
    /// Absorption length of the sample, same unit as the thickness
    pub absorption_length: f64,
    /// Initial sample thickness
    pub thickness: f64,
}

impl AbsorptionCorrection {
    /// Multiplicative correction at `q` for a given thickness
    pub fn factor(&self, q: f64, thickness: f64) -> f64 {
        if self.absorption_length <= 0.0 || thickness == 0.0 {
            return 1.0;
        }
        let cos_two_theta = two_theta(q, self.wavelength)
            .map_or(MIN_COS_TWO_THETA, |angle| angle.cos().max(MIN_COS_TWO_THETA));
        (thickness / (self.absorption_length * cos_two_theta)).exp()
    }

    /// Correction factors on a whole grid
    pub fn factors(&self, q: &[f64], thickness: f64) -> Vec<f64> {
        q.iter().map(|&qv| self.factor(qv, thickness)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_forward_direction() {
        let geometry = AbsorptionCorrection {
            wavelength: 0.03344,
            absorption_length: 2.0,
            thickness: 0.5,
        };
        assert_relative_eq!(geometry.factor(0.0, 0.5), 0.25f64.exp(), epsilon = 1e-12);
        assert_relative_eq!(geometry.factor(40.0, 0.0), 1.0);
    }

    #[test]
    fn test_factor_grows_with_angle() {
        let geometry = AbsorptionCorrection {
            wavelength: 0.03344,
            absorption_length: 2.0,
            thickness: 0.5,
        };
        let factors = geometry.factors(&[10.0, 60.0, 120.0], 0.5);
        assert!(factors[0] < factors[1] && factors[1] < factors[2]);
    }
}
