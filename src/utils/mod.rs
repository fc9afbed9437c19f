/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Utility functions shared by the analysis stages
//!
//! Numerical integration, FFT, interpolation, splines and unit conversions.

pub mod constants;
pub mod errors;
pub mod math;
pub mod spline;

pub use errors::{Result, UtilsError};
pub use math::{
    fft_in_place, interpolate_onto, interpolate_table, linspace, mean_spacing, nearest_index,
    polynomial_fit, real_fft, simpson,
};
pub use spline::CubicSpline;

/// Convert a length from Ångström to nanometres
pub fn angstrom_to_nm(angstrom: f64) -> f64 {
    angstrom * constants::ANGSTROM_TO_NM
}

/// Scattering angle 2θ (radians) for momentum transfer `q` (nm⁻¹) and wavelength (nm)
///
/// Returns `None` when `q` exceeds the kinematic limit `4π/λ`.
pub fn two_theta(q: f64, wavelength: f64) -> Option<f64> {
    let sin_theta = q * wavelength / (4.0 * std::f64::consts::PI);
    if !(0.0..=1.0).contains(&sin_theta.abs()) {
        return None;
    }
    Some(2.0 * sin_theta.asin())
}
