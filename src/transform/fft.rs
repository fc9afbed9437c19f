/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! FFT-based sine transforms between i(Q) and F(r)
//!
//! Both directions compute `Σ_j y_j sin(ω_k x_j) Δx` on a uniform grid
//! `x_j = x_0 + jΔx` with `ω_k = 2πk/(Δx N)`. Writing the sine as the
//! imaginary part of a phase-shifted inverse DFT gives
//! `Im(exp(iω_k x_0) · conj(X_k)) Δx`, where `X` is the forward FFT of `y`.
//! For `x_0 = 0` this reduces to `-Im(X_k) Δx`.

use num_complex::Complex64;
use std::f64::consts::PI;

use super::real_space::RealSpaceCurve;
use crate::utils::math::{interpolate_onto, mean_spacing, nearest_index, real_fft};
use crate::utils::{Result, UtilsError};

/// Zero-padded FFT length for a transform using samples `0..=last_index`
pub fn padded_length(last_index: usize) -> usize {
    4 * (5 * (last_index + 1)).next_power_of_two()
}

/// Largest deviation of a spacing from the mean, relative to the mean
const UNIFORM_TOLERANCE: f64 = 1e-6;

fn check_uniform(x: &[f64], axis: &str) -> Result<f64> {
    let dx = mean_spacing(x);
    let uniform = dx > 0.0
        && x.windows(2)
            .all(|w| ((w[1] - w[0]) - dx).abs() <= UNIFORM_TOLERANCE * dx);
    if !uniform {
        return Err(UtilsError::Math(format!(
            "FFT needs a uniform {} axis ({} samples, mean spacing {})",
            axis,
            x.len(),
            dx
        )));
    }
    Ok(dx)
}

/// Sine transform of `y` sampled from `x0` with spacing `dx`, zero padded to `n`
///
/// Returns the non-negative half of the spectrum and its frequency spacing.
fn sine_transform(y: &[f64], x0: f64, dx: f64, n: usize) -> Result<(f64, Vec<f64>)> {
    if y.len() > n {
        return Err(UtilsError::Math(format!(
            "FFT length {} shorter than the {} input samples",
            n,
            y.len()
        )));
    }
    let mut padded = vec![0.0; n];
    padded[..y.len()].copy_from_slice(y);
    let spectrum = real_fft(&padded)?;

    let d_omega = 2.0 * PI / (dx * n as f64);
    let values = spectrum[..n / 2]
        .iter()
        .enumerate()
        .map(|(k, x)| {
            let phase = Complex64::from_polar(1.0, k as f64 * d_omega * x0);
            (phase * x.conj()).im * dx
        })
        .collect();
    Ok((d_omega, values))
}

/// Forward transform `F(r) = (2/π) Σ Q·i(Q)·sin(rQ) ΔQ` through a padded FFT
///
/// Samples beyond the one nearest `q_max_integrate` are zeroed and a `q`
/// axis that is not uniform is rejected. The returned r grid has spacing
/// `2π/(ΔQ·N_fft)`.
pub fn fft_forward(q: &[f64], i_q: &[f64], q_max_integrate: f64) -> Result<RealSpaceCurve> {
    if q.len() != i_q.len() {
        return Err(UtilsError::LengthMismatch {
            expected: q.len(),
            found: i_q.len(),
        });
    }
    if q.len() < 2 {
        return Err(UtilsError::Math(
            "FFT transform needs at least two Q samples".to_string(),
        ));
    }

    let dq = check_uniform(q, "Q")?;
    let last = nearest_index(q, q_max_integrate);
    let n_fft = padded_length(last);
    let qi: Vec<f64> = q[..=last]
        .iter()
        .zip(&i_q[..=last])
        .map(|(&qv, &i)| qv * i)
        .collect();

    let (dr, values) = sine_transform(&qi, q[0], dq, n_fft)?;
    log::debug!("FFT forward: N = {}, dr = {:.6}", n_fft, dr);

    Ok(RealSpaceCurve {
        r: (0..values.len()).map(|k| k as f64 * dr).collect(),
        f: values.into_iter().map(|v| v * 2.0 / PI).collect(),
    })
}

/// Real-space grid the FFT path produces for `q`
pub fn fft_r_grid(q: &[f64], q_max_integrate: f64) -> Vec<f64> {
    let dq = mean_spacing(q);
    let n_fft = padded_length(nearest_index(q, q_max_integrate));
    let dr = 2.0 * PI / (dq * n_fft as f64);
    (0..n_fft / 2).map(|k| k as f64 * dr).collect()
}

/// Inverse transform `Q·i(Q) = Σ F(r)·sin(Qr) Δr`, interpolated onto `q`
///
/// `curve.r` must be uniform, like the Q axis of [`fft_forward`]. The FFT
/// length is the smallest power of two holding `len - 1` intervals, doubled
/// when it would drop samples.
pub fn fft_inverse(curve: &RealSpaceCurve, q: &[f64]) -> Result<Vec<f64>> {
    let len = curve.r.len();
    if len < 2 || curve.f.len() != len {
        return Err(UtilsError::LengthMismatch {
            expected: len,
            found: curve.f.len(),
        });
    }

    let dr = check_uniform(&curve.r, "r")?;
    let mut n = (len - 1).next_power_of_two();
    if n < len {
        n *= 2;
    }
    let (dq, values) = sine_transform(&curve.f, curve.r[0], dr, n)?;
    let q_axis: Vec<f64> = (0..values.len()).map(|k| k as f64 * dq).collect();

    interpolate_onto(q, &q_axis, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::quadrature::{direct_transform, QuadratureRule};
    use crate::utils::math::linspace;
    use approx::assert_relative_eq;

    #[test]
    fn test_padded_length() {
        assert_eq!(padded_length(0), 32);
        assert_eq!(padded_length(99), 4 * 512);
    }

    #[test]
    fn test_matches_riemann_quadrature() {
        let q = linspace(0.0, 60.0, 601);
        let i_q: Vec<f64> = q.iter().map(|&v| (-0.02 * v * v).exp() * (0.5 * v).cos()).collect();
        let curve = fft_forward(&q, &i_q, 50.0).unwrap();
        let direct = direct_transform(&q, &i_q, &curve.r[..200], 50.0, QuadratureRule::Riemann);
        for (a, b) in curve.f.iter().zip(&direct) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_grid_offset_is_phase_corrected() {
        let q = linspace(2.0, 60.0, 581);
        let i_q: Vec<f64> = q.iter().map(|&v| (-0.01 * v * v).exp()).collect();
        let curve = fft_forward(&q, &i_q, 60.0).unwrap();
        let direct = direct_transform(&q, &i_q, &curve.r[..100], 60.0, QuadratureRule::Riemann);
        for (a, b) in curve.f.iter().zip(&direct) {
            assert_relative_eq!(a, b, epsilon = 1e-9);
        }
        assert_eq!(fft_r_grid(&q, 60.0), curve.r);
    }

    #[test]
    fn test_inverse_round_trip() {
        let a = 0.02;
        let q = linspace(0.0, 100.0, 1001);
        let i_q: Vec<f64> = q.iter().map(|&v| (-a * v * v).exp()).collect();
        let curve = fft_forward(&q, &i_q, 100.0).unwrap();
        let qi = fft_inverse(&curve, &q[..400]).unwrap();
        for (&qv, &value) in q[..400].iter().zip(&qi) {
            assert_relative_eq!(value, qv * (-a * qv * qv).exp(), epsilon = 1e-2);
        }
    }

    #[test]
    fn test_non_uniform_axis_is_rejected() {
        let q: Vec<f64> = linspace(0.0, 1.0, 401).iter().map(|t| 100.0 * t * t).collect();
        let i_q: Vec<f64> = q.iter().map(|&v| (-0.01 * v * v).exp()).collect();
        assert!(matches!(
            fft_forward(&q, &i_q, 90.0),
            Err(UtilsError::Math(_))
        ));

        let curve = RealSpaceCurve::new(q.iter().map(|v| v / 100.0).collect(), i_q);
        assert!(matches!(
            fft_inverse(&curve, &[1.0, 2.0]),
            Err(UtilsError::Math(_))
        ));
    }
}
