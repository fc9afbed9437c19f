/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Numerical building blocks for the analysis pipeline
//!
//! Sample-based quadrature, a radix-2 FFT, interpolation helpers and a
//! least-squares polynomial fit. All functions work on plain slices so the
//! higher level stages can keep their own array ownership.

use super::errors::{Result, UtilsError};
use faer::{prelude::*, Col, Mat};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Evenly spaced samples over `[start, end]`, endpoint included
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (num - 1) as f64;
            (0..num).map(|i| start + i as f64 * step).collect()
        }
    }
}

/// Mean spacing of a sampled axis, `(x_last - x_first) / (n - 1)`
///
/// Returns 0.0 for axes with fewer than two samples.
pub fn mean_spacing(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    (x[x.len() - 1] - x[0]) / (x.len() - 1) as f64
}

/// Index of the sample closest to `target`
///
/// `values` must be sorted in increasing order. An empty slice yields 0.
pub fn nearest_index(values: &[f64], target: f64) -> usize {
    if values.is_empty() {
        return 0;
    }
    let upper = values.partition_point(|&v| v < target);
    if upper == 0 {
        return 0;
    }
    if upper >= values.len() {
        return values.len() - 1;
    }
    if (values[upper] - target).abs() < (target - values[upper - 1]).abs() {
        upper
    } else {
        upper - 1
    }
}

/// Composite Simpson integral of sampled data on a possibly non-uniform axis
///
/// Pairs of intervals are integrated with the non-uniform Simpson rule. When
/// the number of intervals is odd, the last interval is closed with a
/// three-point correction that is exact for quadratics.
///
/// # Arguments
///
/// * `y` - Sampled integrand
/// * `x` - Sample positions, strictly increasing, same length as `y`
///
/// # Returns
///
/// The integral, or 0.0 when fewer than two samples are given
pub fn simpson(y: &[f64], x: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    match n {
        0 | 1 => return 0.0,
        2 => return 0.5 * (x[1] - x[0]) * (y[0] + y[1]),
        _ => {}
    }

    let intervals = n - 1;
    let paired = intervals - intervals % 2;
    let mut total = 0.0;

    for i in (0..paired).step_by(2) {
        let h0 = x[i + 1] - x[i];
        let h1 = x[i + 2] - x[i + 1];
        let hsum = h0 + h1;
        total += hsum / 6.0
            * ((2.0 - h1 / h0) * y[i]
                + hsum * hsum / (h0 * h1) * y[i + 1]
                + (2.0 - h0 / h1) * y[i + 2]);
    }

    if intervals % 2 == 1 {
        let h0 = x[n - 2] - x[n - 3];
        let h1 = x[n - 1] - x[n - 2];
        let alpha = (2.0 * h1 * h1 + 3.0 * h0 * h1) / (6.0 * (h0 + h1));
        let beta = (h1 * h1 + 3.0 * h0 * h1) / (6.0 * h0);
        let eta = h1 * h1 * h1 / (6.0 * h0 * (h0 + h1));
        total += alpha * y[n - 1] + beta * y[n - 2] - eta * y[n - 3];
    }

    total
}

/// Piecewise-linear interpolation of a table at `x`
///
/// Values outside the table are clamped to the first or last entry.
pub fn interpolate_table(x: f64, x_values: &[f64], y_values: &[f64]) -> Result<f64> {
    if x_values.len() != y_values.len() {
        return Err(UtilsError::LengthMismatch {
            expected: x_values.len(),
            found: y_values.len(),
        });
    }
    if x_values.is_empty() {
        return Err(UtilsError::Generic(
            "Empty arrays provided for interpolation".to_string(),
        ));
    }

    let last = x_values.len() - 1;
    if x <= x_values[0] {
        return Ok(y_values[0]);
    }
    if x >= x_values[last] {
        return Ok(y_values[last]);
    }

    let hi = x_values.partition_point(|&v| v <= x);
    let lo = hi - 1;
    let t = (x - x_values[lo]) / (x_values[hi] - x_values[lo]);
    Ok(y_values[lo] + t * (y_values[hi] - y_values[lo]))
}

/// Interpolate a whole table onto new abscissae
pub fn interpolate_onto(targets: &[f64], x_values: &[f64], y_values: &[f64]) -> Result<Vec<f64>> {
    targets
        .iter()
        .map(|&x| interpolate_table(x, x_values, y_values))
        .collect()
}

/// In-place iterative radix-2 Cooley-Tukey FFT
///
/// Uses the forward sign convention `X_k = Σ x_j exp(-2πi jk/N)` without
/// normalization.
///
/// # Errors
///
/// Returns `UtilsError::Math` when the length is not a power of two.
pub fn fft_in_place(data: &mut [Complex64]) -> Result<()> {
    let n = data.len();
    if !n.is_power_of_two() {
        return Err(UtilsError::Math(format!(
            "FFT requires a power-of-two length, got {}",
            n
        )));
    }
    if n == 1 {
        return Ok(());
    }

    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            data.swap(i, j);
        }
    }

    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f64;
        let w_len = Complex64::new(angle.cos(), angle.sin());
        for chunk in data.chunks_mut(len) {
            let (lower, upper) = chunk.split_at_mut(len / 2);
            let mut w = Complex64::new(1.0, 0.0);
            for (a, b) in lower.iter_mut().zip(upper.iter_mut()) {
                let t = w * *b;
                *b = *a - t;
                *a += t;
                w *= w_len;
            }
        }
        len <<= 1;
    }

    Ok(())
}

/// Forward FFT of a real sequence
pub fn real_fft(input: &[f64]) -> Result<Vec<Complex64>> {
    let mut data: Vec<Complex64> = input.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    fft_in_place(&mut data)?;
    Ok(data)
}

/// Least-squares polynomial fit
///
/// The normal equations are assembled on centred abscissae and solved with a
/// partially pivoted LU decomposition.
///
/// # Arguments
///
/// * `x_values` - Sample positions
/// * `y_values` - Sample values
/// * `degree` - Polynomial degree
///
/// # Returns
///
/// Coefficients `c_0..c_degree` of `Σ c_k x^k` in the original (uncentred) variable
pub fn polynomial_fit(x_values: &[f64], y_values: &[f64], degree: usize) -> Result<Vec<f64>> {
    if x_values.len() != y_values.len() {
        return Err(UtilsError::LengthMismatch {
            expected: x_values.len(),
            found: y_values.len(),
        });
    }
    if x_values.len() <= degree {
        return Err(UtilsError::Math(format!(
            "Need more than {} points for a degree {} fit, got {}",
            degree,
            degree,
            x_values.len()
        )));
    }

    let num_coeffs = degree + 1;
    let shift = x_values.iter().sum::<f64>() / x_values.len() as f64;
    let centred: Vec<f64> = x_values.iter().map(|&x| x - shift).collect();

    let normal = Mat::<f64>::from_fn(num_coeffs, num_coeffs, |i, j| {
        centred.iter().map(|&x| x.powi((i + j) as i32)).sum()
    });
    let rhs = Col::<f64>::from_fn(num_coeffs, |i| {
        centred
            .iter()
            .zip(y_values)
            .map(|(&x, &y)| y * x.powi(i as i32))
            .sum()
    });

    let solution = normal.partial_piv_lu().solve(&rhs);
    let local: Vec<f64> = (0..num_coeffs).map(|i| solution[i]).collect();
    if local.iter().any(|c| !c.is_finite()) {
        return Err(UtilsError::Math(
            "Singular normal equations in polynomial fit".to_string(),
        ));
    }

    Ok(expand_shifted_polynomial(&local, shift))
}

/// Rewrite `Σ c_k (x - shift)^k` as `Σ d_k x^k`
fn expand_shifted_polynomial(coeffs: &[f64], shift: f64) -> Vec<f64> {
    let mut expanded = vec![0.0; coeffs.len()];
    for (k, &c) in coeffs.iter().enumerate() {
        let mut binom = 1.0;
        for j in 0..=k {
            // term c * C(k, j) * x^j * (-shift)^(k-j)
            expanded[j] += c * binom * (-shift).powi((k - j) as i32);
            binom = binom * (k - j) as f64 / (j + 1) as f64;
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_simpson_exact_for_cubics() {
        let x = linspace(0.0, 2.0, 11);
        let y: Vec<f64> = x.iter().map(|v| v * v * v).collect();
        assert_relative_eq!(simpson(&y, &x), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_simpson_odd_interval_count() {
        // 9 intervals on a non-uniform axis, exact for quadratics
        let x = vec![0.0, 0.1, 0.25, 0.4, 0.6, 0.75, 1.0, 1.2, 1.3, 1.5];
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        assert_relative_eq!(simpson(&y, &x), 1.5f64.powi(3) / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_simpson_degenerate_inputs() {
        assert_eq!(simpson(&[], &[]), 0.0);
        assert_eq!(simpson(&[3.0], &[1.0]), 0.0);
        assert_relative_eq!(simpson(&[1.0, 3.0], &[0.0, 2.0]), 4.0);
    }

    #[test]
    fn test_nearest_index() {
        let values = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(nearest_index(&values, -5.0), 0);
        assert_eq!(nearest_index(&values, 1.4), 1);
        assert_eq!(nearest_index(&values, 1.6), 2);
        assert_eq!(nearest_index(&values, 7.0), 3);
    }

    #[test]
    fn test_fft_matches_direct_dft() {
        let input: Vec<f64> = (0..16).map(|i| (i as f64 * 0.3).sin() + 0.1 * i as f64).collect();
        let fast = real_fft(&input).unwrap();
        for (k, value) in fast.iter().enumerate() {
            let mut direct = Complex64::new(0.0, 0.0);
            for (j, &x) in input.iter().enumerate() {
                let phase = -2.0 * PI * (j * k) as f64 / 16.0;
                direct += Complex64::new(phase.cos(), phase.sin()) * x;
            }
            assert_relative_eq!(value.re, direct.re, epsilon = 1e-10);
            assert_relative_eq!(value.im, direct.im, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_fft_rejects_non_power_of_two() {
        let mut data = vec![Complex64::new(1.0, 0.0); 12];
        assert!(fft_in_place(&mut data).is_err());
    }

    #[test]
    fn test_interpolation_clamps() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 10.0, 30.0];
        assert_relative_eq!(interpolate_table(0.5, &xs, &ys).unwrap(), 5.0);
        assert_relative_eq!(interpolate_table(1.5, &xs, &ys).unwrap(), 20.0);
        assert_relative_eq!(interpolate_table(-1.0, &xs, &ys).unwrap(), 0.0);
        assert_relative_eq!(interpolate_table(9.0, &xs, &ys).unwrap(), 30.0);
        assert!(interpolate_table(0.5, &xs, &ys[..2]).is_err());
    }

    #[test]
    fn test_polynomial_fit_recovers_parabola() {
        let x = linspace(9.5, 10.5, 7);
        let y: Vec<f64> = x.iter().map(|v| 3.0 * (v - 10.2).powi(2) + 0.5).collect();
        let coeffs = polynomial_fit(&x, &y, 2).unwrap();
        let vertex = -coeffs[1] / (2.0 * coeffs[2]);
        assert_relative_eq!(vertex, 10.2, epsilon = 1e-8);
        let minimum = coeffs[0] + coeffs[1] * vertex + coeffs[2] * vertex * vertex;
        assert_relative_eq!(minimum, 0.5, epsilon = 1e-8);
    }
}
