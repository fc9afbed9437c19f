/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Natural cubic splines with an optional smoothing constraint
//!
//! The smoothing spline minimizes `∫ g''(x)² dx` subject to
//! `Σ (g(x_i) - y_i)² ≤ S`, following Reinsch's formulation. The Lagrange
//! multiplier is found with Newton steps on `F(p)^-1/2`, which converge
//! monotonically from `p = 0` (the least-squares straight line). Each step
//! solves a symmetric pentadiagonal system, so a fit costs O(n) per iteration.

use super::errors::{Result, UtilsError};

const MAX_NEWTON_ITERATIONS: usize = 100;
const RESIDUAL_TOLERANCE: f64 = 1e-8;

/// Natural cubic spline described by knot values and second derivatives
#[derive(Debug, Clone)]
pub struct CubicSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    second_derivatives: Vec<f64>,
}

impl CubicSpline {
    /// Smoothing spline with residual budget `smoothing` (sum of squared deviations)
    ///
    /// A zero budget gives the interpolating natural spline through `(x, y)`.
    pub fn smoothing(x: &[f64], y: &[f64], smoothing: f64) -> Result<Self> {
        fit(x, y, smoothing.max(0.0))
    }

    /// Evaluate the spline at `x`
    ///
    /// Outside the knot span the spline continues linearly, which is the
    /// natural extension of a spline with zero end curvature.
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.knots.len();
        let first = self.knots[0];
        let last = self.knots[n - 1];

        if x < first {
            return self.values[0] + self.start_slope() * (x - first);
        }
        if x > last {
            return self.values[n - 1] + self.end_slope() * (x - last);
        }

        let hi = self.knots.partition_point(|&k| k <= x).clamp(1, n - 1);
        let lo = hi - 1;
        let h = self.knots[hi] - self.knots[lo];
        let a = self.knots[hi] - x;
        let b = x - self.knots[lo];

        (a * self.values[lo] + b * self.values[hi]) / h
            + ((a * a * a - h * h * a) * self.second_derivatives[lo]
                + (b * b * b - h * h * b) * self.second_derivatives[hi])
                / (6.0 * h)
    }

    fn start_slope(&self) -> f64 {
        let h = self.knots[1] - self.knots[0];
        (self.values[1] - self.values[0]) / h
            - h * (2.0 * self.second_derivatives[0] + self.second_derivatives[1]) / 6.0
    }

    fn end_slope(&self) -> f64 {
        let n = self.knots.len();
        let h = self.knots[n - 1] - self.knots[n - 2];
        (self.values[n - 1] - self.values[n - 2]) / h
            + h * (self.second_derivatives[n - 2] + 2.0 * self.second_derivatives[n - 1]) / 6.0
    }
}

/// Symmetric pentadiagonal matrix stored by diagonals
#[derive(Debug, Clone)]
struct Pentadiagonal {
    d0: Vec<f64>,
    d1: Vec<f64>,
    d2: Vec<f64>,
}

impl Pentadiagonal {
    fn zeros(m: usize) -> Self {
        Self {
            d0: vec![0.0; m],
            d1: vec![0.0; m.saturating_sub(1)],
            d2: vec![0.0; m.saturating_sub(2)],
        }
    }

    fn multiply(&self, v: &[f64]) -> Vec<f64> {
        let m = self.d0.len();
        (0..m)
            .map(|i| {
                let mut sum = self.d0[i] * v[i];
                if i >= 1 {
                    sum += self.d1[i - 1] * v[i - 1];
                }
                if i + 1 < m {
                    sum += self.d1[i] * v[i + 1];
                }
                if i >= 2 {
                    sum += self.d2[i - 2] * v[i - 2];
                }
                if i + 2 < m {
                    sum += self.d2[i] * v[i + 2];
                }
                sum
            })
            .collect()
    }

    /// `self + p * other`
    fn combined(&self, other: &Pentadiagonal, p: f64) -> Pentadiagonal {
        let add = |a: &[f64], b: &[f64]| -> Vec<f64> { a.iter().zip(b).map(|(x, y)| x + p * y).collect() };
        Pentadiagonal {
            d0: add(&self.d0, &other.d0),
            d1: add(&self.d1, &other.d1),
            d2: add(&self.d2, &other.d2),
        }
    }
}

/// Banded Cholesky factor `L` of a pentadiagonal matrix
struct BandedCholesky {
    diag: Vec<f64>,
    sub1: Vec<f64>,
    sub2: Vec<f64>,
}

impl BandedCholesky {
    fn factor(a: &Pentadiagonal) -> Result<Self> {
        let m = a.d0.len();
        let mut diag = vec![0.0; m];
        let mut sub1 = vec![0.0; m];
        let mut sub2 = vec![0.0; m];

        for i in 0..m {
            if i >= 2 {
                sub2[i] = a.d2[i - 2] / diag[i - 2];
            }
            if i >= 1 {
                let overlap = if i >= 2 { sub2[i] * sub1[i - 1] } else { 0.0 };
                sub1[i] = (a.d1[i - 1] - overlap) / diag[i - 1];
            }
            let pivot = a.d0[i] - sub1[i] * sub1[i] - sub2[i] * sub2[i];
            if pivot <= 0.0 || !pivot.is_finite() {
                return Err(UtilsError::Math(format!(
                    "Spline system is not positive definite at row {}",
                    i
                )));
            }
            diag[i] = pivot.sqrt();
        }

        Ok(Self { diag, sub1, sub2 })
    }

    fn solve(&self, rhs: &[f64]) -> Vec<f64> {
        let m = self.diag.len();
        let mut z = vec![0.0; m];
        for i in 0..m {
            let mut acc = rhs[i];
            if i >= 1 {
                acc -= self.sub1[i] * z[i - 1];
            }
            if i >= 2 {
                acc -= self.sub2[i] * z[i - 2];
            }
            z[i] = acc / self.diag[i];
        }

        let mut u = vec![0.0; m];
        for i in (0..m).rev() {
            let mut acc = z[i];
            if i + 1 < m {
                acc -= self.sub1[i + 1] * u[i + 1];
            }
            if i + 2 < m {
                acc -= self.sub2[i + 2] * u[i + 2];
            }
            u[i] = acc / self.diag[i];
        }
        u
    }
}

/// Second-difference operator `Q` (n x n-2), stored per interior column
struct SecondDifference {
    columns: Vec<[f64; 3]>,
}

impl SecondDifference {
    fn new(h: &[f64]) -> Self {
        let columns = (1..h.len())
            .map(|k| {
                let left = 1.0 / h[k - 1];
                let right = 1.0 / h[k];
                [left, -left - right, right]
            })
            .collect();
        Self { columns }
    }

    /// `Qᵀ y`
    fn transpose_apply(&self, y: &[f64]) -> Vec<f64> {
        self.columns
            .iter()
            .enumerate()
            .map(|(k, c)| c[0] * y[k] + c[1] * y[k + 1] + c[2] * y[k + 2])
            .collect()
    }

    /// `Q u`
    fn apply(&self, u: &[f64], n: usize) -> Vec<f64> {
        let mut out = vec![0.0; n];
        for (k, (c, &uk)) in self.columns.iter().zip(u).enumerate() {
            out[k] += c[0] * uk;
            out[k + 1] += c[1] * uk;
            out[k + 2] += c[2] * uk;
        }
        out
    }

    /// `QᵀQ`
    fn gram(&self) -> Pentadiagonal {
        let m = self.columns.len();
        let mut g = Pentadiagonal::zeros(m);
        for k in 0..m {
            let c = &self.columns[k];
            g.d0[k] = c[0] * c[0] + c[1] * c[1] + c[2] * c[2];
            if k + 1 < m {
                let next = &self.columns[k + 1];
                g.d1[k] = c[1] * next[0] + c[2] * next[1];
            }
            if k + 2 < m {
                g.d2[k] = c[2] * self.columns[k + 2][0];
            }
        }
        g
    }
}

/// Tridiagonal `T` with `(h_{k-1} + h_k)/3` on the diagonal and `h_k/6` beside it
fn curvature_matrix(h: &[f64]) -> Pentadiagonal {
    let m = h.len() - 1;
    let mut t = Pentadiagonal::zeros(m);
    for k in 0..m {
        t.d0[k] = (h[k] + h[k + 1]) / 3.0;
        if k + 1 < m {
            t.d1[k] = h[k + 1] / 6.0;
        }
    }
    t
}

fn fit(x: &[f64], y: &[f64], smoothing: f64) -> Result<CubicSpline> {
    if x.len() != y.len() {
        return Err(UtilsError::LengthMismatch {
            expected: x.len(),
            found: y.len(),
        });
    }
    let n = x.len();
    if n < 2 {
        return Err(UtilsError::Math(format!(
            "A spline needs at least two knots, got {}",
            n
        )));
    }

    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    if h.iter().any(|&d| d <= 0.0 || !d.is_finite()) {
        return Err(UtilsError::Math(
            "Spline knots must be strictly increasing".to_string(),
        ));
    }

    if n == 2 {
        return Ok(CubicSpline {
            knots: x.to_vec(),
            values: y.to_vec(),
            second_derivatives: vec![0.0; 2],
        });
    }

    let q = SecondDifference::new(&h);
    let t = curvature_matrix(&h);
    let rhs = q.transpose_apply(y);

    let (values, interior) = if smoothing <= 0.0 {
        let gamma = BandedCholesky::factor(&t)?.solve(&rhs);
        (y.to_vec(), gamma)
    } else {
        let (p, u) = solve_multiplier(&q.gram(), &t, &rhs, smoothing)?;
        let correction = q.apply(&u, n);
        let values = y.iter().zip(&correction).map(|(a, b)| a - b).collect();
        (values, u.iter().map(|v| p * v).collect())
    };

    let mut second_derivatives = Vec::with_capacity(n);
    second_derivatives.push(0.0);
    second_derivatives.extend(interior);
    second_derivatives.push(0.0);

    Ok(CubicSpline {
        knots: x.to_vec(),
        values,
        second_derivatives,
    })
}

/// Newton iteration for the multiplier `p` of `(QᵀQ + pT) u = Qᵀy`
fn solve_multiplier(
    gram: &Pentadiagonal,
    t: &Pentadiagonal,
    rhs: &[f64],
    smoothing: f64,
) -> Result<(f64, Vec<f64>)> {
    let mut p = 0.0;
    let mut u = Vec::new();

    for _ in 0..MAX_NEWTON_ITERATIONS {
        let factor = BandedCholesky::factor(&gram.combined(t, p))?;
        u = factor.solve(rhs);

        let gram_u = gram.multiply(&u);
        let residual: f64 = u.iter().zip(&gram_u).map(|(a, b)| a * b).sum();
        if residual <= smoothing * (1.0 + RESIDUAL_TOLERANCE) {
            break;
        }

        let w = factor.solve(&t.multiply(&u));
        let derivative = -2.0 * gram_u.iter().zip(&w).map(|(a, b)| a * b).sum::<f64>();
        if derivative >= 0.0 || !derivative.is_finite() {
            break;
        }

        let step = 2.0 * (residual - residual * (residual / smoothing).sqrt()) / derivative;
        if !step.is_finite() || step <= p * f64::EPSILON {
            break;
        }
        p += step;
    }

    Ok((p, u))
}
