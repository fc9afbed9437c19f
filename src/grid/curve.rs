/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Momentum-transfer grids and intensity curves

use super::errors::{GridError, Result};
use crate::utils::math::{interpolate_table, linspace, mean_spacing};

/// Strictly increasing sequence of Q samples (nm⁻¹)
#[derive(Debug, Clone, PartialEq)]
pub struct MomentumGrid {
    values: Vec<f64>,
}

impl MomentumGrid {
    /// Validate and wrap a set of Q samples
    ///
    /// # Errors
    ///
    /// Fails for fewer than two samples, non-finite samples, or a grid that is
    /// not strictly increasing.
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.len() < 2 {
            return Err(GridError::TooShort {
                len: values.len(),
                min: 2,
            });
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(GridError::NonFinite { index });
        }
        if let Some(index) = values.windows(2).position(|w| w[1] <= w[0]) {
            return Err(GridError::NonIncreasing {
                index: index + 1,
                previous: values[index],
                value: values[index + 1],
            });
        }
        Ok(Self { values })
    }

    /// Uniform grid of `num` samples over `[start, end]`
    pub fn uniform(start: f64, end: f64, num: usize) -> Result<Self> {
        Self::new(linspace(start, end, num))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.values[0]
    }

    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// Mean sample spacing, `(last - first) / (len - 1)`
    pub fn mean_spacing(&self) -> f64 {
        mean_spacing(&self.values)
    }

    /// Number of samples with `Q ≤ limit`
    pub fn count_up_to(&self, limit: f64) -> usize {
        self.values.partition_point(|&q| q <= limit)
    }
}

/// A sampled intensity I(Q), either sample or background
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityCurve {
    grid: MomentumGrid,
    intensity: Vec<f64>,
}

impl IntensityCurve {
    /// Build a curve from raw Q and I columns
    pub fn new(q: Vec<f64>, intensity: Vec<f64>) -> Result<Self> {
        Self::on_grid(MomentumGrid::new(q)?, intensity)
    }

    /// Attach intensities to an existing grid
    pub fn on_grid(grid: MomentumGrid, intensity: Vec<f64>) -> Result<Self> {
        if intensity.len() != grid.len() {
            return Err(GridError::LengthMismatch {
                expected: grid.len(),
                found: intensity.len(),
            });
        }
        if let Some(index) = intensity.iter().position(|v| !v.is_finite()) {
            return Err(GridError::NonFinite { index });
        }
        Ok(Self { grid, intensity })
    }

    pub fn grid(&self) -> &MomentumGrid {
        &self.grid
    }

    pub fn q(&self) -> &[f64] {
        self.grid.values()
    }

    pub fn intensity(&self) -> &[f64] {
        &self.intensity
    }

    pub fn len(&self) -> usize {
        self.intensity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intensity.is_empty()
    }

    /// Keep only the samples with `Q ≤ max_q`
    pub fn truncate(&self, max_q: f64) -> Result<Self> {
        let keep = self.grid.count_up_to(max_q);
        Self::new(
            self.grid.values()[..keep].to_vec(),
            self.intensity[..keep].to_vec(),
        )
    }

    /// Linearly interpolate the curve onto another grid
    ///
    /// Points outside the curve's own Q span take the nearest end value.
    pub fn interpolate_onto(&self, grid: &MomentumGrid) -> Result<Self> {
        let intensity = grid
            .values()
            .iter()
            .map(|&q| interpolate_table(q, self.grid.values(), &self.intensity))
            .collect::<std::result::Result<Vec<f64>, _>>()
            .map_err(|_| GridError::LengthMismatch {
                expected: self.grid.len(),
                found: self.intensity.len(),
            })?;
        Self::on_grid(grid.clone(), intensity)
    }

    /// Rebin onto `num` evenly spaced samples spanning the same Q range
    pub fn resample_uniform(&self, num: usize) -> Result<Self> {
        let grid = MomentumGrid::uniform(self.grid.first(), self.grid.last(), num)?;
        self.interpolate_onto(&grid)
    }

    /// Express `other` on this curve's grid
    ///
    /// Curves that already share the grid are returned unchanged, otherwise
    /// `other` is interpolated. This is how a background measured on a
    /// different Q axis is aligned to the sample.
    pub fn align(&self, other: &IntensityCurve) -> Result<IntensityCurve> {
        if other.grid == self.grid {
            return Ok(other.clone());
        }
        other.interpolate_onto(&self.grid)
    }
}
