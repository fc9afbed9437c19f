/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Q-range bookkeeping
//!
//! Every stage that distinguishes the low-Q, calculation and tail regions goes
//! through [`RangeMasks`], which is always derived from the grid it indexes.
//! Because a `MomentumGrid` is sorted, each region is a contiguous index range.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::curve::MomentumGrid;
use super::errors::{GridError, Result};

/// The three Q limits of an analysis (nm⁻¹)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QRanges {
    /// Upper end of the excluded low-Q region
    pub min_q: f64,
    /// Upper limit of the integrals and of the calculation range
    pub q_max_integrate: f64,
    /// Upper end of the validation range
    pub max_q: f64,
}

impl Default for QRanges {
    fn default() -> Self {
        Self {
            min_q: 3.0,
            q_max_integrate: 98.0,
            max_q: 109.0,
        }
    }
}

impl QRanges {
    pub fn new(min_q: f64, q_max_integrate: f64, max_q: f64) -> Result<Self> {
        let ranges = Self {
            min_q,
            q_max_integrate,
            max_q,
        };
        ranges.validate()?;
        Ok(ranges)
    }

    /// Check that `min_q ≤ q_max_integrate ≤ max_q` and all limits are finite
    pub fn validate(&self) -> Result<()> {
        if !(self.min_q.is_finite() && self.q_max_integrate.is_finite() && self.max_q.is_finite())
        {
            return Err(GridError::InvalidRanges(
                "Q limits must be finite".to_string(),
            ));
        }
        if self.min_q > self.q_max_integrate || self.q_max_integrate > self.max_q {
            return Err(GridError::InvalidRanges(format!(
                "expected minQ <= QmaxIntegrate <= maxQ, got {} / {} / {}",
                self.min_q, self.q_max_integrate, self.max_q
            )));
        }
        Ok(())
    }
}

/// Index ranges of the low, calculation and tail regions of a grid
#[derive(Debug, Clone)]
pub struct RangeMasks<'g> {
    grid: &'g MomentumGrid,
    low_end: usize,
    calc_end: usize,
    max_end: usize,
}

impl<'g> RangeMasks<'g> {
    pub fn new(grid: &'g MomentumGrid, ranges: QRanges) -> Result<Self> {
        ranges.validate()?;
        Ok(Self::from_validated(grid, ranges))
    }

    /// Masks for limits that already passed [`QRanges::validate`]
    pub(crate) fn from_validated(grid: &'g MomentumGrid, ranges: QRanges) -> Self {
        Self {
            grid,
            low_end: grid.count_up_to(ranges.min_q),
            calc_end: grid.count_up_to(ranges.q_max_integrate),
            max_end: grid.count_up_to(ranges.max_q),
        }
    }

    pub fn grid(&self) -> &'g MomentumGrid {
        self.grid
    }

    /// `Q ≤ minQ`
    pub fn low(&self) -> Range<usize> {
        0..self.low_end
    }

    /// `minQ < Q ≤ QmaxIntegrate`
    pub fn calc(&self) -> Range<usize> {
        self.low_end..self.calc_end
    }

    /// `QmaxIntegrate < Q ≤ maxQ`
    pub fn tail(&self) -> Range<usize> {
        self.calc_end..self.max_end
    }

    /// `Q ≤ QmaxIntegrate`, the domain of every integral
    pub fn integration(&self) -> Range<usize> {
        0..self.calc_end
    }

    /// `Q ≤ maxQ`
    pub fn validation(&self) -> Range<usize> {
        0..self.max_end
    }
}
