/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Physical and numerical constants shared by the analysis stages

use std::f64::consts::PI;

/// Nanometres per Ångström
pub const ANGSTROM_TO_NM: f64 = 0.1;

/// Factor converting Q (nm⁻¹) into the form-factor argument s = sin(θ)/λ (Å⁻¹)
pub const Q_TO_S: f64 = 1.0 / (4.0 * PI * 10.0);

/// Scores above this value mark a diverging candidate in the grid search
pub const DIVERGENCE_THRESHOLD: f64 = 1e8;

/// Number of candidates evaluated per zoom level of the grid search
pub const NUM_SAMPLES: usize = 23;

/// Maximum number of edge hits tolerated by the grid search
pub const MAX_NO_PEAK: usize = 5;

/// Outer iteration cap of the scale/density driver
pub const MAX_DRIVER_ITERATIONS: usize = 30;
