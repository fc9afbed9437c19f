/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Structure factor S(Q)
//!
//! Normalization of the measured intensity into S(Q) under a chosen
//! [`Formalism`], the sample transmission correction, and the spline
//! smoothing and damping applied before the Fourier transform.

pub mod absorption;
pub mod builder;
pub mod formalism;
pub mod smoothing;

pub use absorption::AbsorptionCorrection;
pub use builder::{sample_intensity, StructureFactor, StructureFactorBuilder};
pub use formalism::Formalism;
pub use smoothing::{
    damp, damping_curve, smooth, smoothed_grid, DampingFunction, SmoothingOptions,
};
