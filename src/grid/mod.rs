/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Sampled Q-space data
//!
//! [`MomentumGrid`] and [`IntensityCurve`] validate the input arrays once, so
//! downstream stages can rely on sorted, finite, length-matched samples.
//! [`RangeMasks`] splits a grid into the low-Q, calculation and tail regions.

pub mod curve;
pub mod errors;
pub mod ranges;

pub use curve::{IntensityCurve, MomentumGrid};
pub use errors::{GridError, Result};
pub use ranges::{QRanges, RangeMasks};
