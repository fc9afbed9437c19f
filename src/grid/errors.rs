/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the grid module

use thiserror::Error;

/// Errors raised while validating sampled curves and Q ranges
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Grid needs at least {min} samples, got {len}")]
    TooShort { len: usize, min: usize },

    #[error("Grid is not strictly increasing at index {index} ({previous} -> {value})")]
    NonIncreasing {
        index: usize,
        previous: f64,
        value: f64,
    },

    #[error("Non-finite sample at index {index}")]
    NonFinite { index: usize },

    #[error("Length mismatch: grid has {expected} samples, values have {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Invalid Q ranges: {0}")]
    InvalidRanges(String),
}

/// Result type for grid operations
pub type Result<T> = std::result::Result<T, GridError>;
