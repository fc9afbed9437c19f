/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the utils module

use thiserror::Error;

/// Errors that can occur in the numerical utilities
#[derive(Error, Debug)]
pub enum UtilsError {
    /// Generic error with a message
    #[error("Utility error: {0}")]
    Generic(String),

    /// Math-related errors
    #[error("Math error: {0}")]
    Math(String),

    /// Two arrays that must be paired have different lengths
    #[error("Length mismatch: expected {expected} samples, found {found}")]
    LengthMismatch { expected: usize, found: usize },
}

/// A specialized Result type for utils operations
pub type Result<T> = std::result::Result<T, UtilsError>;
