/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for the atoms module

/// Error types for composition and form-factor handling
#[derive(Debug, thiserror::Error)]
pub enum AtomError {
    #[error("Unknown element symbol: {0}")]
    UnknownElement(String),

    #[error("Element {0} is missing from the coefficient table")]
    MissingCoefficients(String),

    #[error("Invalid formula '{formula}': {reason}")]
    InvalidFormula { formula: String, reason: String },

    #[error("Composition is empty")]
    EmptyComposition,

    #[error("Invalid coefficients for {element}: {reason}")]
    InvalidCoefficients { element: String, reason: String },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),
}

/// Result type for atom operations
pub type Result<T> = std::result::Result<T, AtomError>;
