/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types of the analysis pipeline

use thiserror::Error;

use crate::atoms::AtomError;
use crate::grid::GridError;
use crate::input::InputError;
use crate::utils::UtilsError;

/// Any failure while setting up or evaluating an analysis
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Atom error: {0}")]
    Atom(#[from] AtomError),

    #[error("Numerical error: {0}")]
    Utils(#[from] UtilsError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, AnalysisError>;
