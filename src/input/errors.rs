/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Error types for reading analysis inputs

use std::io;
use thiserror::Error;

use crate::atoms::AtomError;
use crate::grid::GridError;

/// Errors that can occur while loading data files and configuration
#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Invalid input format: {0}")]
    InvalidFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    Grid(#[from] GridError),

    #[error("Invalid composition or coefficients: {0}")]
    Atom(#[from] AtomError),
}

/// Result type for input operations
pub type Result<T> = std::result::Result<T, InputError>;
