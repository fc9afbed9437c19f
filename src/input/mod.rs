/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Input handling
//!
//! Loading of intensity curves, molecular geometries and coefficient tables,
//! and the JSON configuration that ties them to the analysis settings.

pub mod config;
pub mod errors;
pub mod parser;

pub use config::{AnalysisConfig, AnalysisInputs, CoefficientSource};
pub use errors::{InputError, Result};
pub use parser::{
    parse_element_tables, parse_intensity, parse_xyz, read_element_table_json,
    read_element_tables, read_intensity_file, read_xyz_file,
};

use std::path::Path;

/// Load a configuration file and every data file it names
///
/// Relative paths in the configuration are resolved against the directory
/// of the configuration file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<(AnalysisConfig, AnalysisInputs)> {
    let path = path.as_ref();
    let config = AnalysisConfig::from_file(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let inputs = config.load_inputs(base)?;
    Ok((config, inputs))
}
