/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! # lasdia-rs
//!
//! Structure factor and pair-distribution analysis of X-ray diffraction data
//! from liquids and amorphous solids.
//!
//! The measured intensity is normalized into S(Q), smoothed and damped,
//! Fourier transformed into the reduced pair-distribution function F(r), and
//! refined with the Kaplow low-r correction. A grid-search minimizer then
//! adjusts the scale factor and atomic density until the unphysical
//! oscillations of F(r) below the first coordination shell are smallest.
//!
//! Units follow the diffraction convention of the field: Q in nm⁻¹, r in nm
//! and densities in atoms/nm³.
//!
//! ```no_run
//! use lasdia_rs::pipeline::Pipeline;
//!
//! let (config, inputs) = lasdia_rs::input::load("argon.json")?;
//! let pipeline = Pipeline::from_config(&config, &inputs)?;
//! let analysis = pipeline.optimize(config.initial_parameters(), config.search, config.driver)?;
//! println!("density = {}", analysis.minimization.parameters.density);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod atoms;
pub mod cli;
pub mod grid;
pub mod input;
pub mod pipeline;
pub mod refine;
pub mod structure;
pub mod transform;
pub mod utils;

pub use pipeline::{Analysis, AnalysisError, Pipeline, PipelineSettings, PipelineState};
pub use refine::{Driver, GridSearchOptimizer, KaplowRefiner, MinimizationResult, Parameters};
pub use structure::{Formalism, StructureFactorBuilder};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
