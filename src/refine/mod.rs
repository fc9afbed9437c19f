/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Self-consistent refinement
//!
//! * [`KaplowRefiner`] enforces the low-r constraint on F(r)
//! * [`GridSearchOptimizer`] minimizes a scalar objective of one parameter
//! * [`Driver`] alternates scale-factor and density searches until the
//!   density settles

pub mod driver;
pub mod kaplow;
pub mod search;

pub use driver::{
    step_tier, ChiSquareModel, ChiSquarePoint, Driver, DriverOptions, MinimizationResult,
    ParameterObjective, Parameters, SearchParameter,
};
pub use kaplow::{
    chi_square, constraint_deviation, KaplowInput, KaplowOutcome, KaplowRefiner,
    RefinementOptions,
};
pub use search::{GridSearchOptimizer, Objective, SearchOptions, SearchOutcome};
