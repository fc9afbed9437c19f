/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Alternating scale-factor / density minimization
//!
//! The two parameters are strongly correlated, so they are refined one at a
//! time: a scale pass at fixed density, then a density pass at the new scale.
//! The size of the last density change picks the step sizes of the next
//! round, and the loop ends once the density stops moving.

use serde::{Deserialize, Serialize};

use super::search::{GridSearchOptimizer, Objective, SearchOutcome};
use crate::utils::constants::MAX_DRIVER_ITERATIONS;

const INITIAL_SCALE_STEP: f64 = 0.05;
const SCALE_END: f64 = 0.00006;

/// The free parameters of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub scale_factor: f64,
    /// Atomic density (atoms/nm³)
    pub density: f64,
    /// Sample thickness, only used with an absorption correction
    pub thickness: f64,
}

impl Parameters {
    pub fn new(scale_factor: f64, density: f64) -> Self {
        Self {
            scale_factor,
            density,
            thickness: 0.0,
        }
    }
}

/// Which parameter a search pass varies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchParameter {
    ScaleFactor,
    Density,
    SampleThickness,
}

impl SearchParameter {
    pub fn get(&self, parameters: &Parameters) -> f64 {
        match self {
            SearchParameter::ScaleFactor => parameters.scale_factor,
            SearchParameter::Density => parameters.density,
            SearchParameter::SampleThickness => parameters.thickness,
        }
    }

    /// Copy of `parameters` with this parameter set to `value`
    pub fn with(&self, parameters: &Parameters, value: f64) -> Parameters {
        let mut updated = *parameters;
        match self {
            SearchParameter::ScaleFactor => updated.scale_factor = value,
            SearchParameter::Density => updated.density = value,
            SearchParameter::SampleThickness => updated.thickness = value,
        }
        updated
    }

    /// Smallest physical value, if any
    pub fn lower_bound(&self) -> Option<f64> {
        match self {
            SearchParameter::ScaleFactor
            | SearchParameter::Density
            | SearchParameter::SampleThickness => Some(0.0),
        }
    }
}

/// Anything that scores a full parameter set
pub trait ChiSquareModel: Sync {
    fn chi_square(&self, parameters: &Parameters) -> f64;
}

/// Restriction of a model to one parameter, the others held fixed
pub struct ParameterObjective<'a, M: ChiSquareModel + ?Sized> {
    pub model: &'a M,
    pub base: Parameters,
    pub parameter: SearchParameter,
}

impl<M: ChiSquareModel + ?Sized> Objective for ParameterObjective<'_, M> {
    fn score(&self, value: f64) -> f64 {
        self.model
            .chi_square(&self.parameter.with(&self.base, value))
    }
}

/// Outer-loop settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    pub max_iterations: usize,
    /// Refine the sample thickness after scale and density
    pub refine_thickness: bool,
    pub thickness_step: f64,
    pub thickness_end: f64,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            max_iterations: MAX_DRIVER_ITERATIONS,
            refine_thickness: false,
            thickness_step: 0.01,
            thickness_end: 0.00001,
        }
    }
}

/// Chi-square after one driver iteration, iteration 0 being the initial passes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquarePoint {
    pub iteration: usize,
    pub scale_factor: f64,
    pub density: f64,
    pub chi_square: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimizationResult {
    pub parameters: Parameters,
    pub iterations: usize,
    pub converged: bool,
    pub chi_square: f64,
    pub trace: Vec<ChiSquarePoint>,
}

/// Step sizes of the next round from the last density change
///
/// Returns `(scale_step, density_step)`.
pub fn step_tier(density_change: f64, density: f64) -> (f64, f64) {
    let change = density_change.abs();
    let density = density.abs();
    if change > density / 25.0 {
        (0.006, density / 10.0)
    } else if change > density / 75.0 {
        (0.0006, density / 100.0)
    } else {
        (0.00006, density / 1000.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Driver {
    optimizer: GridSearchOptimizer,
    options: DriverOptions,
}

impl Driver {
    pub fn new(optimizer: GridSearchOptimizer, options: DriverOptions) -> Self {
        Self { optimizer, options }
    }

    /// Jointly minimize chi-square over scale factor and density
    pub fn minimize<M: ChiSquareModel + ?Sized>(
        &self,
        model: &M,
        initial: Parameters,
    ) -> MinimizationResult {
        let mut parameters = initial;
        let mut trace = Vec::new();

        let scale = self.pass(
            model,
            &parameters,
            SearchParameter::ScaleFactor,
            INITIAL_SCALE_STEP,
            SCALE_END,
        );
        parameters.scale_factor = scale.value;

        let start_density = parameters.density;
        let density = self.pass(
            model,
            &parameters,
            SearchParameter::Density,
            start_density / 50.0,
            start_density / 250.0,
        );
        parameters.density = density.value;
        let mut density_change = parameters.density - start_density;
        let mut chi_square = density.score;
        trace.push(ChiSquarePoint {
            iteration: 0,
            scale_factor: parameters.scale_factor,
            density: parameters.density,
            chi_square,
        });

        let mut iterations = 0;
        let mut converged = false;
        loop {
            iterations += 1;
            let (scale_step, density_step) = step_tier(density_change, parameters.density);

            let scale = self.pass(
                model,
                &parameters,
                SearchParameter::ScaleFactor,
                scale_step,
                SCALE_END,
            );
            parameters.scale_factor = scale.value;

            let previous_density = parameters.density;
            let density = self.pass(
                model,
                &parameters,
                SearchParameter::Density,
                density_step,
                previous_density / 250.0,
            );
            parameters.density = density.value;
            density_change = parameters.density - previous_density;
            chi_square = density.score;

            log::info!(
                "Iteration {}: scale = {:.6}, density = {:.6}, chi2 = {:.6e}",
                iterations,
                parameters.scale_factor,
                parameters.density,
                chi_square
            );
            trace.push(ChiSquarePoint {
                iteration: iterations,
                scale_factor: parameters.scale_factor,
                density: parameters.density,
                chi_square,
            });

            if density_change.abs() <= parameters.density.abs() / 2500.0 {
                converged = true;
                break;
            }
            if iterations >= self.options.max_iterations {
                log::warn!(
                    "Density did not settle after {} iterations (last change {:.3e})",
                    iterations,
                    density_change
                );
                break;
            }
        }

        if self.options.refine_thickness {
            let thickness = self.pass(
                model,
                &parameters,
                SearchParameter::SampleThickness,
                self.options.thickness_step,
                self.options.thickness_end,
            );
            parameters.thickness = thickness.value;
            chi_square = thickness.score;
            log::info!("Sample thickness = {:.6}", parameters.thickness);
        }

        MinimizationResult {
            parameters,
            iterations,
            converged,
            chi_square,
            trace,
        }
    }

    /// One grid search over `parameter`
    pub fn pass<M: ChiSquareModel + ?Sized>(
        &self,
        model: &M,
        parameters: &Parameters,
        parameter: SearchParameter,
        step: f64,
        end: f64,
    ) -> SearchOutcome {
        let objective = ParameterObjective {
            model,
            base: *parameters,
            parameter,
        };
        let outcome = self.optimizer.minimize(
            &objective,
            parameter.get(parameters),
            step,
            end,
            parameter.lower_bound(),
        );
        log::debug!(
            "{:?} pass: {} -> {} after {} levels",
            parameter,
            parameter.get(parameters),
            outcome.value,
            outcome.levels
        );
        outcome
    }
}
