/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! The complete analysis chain for one data set
//!
//! ```text
//! I(Q), Ibkg(Q) ─► S(Q) ─► smoothed, damped S(Q) ─► F(r) ─► Kaplow ─► χ²
//! ```
//!
//! A [`Pipeline`] fixes everything that does not depend on the scale factor,
//! density or sample thickness: the form-factor model, the transform grids,
//! the incoherent ratio and the intramolecular F(r). Each call to
//! [`Pipeline::evaluate`] then runs the chain for one parameter set and
//! returns a fresh [`PipelineState`].

pub mod errors;
pub mod state;

pub use errors::{AnalysisError, Result};
pub use state::{PipelineState, ScalarState};

use serde::{Deserialize, Serialize};

use crate::atoms::FormFactorModel;
use crate::grid::{GridError, QRanges};
use crate::input::{AnalysisConfig, AnalysisInputs};
use crate::refine::{
    chi_square, ChiSquareModel, Driver, DriverOptions, GridSearchOptimizer, KaplowInput,
    KaplowRefiner, MinimizationResult, Parameters, RefinementOptions, SearchOptions,
};
use crate::structure::{
    damp, damping_curve, sample_intensity, smooth, smoothed_grid, AbsorptionCorrection,
    Formalism, SmoothingOptions, StructureFactorBuilder,
};
use crate::transform::{RealSpaceCurve, TransformOptions};

/// Minimum number of samples in the calculation range
const MIN_CALC_POINTS: usize = 3;

/// Fixed settings of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub ranges: QRanges,
    pub formalism: Formalism,
    pub smoothing: SmoothingOptions,
    pub transform: TransformOptions,
    pub refinement: RefinementOptions,
    pub absorption: Option<AbsorptionCorrection>,
}

impl From<&AnalysisConfig> for PipelineSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            ranges: config.ranges,
            formalism: config.formalism,
            smoothing: config.smoothing,
            transform: config.transform,
            refinement: config.refinement,
            absorption: config.absorption,
        }
    }
}

/// Outcome of a full minimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub minimization: MinimizationResult,
    /// State at the final parameters
    pub state: PipelineState,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: PipelineSettings,
    builder: StructureFactorBuilder,
    intensity: Vec<f64>,
    background: Vec<f64>,
    s_inf: f64,
    z_total: f64,
    q_transform: Vec<f64>,
    j_transform: Vec<f64>,
    r: Vec<f64>,
    f_intra: Vec<f64>,
    refiner: KaplowRefiner,
}

impl Pipeline {
    /// Fix the parameter-independent part of the analysis
    ///
    /// # Errors
    ///
    /// Fails for invalid Q ranges, a background that does not match the
    /// sample grid, elements without coefficients, or fewer than three
    /// samples between minQ and QmaxIntegrate.
    pub fn new(settings: PipelineSettings, inputs: &AnalysisInputs) -> Result<Self> {
        let ranges = settings.ranges;
        ranges.validate()?;

        let grid = inputs.sample.grid().clone();
        if inputs.background.grid() != &grid {
            return Err(GridError::LengthMismatch {
                expected: grid.len(),
                found: inputs.background.len(),
            }
            .into());
        }

        let model = FormFactorModel::new(&inputs.composition, &inputs.table, &grid)?;
        let builder = StructureFactorBuilder::new(grid, ranges, settings.formalism, &model)?;

        let (calc_points, q_validation) = {
            let masks = builder.masks();
            let validation = masks.grid().values()[masks.validation()].to_vec();
            (masks.calc().len(), validation)
        };
        if calc_points < MIN_CALC_POINTS {
            return Err(AnalysisError::InvalidConfiguration(format!(
                "only {} samples between minQ = {} and QmaxIntegrate = {}",
                calc_points, ranges.min_q, ranges.q_max_integrate
            )));
        }

        let q_transform = smoothed_grid(&q_validation, &settings.smoothing);
        let j_transform = settings
            .formalism
            .incoherent_ratio(&model.evaluate(&q_transform), model.atom_count());
        let r = settings
            .transform
            .r_grid(&q_transform, ranges.q_max_integrate);
        if r.is_empty() {
            return Err(AnalysisError::InvalidConfiguration(
                "empty real-space grid".to_string(),
            ));
        }

        let f_intra = match &inputs.molecule {
            Some(molecule) => {
                let iintra = molecule.intramolecular(&model, &q_transform, ranges.q_max_integrate)?;
                let envelope = damping_curve(
                    settings.smoothing.damping,
                    &q_transform,
                    ranges.q_max_integrate,
                    settings.smoothing.damping_factor,
                );
                let damped: Vec<f64> = iintra.iter().zip(&envelope).map(|(i, d)| i * d).collect();
                settings
                    .transform
                    .forward(&q_transform, &damped, &r, ranges.q_max_integrate)?
                    .f
            }
            None => vec![0.0; r.len()],
        };

        log::info!(
            "Pipeline: {} Q samples, {} transform samples, {} r samples, Sinf = {:.6}",
            builder.grid().len(),
            q_transform.len(),
            r.len(),
            model.s_inf()
        );

        Ok(Self {
            refiner: KaplowRefiner::new(settings.refinement, settings.transform.rule),
            settings,
            builder,
            intensity: inputs.sample.intensity().to_vec(),
            background: inputs.background.intensity().to_vec(),
            s_inf: model.s_inf(),
            z_total: model.z_total(),
            q_transform,
            j_transform,
            r,
            f_intra,
        })
    }

    /// Build a pipeline from a configuration and its loaded inputs
    pub fn from_config(config: &AnalysisConfig, inputs: &AnalysisInputs) -> Result<Self> {
        Self::new(PipelineSettings::from(config), inputs)
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Real-space grid of F(r)
    pub fn r(&self) -> &[f64] {
        &self.r
    }

    /// Intramolecular F(r), zero without a molecular geometry
    pub fn intramolecular(&self) -> &[f64] {
        &self.f_intra
    }

    pub fn scalar_state(&self, parameters: &Parameters) -> ScalarState {
        ScalarState {
            s_inf: self.s_inf,
            z_total: self.z_total,
            density: parameters.density,
            scale_factor: parameters.scale_factor,
            r_min: self.settings.refinement.r_min,
            damping_factor: self.settings.smoothing.damping_factor,
            smoothing_factor: self.settings.smoothing.smoothing_factor,
            iterations: self.settings.refinement.iterations,
        }
    }

    /// Run the chain for one parameter set
    pub fn evaluate(&self, parameters: &Parameters) -> Result<PipelineState> {
        let ranges = self.settings.ranges;
        let q_max_integrate = ranges.q_max_integrate;

        let correction = self
            .settings
            .absorption
            .map(|a| a.factors(self.builder.grid().values(), parameters.thickness));
        let sample = sample_intensity(
            &self.intensity,
            &self.background,
            parameters.scale_factor,
            correction.as_deref(),
        );

        let raw = self.builder.build(&sample, parameters.density)?;
        let smoothed = smooth(&raw, &ranges, &self.settings.smoothing)?;
        let damped = damp(&smoothed, q_max_integrate, &self.settings.smoothing);
        let i_q: Vec<f64> = damped.s_q.iter().map(|s| s - damped.asymptote).collect();

        let f_r = self
            .settings
            .transform
            .forward(&self.q_transform, &i_q, &self.r, q_max_integrate)?;

        let outcome = self.refiner.refine(&KaplowInput {
            q: &self.q_transform,
            i_q: &i_q,
            j_q: &self.j_transform,
            r: &self.r,
            f_r: &f_r.f,
            f_intra: &self.f_intra,
            asymptote: damped.asymptote,
            density: parameters.density,
            q_max_integrate,
        });
        let chi2 = chi_square(&self.r, &outcome.delta_f, self.refiner.r_min);

        Ok(PipelineState::new(
            *parameters,
            self.scalar_state(parameters),
            raw,
            damped,
            outcome.i_q,
            RealSpaceCurve::new(self.r.clone(), outcome.f_r),
            outcome.delta_f,
            chi2,
        ))
    }

    /// Minimize chi-square over scale factor and density, then evaluate the
    /// final state
    pub fn optimize(
        &self,
        initial: Parameters,
        search: SearchOptions,
        driver: DriverOptions,
    ) -> Result<Analysis> {
        let driver = Driver::new(GridSearchOptimizer::new(search), driver);
        let minimization = driver.minimize(self, initial);
        let state = self.evaluate(&minimization.parameters)?;
        Ok(Analysis {
            minimization,
            state,
        })
    }
}

impl ChiSquareModel for Pipeline {
    fn chi_square(&self, parameters: &Parameters) -> f64 {
        match self.evaluate(parameters) {
            Ok(state) => state.chi_square,
            Err(err) => {
                log::debug!("Evaluation failed at {:?}: {}", parameters, err);
                f64::INFINITY
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{Composition, ElementParameters, ElementTable};
    use crate::grid::{IntensityCurve, MomentumGrid};

    fn flat_argon(grid: MomentumGrid) -> AnalysisInputs {
        let mut table = ElementTable::new();
        table
            .insert(
                "Ar",
                ElementParameters {
                    a: [0.0; 4],
                    b: [0.0; 4],
                    c: 1.0,
                    z: 1.0,
                    m: 0.0,
                    k: 0.0,
                    l: 0.0,
                },
            )
            .unwrap();
        let n = grid.len();
        AnalysisInputs {
            composition: Composition::new(&[("Ar", 1)]).unwrap(),
            table,
            sample: IntensityCurve::on_grid(grid.clone(), vec![1.0; n]).unwrap(),
            background: IntensityCurve::on_grid(grid, vec![0.0; n]).unwrap(),
            molecule: None,
        }
    }

    fn settings(min_q: f64, q_max_integrate: f64, max_q: f64) -> PipelineSettings {
        PipelineSettings {
            ranges: QRanges::new(min_q, q_max_integrate, max_q).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_flat_sample_without_density() {
        let grid = MomentumGrid::uniform(0.0, 100.0, 201).unwrap();
        let pipeline = Pipeline::new(settings(0.0, 90.0, 100.0), &flat_argon(grid)).unwrap();
        assert!(pipeline.intramolecular().iter().all(|&f| f == 0.0));

        let state = pipeline.evaluate(&Parameters::new(1.0, 0.0)).unwrap();
        assert!((state.alpha - 1.0).abs() < 1e-12);
        assert!(state.s_q[1..].iter().all(|&s| (s - 1.0).abs() < 1e-12));
        assert!(state.f_r.f.iter().all(|&f| f.abs() < 1e-9));
        assert!(state.chi_square.abs() < 1e-12);
        assert_eq!(state.scalars.iterations, 2);
    }

    #[test]
    fn test_flat_sample_optimization_converges_at_once() {
        let grid = MomentumGrid::uniform(0.0, 100.0, 201).unwrap();
        let pipeline = Pipeline::new(settings(0.0, 90.0, 100.0), &flat_argon(grid)).unwrap();
        let analysis = pipeline
            .optimize(
                Parameters::new(1.0, 0.0),
                SearchOptions::default(),
                DriverOptions::default(),
            )
            .unwrap();
        assert!(analysis.minimization.converged);
        assert_eq!(analysis.minimization.iterations, 1);
        assert_eq!(analysis.minimization.parameters.density, 0.0);
        assert!(analysis.state.chi_square.abs() < 1e-12);
    }

    #[test]
    fn test_density_raises_chi_square() {
        let grid = MomentumGrid::uniform(0.0, 100.0, 201).unwrap();
        let pipeline = Pipeline::new(settings(0.0, 90.0, 100.0), &flat_argon(grid)).unwrap();
        let chi2 = pipeline.chi_square(&Parameters::new(1.0, 20.0));
        assert!(chi2.is_finite());
        assert!(chi2 > 0.0);
    }

    #[test]
    fn test_too_few_calculation_points() {
        let grid = MomentumGrid::uniform(0.0, 100.0, 201).unwrap();
        let err = Pipeline::new(settings(0.0, 0.6, 100.0), &flat_argon(grid)).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_fft_path_on_non_uniform_grid() {
        use crate::refine::RefinementOptions;
        use crate::transform::{direct_transform, QuadratureRule, TransformMethod};
        use crate::utils::math::linspace;

        let q: Vec<f64> = linspace(0.0, 1.0, 401).iter().map(|t| 100.0 * t * t).collect();
        let intensity: Vec<f64> = q
            .iter()
            .map(|&v| 1.0 + 0.3 * (0.5 * v).sin() / (1.0 + 0.1 * v))
            .collect();
        let grid = MomentumGrid::new(q).unwrap();
        let mut inputs = flat_argon(grid.clone());
        inputs.sample = IntensityCurve::on_grid(grid, intensity).unwrap();

        let mut settings = settings(0.0, 90.01, 100.0);
        settings.transform.method = TransformMethod::Fft;
        settings.refinement = RefinementOptions {
            iterations: 0,
            ..Default::default()
        };
        let pipeline = Pipeline::new(settings, &inputs).unwrap();
        let state = pipeline.evaluate(&Parameters::new(1.0, 0.0)).unwrap();

        for w in state.q_smoothed.windows(2) {
            assert!((w[1] - w[0] - 0.25).abs() < 1e-12);
        }
        assert!(state.f_r.f.iter().any(|f| f.abs() > 1e-3));
        let direct = direct_transform(
            &state.q_smoothed,
            &state.i_q,
            &state.f_r.r,
            90.01,
            QuadratureRule::Riemann,
        );
        for (fft, quad) in state.f_r.f.iter().zip(&direct) {
            assert!((fft - quad).abs() < 1e-6, "{} vs {}", fft, quad);
        }
    }

    #[test]
    fn test_background_on_other_grid_is_rejected() {
        let grid = MomentumGrid::uniform(0.0, 100.0, 201).unwrap();
        let mut inputs = flat_argon(grid);
        inputs.background =
            IntensityCurve::on_grid(MomentumGrid::uniform(0.0, 100.0, 101).unwrap(), vec![0.0; 101])
                .unwrap();
        let err = Pipeline::new(settings(0.0, 90.0, 100.0), &inputs).unwrap_err();
        assert!(matches!(err, AnalysisError::Grid(_)));
    }
}
