/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! JSON analysis configuration
//!
//! A configuration names the data files and holds every scalar setting of a
//! run. Relative paths are resolved against a base directory, normally the
//! directory of the configuration file itself.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::Result;
use super::parser::{read_element_table_json, read_element_tables, read_intensity_file, read_xyz_file};
use crate::atoms::{Composition, ElementTable, Molecule};
use crate::grid::{IntensityCurve, QRanges};
use crate::refine::{DriverOptions, Parameters, RefinementOptions, SearchOptions};
use crate::structure::{AbsorptionCorrection, Formalism, SmoothingOptions};
use crate::transform::TransformOptions;

/// Where the element coefficients come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum CoefficientSource {
    /// A serialized [`ElementTable`]
    Json { path: PathBuf },
    /// Separate form-factor and incoherent-scattering text tables
    Text {
        form_factors: PathBuf,
        incoherent: PathBuf,
    },
}

impl CoefficientSource {
    pub fn load(&self, base: &Path) -> Result<ElementTable> {
        match self {
            CoefficientSource::Json { path } => read_element_table_json(base.join(path)),
            CoefficientSource::Text {
                form_factors,
                incoherent,
            } => read_element_tables(base.join(form_factors), base.join(incoherent)),
        }
    }
}

fn default_scale_factor() -> f64 {
    1.0
}

/// Complete description of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Molecular formula of the sample, e.g. `"CO2"`
    pub composition: String,
    pub coefficients: CoefficientSource,
    /// Sample intensity file
    pub sample: PathBuf,
    /// Background intensity file; no background when absent
    #[serde(default)]
    pub background: Option<PathBuf>,
    /// Molecular geometry (xyz, Å) for the intramolecular term
    #[serde(default)]
    pub molecule: Option<PathBuf>,
    /// Initial atomic density (atoms/nm³)
    pub density: f64,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    #[serde(default)]
    pub ranges: QRanges,
    /// Rebin the sample onto this many uniform samples after truncation
    #[serde(default)]
    pub rebin_points: Option<usize>,
    #[serde(default)]
    pub formalism: Formalism,
    #[serde(default)]
    pub smoothing: SmoothingOptions,
    #[serde(default)]
    pub transform: TransformOptions,
    #[serde(default)]
    pub refinement: RefinementOptions,
    #[serde(default)]
    pub search: SearchOptions,
    #[serde(default)]
    pub driver: DriverOptions,
    #[serde(default)]
    pub absorption: Option<AbsorptionCorrection>,
}

/// Data files of a configuration, loaded and aligned
#[derive(Debug, Clone)]
pub struct AnalysisInputs {
    pub composition: Composition,
    pub table: ElementTable,
    pub sample: IntensityCurve,
    /// Background on the sample grid
    pub background: IntensityCurve,
    pub molecule: Option<Molecule>,
}

impl AnalysisConfig {
    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Initial parameters of the run
    pub fn initial_parameters(&self) -> Parameters {
        Parameters {
            scale_factor: self.scale_factor,
            density: self.density,
            thickness: self.absorption.map_or(0.0, |a| a.thickness),
        }
    }

    /// Load every file the configuration names, relative to `base`
    ///
    /// The sample is cut at maxQ and optionally rebinned; the background is
    /// then expressed on the resulting sample grid.
    pub fn load_inputs(&self, base: &Path) -> Result<AnalysisInputs> {
        let composition = Composition::from_formula(&self.composition)?;
        let table = self.coefficients.load(base)?;

        let raw = read_intensity_file(base.join(&self.sample))?;
        let mut sample = raw.truncate(self.ranges.max_q)?;
        if let Some(points) = self.rebin_points {
            sample = sample.resample_uniform(points)?;
        }
        if sample.len() != raw.len() {
            log::debug!(
                "Sample grid: {} -> {} points up to Q = {}",
                raw.len(),
                sample.len(),
                sample.grid().last()
            );
        }

        let background = match &self.background {
            Some(path) => sample.align(&read_intensity_file(base.join(path))?)?,
            None => IntensityCurve::on_grid(sample.grid().clone(), vec![0.0; sample.len()])?,
        };
        let molecule = self
            .molecule
            .as_ref()
            .map(|path| read_xyz_file(base.join(path)))
            .transpose()?;

        log::info!(
            "Loaded {} sample points for {} ({} elements in table)",
            sample.len(),
            self.composition,
            table.len()
        );

        Ok(AnalysisInputs {
            composition,
            table,
            sample,
            background,
            molecule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::DampingFunction;
    use approx::assert_relative_eq;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let text = r#"{
            "composition": "Ar",
            "coefficients": {"format": "json", "path": "table.json"},
            "sample": "ar.dat",
            "density": 21.0
        }"#;
        let config = AnalysisConfig::from_json(text).unwrap();
        assert_eq!(config.scale_factor, 1.0);
        assert_eq!(config.ranges, QRanges::default());
        assert_eq!(config.formalism, Formalism::Eggert);
        assert_eq!(config.smoothing.damping, DampingFunction::Exponential);
        assert!(config.background.is_none());
        assert_eq!(config.initial_parameters().thickness, 0.0);
    }

    #[test]
    fn test_full_config() {
        let text = r#"{
            "composition": "CO2",
            "coefficients": {"format": "text", "form_factors": "ff.txt", "incoherent": "inc.txt"},
            "sample": "co2.dat",
            "background": "bkg.dat",
            "molecule": "co2.xyz",
            "density": 26.0,
            "scale_factor": 0.9,
            "ranges": {"min_q": 3.0, "q_max_integrate": 90.0, "max_q": 100.0},
            "formalism": {"kind": "waseda", "gamma": 0.001},
            "smoothing": {"damping": "lorch", "target_points": 550},
            "refinement": {"iterations": 5},
            "absorption": {"wavelength": 0.03344, "absorption_length": 1.2, "thickness": 0.2}
        }"#;
        let config = AnalysisConfig::from_json(text).unwrap();
        assert_eq!(config.formalism, Formalism::Waseda { gamma: 0.001 });
        assert_eq!(config.smoothing.target_points, Some(550));
        assert_eq!(config.smoothing.smoothing_factor, 0.25);
        assert_eq!(config.refinement.iterations, 5);
        assert_eq!(config.refinement.r_min, 0.22);
        assert_eq!(config.initial_parameters().thickness, 0.2);
        assert!(matches!(config.coefficients, CoefficientSource::Text { .. }));
    }

    fn write_run(dir: &Path, extra: &str) -> AnalysisConfig {
        let mut data = String::new();
        for k in 0..=120 {
            let q = k as f64;
            data.push_str(&format!("{} {}\n", q, 1.0 + 0.01 * q));
        }
        std::fs::write(dir.join("s.dat"), data).unwrap();
        std::fs::write(dir.join("b.dat"), "0.0 0.5\n200.0 2.5\n").unwrap();
        let text = format!(
            r#"{{
                "composition": "Ar",
                "coefficients": {{"format": "json", "path": "t.json"}},
                "sample": "s.dat",
                "background": "b.dat",
                "density": 21.0,
                "ranges": {{"min_q": 3.0, "q_max_integrate": 90.0, "max_q": 100.0}}{}
            }}"#,
            extra
        );
        AnalysisConfig::from_json(&text).unwrap()
    }

    #[test]
    fn test_sample_is_cut_at_max_q() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t.json"), "{}").unwrap();
        let config = write_run(dir.path(), "");
        assert_eq!(config.rebin_points, None);

        let inputs = config.load_inputs(dir.path()).unwrap();
        assert_eq!(inputs.sample.len(), 101);
        assert_eq!(inputs.sample.grid().last(), 100.0);
        assert_eq!(inputs.background.grid(), inputs.sample.grid());
        assert_relative_eq!(inputs.background.intensity()[100], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_sample_is_rebinned() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t.json"), "{}").unwrap();
        let config = write_run(dir.path(), r#", "rebin_points": 401"#);

        let inputs = config.load_inputs(dir.path()).unwrap();
        let q = inputs.sample.grid().values();
        assert_eq!(q.len(), 401);
        assert_eq!(q[0], 0.0);
        assert_relative_eq!(q[400], 100.0, epsilon = 1e-12);
        assert_relative_eq!(q[1], 0.25, epsilon = 1e-12);
        // the intensity is linear in Q, so rebinning reproduces it
        assert_relative_eq!(inputs.sample.intensity()[1], 1.0025, epsilon = 1e-12);
        assert_eq!(inputs.background.len(), 401);
    }

    #[test]
    fn test_missing_density_is_rejected() {
        let text = r#"{"composition": "Ar", "coefficients": {"format": "json", "path": "t"}, "sample": "s"}"#;
        assert!(AnalysisConfig::from_json(text).is_err());
    }
}
