/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Composition-averaged scattering factors
//!
//! For a composition with multiplicities `n_p`:
//!
//! * `Ztot = Σ n_p Z_p`
//! * `fe(Q) = Σ n_p f_p(Q) / Ztot`, the effective electron form factor
//! * `Iincoh(Q) = Σ n_p Iincoh_p(Q)`
//! * `Kp = ⟨f_p(Q) / fe(Q)⟩`, averaged over the measurement grid
//! * `Sinf = Σ n_p Kp² / Ztot²`
//!
//! `Kp` and `Sinf` are fixed when the model is built; the Q-dependent curves
//! can be evaluated on any grid, which is needed once S(Q) is resampled.

use super::composition::Composition;
use super::database::{ElementParameters, ElementTable};
use super::errors::{AtomError, Result};
use crate::grid::MomentumGrid;

#[derive(Debug, Clone)]
struct Species {
    symbol: String,
    multiplicity: f64,
    parameters: ElementParameters,
    effective_atomic_number: f64,
}

/// Q-dependent form-factor curves on a particular grid
#[derive(Debug, Clone, PartialEq)]
pub struct FormFactorCurves {
    /// Effective electron form factor fe(Q)
    pub effective: Vec<f64>,
    /// Total incoherent intensity per formula unit
    pub incoherent: Vec<f64>,
    /// `Σ n_p f_p(Q)`
    pub sum_f: Vec<f64>,
    /// `Σ n_p f_p(Q)²`
    pub sum_f_squared: Vec<f64>,
}

/// Form-factor model of a composition
#[derive(Debug, Clone)]
pub struct FormFactorModel {
    species: Vec<Species>,
    z_total: f64,
    s_inf: f64,
    atom_count: f64,
}

impl FormFactorModel {
    /// Build the model for `composition` and fix `Kp`/`Sinf` on `grid`
    ///
    /// # Errors
    ///
    /// `AtomError::MissingCoefficients` if an element has no table entry.
    pub fn new(
        composition: &Composition,
        table: &ElementTable,
        grid: &MomentumGrid,
    ) -> Result<Self> {
        let mut species = composition
            .iter()
            .map(|(symbol, n)| {
                Ok(Species {
                    symbol: symbol.to_string(),
                    multiplicity: f64::from(n),
                    parameters: *table.get(symbol)?,
                    effective_atomic_number: 0.0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let z_total: f64 = species.iter().map(|s| s.multiplicity * s.parameters.z).sum();
        if z_total <= 0.0 {
            return Err(AtomError::EmptyComposition);
        }

        let q = grid.values();
        let effective: Vec<f64> = q
            .iter()
            .map(|&qv| {
                species
                    .iter()
                    .map(|s| s.multiplicity * s.parameters.form_factor(qv))
                    .sum::<f64>()
                    / z_total
            })
            .collect();

        for s in species.iter_mut() {
            let ratios: Vec<f64> = q
                .iter()
                .zip(&effective)
                .filter(|(_, &fe)| fe != 0.0)
                .map(|(&qv, &fe)| s.parameters.form_factor(qv) / fe)
                .collect();
            if ratios.is_empty() {
                return Err(AtomError::InvalidCoefficients {
                    element: s.symbol.clone(),
                    reason: "effective form factor vanishes on the whole grid".to_string(),
                });
            }
            s.effective_atomic_number = ratios.iter().sum::<f64>() / ratios.len() as f64;
        }

        let s_inf = species
            .iter()
            .map(|s| s.multiplicity * s.effective_atomic_number.powi(2))
            .sum::<f64>()
            / (z_total * z_total);
        let atom_count = species.iter().map(|s| s.multiplicity).sum();

        log::debug!(
            "Form-factor model: Ztot = {}, Sinf = {:.6}, {} species",
            z_total,
            s_inf,
            species.len()
        );

        Ok(Self {
            species,
            z_total,
            s_inf,
            atom_count,
        })
    }

    /// Total electron count `Ztot`
    pub fn z_total(&self) -> f64 {
        self.z_total
    }

    /// Asymptotic structure factor `Sinf`
    pub fn s_inf(&self) -> f64 {
        self.s_inf
    }

    /// Number of atoms per formula unit
    pub fn atom_count(&self) -> f64 {
        self.atom_count
    }

    /// Averaged effective atomic number `Kp` of an element in the composition
    pub fn effective_atomic_number(&self, symbol: &str) -> Option<f64> {
        self.species
            .iter()
            .find(|s| s.symbol == symbol)
            .map(|s| s.effective_atomic_number)
    }

    /// Evaluate the Q-dependent curves on `q`
    pub fn evaluate(&self, q: &[f64]) -> FormFactorCurves {
        let n = q.len();
        let mut curves = FormFactorCurves {
            effective: Vec::with_capacity(n),
            incoherent: Vec::with_capacity(n),
            sum_f: Vec::with_capacity(n),
            sum_f_squared: Vec::with_capacity(n),
        };

        for &qv in q {
            let mut sum_f = 0.0;
            let mut sum_f_squared = 0.0;
            let mut incoherent = 0.0;
            for s in &self.species {
                let f = s.parameters.form_factor(qv);
                sum_f += s.multiplicity * f;
                sum_f_squared += s.multiplicity * f * f;
                incoherent += s.multiplicity * s.parameters.incoherent(qv, f);
            }
            curves.effective.push(sum_f / self.z_total);
            curves.incoherent.push(incoherent);
            curves.sum_f.push(sum_f);
            curves.sum_f_squared.push(sum_f_squared);
        }

        curves
    }
}
