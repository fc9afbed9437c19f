/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Coherent intensity normalization and the piecewise S(Q)

use std::f64::consts::PI;

use super::formalism::{safe_ratio, Formalism};
use crate::atoms::FormFactorModel;
use crate::grid::{GridError, MomentumGrid, QRanges, RangeMasks, Result};
use crate::utils::math::simpson;

/// Structure factor over the validation range `Q ≤ maxQ`
#[derive(Debug, Clone, PartialEq)]
pub struct StructureFactor {
    pub q: Vec<f64>,
    pub s_q: Vec<f64>,
    /// Normalization factor α
    pub alpha: f64,
    /// Value of S(Q) above QmaxIntegrate
    pub asymptote: f64,
}

/// Background-subtracted sample intensity `c(Q)·(I(Q) - scale·Ibkg(Q))`
///
/// `correction` holds optional per-sample transmission factors.
pub fn sample_intensity(
    intensity: &[f64],
    background: &[f64],
    scale_factor: f64,
    correction: Option<&[f64]>,
) -> Vec<f64> {
    let raw = intensity
        .iter()
        .zip(background)
        .map(|(i, b)| i - scale_factor * b);
    match correction {
        Some(factors) => raw.zip(factors).map(|(v, c)| v * c).collect(),
        None => raw.collect(),
    }
}

/// Turns sample intensities into S(Q) for one grid, composition and formalism
///
/// Everything that does not depend on the scale factor or density is
/// evaluated once at construction.
#[derive(Debug, Clone)]
pub struct StructureFactorBuilder {
    grid: MomentumGrid,
    ranges: QRanges,
    formalism: Formalism,
    asymptote: f64,
    incoherent: Vec<f64>,
    denominator: Vec<f64>,
    offset: Vec<f64>,
    weighted_q2: Vec<f64>,
    fixed_integral: f64,
}

impl StructureFactorBuilder {
    pub fn new(
        grid: MomentumGrid,
        ranges: QRanges,
        formalism: Formalism,
        model: &FormFactorModel,
    ) -> Result<Self> {
        ranges.validate()?;
        let curves = model.evaluate(grid.values());
        let atom_count = model.atom_count();
        let asymptote = formalism.asymptote(model.s_inf());

        let n = grid.len();
        let denominator: Vec<f64> = (0..n)
            .map(|i| formalism.denominator(&curves, atom_count, i))
            .collect();
        let offset: Vec<f64> = (0..n)
            .map(|i| formalism.self_offset(&curves, atom_count, i))
            .collect();
        let weighted_q2: Vec<f64> = grid
            .values()
            .iter()
            .map(|&q| formalism.weight(q) * q * q)
            .collect();

        let mut builder = Self {
            grid,
            ranges,
            formalism,
            asymptote,
            incoherent: curves.incoherent,
            denominator,
            offset,
            weighted_q2,
            fixed_integral: 0.0,
        };

        let integration = builder.masks().integration();
        let integrand: Vec<f64> = integration
            .clone()
            .map(|i| {
                builder.weighted_q2[i]
                    * (safe_ratio(builder.incoherent[i] + builder.offset[i], builder.denominator[i])
                        + asymptote)
            })
            .collect();
        builder.fixed_integral = simpson(&integrand, &builder.grid.values()[integration]);
        Ok(builder)
    }

    pub fn grid(&self) -> &MomentumGrid {
        &self.grid
    }

    pub fn formalism(&self) -> Formalism {
        self.formalism
    }

    pub fn asymptote(&self) -> f64 {
        self.asymptote
    }

    /// Range masks of this builder's grid
    pub fn masks(&self) -> RangeMasks<'_> {
        RangeMasks::from_validated(&self.grid, self.ranges)
    }

    /// Incoherent ratio `J(Q) = Iincoh(Q)/D(Q)` on the full grid
    pub fn incoherent_ratio(&self) -> Vec<f64> {
        self.incoherent
            .iter()
            .zip(&self.denominator)
            .map(|(&i, &d)| safe_ratio(i, d))
            .collect()
    }

    /// Denominator `D(Q)` on the full grid
    pub fn denominator(&self) -> &[f64] {
        &self.denominator
    }

    /// Normalization factor α from the sum rule over `Q ≤ QmaxIntegrate`
    ///
    /// A vanishing sample integral yields α = 0 rather than a non-finite value.
    pub fn normalization(&self, sample: &[f64], density: f64) -> f64 {
        let integration = self.masks().integration();
        let integrand: Vec<f64> = integration
            .clone()
            .map(|i| self.weighted_q2[i] * safe_ratio(sample[i], self.denominator[i]))
            .collect();
        let sample_integral = simpson(&integrand, &self.grid.values()[integration]);
        let numerator = -2.0 * PI * PI * density + self.fixed_integral;
        let alpha = safe_ratio(numerator, sample_integral);
        if !alpha.is_finite() {
            log::warn!("Non-finite normalization factor, using 0");
            return 0.0;
        }
        alpha
    }

    /// Piecewise S(Q): 0 for `Q ≤ minQ`, the normalized coherent intensity on
    /// the calculation range and the asymptote up to `maxQ`
    pub fn build(&self, sample: &[f64], density: f64) -> Result<StructureFactor> {
        if sample.len() != self.grid.len() {
            return Err(GridError::LengthMismatch {
                expected: self.grid.len(),
                found: sample.len(),
            });
        }

        let masks = self.masks();
        let alpha = self.normalization(sample, density);
        let validation = masks.validation();
        let mut s_q = vec![0.0; validation.len()];

        for i in masks.calc() {
            let coherent = alpha * sample[i] - self.incoherent[i] - self.offset[i];
            s_q[i] = safe_ratio(coherent, self.denominator[i]);
        }
        for i in masks.tail() {
            s_q[i] = self.asymptote;
        }

        Ok(StructureFactor {
            q: self.grid.values()[validation].to_vec(),
            s_q,
            alpha,
            asymptote: self.asymptote,
        })
    }
}
