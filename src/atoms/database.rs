/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Element symbols and scattering coefficient tables
//!
//! The coefficient values themselves are supplied by the caller (JSON or the
//! whitespace tables read by [`crate::input::parser`]); this module only
//! defines their shape and evaluates the parametrised curves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::errors::{AtomError, Result};
use crate::utils::constants::Q_TO_S;

const ELEMENT_SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl",
    "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As",
    "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In",
    "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb",
    "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg", "Tl",
    "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk",
    "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh",
    "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Atomic number of an element symbol, case-sensitive
pub fn atomic_number(symbol: &str) -> Option<u32> {
    ELEMENT_SYMBOLS
        .iter()
        .position(|&s| s == symbol)
        .map(|i| i as u32 + 1)
}

/// Element symbol for an atomic number
pub fn element_symbol(atomic_number: u32) -> Option<&'static str> {
    let index = atomic_number.checked_sub(1)? as usize;
    ELEMENT_SYMBOLS.get(index).copied()
}

/// Form-factor and incoherent-scattering coefficients of one element
///
/// `f(Q) = Σ a_k exp(-b_k s²) + c` with `s = Q/(40π)`, and
/// `I_incoh(Q) = (Z - f²/Z)(1 - M(exp(-K s) - exp(-L s)))` with `s = Q/(40π)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementParameters {
    pub a: [f64; 4],
    pub b: [f64; 4],
    pub c: f64,
    /// Number of electrons used by the incoherent term
    pub z: f64,
    pub m: f64,
    pub k: f64,
    pub l: f64,
}

impl ElementParameters {
    /// Atomic form factor at momentum transfer `q` (nm⁻¹)
    pub fn form_factor(&self, q: f64) -> f64 {
        let s2 = (q * Q_TO_S).powi(2);
        self.a
            .iter()
            .zip(&self.b)
            .map(|(a, b)| a * (-b * s2).exp())
            .sum::<f64>()
            + self.c
    }

    /// Incoherent (Compton) intensity given the form factor at the same `q`
    pub fn incoherent(&self, q: f64, form_factor: f64) -> f64 {
        let s = q * Q_TO_S;
        (self.z - form_factor * form_factor / self.z)
            * (1.0 - self.m * ((-self.k * s).exp() - (-self.l * s).exp()))
    }

    fn validate(&self, element: &str) -> Result<()> {
        let finite = self.a.iter().chain(&self.b).all(|v| v.is_finite())
            && [self.c, self.z, self.m, self.k, self.l]
                .iter()
                .all(|v| v.is_finite());
        if !finite {
            return Err(AtomError::InvalidCoefficients {
                element: element.to_string(),
                reason: "non-finite coefficient".to_string(),
            });
        }
        if self.z <= 0.0 {
            return Err(AtomError::InvalidCoefficients {
                element: element.to_string(),
                reason: format!("electron count must be positive, got {}", self.z),
            });
        }
        Ok(())
    }
}

/// Coefficient table keyed by element symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementTable {
    entries: BTreeMap<String, ElementParameters>,
}

impl ElementTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the coefficients of `symbol`
    pub fn insert(&mut self, symbol: &str, parameters: ElementParameters) -> Result<()> {
        parameters.validate(symbol)?;
        self.entries.insert(symbol.to_string(), parameters);
        Ok(())
    }

    /// Coefficients of `symbol`
    ///
    /// # Errors
    ///
    /// `AtomError::MissingCoefficients` when the element is not in the table.
    pub fn get(&self, symbol: &str) -> Result<&ElementParameters> {
        self.entries
            .get(symbol)
            .ok_or_else(|| AtomError::MissingCoefficients(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate every entry, e.g. after deserialization
    pub fn validate(&self) -> Result<()> {
        self.entries
            .iter()
            .try_for_each(|(symbol, parameters)| parameters.validate(symbol))
    }
}
