/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Normalization conventions for turning coherent intensity into S(Q)
//!
//! Every formalism is expressed through the same three quantities evaluated
//! per Q sample: a denominator `D(Q)`, a self-scattering offset `B(Q)` and an
//! integral weight `w(Q)`, plus the asymptote `S∞`:
//!
//! ```text
//! S(Q) = (α·Isample(Q) - Iincoh(Q) - B(Q)) / D(Q)
//! α    = [-2π²ρ + ∫ w (Iincoh/D + B/D + S∞) Q² dQ] / ∫ w (Isample/D) Q² dQ
//! ```
//!
//! The incoherent ratio `J(Q) = Iincoh(Q)/D(Q)` is the quantity used by the
//! Kaplow correction.

use serde::{Deserialize, Serialize};

use crate::atoms::FormFactorCurves;

/// Structure-factor normalization convention
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Formalism {
    /// Eggert et al. (2002): `D = Ztot² fe²`, asymptote `Sinf`
    #[default]
    Eggert,
    /// Ashcroft-Langreth: `D = Σ n f²`, asymptote 1
    AshcroftLangreth,
    /// Faber-Ziman: `D = (Σ n f)²/N`, `B = Σ n f² - (Σ n f)²/N`, asymptote 1
    FaberZiman,
    /// Faber-Ziman normalized with a Gaussian weight `exp(-γQ²)` in both integrals
    Waseda { gamma: f64 },
}

impl Formalism {
    /// Value S(Q) approaches at large Q
    pub fn asymptote(&self, s_inf: f64) -> f64 {
        match self {
            Formalism::Eggert => s_inf,
            _ => 1.0,
        }
    }

    /// Denominator `D(Q)` at sample `i`
    pub fn denominator(&self, curves: &FormFactorCurves, atom_count: f64, i: usize) -> f64 {
        match self {
            Formalism::Eggert => curves.sum_f[i] * curves.sum_f[i],
            Formalism::AshcroftLangreth => curves.sum_f_squared[i],
            Formalism::FaberZiman | Formalism::Waseda { .. } => {
                curves.sum_f[i] * curves.sum_f[i] / atom_count
            }
        }
    }

    /// Self-scattering offset `B(Q)` at sample `i`
    pub fn self_offset(&self, curves: &FormFactorCurves, atom_count: f64, i: usize) -> f64 {
        match self {
            Formalism::Eggert | Formalism::AshcroftLangreth => 0.0,
            Formalism::FaberZiman | Formalism::Waseda { .. } => {
                curves.sum_f_squared[i] - curves.sum_f[i] * curves.sum_f[i] / atom_count
            }
        }
    }

    /// Incoherent ratio `J = Iincoh/D` for every sample of `curves`
    pub fn incoherent_ratio(&self, curves: &FormFactorCurves, atom_count: f64) -> Vec<f64> {
        (0..curves.incoherent.len())
            .map(|i| safe_ratio(curves.incoherent[i], self.denominator(curves, atom_count, i)))
            .collect()
    }

    /// Weight of the normalization integrals at momentum transfer `q`
    pub fn weight(&self, q: f64) -> f64 {
        match self {
            Formalism::Waseda { gamma } => (-gamma * q * q).exp(),
            _ => 1.0,
        }
    }
}

/// `a / d`, or 0 where the denominator vanishes
pub(crate) fn safe_ratio(a: f64, d: f64) -> f64 {
    if d == 0.0 || !d.is_finite() {
        0.0
    } else {
        a / d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_species_curves() -> FormFactorCurves {
        // one C (f = 6) and two O (f = 8)
        FormFactorCurves {
            effective: vec![1.0],
            incoherent: vec![0.0],
            sum_f: vec![22.0],
            sum_f_squared: vec![36.0 + 128.0],
        }
    }

    #[test]
    fn test_denominators() {
        let c = two_species_curves();
        assert_relative_eq!(Formalism::Eggert.denominator(&c, 3.0, 0), 484.0);
        assert_relative_eq!(Formalism::AshcroftLangreth.denominator(&c, 3.0, 0), 164.0);
        assert_relative_eq!(Formalism::FaberZiman.denominator(&c, 3.0, 0), 484.0 / 3.0);
        assert_relative_eq!(
            Formalism::FaberZiman.self_offset(&c, 3.0, 0),
            164.0 - 484.0 / 3.0
        );
        assert_relative_eq!(Formalism::Eggert.self_offset(&c, 3.0, 0), 0.0);
    }

    #[test]
    fn test_incoherent_ratio() {
        let mut c = two_species_curves();
        c.incoherent[0] = 48.4;
        assert_relative_eq!(Formalism::Eggert.incoherent_ratio(&c, 3.0)[0], 0.1);
        c.sum_f[0] = 0.0;
        assert_eq!(Formalism::Eggert.incoherent_ratio(&c, 3.0)[0], 0.0);
    }

    #[test]
    fn test_asymptote_and_weight() {
        assert_relative_eq!(Formalism::Eggert.asymptote(0.34), 0.34);
        assert_relative_eq!(Formalism::FaberZiman.asymptote(0.34), 1.0);
        assert_relative_eq!(Formalism::Eggert.weight(50.0), 1.0);
        let waseda = Formalism::Waseda { gamma: 0.01 };
        assert_relative_eq!(waseda.weight(10.0), (-1.0f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_serde_tag() {
        let json = serde_json::to_string(&Formalism::Waseda { gamma: 0.5 }).unwrap();
        assert_eq!(json, "{\"kind\":\"waseda\",\"gamma\":0.5}");
        let back: Formalism = serde_json::from_str("{\"kind\":\"eggert\"}").unwrap();
        assert_eq!(back, Formalism::Eggert);
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(1.0, 0.0), 0.0);
        assert_eq!(safe_ratio(1.0, f64::INFINITY), 0.0);
        assert_relative_eq!(safe_ratio(1.0, 4.0), 0.25);
    }
}
