/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Molecular geometry and the intramolecular scattering term
//!
//! For bonded atoms at fixed distances `d_ij`, the intramolecular part of
//! i(Q) is
//!
//! `iintra(Q) = Σ_{i≠j} K_i K_j sin(d_ij Q) / (d_ij Q) / Ztot²`
//!
//! summed over ordered pairs, with `K` the averaged effective atomic numbers
//! of the form-factor model.

use super::database::atomic_number;
use super::errors::{AtomError, Result};
use super::form_factor::FormFactorModel;

/// One atom of a molecule, position in nm
#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeAtom {
    pub symbol: String,
    pub position: [f64; 3],
}

/// Rigid molecular geometry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Molecule {
    atoms: Vec<MoleculeAtom>,
}

impl Molecule {
    pub fn new(atoms: Vec<MoleculeAtom>) -> Result<Self> {
        for atom in &atoms {
            if atomic_number(&atom.symbol).is_none() {
                return Err(AtomError::UnknownElement(atom.symbol.clone()));
            }
            if atom.position.iter().any(|c| !c.is_finite()) {
                return Err(AtomError::InvalidStructure(format!(
                    "non-finite coordinate for {}",
                    atom.symbol
                )));
            }
        }
        Ok(Self { atoms })
    }

    pub fn atoms(&self) -> &[MoleculeAtom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Distinct ordered-pair distances as `(i, j, d_ij)` with `i < j`
    pub fn pair_distances(&self) -> Vec<(usize, usize, f64)> {
        let mut pairs = Vec::new();
        for i in 0..self.atoms.len() {
            for j in (i + 1)..self.atoms.len() {
                let a = self.atoms[i].position;
                let b = self.atoms[j].position;
                let d = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2))
                    .sqrt();
                pairs.push((i, j, d));
            }
        }
        pairs
    }

    /// Intramolecular contribution to i(Q) on `q`
    ///
    /// Samples above `q_max_integrate` are set to zero.
    ///
    /// # Errors
    ///
    /// Fails when the molecule contains an element absent from the model, or
    /// two atoms share a position.
    pub fn intramolecular(
        &self,
        model: &FormFactorModel,
        q: &[f64],
        q_max_integrate: f64,
    ) -> Result<Vec<f64>> {
        let weights = self
            .atoms
            .iter()
            .map(|atom| {
                model
                    .effective_atomic_number(&atom.symbol)
                    .ok_or_else(|| AtomError::MissingCoefficients(atom.symbol.clone()))
            })
            .collect::<Result<Vec<f64>>>()?;

        let pairs = self.pair_distances();
        if let Some((i, j, _)) = pairs.iter().find(|(_, _, d)| *d <= 0.0) {
            return Err(AtomError::InvalidStructure(format!(
                "atoms {} and {} overlap",
                i, j
            )));
        }

        let z2 = model.z_total().powi(2);
        let curve = q
            .iter()
            .map(|&qv| {
                if qv > q_max_integrate {
                    return 0.0;
                }
                // each unordered pair appears twice in the ordered sum
                2.0 * pairs
                    .iter()
                    .map(|&(i, j, d)| weights[i] * weights[j] * sinc(d * qv))
                    .sum::<f64>()
                    / z2
            })
            .collect();
        Ok(curve)
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        x.sin() / x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::{Composition, ElementParameters, ElementTable};
    use crate::grid::MomentumGrid;
    use approx::assert_relative_eq;

    fn constant(z: f64) -> ElementParameters {
        ElementParameters {
            a: [0.0; 4],
            b: [0.0; 4],
            c: z,
            z,
            m: 0.0,
            k: 0.0,
            l: 0.0,
        }
    }

    fn carbon_dioxide() -> Molecule {
        Molecule::new(vec![
            MoleculeAtom {
                symbol: "C".into(),
                position: [0.0, 0.0, 0.0],
            },
            MoleculeAtom {
                symbol: "O".into(),
                position: [0.1165, 0.0, 0.0],
            },
            MoleculeAtom {
                symbol: "O".into(),
                position: [-0.1165, 0.0, 0.0],
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_pair_distances() {
        let pairs = carbon_dioxide().pair_distances();
        assert_eq!(pairs.len(), 3);
        assert_relative_eq!(pairs[0].2, 0.1165, epsilon = 1e-12);
        assert_relative_eq!(pairs[2].2, 0.233, epsilon = 1e-12);
    }

    #[test]
    fn test_intramolecular_forward_limit_and_cutoff() {
        let mut table = ElementTable::new();
        table.insert("C", constant(6.0)).unwrap();
        table.insert("O", constant(8.0)).unwrap();
        let composition = Composition::from_formula("CO2").unwrap();
        let grid = MomentumGrid::uniform(0.0, 100.0, 101).unwrap();
        let model = FormFactorModel::new(&composition, &table, &grid).unwrap();

        let iintra = carbon_dioxide()
            .intramolecular(&model, grid.values(), 80.0)
            .unwrap();
        // 4 C-O and 2 O-O ordered pairs
        let expected = (4.0 * 6.0 * 8.0 + 2.0 * 64.0) / 484.0;
        assert_relative_eq!(iintra[0], expected, epsilon = 1e-12);
        assert!(iintra[81..].iter().all(|&v| v == 0.0));
        assert!(iintra[40].abs() < expected);
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let atoms = vec![MoleculeAtom {
            symbol: "Qq".into(),
            position: [0.0; 3],
        }];
        assert!(Molecule::new(atoms).is_err());
    }
}
