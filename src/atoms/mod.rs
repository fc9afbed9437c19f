/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Composition, scattering coefficients and molecular geometry
//!
//! This module turns a chemical composition and a coefficient table into the
//! averaged form factors used to normalize diffraction data, and evaluates
//! the intramolecular term from a rigid molecular geometry.

pub mod composition;
pub mod database;
pub mod errors;
pub mod form_factor;
pub mod molecule;

pub use composition::Composition;
pub use database::{atomic_number, element_symbol, ElementParameters, ElementTable};
pub use errors::{AtomError, Result};
pub use form_factor::{FormFactorCurves, FormFactorModel};
pub use molecule::{Molecule, MoleculeAtom};
