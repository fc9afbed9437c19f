/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use lasdia_rs::atoms::{ElementParameters, ElementTable};
use lasdia_rs::utils::linspace;

/// Argon with a constant unit form factor and no incoherent scattering
pub fn flat_argon() -> ElementParameters {
    ElementParameters {
        a: [0.0; 4],
        b: [0.0; 4],
        c: 1.0,
        z: 1.0,
        m: 0.0,
        k: 0.0,
        l: 0.0,
    }
}

pub fn flat_argon_table() -> ElementTable {
    let mut table = ElementTable::new();
    table.insert("Ar", flat_argon()).unwrap();
    table
}

/// `i(Q) = exp(-aQ²)`, whose transform is known in closed form
pub fn gaussian(q: &[f64], a: f64) -> Vec<f64> {
    q.iter().map(|&v| (-a * v * v).exp()).collect()
}

/// `F(r)` of [`gaussian`] for an unbounded Q range
pub fn gaussian_transform(r: f64, a: f64) -> f64 {
    r * (-r * r / (4.0 * a)).exp() / (2.0 * std::f64::consts::PI.sqrt() * a.powf(1.5))
}

/// Write a flat argon data set with a constant unit intensity and its
/// configuration into `dir`, returning the configuration path
pub fn write_flat_argon_run(dir: &Path) -> PathBuf {
    let q = linspace(0.0, 100.0, 201);
    let mut data = String::from("# Q (1/nm)  I (a.u.)\n");
    for v in &q {
        data.push_str(&format!("{:.6} 1.0\n", v));
    }
    fs::write(dir.join("ar.dat"), data).unwrap();

    let table = serde_json::to_string_pretty(&flat_argon_table()).unwrap();
    fs::write(dir.join("table.json"), table).unwrap();

    let config = r#"{
        "composition": "Ar",
        "coefficients": {"format": "json", "path": "table.json"},
        "sample": "ar.dat",
        "density": 0.0,
        "scale_factor": 1.0,
        "ranges": {"min_q": 0.0, "q_max_integrate": 90.0, "max_q": 100.0}
    }"#;
    let path = dir.join("ar.json");
    fs::write(&path, config).unwrap();
    path
}
