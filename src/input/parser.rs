/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Readers for the plain-text data files of an analysis
//!
//! * intensity files: two whitespace-separated columns Q (nm⁻¹) and I(Q)
//! * xyz files: atom count, comment line, then `Element x y z` in Å
//! * form-factor tables: `Element a1 b1 a2 b2 a3 b3 a4 b4 c`
//! * incoherent tables: `Element Z M K L`
//!
//! Blank lines and lines starting with `#` are skipped. A non-numeric line
//! before the first data row is treated as a column header.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::errors::{InputError, Result};
use crate::atoms::{ElementParameters, ElementTable, Molecule, MoleculeAtom};
use crate::grid::IntensityCurve;
use crate::utils::angstrom_to_nm;

/// Non-comment lines of a reader with their 1-based line numbers
fn data_lines<R: BufRead>(reader: R) -> Result<Vec<(usize, String)>> {
    let mut lines = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push((i + 1, trimmed.to_string()));
    }
    Ok(lines)
}

fn parse_float(field: &str, line: usize) -> Result<f64> {
    field.parse::<f64>().map_err(|_| InputError::ParseError {
        line,
        message: format!("'{}' is not a number", field),
    })
}

fn open<P: AsRef<Path>>(path: P) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// Parse a two-column intensity file
pub fn parse_intensity<R: BufRead>(reader: R) -> Result<IntensityCurve> {
    let mut q = Vec::new();
    let mut intensity = Vec::new();

    for (line, text) in data_lines(reader)? {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(InputError::ParseError {
                line,
                message: "expected two columns".to_string(),
            });
        }
        match (fields[0].parse::<f64>(), fields[1].parse::<f64>()) {
            (Ok(qv), Ok(iv)) => {
                q.push(qv);
                intensity.push(iv);
            }
            _ if q.is_empty() => continue,
            _ => {
                return Err(InputError::ParseError {
                    line,
                    message: format!("invalid data row '{}'", text),
                })
            }
        }
    }

    Ok(IntensityCurve::new(q, intensity)?)
}

/// Read a two-column intensity file
pub fn read_intensity_file<P: AsRef<Path>>(path: P) -> Result<IntensityCurve> {
    parse_intensity(open(path)?)
}

/// Parse an xyz geometry, converting positions from Å to nm
pub fn parse_xyz<R: BufRead>(reader: R) -> Result<Molecule> {
    let mut lines = reader.lines().enumerate();

    let count = match lines.next() {
        Some((_, line)) => line?.trim().parse::<usize>().map_err(|_| InputError::ParseError {
            line: 1,
            message: "first line must hold the atom count".to_string(),
        })?,
        None => return Err(InputError::InvalidFormat("empty xyz file".to_string())),
    };
    // comment line
    if let Some((_, line)) = lines.next() {
        line?;
    }

    let mut atoms = Vec::with_capacity(count);
    for (i, line) in lines {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 4 {
            return Err(InputError::ParseError {
                line: i + 1,
                message: "expected 'Element x y z'".to_string(),
            });
        }
        let mut position = [0.0; 3];
        for (slot, field) in position.iter_mut().zip(&fields[1..4]) {
            *slot = angstrom_to_nm(parse_float(field, i + 1)?);
        }
        atoms.push(MoleculeAtom {
            symbol: fields[0].to_string(),
            position,
        });
    }

    if atoms.len() != count {
        return Err(InputError::InvalidFormat(format!(
            "xyz header announces {} atoms, found {}",
            count,
            atoms.len()
        )));
    }
    Ok(Molecule::new(atoms)?)
}

/// Read an xyz geometry file
pub fn read_xyz_file<P: AsRef<Path>>(path: P) -> Result<Molecule> {
    parse_xyz(open(path)?)
}

/// Rows of a table whose first column is an element symbol
fn parse_symbol_table<R: BufRead>(reader: R, columns: usize) -> Result<BTreeMap<String, Vec<f64>>> {
    let mut rows = BTreeMap::new();
    for (line, text) in data_lines(reader)? {
        let fields: Vec<&str> = text.split_whitespace().collect();
        let numbers: std::result::Result<Vec<f64>, _> =
            fields.iter().skip(1).map(|f| f.parse::<f64>()).collect();
        match numbers {
            Ok(values) if values.len() == columns => {
                rows.insert(fields[0].to_string(), values);
            }
            _ if rows.is_empty() => continue,
            _ => {
                return Err(InputError::ParseError {
                    line,
                    message: format!("expected an element symbol and {} numbers", columns),
                })
            }
        }
    }
    Ok(rows)
}

/// Merge a form-factor table and an incoherent-scattering table
///
/// Elements present in only one of the tables are rejected.
pub fn parse_element_tables<R1: BufRead, R2: BufRead>(
    form_factors: R1,
    incoherent: R2,
) -> Result<ElementTable> {
    let form_factors = parse_symbol_table(form_factors, 9)?;
    let incoherent = parse_symbol_table(incoherent, 4)?;

    let mut table = ElementTable::new();
    for (symbol, ff) in &form_factors {
        let inc = incoherent.get(symbol).ok_or_else(|| {
            InputError::InvalidFormat(format!("{} has no incoherent-scattering entry", symbol))
        })?;
        let parameters = ElementParameters {
            a: [ff[0], ff[2], ff[4], ff[6]],
            b: [ff[1], ff[3], ff[5], ff[7]],
            c: ff[8],
            z: inc[0],
            m: inc[1],
            k: inc[2],
            l: inc[3],
        };
        table.insert(symbol, parameters)?;
    }
    if let Some(symbol) = incoherent.keys().find(|s| !form_factors.contains_key(*s)) {
        return Err(InputError::InvalidFormat(format!(
            "{} has no form-factor entry",
            symbol
        )));
    }

    log::debug!("Loaded coefficients for {} elements", table.len());
    Ok(table)
}

/// Read the two text coefficient tables
pub fn read_element_tables<P: AsRef<Path>, Q: AsRef<Path>>(
    form_factors: P,
    incoherent: Q,
) -> Result<ElementTable> {
    parse_element_tables(open(form_factors)?, open(incoherent)?)
}

/// Read a JSON coefficient table
pub fn read_element_table_json<P: AsRef<Path>>(path: P) -> Result<ElementTable> {
    let table: ElementTable = serde_json::from_reader(open(path)?)?;
    table.validate()?;
    Ok(table)
}
