/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Sample composition: element symbols with integer multiplicities

use std::fmt;

use serde::{Deserialize, Serialize};

use super::database::atomic_number;
use super::errors::{AtomError, Result};

/// Immutable element → multiplicity mapping, kept in first-appearance order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<(String, u32)>", into = "Vec<(String, u32)>")]
pub struct Composition {
    elements: Vec<(String, u32)>,
}

impl Composition {
    /// Build a composition from `(symbol, multiplicity)` pairs
    ///
    /// Repeated symbols are merged. Symbols must be valid element symbols and
    /// multiplicities must be positive.
    pub fn new<S: AsRef<str>>(pairs: &[(S, u32)]) -> Result<Self> {
        let mut elements: Vec<(String, u32)> = Vec::with_capacity(pairs.len());
        for (symbol, count) in pairs {
            let symbol = symbol.as_ref();
            if atomic_number(symbol).is_none() {
                return Err(AtomError::UnknownElement(symbol.to_string()));
            }
            if *count == 0 {
                return Err(AtomError::InvalidFormula {
                    formula: symbol.to_string(),
                    reason: "multiplicity must be positive".to_string(),
                });
            }
            match elements.iter_mut().find(|(s, _)| s == symbol) {
                Some((_, existing)) => *existing += count,
                None => elements.push((symbol.to_string(), *count)),
            }
        }
        if elements.is_empty() {
            return Err(AtomError::EmptyComposition);
        }
        Ok(Self { elements })
    }

    /// Parse a molecular formula such as `CO2`, `H2O` or `Ca(OH)2`
    pub fn from_formula(formula: &str) -> Result<Self> {
        let pairs = FormulaParser::new(formula).parse()?;
        Self::new(&pairs)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.elements.iter().map(|(s, n)| (s.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Multiplicity of `symbol`, 0 when absent
    pub fn multiplicity(&self, symbol: &str) -> u32 {
        self.elements
            .iter()
            .find(|(s, _)| s == symbol)
            .map_or(0, |(_, n)| *n)
    }

    /// Total number of atoms per formula unit
    pub fn atom_count(&self) -> u32 {
        self.elements.iter().map(|(_, n)| n).sum()
    }
}

impl TryFrom<Vec<(String, u32)>> for Composition {
    type Error = AtomError;

    fn try_from(pairs: Vec<(String, u32)>) -> Result<Self> {
        Self::new(&pairs)
    }
}

impl From<Composition> for Vec<(String, u32)> {
    fn from(composition: Composition) -> Self {
        composition.elements
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, count) in &self.elements {
            if *count == 1 {
                write!(f, "{}", symbol)?;
            } else {
                write!(f, "{}{}", symbol, count)?;
            }
        }
        Ok(())
    }
}

/// Recursive-descent parser for formulas with nested parentheses
struct FormulaParser<'a> {
    formula: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> FormulaParser<'a> {
    fn new(formula: &'a str) -> Self {
        Self {
            formula,
            chars: formula.chars().filter(|c| !c.is_whitespace()).collect(),
            pos: 0,
        }
    }

    fn parse(mut self) -> Result<Vec<(String, u32)>> {
        let pairs = self.sequence()?;
        if self.pos < self.chars.len() {
            return Err(self.error(format!("unexpected '{}'", self.chars[self.pos])));
        }
        if pairs.is_empty() {
            return Err(self.error("no elements found".to_string()));
        }
        Ok(pairs)
    }

    fn sequence(&mut self) -> Result<Vec<(String, u32)>> {
        let mut pairs = Vec::new();
        while let Some(&ch) = self.chars.get(self.pos) {
            if ch == '(' {
                self.pos += 1;
                let inner = self.sequence()?;
                if self.chars.get(self.pos) != Some(&')') {
                    return Err(self.error("unbalanced parenthesis".to_string()));
                }
                self.pos += 1;
                let count = self.count()?;
                pairs.extend(inner.into_iter().map(|(s, n)| (s, n * count)));
            } else if ch.is_ascii_uppercase() {
                let start = self.pos;
                self.pos += 1;
                while self
                    .chars
                    .get(self.pos)
                    .is_some_and(|c| c.is_ascii_lowercase())
                {
                    self.pos += 1;
                }
                let symbol: String = self.chars[start..self.pos].iter().collect();
                if atomic_number(&symbol).is_none() {
                    return Err(AtomError::UnknownElement(symbol));
                }
                let count = self.count()?;
                pairs.push((symbol, count));
            } else if ch == ')' {
                break;
            } else {
                return Err(self.error(format!("unexpected '{}'", ch)));
            }
        }
        Ok(pairs)
    }

    fn count(&mut self) -> Result<u32> {
        let start = self.pos;
        while self.chars.get(self.pos).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return Ok(1);
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        match digits.parse::<u32>() {
            Ok(0) | Err(_) => Err(self.error(format!("invalid count '{}'", digits))),
            Ok(n) => Ok(n),
        }
    }

    fn error(&self, reason: String) -> AtomError {
        AtomError::InvalidFormula {
            formula: self.formula.to_string(),
            reason,
        }
    }
}
