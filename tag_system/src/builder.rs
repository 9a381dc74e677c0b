// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Program builder ("assembler") for `tag_system`.
//!
//! Programs are written with named symbols. The builder interns each name in first-use order,
//! picks the smallest symbol size that can number all of them, and emits a [`TagProgram`] whose
//! symbols are the little-endian symbol numbers truncated to that size.

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

use crate::binary::TagProgram;
use crate::rule::{Production, TagRule};

/// A [`ProgramBuilder`] error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildError {
    /// Two rules share a key symbol.
    DuplicateRule {
        /// The repeated symbol name.
        symbol: String,
    },
    /// The deletion number is below `2`.
    BadDeletionNumber {
        /// The rejected deletion number.
        deletion_number: u32,
    },
    /// The program has no rules.
    NoRules,
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateRule { symbol } => write!(f, "duplicate rule for symbol {symbol:?}"),
            Self::BadDeletionNumber { deletion_number } => {
                write!(f, "invalid deletion number: {deletion_number}")
            }
            Self::NoRules => write!(f, "program has no rules"),
        }
    }
}

impl core::error::Error for BuildError {}

#[derive(Clone, Debug)]
enum RuleDef {
    Pure(Vec<u64>),
    Input(Vec<u64>, Vec<u64>),
    Output(Vec<u64>, bool),
}

/// Maps symbol names to their encoded bytes and back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolMap {
    symbol_size: u32,
    names: Vec<String>,
}

impl SymbolMap {
    /// Returns the encoded symbol width in bytes.
    #[must_use]
    pub fn symbol_size(&self) -> u32 {
        self.symbol_size
    }

    /// Returns the number of distinct symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no symbols were interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the encoding of `name`, if it was used by the program.
    #[must_use]
    pub fn encode(&self, name: &str) -> Option<Box<[u8]>> {
        let id = self.names.iter().position(|n| n == name)?;
        Some(encode_id(id as u64, self.symbol_size).into_boxed_slice())
    }

    /// Returns the name of an encoded symbol.
    ///
    /// Only the first `symbol_size` bytes of `symbol` are considered.
    #[must_use]
    pub fn name_of(&self, symbol: &[u8]) -> Option<&str> {
        let width = usize::try_from(self.symbol_size).ok()?;
        let bytes = symbol.get(..width)?;
        let mut raw = [0_u8; 8];
        raw.get_mut(..width)?.copy_from_slice(bytes);
        let id = usize::try_from(u64::from_le_bytes(raw)).ok()?;
        self.names.get(id).map(String::as_str)
    }

    /// Renders an encoded symbol sequence as space-separated names.
    ///
    /// Unknown symbols are shown as `?`.
    #[must_use]
    pub fn names_of(&self, symbols: &[u8]) -> String {
        let mut out = String::new();
        let width = usize::try_from(self.symbol_size).unwrap_or(usize::MAX).max(1);
        for (i, symbol) in symbols.chunks(width).enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(self.name_of(symbol).unwrap_or("?"));
        }
        out
    }
}

fn encode_id(id: u64, symbol_size: u32) -> Vec<u8> {
    let width = usize::try_from(symbol_size).unwrap_or(8).min(8);
    id.to_le_bytes()[..width].to_vec()
}

/// Smallest byte width that can hold every id below `count`.
fn symbol_width(count: usize) -> u32 {
    let max_id = (count as u64).saturating_sub(1);
    (u64::BITS - max_id.leading_zeros()).div_ceil(8).max(1)
}

/// Builds a [`TagProgram`] from named symbols.
#[derive(Clone, Debug)]
pub struct ProgramBuilder {
    deletion_number: u32,
    names: Vec<String>,
    ids: HashMap<String, u64>,
    rules: Vec<(u64, RuleDef)>,
    tape: Vec<u64>,
    duplicate: Option<String>,
}

impl ProgramBuilder {
    /// Creates an empty builder for a system deleting `deletion_number` symbols per step.
    #[must_use]
    pub fn new(deletion_number: u32) -> Self {
        Self {
            deletion_number,
            names: Vec::new(),
            ids: HashMap::new(),
            rules: Vec::new(),
            tape: Vec::new(),
            duplicate: None,
        }
    }

    /// Interns `name` and returns its symbol number.
    pub fn symbol(&mut self, name: &str) -> u64 {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len() as u64;
        self.names.push(name.to_owned());
        self.ids.insert(name.to_owned(), id);
        id
    }

    fn symbols(&mut self, names: &[&str]) -> Vec<u64> {
        names.iter().map(|n| self.symbol(n)).collect()
    }

    fn rule(&mut self, name: &str, def: RuleDef) -> &mut Self {
        let key = self.symbol(name);
        if self.duplicate.is_none() && self.rules.iter().any(|(k, _)| *k == key) {
            self.duplicate = Some(name.to_owned());
        }
        self.rules.push((key, def));
        self
    }

    /// Adds `name -> appendant`.
    pub fn pure(&mut self, name: &str, appendant: &[&str]) -> &mut Self {
        self.symbol(name);
        let appendant = self.symbols(appendant);
        self.rule(name, RuleDef::Pure(appendant))
    }

    /// Adds an input rule: `appendant0` on a `0` bit, `appendant1` on a `1` bit.
    pub fn input(&mut self, name: &str, appendant0: &[&str], appendant1: &[&str]) -> &mut Self {
        self.symbol(name);
        let appendant0 = self.symbols(appendant0);
        let appendant1 = self.symbols(appendant1);
        self.rule(name, RuleDef::Input(appendant0, appendant1))
    }

    /// Adds an output rule writing `bit`, then appending `appendant`.
    pub fn output(&mut self, name: &str, appendant: &[&str], bit: bool) -> &mut Self {
        self.symbol(name);
        let appendant = self.symbols(appendant);
        self.rule(name, RuleDef::Output(appendant, bit))
    }

    /// Appends `names` to the initial tape.
    pub fn tape(&mut self, names: &[&str]) -> &mut Self {
        let ids = self.symbols(names);
        self.tape.extend(ids);
        self
    }

    /// Encodes the program and returns it with its symbol map.
    pub fn build(&self) -> Result<(TagProgram, SymbolMap), BuildError> {
        if self.deletion_number < 2 {
            return Err(BuildError::BadDeletionNumber {
                deletion_number: self.deletion_number,
            });
        }
        if let Some(symbol) = &self.duplicate {
            return Err(BuildError::DuplicateRule {
                symbol: symbol.clone(),
            });
        }
        if self.rules.is_empty() {
            return Err(BuildError::NoRules);
        }

        let symbol_size = symbol_width(self.names.len());
        let encode = |ids: &[u64]| -> Box<[u8]> {
            ids.iter()
                .flat_map(|&id| encode_id(id, symbol_size))
                .collect()
        };

        let rules = self
            .rules
            .iter()
            .map(|(key, def)| {
                let production = match def {
                    RuleDef::Pure(appendant) => Production::Pure {
                        appendant: encode(appendant),
                    },
                    RuleDef::Input(appendant0, appendant1) => Production::Input {
                        appendant0: encode(appendant0),
                        appendant1: encode(appendant1),
                    },
                    RuleDef::Output(appendant, bit) => Production::Output {
                        appendant: encode(appendant),
                        bit: *bit,
                    },
                };
                TagRule::new(encode_id(*key, symbol_size), production)
            })
            .collect();

        let program = TagProgram {
            symbol_size,
            deletion_number: self.deletion_number,
            rules,
            tape: encode(&self.tape).into_vec(),
        };
        let symbols = SymbolMap {
            symbol_size,
            names: self.names.clone(),
        };
        Ok((program, symbols))
    }
}
