// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Production rules and the production table.

use alloc::boxed::Box;
use core::fmt;

use hashbrown::HashMap;

use crate::blob::try_alloc_zeroed;
use crate::status::Status;

/// Rule style tag, as stored in the binary format.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RuleStyle {
    /// Emits one bit, then appends.
    Output = 0,
    /// Reads one bit and appends the matching appendant.
    Input = 1,
    /// Appends unconditionally.
    Pure = 2,
}

impl RuleStyle {
    /// Decodes a style tag.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Output),
            1 => Some(Self::Input),
            2 => Some(Self::Pure),
            _ => None,
        }
    }

    /// Returns the tag byte.
    #[must_use]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Returns a stable human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Output => "Output",
            Self::Input => "Input",
            Self::Pure => "Pure",
        }
    }
}

impl fmt::Display for RuleStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a rule does when its symbol heads the popped run.
///
/// An empty selected appendant halts the system.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Production {
    /// Append `appendant`.
    Pure {
        /// Symbols to append.
        appendant: Box<[u8]>,
    },
    /// Read a bit; append `appendant1` if it is set, `appendant0` otherwise.
    Input {
        /// Appended on a `0` bit.
        appendant0: Box<[u8]>,
        /// Appended on a `1` bit.
        appendant1: Box<[u8]>,
    },
    /// Write `bit`, then append `appendant`.
    Output {
        /// Symbols to append.
        appendant: Box<[u8]>,
        /// Bit to emit.
        bit: bool,
    },
}

impl Production {
    /// Returns the style tag of this production.
    #[must_use]
    pub fn style(&self) -> RuleStyle {
        match self {
            Self::Pure { .. } => RuleStyle::Pure,
            Self::Input { .. } => RuleStyle::Input,
            Self::Output { .. } => RuleStyle::Output,
        }
    }

    fn appendants(&self) -> impl Iterator<Item = &[u8]> {
        let (first, second) = match self {
            Self::Pure { appendant } | Self::Output { appendant, .. } => (&**appendant, None),
            Self::Input {
                appendant0,
                appendant1,
            } => (&**appendant0, Some(&**appendant1)),
        };
        core::iter::once(first).chain(second)
    }
}

/// A [`TagRule`] or [`ProductionTable`] operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleError {
    /// An appendant length is not a multiple of the symbol size.
    BadLength {
        /// Style of the offending rule.
        style: RuleStyle,
        /// Appendant length in bytes.
        len: usize,
        /// Symbol size in bytes.
        symbol_size: u32,
    },
    /// The key symbol does not have the table's symbol size.
    SymbolSizeMismatch {
        /// The table's symbol size.
        expected: u32,
        /// The key length.
        actual: usize,
    },
    /// Another rule already uses this key symbol.
    DuplicateRule,
    /// An allocation failed.
    OutOfMemory,
}

impl RuleError {
    /// Returns the flat status code for this error.
    #[must_use]
    pub fn status(self) -> Status {
        match self {
            Self::BadLength { .. } | Self::SymbolSizeMismatch { .. } => Status::BadLength,
            Self::DuplicateRule => Status::DuplicateRule,
            Self::OutOfMemory => Status::OutOfMemory,
        }
    }
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadLength {
                style,
                len,
                symbol_size,
            } => write!(
                f,
                "{style} rule appendant of {len} bytes is not a multiple of symbol size {symbol_size}"
            ),
            Self::SymbolSizeMismatch { expected, actual } => {
                write!(f, "rule key is {actual} bytes, expected {expected}")
            }
            Self::DuplicateRule => write!(f, "duplicate rule"),
            Self::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

impl core::error::Error for RuleError {}

fn try_boxed(bytes: &[u8]) -> Result<Box<[u8]>, RuleError> {
    let mut out = try_alloc_zeroed(bytes.len()).map_err(|_| RuleError::OutOfMemory)?;
    out.copy_from_slice(bytes);
    Ok(out.into_boxed_slice())
}

/// A key symbol and its production.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagRule {
    symbol: Box<[u8]>,
    production: Production,
}

impl TagRule {
    /// Creates a rule from a key symbol and a production.
    pub fn new(symbol: impl Into<Box<[u8]>>, production: Production) -> Self {
        Self {
            symbol: symbol.into(),
            production,
        }
    }

    /// Creates a [`Production::Pure`] rule.
    pub fn pure(symbol: impl Into<Box<[u8]>>, appendant: impl Into<Box<[u8]>>) -> Self {
        Self::new(
            symbol,
            Production::Pure {
                appendant: appendant.into(),
            },
        )
    }

    /// Creates a [`Production::Input`] rule.
    pub fn input(
        symbol: impl Into<Box<[u8]>>,
        appendant0: impl Into<Box<[u8]>>,
        appendant1: impl Into<Box<[u8]>>,
    ) -> Self {
        Self::new(
            symbol,
            Production::Input {
                appendant0: appendant0.into(),
                appendant1: appendant1.into(),
            },
        )
    }

    /// Creates a [`Production::Output`] rule.
    pub fn output(
        symbol: impl Into<Box<[u8]>>,
        appendant: impl Into<Box<[u8]>>,
        bit: bool,
    ) -> Self {
        Self::new(
            symbol,
            Production::Output {
                appendant: appendant.into(),
                bit,
            },
        )
    }

    /// Returns the key symbol.
    #[must_use]
    pub fn symbol(&self) -> &[u8] {
        &self.symbol
    }

    /// Returns the production.
    #[must_use]
    pub fn production(&self) -> &Production {
        &self.production
    }

    /// Returns the style tag.
    #[must_use]
    pub fn style(&self) -> RuleStyle {
        self.production.style()
    }

    /// Checks the key and every appendant against `symbol_size`.
    pub fn validate(&self, symbol_size: u32) -> Result<(), RuleError> {
        let width = usize::try_from(symbol_size).ok();
        let Some(ss) = width.filter(|&ss| ss != 0 && self.symbol.len() == ss) else {
            return Err(RuleError::SymbolSizeMismatch {
                expected: symbol_size,
                actual: self.symbol.len(),
            });
        };
        for appendant in self.production.appendants() {
            if appendant.len() % ss != 0 {
                return Err(RuleError::BadLength {
                    style: self.style(),
                    len: appendant.len(),
                    symbol_size,
                });
            }
        }
        Ok(())
    }

    /// Returns a deep copy, reporting allocation failure instead of aborting.
    pub fn try_clone(&self) -> Result<Self, RuleError> {
        let production = match &self.production {
            Production::Pure { appendant } => Production::Pure {
                appendant: try_boxed(appendant)?,
            },
            Production::Input {
                appendant0,
                appendant1,
            } => Production::Input {
                appendant0: try_boxed(appendant0)?,
                appendant1: try_boxed(appendant1)?,
            },
            Production::Output { appendant, bit } => Production::Output {
                appendant: try_boxed(appendant)?,
                bit: *bit,
            },
        };
        Ok(Self {
            symbol: try_boxed(&self.symbol)?,
            production,
        })
    }
}

/// Symbol-keyed rule lookup for one symbol size.
#[derive(Clone, Debug)]
pub struct ProductionTable {
    symbol_size: u32,
    rules: HashMap<Box<[u8]>, TagRule>,
}

impl ProductionTable {
    /// Creates an empty table for `symbol_size`-byte symbols.
    #[must_use]
    pub fn new(symbol_size: u32) -> Self {
        Self {
            symbol_size,
            rules: HashMap::new(),
        }
    }

    /// Validates `rule` and takes ownership of it.
    ///
    /// On error the table is unchanged.
    pub fn insert(&mut self, rule: TagRule) -> Result<(), RuleError> {
        rule.validate(self.symbol_size)?;
        if self.rules.contains_key(rule.symbol()) {
            return Err(RuleError::DuplicateRule);
        }
        self.rules
            .try_reserve(1)
            .map_err(|_| RuleError::OutOfMemory)?;
        let key = try_boxed(rule.symbol())?;
        self.rules.insert(key, rule);
        Ok(())
    }

    /// Looks up the rule for the symbol at the start of `key`.
    ///
    /// Only the first `symbol_size` bytes of `key` are compared.
    #[must_use]
    pub fn lookup(&self, key: &[u8]) -> Option<&TagRule> {
        let ss = usize::try_from(self.symbol_size).ok()?;
        self.rules.get(key.get(..ss)?)
    }

    /// Returns the number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns `true` if the table holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the symbol size the table was created for.
    #[must_use]
    pub fn symbol_size(&self) -> u32 {
        self.symbol_size
    }

    /// Iterates the rules in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &TagRule> {
        self.rules.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_tags_round_trip() {
        for style in [RuleStyle::Output, RuleStyle::Input, RuleStyle::Pure] {
            assert_eq!(RuleStyle::from_byte(style.as_byte()), Some(style));
        }
        assert_eq!(RuleStyle::from_byte(3), None);
        assert_eq!(RuleStyle::Pure.as_byte(), 2);
    }

    #[test]
    fn lookup_compares_only_the_symbol_prefix() {
        let mut t = ProductionTable::new(2);
        t.insert(TagRule::pure(*b"ab", *b"cd")).unwrap();
        assert_eq!(t.lookup(b"abzz").unwrap().symbol(), b"ab");
        assert!(t.lookup(b"ba").is_none());
        assert!(t.lookup(b"a").is_none());
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let mut t = ProductionTable::new(1);
        t.insert(TagRule::pure(*b"a", *b"b")).unwrap();
        assert_eq!(
            t.insert(TagRule::output(*b"a", *b"c", true)),
            Err(RuleError::DuplicateRule)
        );
        assert_eq!(t.len(), 1);
        assert_eq!(t.lookup(b"a").unwrap().style(), RuleStyle::Pure);
    }

    #[test]
    fn appendants_must_be_symbol_multiples() {
        let mut t = ProductionTable::new(2);
        let err = t
            .insert(TagRule::input(*b"ab", *b"cd", *b"efg"))
            .unwrap_err();
        assert_eq!(
            err,
            RuleError::BadLength {
                style: RuleStyle::Input,
                len: 3,
                symbol_size: 2
            }
        );
        assert_eq!(err.status(), Status::BadLength);
        assert!(t.is_empty());
    }

    #[test]
    fn key_width_must_match() {
        let mut t = ProductionTable::new(2);
        assert_eq!(
            t.insert(TagRule::pure(*b"abc", *b"")),
            Err(RuleError::SymbolSizeMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn empty_appendant_is_valid() {
        let mut t = ProductionTable::new(1);
        t.insert(TagRule::pure(*b"H", *b"")).unwrap();
        assert!(matches!(
            t.lookup(b"H").unwrap().production(),
            Production::Pure { appendant } if appendant.is_empty()
        ));
    }

    #[test]
    fn try_clone_is_deep() {
        let rule = TagRule::input(*b"x", *b"yy", *b"z");
        let copy = rule.try_clone().unwrap();
        assert_eq!(rule, copy);
        assert_ne!(rule.symbol().as_ptr(), copy.symbol().as_ptr());
    }
}
