// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The binary program container.
//!
//! Layout, all integers in host byte order:
//!
//! ```text
//! header:  rule_count u64 | symbol_size u32 | tape_len u32 | deletion_number u32
//! rule*:   style u8 | lengths | key symbol | payload
//!            Output (0): len u16              | key | appendant | bit u8
//!            Input  (1): len0 u16 | len1 u16  | key | appendant0 | appendant1
//!            Pure   (2): len u16              | key | appendant
//! tape:    tape_len bytes
//! ```
//!
//! Bytes after the tape are ignored.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::format::{DecodeError, Reader, Writer};
use crate::rule::{Production, RuleStyle, TagRule};
use crate::status::Status;

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 8 + 4 + 4 + 4;

/// A decoded program: rules, initial tape, and the parameters they are interpreted with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagProgram {
    /// Bytes per symbol.
    pub symbol_size: u32,
    /// Symbols deleted per step.
    pub deletion_number: u32,
    /// Rules in file order.
    pub rules: Vec<TagRule>,
    /// Initial tape contents.
    pub tape: Vec<u8>,
}

/// Loading a binary program failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadError {
    /// The input was truncated.
    Decode(DecodeError),
    /// The header declares a symbol size of `0`.
    BadSymbolSize,
    /// A length is not a multiple of the symbol size.
    BadLength {
        /// Index of the offending rule, or `None` for the initial tape.
        rule: Option<u64>,
        /// The offending length in bytes.
        len: usize,
    },
    /// A rule has an unknown style tag.
    BadEnum {
        /// Index of the offending rule.
        rule: u64,
        /// The raw tag byte.
        tag: u8,
    },
    /// The header declares a deletion number below `2`.
    BadDeletionNumber {
        /// The declared deletion number.
        deletion_number: u32,
    },
    /// An allocation failed.
    OutOfMemory,
    /// Reading the input stream failed.
    #[cfg(feature = "std")]
    Io(std::io::ErrorKind),
}

impl LoadError {
    /// Returns the flat status code for this error.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::Decode(_) | Self::BadLength { .. } => Status::BadLength,
            Self::BadSymbolSize => Status::BadArgument,
            Self::BadEnum { .. } => Status::BadEnum,
            Self::BadDeletionNumber { .. } => Status::BadDeletionNumber,
            Self::OutOfMemory => Status::OutOfMemory,
            #[cfg(feature = "std")]
            Self::Io(_) => Status::Eof,
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::BadSymbolSize => write!(f, "symbol size must be nonzero"),
            Self::BadLength {
                rule: Some(rule),
                len,
            } => write!(f, "rule #{rule}: appendant length {len} is not a symbol multiple"),
            Self::BadLength { rule: None, len } => {
                write!(f, "tape length {len} is not a symbol multiple")
            }
            Self::BadEnum { rule, tag } => write!(f, "rule #{rule}: invalid style {tag:#x}"),
            Self::BadDeletionNumber { deletion_number } => {
                write!(f, "invalid deletion number: {deletion_number}")
            }
            Self::OutOfMemory => write!(f, "out of memory"),
            #[cfg(feature = "std")]
            Self::Io(kind) => write!(f, "read failed: {kind}"),
        }
    }
}

impl core::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for LoadError {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}

/// Encoding a program failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// An appendant is longer than `u16::MAX` bytes.
    AppendantTooLong {
        /// Index of the offending rule.
        rule: usize,
        /// Appendant length in bytes.
        len: usize,
    },
    /// The tape is longer than `u32::MAX` bytes.
    TapeTooLong,
    /// The symbol size is `0` or a rule key does not match it.
    SymbolSizeMismatch {
        /// Index of the offending rule.
        rule: usize,
    },
    /// A length is not a multiple of the symbol size.
    BadLength,
}

impl EncodeError {
    /// Returns the flat status code for this error.
    #[must_use]
    pub fn status(&self) -> Status {
        match self {
            Self::AppendantTooLong { .. } | Self::TapeTooLong => Status::IntegerOverflow,
            Self::SymbolSizeMismatch { .. } | Self::BadLength => Status::BadLength,
        }
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppendantTooLong { rule, len } => {
                write!(f, "rule #{rule}: appendant of {len} bytes exceeds u16::MAX")
            }
            Self::TapeTooLong => write!(f, "tape exceeds u32::MAX bytes"),
            Self::SymbolSizeMismatch { rule } => {
                write!(f, "rule #{rule}: key does not match the symbol size")
            }
            Self::BadLength => write!(f, "length is not a multiple of the symbol size"),
        }
    }
}

impl core::error::Error for EncodeError {}

impl TagProgram {
    /// Decodes a program from `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, LoadError> {
        let mut r = Reader::new(bytes);
        let rule_count = r.read_u64_ne()?;
        let symbol_size = r.read_u32_ne()?;
        let tape_len = r.read_u32_ne()?;
        let deletion_number = r.read_u32_ne()?;

        let ss = usize::try_from(symbol_size)
            .ok()
            .filter(|&ss| ss != 0)
            .ok_or(LoadError::BadSymbolSize)?;
        let tape_len = usize::try_from(tape_len).map_err(|_| DecodeError::OutOfBounds)?;
        if tape_len % ss != 0 {
            return Err(LoadError::BadLength {
                rule: None,
                len: tape_len,
            });
        }
        if deletion_number < 2 {
            return Err(LoadError::BadDeletionNumber { deletion_number });
        }

        // A rule record is at least a style byte, a u16 length and the key, so a bogus count
        // cannot force a huge allocation.
        let min_record = ss.saturating_add(3);
        let plausible = u64::try_from(r.remaining() / min_record).unwrap_or(u64::MAX);
        let reserve = usize::try_from(rule_count.min(plausible)).unwrap_or(usize::MAX);
        let mut rules = Vec::new();
        rules
            .try_reserve_exact(reserve)
            .map_err(|_| LoadError::OutOfMemory)?;

        for index in 0..rule_count {
            rules.push(decode_rule(&mut r, index, ss)?);
        }

        let tape = r.read_bytes(tape_len)?.to_vec();
        Ok(Self {
            symbol_size,
            deletion_number,
            rules,
            tape,
        })
    }

    /// Reads the whole of `reader` and decodes it.
    #[cfg(feature = "std")]
    pub fn read_from(mut reader: impl std::io::Read) -> Result<Self, LoadError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| LoadError::Io(e.kind()))?;
        Self::decode(&bytes)
    }

    /// Encodes the program in the layout [`TagProgram::decode`] reads.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let ss = usize::try_from(self.symbol_size)
            .ok()
            .filter(|&ss| ss != 0)
            .ok_or(EncodeError::SymbolSizeMismatch { rule: 0 })?;
        let tape_len = u32::try_from(self.tape.len()).map_err(|_| EncodeError::TapeTooLong)?;
        if self.tape.len() % ss != 0 {
            return Err(EncodeError::BadLength);
        }

        let mut w = Writer::new();
        w.write_u64_ne(self.rules.len() as u64);
        w.write_u32_ne(self.symbol_size);
        w.write_u32_ne(tape_len);
        w.write_u32_ne(self.deletion_number);

        for (index, rule) in self.rules.iter().enumerate() {
            if rule.symbol().len() != ss {
                return Err(EncodeError::SymbolSizeMismatch { rule: index });
            }
            let len16 = |appendant: &[u8]| {
                if appendant.len() % ss != 0 {
                    return Err(EncodeError::BadLength);
                }
                u16::try_from(appendant.len()).map_err(|_| EncodeError::AppendantTooLong {
                    rule: index,
                    len: appendant.len(),
                })
            };

            w.write_u8(rule.style().as_byte());
            match rule.production() {
                Production::Output { appendant, bit } => {
                    w.write_u16_ne(len16(appendant)?);
                    w.write_bytes(rule.symbol());
                    w.write_bytes(appendant);
                    w.write_u8(u8::from(*bit));
                }
                Production::Input {
                    appendant0,
                    appendant1,
                } => {
                    w.write_u16_ne(len16(appendant0)?);
                    w.write_u16_ne(len16(appendant1)?);
                    w.write_bytes(rule.symbol());
                    w.write_bytes(appendant0);
                    w.write_bytes(appendant1);
                }
                Production::Pure { appendant } => {
                    w.write_u16_ne(len16(appendant)?);
                    w.write_bytes(rule.symbol());
                    w.write_bytes(appendant);
                }
            }
        }

        w.write_bytes(&self.tape);
        Ok(w.into_vec())
    }
}

fn decode_rule(r: &mut Reader<'_>, index: u64, ss: usize) -> Result<TagRule, LoadError> {
    let tag = r.read_u8()?;
    let style = RuleStyle::from_byte(tag).ok_or(LoadError::BadEnum { rule: index, tag })?;

    let check = |len: u16| {
        let len = usize::from(len);
        if len % ss == 0 {
            Ok(len)
        } else {
            Err(LoadError::BadLength {
                rule: Some(index),
                len,
            })
        }
    };
    let (len0, len1) = match style {
        RuleStyle::Input => (check(r.read_u16_ne()?)?, check(r.read_u16_ne()?)?),
        RuleStyle::Output | RuleStyle::Pure => (check(r.read_u16_ne()?)?, 0),
    };

    let symbol: Box<[u8]> = r.read_bytes(ss)?.into();
    let appendant: Box<[u8]> = r.read_bytes(len0)?.into();
    let production = match style {
        RuleStyle::Output => Production::Output {
            appendant,
            bit: r.read_u8()? != 0,
        },
        RuleStyle::Input => Production::Input {
            appendant0: appendant,
            appendant1: r.read_bytes(len1)?.into(),
        },
        RuleStyle::Pure => Production::Pure { appendant },
    };
    Ok(TagRule::new(symbol, production))
}


#[cfg(all(test, feature = "std"))]
mod std_tests {
    use super::*;
    use alloc::vec;
    use std::io;

    struct Unreadable;

    impl io::Read for Unreadable {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }
    }

    #[test]
    fn read_from_decodes_a_stream() {
        let program = TagProgram {
            symbol_size: 1,
            deletion_number: 2,
            rules: vec![TagRule::pure(*b"a", *b"b"), TagRule::pure(*b"b", *b"")],
            tape: b"aa".to_vec(),
        };
        let bytes = program.encode().unwrap();
        assert_eq!(TagProgram::read_from(io::Cursor::new(bytes)), Ok(program));
    }

    #[test]
    fn read_from_reports_truncation() {
        assert!(matches!(
            TagProgram::read_from(&b"\x01"[..]),
            Err(LoadError::Decode(DecodeError::UnexpectedEof { offset: 0, .. }))
        ));
    }

    #[test]
    fn read_from_reports_stream_errors() {
        let err = TagProgram::read_from(Unreadable).unwrap_err();
        assert_eq!(err, LoadError::Io(io::ErrorKind::PermissionDenied));
    }
}
