// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable dumps of programs and tapes.
//!
//! Both dumps render through [`core::fmt::Display`], one item per line. Symbols are printed as
//! hex (one group of `symbol_size` bytes per symbol) unless a [`SymbolMap`] is attached, in
//! which case their names are used.
//!
//! ```text
//! ; RuleCount=2 SymbolSize=1 QueueSize=3 DeletionNumber=2
//! rule #0 Pure 00 -> 01 00
//! rule #1 Output 01 -> <empty> ; bit=1
//! tape: 00 00 00
//! ```

#![allow(clippy::module_name_repetitions, reason = "public API module")]

use core::fmt;

use crate::binary::TagProgram;
use crate::builder::SymbolMap;
use crate::queue::TagQueue;
use crate::rule::Production;

/// Renders a [`TagProgram`]: header fields, rules in file order, then the initial tape.
#[derive(Clone, Copy, Debug)]
pub struct ProgramDump<'a> {
    program: &'a TagProgram,
    symbols: Option<&'a SymbolMap>,
}

impl<'a> ProgramDump<'a> {
    /// Dumps `program` with hex symbols.
    #[must_use]
    pub fn new(program: &'a TagProgram) -> Self {
        Self {
            program,
            symbols: None,
        }
    }

    /// Prints symbols by name.
    #[must_use]
    pub fn with_symbols(mut self, symbols: &'a SymbolMap) -> Self {
        self.symbols = Some(symbols);
        self
    }
}

impl fmt::Display for ProgramDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.program;
        let ss = p.symbol_size;
        writeln!(
            f,
            "; RuleCount={} SymbolSize={ss} QueueSize={} DeletionNumber={}",
            p.rules.len(),
            p.tape.len(),
            p.deletion_number,
        )?;
        for (ix, rule) in p.rules.iter().enumerate() {
            write!(f, "rule #{ix} {} ", rule.style())?;
            fmt_symbols(f, rule.symbol(), ss, self.symbols)?;
            write!(f, " -> ")?;
            match rule.production() {
                Production::Pure { appendant } => fmt_symbols(f, appendant, ss, self.symbols)?,
                Production::Input {
                    appendant0,
                    appendant1,
                } => {
                    write!(f, "0: ")?;
                    fmt_symbols(f, appendant0, ss, self.symbols)?;
                    write!(f, " | 1: ")?;
                    fmt_symbols(f, appendant1, ss, self.symbols)?;
                }
                Production::Output { appendant, bit } => {
                    fmt_symbols(f, appendant, ss, self.symbols)?;
                    write!(f, " ; bit={}", u8::from(*bit))?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "tape: ")?;
        fmt_symbols(f, &p.tape, ss, self.symbols)?;
        writeln!(f)
    }
}

/// Renders a [`TagQueue`]: FIFO runs oldest first, then the cache entry.
///
/// Each FIFO run is printed as its group-head symbol and group count; the cache shows its raw
/// symbol count.
#[derive(Clone, Copy, Debug)]
pub struct TapeDump<'a> {
    tape: &'a TagQueue,
    symbols: Option<&'a SymbolMap>,
}

impl<'a> TapeDump<'a> {
    /// Dumps `tape` with hex symbols.
    #[must_use]
    pub fn new(tape: &'a TagQueue) -> Self {
        Self { tape, symbols: None }
    }

    /// Prints symbols by name.
    #[must_use]
    pub fn with_symbols(mut self, symbols: &'a SymbolMap) -> Self {
        self.symbols = Some(symbols);
        self
    }
}

impl fmt::Display for TapeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ss = self.tape.symbol_size();
        // A snapshot can only fail on allocation.
        let runs = self.tape.runs().map_err(|_| fmt::Error)?;
        writeln!(
            f,
            "; runs={} logical_len={}",
            runs.len(),
            self.tape.logical_len()
        )?;
        for run in &runs {
            write!(f, "  ")?;
            fmt_symbols(f, &run.symbol, ss, self.symbols)?;
            writeln!(f, " x{}", run.count)?;
        }
        if let Some((symbol, raw_count)) = self.tape.cached() {
            write!(f, "  cache ")?;
            fmt_symbols(f, symbol, ss, self.symbols)?;
            writeln!(f, " raw={raw_count}")?;
        }
        Ok(())
    }
}

fn fmt_symbols(
    f: &mut fmt::Formatter<'_>,
    bytes: &[u8],
    symbol_size: u32,
    symbols: Option<&SymbolMap>,
) -> fmt::Result {
    if bytes.is_empty() {
        return write!(f, "<empty>");
    }
    let width = usize::try_from(symbol_size).unwrap_or(usize::MAX).max(1);
    for (i, symbol) in bytes.chunks(width).enumerate() {
        if i != 0 {
            write!(f, " ")?;
        }
        match symbols.and_then(|m| m.name_of(symbol)) {
            Some(name) => write!(f, "{name}")?,
            None => {
                for b in symbol {
                    write!(f, "{b:02x}")?;
                }
            }
        }
    }
    Ok(())
}
