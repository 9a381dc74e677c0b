// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flat status codes.
//!
//! Each module reports failures through its own error enum. Embedders that want a single
//! code to log, compare, or hand across an FFI boundary can collapse any of them with the
//! `status()` method every error type provides.

use core::fmt;

/// A flat status code covering every outcome the engine reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Success.
    Ok,
    /// An argument violated the operation's preconditions.
    BadArgument,
    /// An allocation failed.
    OutOfMemory,
    /// Size arithmetic overflowed; the operation did not mutate anything.
    IntegerOverflow,
    /// A length was not a multiple of the symbol size, or was otherwise invalid.
    BadLength,
    /// An enum discriminant (rule style tag) was unknown.
    BadEnum,
    /// A system was created with no rules.
    BadRuleCount,
    /// A deletion number below `2` was supplied.
    BadDeletionNumber,
    /// Two rules share a key symbol.
    DuplicateRule,
    /// A fixed ring had no room for a push.
    RingFull,
    /// The tape did not hold a complete deletable unit.
    QueueTooSmall,
    /// A step found no tape to pop.
    OutOfTape,
    /// A step popped a symbol with no matching rule.
    BadRule,
    /// A step selected an empty appendant; the program ended cleanly.
    Halt,
    /// The I/O collaborator ran out of input or failed.
    Eof,
}

impl Status {
    /// Returns `true` for [`Status::Ok`] and [`Status::Halt`].
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::Halt)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::BadArgument => "bad argument",
            Self::OutOfMemory => "out of memory",
            Self::IntegerOverflow => "integer overflow",
            Self::BadLength => "bad length",
            Self::BadEnum => "bad enum",
            Self::BadRuleCount => "bad rule count",
            Self::BadDeletionNumber => "bad deletion number",
            Self::DuplicateRule => "duplicate rule",
            Self::RingFull => "ring full",
            Self::QueueTooSmall => "queue too small",
            Self::OutOfTape => "out of tape",
            Self::BadRule => "bad rule",
            Self::Halt => "halt",
            Self::Eof => "eof",
        };
        f.write_str(s)
    }
}
