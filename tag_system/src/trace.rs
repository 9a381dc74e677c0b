// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing hooks for `tag_system`.
//!
//! Tracing is optional and is designed to be `no_std` friendly.
//! The stepper only emits events requested by a [`TraceMask`].
//!
//! To enable tracing, pass a [`TraceMask`] and [`TraceSink`] to [`TagSystem::run`] or
//! [`TagSystem::step_traced`].

#[cfg(doc)]
use crate::system::TagSystem;

use crate::rule::RuleStyle;
use crate::system::FaultInfo;

/// A set of trace events requested by a [`TraceSink`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TraceMask(u32);

impl core::ops::BitOr for TraceMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for TraceMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl TraceMask {
    /// No tracing.
    pub const NONE: Self = Self(0);
    /// Trace run boundaries.
    ///
    /// Enables:
    /// - [`TraceSink::run_start`]
    /// - [`TraceSink::run_end`]
    pub const RUN: Self = Self(1 << 0);
    /// Trace each executed step.
    ///
    /// Enables:
    /// - [`TraceSink::step`]
    pub const STEP: Self = Self(1 << 1);
    /// Trace bits exchanged with the I/O collaborator.
    ///
    /// Enables:
    /// - [`TraceSink::io`]
    pub const IO: Self = Self(1 << 2);
    /// Every event.
    pub const ALL: Self = Self(Self::RUN.0 | Self::STEP.0 | Self::IO.0);

    /// Returns `true` if this mask includes all bits in `other`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

/// One executed step, reported after rule selection and before the push.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StepEvent<'a> {
    /// Zero-based index of the step (compressed steps, not logical ones).
    pub step: u64,
    /// The popped run's symbol.
    pub symbol: &'a [u8],
    /// How many groups the popped run stood for; the appendant is pushed this many times.
    pub repetitions: u64,
    /// Style of the matched rule.
    pub style: RuleStyle,
    /// The selected appendant. Empty on a halting step.
    pub appendant: &'a [u8],
}

/// A bit exchanged with the I/O collaborator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IoEvent {
    /// An `Input` rule read `bit`.
    Read {
        /// Step index.
        step: u64,
        /// The bit read.
        bit: bool,
    },
    /// An `Output` rule wrote `bit`.
    Write {
        /// Step index.
        step: u64,
        /// The bit written.
        bit: bool,
    },
}

/// Run outcome for tracing.
#[derive(Clone, Debug)]
pub enum TraceOutcome<'a> {
    /// An empty appendant was selected.
    Halted,
    /// The step budget ran out; the system can be resumed.
    BudgetExhausted,
    /// The system faulted.
    Fault(&'a FaultInfo),
}

/// A trace sink that can receive stepper events.
pub trait TraceSink {
    /// Returns the set of events the sink wants.
    fn mask(&self) -> TraceMask {
        TraceMask::NONE
    }

    /// Called at the start of a run.
    ///
    /// Called only if `mask()` includes [`TraceMask::RUN`].
    ///
    /// - `step`: index of the first step the run will execute
    fn run_start(&mut self, _step: u64) {}

    /// Called for each executed step.
    ///
    /// Called only if `mask()` includes [`TraceMask::STEP`].
    fn step(&mut self, _event: &StepEvent<'_>) {}

    /// Called for each bit read or written.
    ///
    /// Called only if `mask()` includes [`TraceMask::IO`].
    fn io(&mut self, _event: IoEvent) {}

    /// Called at the end of a run.
    ///
    /// Called only if `mask()` includes [`TraceMask::RUN`].
    fn run_end(&mut self, _outcome: TraceOutcome<'_>) {}
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn mask(&self) -> TraceMask {
        (**self).mask()
    }

    fn run_start(&mut self, step: u64) {
        (**self).run_start(step);
    }

    fn step(&mut self, event: &StepEvent<'_>) {
        (**self).step(event);
    }

    fn io(&mut self, event: IoEvent) {
        (**self).io(event);
    }

    fn run_end(&mut self, outcome: TraceOutcome<'_>) {
        (**self).run_end(outcome);
    }
}
