// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Tag system stepper.
//!
//! A [`TagSystem`] owns a production table, a compressed tape, and a bit-level I/O collaborator.
//! Each step pops one run from the tape, matches its symbol against the table, exchanges at
//! most one bit with the collaborator, and pushes the selected appendant once per group in the
//! run.

use alloc::vec::Vec;
use core::fmt;

use crate::binary::TagProgram;
use crate::bitio::{BitIo, ByteIo, IoError};
use crate::blob::Blob;
use crate::queue::{QueueError, TagQueue};
use crate::rule::{Production, ProductionTable, RuleError, TagRule};
use crate::status::Status;
use crate::trace::{IoEvent, StepEvent, TraceMask, TraceOutcome, TraceSink};

/// Execution limits for [`TagSystem::run`].
#[derive(Clone, Debug)]
pub struct Limits {
    /// Step budget per run. Counts compressed steps (one per popped run).
    pub max_steps: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
        }
    }
}

/// Why a system stopped with an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// The tape did not hold a complete group.
    OutOfTape,
    /// The popped symbol has no rule.
    BadRule,
    /// The I/O collaborator failed.
    Io(IoError),
    /// The tape failed to accept the appendant.
    Queue(QueueError),
}

impl Fault {
    /// Returns the flat status code for this fault.
    #[must_use]
    pub fn status(self) -> Status {
        match self {
            Self::OutOfTape => Status::OutOfTape,
            Self::BadRule => Status::BadRule,
            Self::Io(e) => e.status(),
            Self::Queue(e) => e.status(),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfTape => write!(f, "out of tape"),
            Self::BadRule => write!(f, "no rule for symbol"),
            Self::Io(e) => write!(f, "i/o: {e}"),
            Self::Queue(e) => write!(f, "tape: {e}"),
        }
    }
}

impl core::error::Error for Fault {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Queue(e) => Some(e),
            Self::OutOfTape | Self::BadRule => None,
        }
    }
}

/// A fault annotated with the step that raised it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaultInfo {
    /// Zero-based index of the faulting step.
    pub step: u64,
    /// Fault kind.
    pub fault: Fault,
}

impl FaultInfo {
    /// Returns the flat status code for the fault.
    #[must_use]
    pub fn status(&self) -> Status {
        self.fault.status()
    }
}

impl fmt::Display for FaultInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fault at step {}: {}", self.step, self.fault)
    }
}

impl core::error::Error for FaultInfo {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        Some(&self.fault)
    }
}

/// [`TagSystem`] construction failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InitError {
    /// No rules were supplied.
    BadRuleCount,
    /// The deletion number was below `2`.
    BadDeletionNumber,
    /// The symbol size was zero or does not fit in `u32`.
    BadSymbolSize,
    /// The initial tape is not a multiple of the symbol size.
    BadLength,
    /// A rule was rejected by the production table.
    Rule(RuleError),
    /// The tape could not be built.
    Queue(QueueError),
    /// An allocation failed.
    OutOfMemory,
}

impl InitError {
    /// Returns the flat status code for this error.
    #[must_use]
    pub fn status(self) -> Status {
        match self {
            Self::BadRuleCount => Status::BadRuleCount,
            Self::BadDeletionNumber => Status::BadDeletionNumber,
            Self::BadSymbolSize => Status::BadArgument,
            Self::BadLength => Status::BadLength,
            Self::Rule(e) => e.status(),
            Self::Queue(e) => e.status(),
            Self::OutOfMemory => Status::OutOfMemory,
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRuleCount => write!(f, "at least one rule is required"),
            Self::BadDeletionNumber => write!(f, "deletion number must be at least 2"),
            Self::BadSymbolSize => write!(f, "invalid symbol size"),
            Self::BadLength => write!(f, "initial tape is not a multiple of the symbol size"),
            Self::Rule(e) => write!(f, "rule: {e}"),
            Self::Queue(e) => write!(f, "tape: {e}"),
            Self::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

impl core::error::Error for InitError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Rule(e) => Some(e),
            Self::Queue(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RuleError> for InitError {
    fn from(e: RuleError) -> Self {
        match e {
            RuleError::OutOfMemory => Self::OutOfMemory,
            e => Self::Rule(e),
        }
    }
}

impl From<QueueError> for InitError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::OutOfMemory => Self::OutOfMemory,
            e => Self::Queue(e),
        }
    }
}

/// Stepper state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// Steps can be taken.
    Running,
    /// An empty appendant was selected. Terminal.
    Halted,
    /// A step faulted. Terminal.
    Errored(FaultInfo),
}

/// Result of one successful step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The appendant was pushed; the system is still running.
    Continue,
    /// The system halted.
    Halted,
}

impl StepOutcome {
    /// Returns the flat status code for this outcome.
    #[must_use]
    pub fn status(self) -> Status {
        match self {
            Self::Continue => Status::Ok,
            Self::Halted => Status::Halt,
        }
    }
}

/// How a [`TagSystem::run`] call ended without a fault.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The system halted.
    Halted,
    /// [`Limits::max_steps`] steps were executed; the system is still running.
    BudgetExhausted,
}

/// Summary of a [`TagSystem::run`] call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    /// How the run ended.
    pub outcome: RunOutcome,
    /// Steps executed by this call.
    pub steps: u64,
}

/// A generalized Tag system.
pub struct TagSystem<B> {
    productions: ProductionTable,
    tape: TagQueue,
    initial_tape: Blob,
    io: BitIo<B>,
    state: State,
    steps: u64,
    logical_steps: u128,
}

impl<B> fmt::Debug for TagSystem<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagSystem")
            .field("state", &self.state)
            .field("rules", &self.productions.len())
            .field("tape", &self.tape)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl<B: ByteIo> TagSystem<B> {
    /// Creates a running system.
    ///
    /// The symbol size is taken from the first rule's key. `initial_tape` may be empty, in which
    /// case the first step faults with [`Fault::OutOfTape`].
    pub fn new(
        rules: Vec<TagRule>,
        initial_tape: &[u8],
        deletion_number: u32,
        io: B,
    ) -> Result<Self, InitError> {
        let first = rules.first().ok_or(InitError::BadRuleCount)?;
        let symbol_size =
            u32::try_from(first.symbol().len()).map_err(|_| InitError::BadSymbolSize)?;
        Self::build(symbol_size, rules, initial_tape, deletion_number, io)
    }

    /// Creates a running system from a decoded program.
    pub fn from_program(program: TagProgram, io: B) -> Result<Self, InitError> {
        let TagProgram {
            symbol_size,
            deletion_number,
            rules,
            tape,
        } = program;
        Self::build(symbol_size, rules, &tape, deletion_number, io)
    }

    fn build(
        symbol_size: u32,
        rules: Vec<TagRule>,
        initial_tape: &[u8],
        deletion_number: u32,
        io: B,
    ) -> Result<Self, InitError> {
        if rules.is_empty() {
            return Err(InitError::BadRuleCount);
        }
        if deletion_number < 2 {
            return Err(InitError::BadDeletionNumber);
        }
        let ss = usize::try_from(symbol_size)
            .ok()
            .filter(|&ss| ss != 0)
            .ok_or(InitError::BadSymbolSize)?;
        if initial_tape.len() % ss != 0 {
            return Err(InitError::BadLength);
        }

        let mut productions = ProductionTable::new(symbol_size);
        for rule in rules {
            productions.insert(rule)?;
        }

        let mut tape = TagQueue::new(deletion_number, symbol_size)?;
        if !initial_tape.is_empty() {
            tape.push(initial_tape, 1)?;
        }

        Ok(Self {
            productions,
            tape,
            initial_tape: Blob::from_bytes(initial_tape).map_err(|_| InitError::OutOfMemory)?,
            io: BitIo::new(io),
            state: State::Running,
            steps: 0,
            logical_steps: 0,
        })
    }

    /// Executes one step without tracing.
    pub fn step(&mut self) -> Result<StepOutcome, FaultInfo> {
        self.step_traced(TraceMask::NONE, None)
    }

    /// Executes one step, reporting the events in `trace_mask` to `trace`.
    ///
    /// A halted system returns [`StepOutcome::Halted`] again and an errored one returns its
    /// recorded fault again; neither is mutated.
    pub fn step_traced(
        &mut self,
        trace_mask: TraceMask,
        mut trace: Option<&mut dyn TraceSink>,
    ) -> Result<StepOutcome, FaultInfo> {
        match self.state {
            State::Running => {}
            State::Halted => return Ok(StepOutcome::Halted),
            State::Errored(info) => return Err(info),
        }
        let step = self.steps;

        let run = match self.tape.pop() {
            Ok(run) => run,
            Err(QueueError::TooSmall) => return Err(self.fail(step, Fault::OutOfTape)),
            Err(e) => return Err(self.fail(step, Fault::Queue(e))),
        };
        let Some(rule) = self.productions.lookup(&run.symbol) else {
            return Err(self.fail(step, Fault::BadRule));
        };

        let selected: Result<&[u8], Fault> = match rule.production() {
            Production::Pure { appendant } => Ok(appendant),
            Production::Input {
                appendant0,
                appendant1,
            } => match self.io.get_bit() {
                Ok(bit) => {
                    if trace_mask.contains(TraceMask::IO)
                        && let Some(t) = trace.as_mut()
                    {
                        t.io(IoEvent::Read { step, bit });
                    }
                    Ok(if bit { appendant1 } else { appendant0 })
                }
                Err(e) => Err(Fault::Io(e)),
            },
            Production::Output { appendant, bit } => match self.io.put_bit(*bit) {
                Ok(()) => {
                    if trace_mask.contains(TraceMask::IO)
                        && let Some(t) = trace.as_mut()
                    {
                        t.io(IoEvent::Write { step, bit: *bit });
                    }
                    Ok(appendant)
                }
                Err(e) => Err(Fault::Io(e)),
            },
        };
        let appendant = match selected {
            Ok(appendant) => appendant,
            Err(fault) => {
                let info = FaultInfo { step, fault };
                self.state = State::Errored(info);
                return Err(info);
            }
        };

        if trace_mask.contains(TraceMask::STEP)
            && let Some(t) = trace.as_mut()
        {
            t.step(&StepEvent {
                step,
                symbol: &run.symbol,
                repetitions: run.count,
                style: rule.style(),
                appendant,
            });
        }

        if appendant.is_empty() {
            self.state = State::Halted;
            self.steps += 1;
            self.logical_steps += 1;
            return Ok(StepOutcome::Halted);
        }

        if let Err(e) = self.tape.push(appendant, run.count) {
            let info = FaultInfo {
                step,
                fault: Fault::Queue(e),
            };
            self.state = State::Errored(info);
            return Err(info);
        }
        self.steps += 1;
        self.logical_steps += u128::from(run.count);
        Ok(StepOutcome::Continue)
    }

    /// Steps until the system halts, faults, or `limits.max_steps` steps have run.
    ///
    /// Tracing is controlled by `trace_mask`; pass `None` for `trace` to disable tracing.
    pub fn run(
        &mut self,
        limits: &Limits,
        trace_mask: TraceMask,
        mut trace: Option<&mut dyn TraceSink>,
    ) -> Result<RunSummary, FaultInfo> {
        if trace_mask.contains(TraceMask::RUN)
            && let Some(t) = trace.as_mut()
        {
            t.run_start(self.steps);
        }

        let result = self.run_body(limits, trace_mask, &mut trace);

        if trace_mask.contains(TraceMask::RUN)
            && let Some(t) = trace.as_mut()
        {
            let outcome = match &result {
                Ok(summary) => match summary.outcome {
                    RunOutcome::Halted => TraceOutcome::Halted,
                    RunOutcome::BudgetExhausted => TraceOutcome::BudgetExhausted,
                },
                Err(info) => TraceOutcome::Fault(info),
            };
            t.run_end(outcome);
        }

        result
    }

    fn run_body(
        &mut self,
        limits: &Limits,
        trace_mask: TraceMask,
        trace: &mut Option<&mut dyn TraceSink>,
    ) -> Result<RunSummary, FaultInfo> {
        let mut steps = 0;
        loop {
            if self.state == State::Halted {
                return Ok(RunSummary {
                    outcome: RunOutcome::Halted,
                    steps,
                });
            }
            if steps == limits.max_steps {
                return Ok(RunSummary {
                    outcome: RunOutcome::BudgetExhausted,
                    steps,
                });
            }
            let t: Option<&mut dyn TraceSink> = match trace {
                Some(t) => Some(&mut **t),
                None => None,
            };
            match self.step_traced(trace_mask, t)? {
                StepOutcome::Continue => steps += 1,
                StepOutcome::Halted => {
                    return Ok(RunSummary {
                        outcome: RunOutcome::Halted,
                        steps: steps + 1,
                    });
                }
            }
        }
    }

    fn fail(&mut self, step: u64, fault: Fault) -> FaultInfo {
        let info = FaultInfo { step, fault };
        self.state = State::Errored(info);
        info
    }
}

impl<B> TagSystem<B> {
    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns `true` while steps can be taken.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == State::Running
    }

    /// Returns the number of completed steps, the halting step included.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns the number of steps an uncompressed tape would have taken for the same work.
    ///
    /// Each completed step contributes its repetitions and a halting step contributes one.
    #[must_use]
    pub fn logical_steps(&self) -> u128 {
        self.logical_steps
    }

    /// Returns the tape.
    #[must_use]
    pub fn tape(&self) -> &TagQueue {
        &self.tape
    }

    /// Returns the production table.
    #[must_use]
    pub fn productions(&self) -> &ProductionTable {
        &self.productions
    }

    /// Returns the tape the system was created with.
    #[must_use]
    pub fn initial_tape(&self) -> &[u8] {
        self.initial_tape.as_slice()
    }

    /// Returns the number of symbols deleted per step.
    #[must_use]
    pub fn deletion_number(&self) -> u32 {
        self.tape.deletion_number()
    }

    /// Returns the symbol width in bytes.
    #[must_use]
    pub fn symbol_size(&self) -> u32 {
        self.tape.symbol_size()
    }

    /// Returns the I/O collaborator.
    #[must_use]
    pub fn io(&self) -> &B {
        self.io.get_ref()
    }

    /// Returns the I/O collaborator mutably.
    pub fn io_mut(&mut self) -> &mut B {
        self.io.get_mut()
    }

    /// Returns the number of output bits buffered towards the next byte.
    #[must_use]
    pub fn pending_output_bits(&self) -> u8 {
        self.io.pending_output_bits()
    }

    /// Consumes the system, returning the I/O collaborator.
    pub fn into_io(self) -> B {
        self.io.into_inner()
    }
}
