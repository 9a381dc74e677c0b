// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracy profiling adapter for `tag_system` trace events.
//!
//! [`ProfilingTraceSink`] implements [`TraceSink`] and forwards events to a running Tracy client:
//!
//! - a zone per run, annotated with the start step and the outcome,
//! - a zone per step, named by the [`LabelResolver`] for the popped symbol,
//! - plots for repetitions, appendant length and cumulative logical steps,
//! - messages for every bit read or written and for faults.
//!
//! When no Tracy client is running, events are still counted and labels still resolved, but
//! nothing is emitted.

use std::fmt::{self, Write as _};

use tag_system::builder::SymbolMap;
use tag_system::trace::{IoEvent, StepEvent, TraceMask, TraceOutcome, TraceSink};
use tracy_client::{Client, Span, plot_name};

/// Produces zone labels for symbols.
pub trait LabelResolver {
    /// Returns a label for `symbol`, or `None` to use a generic one.
    fn symbol_label(&mut self, symbol: &[u8]) -> Option<String>;
}

/// Labels symbols with their bytes in hex.
#[derive(Clone, Copy, Debug, Default)]
pub struct HexLabelResolver;

impl LabelResolver for HexLabelResolver {
    fn symbol_label(&mut self, symbol: &[u8]) -> Option<String> {
        let mut out = String::with_capacity(symbol.len() * 2);
        for b in symbol {
            let _ = write!(out, "{b:02x}");
        }
        Some(out)
    }
}

/// Labels symbols with the names a [`SymbolMap`] assigned them, falling back to hex.
#[derive(Clone, Debug, Default)]
pub struct SymbolMapResolver {
    symbols: SymbolMap,
}

impl SymbolMapResolver {
    /// Creates a resolver over `symbols`.
    #[must_use]
    pub fn new(symbols: SymbolMap) -> Self {
        Self { symbols }
    }
}

impl LabelResolver for SymbolMapResolver {
    fn symbol_label(&mut self, symbol: &[u8]) -> Option<String> {
        match self.symbols.name_of(symbol) {
            Some(name) => Some(name.to_owned()),
            None => HexLabelResolver.symbol_label(symbol),
        }
    }
}

/// A [`TraceSink`] that reports to Tracy.
pub struct ProfilingTraceSink<R = HexLabelResolver> {
    resolver: R,
    run_span: Option<Span>,
    step_span: Option<Span>,
    logical_steps: u128,
    steps: u64,
    bits: u64,
}

impl<R> fmt::Debug for ProfilingTraceSink<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfilingTraceSink")
            .field("steps", &self.steps)
            .field("logical_steps", &self.logical_steps)
            .field("bits", &self.bits)
            .finish_non_exhaustive()
    }
}

impl ProfilingTraceSink {
    /// Creates a sink with hex symbol labels.
    #[must_use]
    pub fn new() -> Self {
        Self::with_resolver(HexLabelResolver)
    }
}

impl Default for ProfilingTraceSink {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: LabelResolver> ProfilingTraceSink<R> {
    /// Creates a sink that names step zones with `resolver`.
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            run_span: None,
            step_span: None,
            logical_steps: 0,
            steps: 0,
            bits: 0,
        }
    }

    /// Returns the steps observed so far.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns the logical steps observed so far.
    #[must_use]
    pub fn logical_steps(&self) -> u128 {
        self.logical_steps
    }

    /// Returns the bits read or written so far.
    #[must_use]
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Returns the label resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Unwraps the label resolver.
    pub fn into_resolver(self) -> R {
        self.resolver
    }
}

impl<R: LabelResolver> TraceSink for ProfilingTraceSink<R> {
    fn mask(&self) -> TraceMask {
        TraceMask::ALL
    }

    fn run_start(&mut self, step: u64) {
        self.step_span = None;
        self.run_span = Client::running().map(|client| {
            let span = client.span_alloc(Some("tag_system::run"), "run", file!(), line!(), 0);
            span.emit_text(&format!("start_step={step}"));
            span
        });
    }

    fn step(&mut self, event: &StepEvent<'_>) {
        let groups = if event.appendant.is_empty() {
            1
        } else {
            event.repetitions
        };
        self.steps += 1;
        self.logical_steps = self.logical_steps.saturating_add(u128::from(groups));

        let label = self
            .resolver
            .symbol_label(event.symbol)
            .unwrap_or_else(|| String::from("step"));

        // Close the previous step's zone before opening the next.
        self.step_span = None;
        if let Some(client) = Client::running() {
            client.plot(plot_name!("tag_system.repetitions"), event.repetitions as f64);
            client.plot(
                plot_name!("tag_system.appendant_len"),
                event.appendant.len() as f64,
            );
            client.plot(
                plot_name!("tag_system.logical_steps"),
                self.logical_steps as f64,
            );
            let span = client.span_alloc(Some(&label), "step", file!(), line!(), 0);
            span.emit_text(&format!(
                "step={} style={} x{}",
                event.step, event.style, event.repetitions
            ));
            self.step_span = Some(span);
        }
    }

    fn io(&mut self, event: IoEvent) {
        self.bits += 1;
        if let Some(client) = Client::running() {
            let text = match event {
                IoEvent::Read { step, bit } => format!("step {step}: read {}", u8::from(bit)),
                IoEvent::Write { step, bit } => format!("step {step}: write {}", u8::from(bit)),
            };
            client.message(&text, 0);
        }
    }

    fn run_end(&mut self, outcome: TraceOutcome<'_>) {
        self.step_span = None;
        let text = match outcome {
            TraceOutcome::Halted => String::from("halted"),
            TraceOutcome::BudgetExhausted => String::from("budget exhausted"),
            TraceOutcome::Fault(info) => {
                let text = info.to_string();
                if let Some(client) = Client::running() {
                    client.message(&text, 0);
                }
                text
            }
        };
        if let Some(span) = self.run_span.take() {
            span.emit_text(&text);
        }
    }
}
