// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integration test that drives a real event stream through the profiling adapter.
//!
//! Run with:
//! `cargo test -p tag_system_profiling`

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tag_system::bitio::MemoryIo;
use tag_system::builder::ProgramBuilder;
use tag_system::system::{Limits, RunOutcome, TagSystem};
use tag_system::trace::TraceSink;

use tag_system_profiling::{LabelResolver, ProfilingTraceSink, SymbolMapResolver};

#[derive(Clone)]
struct CountingResolver {
    labels: Arc<AtomicUsize>,
}

impl LabelResolver for CountingResolver {
    fn symbol_label(&mut self, symbol: &[u8]) -> Option<String> {
        self.labels.fetch_add(1, Ordering::Relaxed);
        Some(format!("symbol:{}", symbol[0]))
    }
}

/// Writes 'A' one bit per step, then halts.
fn build_system() -> (TagSystem<MemoryIo>, SymbolMapResolver) {
    let bits = [true, false, false, false, false, false, true, false];
    let names: Vec<String> = (0..8).map(|i| format!("bit{i}")).collect();
    let mut b = ProgramBuilder::new(2);
    for (i, bit) in bits.into_iter().enumerate() {
        let next = names.get(i + 1).map_or("halt", String::as_str);
        b.output(&names[i], &[next, "pad"], bit);
    }
    b.pure("halt", &[]).tape(&["bit0", "pad"]);
    let (program, symbols) = b.build().unwrap();
    let system = TagSystem::from_program(program, MemoryIo::default()).unwrap();
    (system, SymbolMapResolver::new(symbols))
}

#[test]
fn profiling_sink_handles_real_event_stream() {
    let _tracy = tracy_client::Client::start();
    let (mut system, _) = build_system();

    let labels = Arc::new(AtomicUsize::new(0));
    let mut sink = ProfilingTraceSink::with_resolver(CountingResolver {
        labels: labels.clone(),
    });

    let summary = system
        .run(&Limits::default(), sink.mask(), Some(&mut sink))
        .unwrap();

    assert_eq!(summary.outcome, RunOutcome::Halted);
    assert_eq!(system.io().output(), b"A");
    assert_eq!(labels.load(Ordering::Relaxed), 9);
    assert_eq!(sink.steps(), 9);
    assert_eq!(sink.logical_steps(), 9);
    assert_eq!(sink.bits(), 8);
}

#[test]
fn symbol_map_resolver_prefers_names() {
    let (_, mut resolver) = build_system();
    assert_eq!(resolver.symbol_label(&[0]).as_deref(), Some("bit0"));
    assert_eq!(resolver.symbol_label(&[0xee]).as_deref(), Some("ee"));
}
