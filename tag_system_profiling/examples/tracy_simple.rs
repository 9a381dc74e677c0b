// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simple Tracy-backed example for `tag_system_profiling`.
//!
//! Run with:
//! `cargo run -p tag_system_profiling --example tracy_simple`

use tag_system::bitio::NoIo;
use tag_system::builder::ProgramBuilder;
use tag_system::system::{Limits, TagSystem};
use tag_system::trace::TraceSink;

use tag_system_profiling::{ProfilingTraceSink, SymbolMapResolver};

fn main() {
    // Tracy requires the client to be started before instrumentation.
    let _tracy = tracy_client::Client::start();
    println!("Waiting for Tracy connection...");
    let start = std::time::Instant::now();
    while !tracy_client::Client::is_connected()
        && start.elapsed() < std::time::Duration::from_secs(5)
    {
        std::thread::sleep(std::time::Duration::from_millis(100));
    }
    if tracy_client::Client::is_connected() {
        println!("Tracy connected.");
    } else {
        println!("No Tracy connection detected; continuing.");
    }

    // Collatz sequence from 871, encoded as a^871.
    let mut b = ProgramBuilder::new(2);
    b.pure("a", &["b", "c"])
        .pure("b", &["a"])
        .pure("c", &["a", "a", "a"])
        .pure("H", &[])
        .tape(&["a"; 871]);
    let (program, symbols) = b.build().expect("build collatz program");

    let mut system = TagSystem::from_program(program, NoIo).expect("create system");
    let mut sink = ProfilingTraceSink::with_resolver(SymbolMapResolver::new(symbols));
    let mask = sink.mask();
    let result = system.run(&Limits::default(), mask, Some(&mut sink));

    println!("result: {result:?}");
    println!(
        "steps={} logical_steps={}",
        system.steps(),
        system.logical_steps()
    );
}
