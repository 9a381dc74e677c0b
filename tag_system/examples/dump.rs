// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Program dump example.
//!
//! Run with:
//! `cargo run -p tag_system --features std --example dump -- [program.bin] [--run]`
//!
//! Without a path, a built-in Collatz program is dumped. With `--run`, the program is executed
//! with stdin/stdout as its bit streams and the final tape is printed to stderr.

use std::fs::File;
use std::io::BufReader;

use tag_system::bitio::StdIo;
use tag_system::builder::ProgramBuilder;
use tag_system::dump::{ProgramDump, TapeDump};
use tag_system::system::{Limits, TagSystem};
use tag_system::trace::TraceMask;
use tag_system::TagProgram;

fn collatz() -> TagProgram {
    let mut b = ProgramBuilder::new(2);
    b.pure("a", &["b", "c"])
        .pure("b", &["a"])
        .pure("c", &["a", "a", "a"])
        .pure("H", &[])
        .tape(&["a"; 27]);
    b.build().unwrap().0
}

fn main() {
    let mut path = None;
    let mut run = false;
    for arg in std::env::args().skip(1) {
        if arg == "--run" {
            run = true;
        } else {
            path = Some(arg);
        }
    }

    let program = match path {
        Some(path) => {
            let file = File::open(&path).unwrap_or_else(|e| panic!("open {path}: {e}"));
            TagProgram::read_from(BufReader::new(file)).unwrap()
        }
        None => collatz(),
    };
    print!("{}", ProgramDump::new(&program));

    if !run {
        return;
    }
    let io = StdIo::new(std::io::stdin().lock(), std::io::stdout().lock());
    let mut system = TagSystem::from_program(program, io).unwrap();
    let result = system.run(&Limits::default(), TraceMask::NONE, None);
    system.io_mut().flush().unwrap();

    eprintln!("result: {result:?}");
    eprintln!(
        "steps={} logical_steps={}",
        system.steps(),
        system.logical_steps()
    );
    eprint!("{}", TapeDump::new(system.tape()));
}
