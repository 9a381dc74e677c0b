// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

#![allow(missing_docs, reason = "integration test crate")]

use std::collections::{HashMap, VecDeque};

use tag_system::binary::{HEADER_LEN, LoadError};
use tag_system::bitio::{IoError, MemoryIo, NoIo};
use tag_system::builder::ProgramBuilder;
use tag_system::format::DecodeError;
use tag_system::rule::RuleError;
use tag_system::status::Status;
use tag_system::system::{
    Fault, FaultInfo, InitError, Limits, RunOutcome, RunSummary, State, StepOutcome, TagSystem,
};
use tag_system::trace::{StepEvent, TraceMask, TraceSink};
use tag_system::{TagProgram, TagRule};

fn header(rule_count: u64, symbol_size: u32, tape_len: u32, deletion_number: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&rule_count.to_ne_bytes());
    out.extend_from_slice(&symbol_size.to_ne_bytes());
    out.extend_from_slice(&tape_len.to_ne_bytes());
    out.extend_from_slice(&deletion_number.to_ne_bytes());
    out
}

fn sample_program() -> TagProgram {
    TagProgram {
        symbol_size: 1,
        deletion_number: 2,
        rules: vec![
            TagRule::pure(*b"a", *b"bc"),
            TagRule::output(*b"b", *b"a", true),
            TagRule::input(*b"c", *b"a", *b"aa"),
        ],
        tape: b"aaa".to_vec(),
    }
}

#[test]
fn golden_program_bytes() {
    let mut expected = header(3, 1, 3, 2);
    // Pure: style, len, key, appendant.
    expected.push(2);
    expected.extend_from_slice(&2_u16.to_ne_bytes());
    expected.extend_from_slice(b"abc");
    // Output: style, len, key, appendant, bit.
    expected.push(0);
    expected.extend_from_slice(&1_u16.to_ne_bytes());
    expected.extend_from_slice(b"ba");
    expected.push(1);
    // Input: style, len0, len1, key, appendant0, appendant1.
    expected.push(1);
    expected.extend_from_slice(&1_u16.to_ne_bytes());
    expected.extend_from_slice(&2_u16.to_ne_bytes());
    expected.extend_from_slice(b"caaa");
    // Tape.
    expected.extend_from_slice(b"aaa");

    let program = sample_program();
    assert_eq!(expected.len(), HEADER_LEN + 6 + 6 + 9 + 3);
    assert_eq!(program.encode().unwrap(), expected);
    assert_eq!(TagProgram::decode(&expected).unwrap(), program);
}

#[test]
fn builder_programs_roundtrip_through_bytes() {
    let mut b = ProgramBuilder::new(3);
    let names: Vec<String> = (0..400).map(|i| format!("s{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    b.pure("s0", &refs)
        .input("s1", &refs[100..103], &[])
        .output("s2", &refs[390..], false)
        .tape(&refs[..6]);
    let (program, symbols) = b.build().unwrap();
    assert_eq!(program.symbol_size, 2);

    let bytes = program.encode().unwrap();
    let decoded = TagProgram::decode(&bytes).unwrap();
    assert_eq!(decoded, program);
    assert_eq!(symbols.names_of(&decoded.tape), "s0 s1 s2 s3 s4 s5");
}

/// Uncompressed Tag system: the tape holds every symbol.
struct Reference {
    deletion_number: usize,
    symbol_size: usize,
    rules: HashMap<Vec<u8>, Vec<u8>>,
    tape: VecDeque<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum End {
    Halted,
    OutOfTape,
    BadRule,
    Capped,
}

impl Reference {
    fn new(program: &TagProgram) -> Self {
        let rules = program
            .rules
            .iter()
            .map(|r| {
                let tag_system::Production::Pure { appendant } = r.production() else {
                    panic!("reference simulates pure rules only");
                };
                (r.symbol().to_vec(), appendant.to_vec())
            })
            .collect();
        Self {
            deletion_number: program.deletion_number as usize,
            symbol_size: program.symbol_size as usize,
            rules,
            tape: program.tape.iter().copied().collect(),
        }
    }

    /// Runs until termination or until `cap` groups were read; returns every group head read.
    fn run(&mut self, cap: usize) -> (Vec<Vec<u8>>, End) {
        let mut heads = Vec::new();
        loop {
            if heads.len() >= cap {
                return (heads, End::Capped);
            }
            if self.tape.len() < self.deletion_number * self.symbol_size {
                return (heads, End::OutOfTape);
            }
            let head: Vec<u8> = self.tape.iter().take(self.symbol_size).copied().collect();
            let Some(appendant) = self.rules.get(&head) else {
                return (heads, End::BadRule);
            };
            heads.push(head);
            if appendant.is_empty() {
                return (heads, End::Halted);
            }
            self.tape.drain(..self.deletion_number * self.symbol_size);
            self.tape.extend(appendant.iter().copied());
        }
    }
}

/// Expands step events into the group heads an uncompressed run would read.
struct Heads {
    cap: usize,
    heads: Vec<Vec<u8>>,
}

impl TraceSink for Heads {
    fn mask(&self) -> TraceMask {
        TraceMask::STEP
    }

    fn step(&mut self, event: &StepEvent<'_>) {
        // A halting step reads only its first group.
        let groups = if event.appendant.is_empty() {
            1
        } else {
            event.repetitions
        };
        for _ in 0..groups {
            if self.heads.len() >= self.cap {
                break;
            }
            self.heads.push(event.symbol.to_vec());
        }
    }
}

fn run_compressed<B: tag_system::bitio::ByteIo>(
    system: &mut TagSystem<B>,
    cap: usize,
) -> (Vec<Vec<u8>>, End) {
    let mut sink = Heads {
        cap,
        heads: Vec::new(),
    };
    while sink.heads.len() < cap {
        match system.step_traced(sink.mask(), Some(&mut sink)) {
            Ok(StepOutcome::Continue) => {}
            Ok(StepOutcome::Halted) => return (sink.heads, End::Halted),
            Err(FaultInfo {
                fault: Fault::OutOfTape,
                ..
            }) => return (sink.heads, End::OutOfTape),
            Err(FaultInfo {
                fault: Fault::BadRule,
                ..
            }) => return (sink.heads, End::BadRule),
            Err(info) => panic!("unexpected fault: {info}"),
        }
    }
    (sink.heads, End::Capped)
}

fn assert_matches_reference(program: &TagProgram, cap: usize) {
    let mut reference = Reference::new(program);
    let (expected_heads, expected_end) = reference.run(cap);

    let mut system = TagSystem::from_program(program.clone(), NoIo).unwrap();
    let (heads, end) = run_compressed(&mut system, cap);

    assert_eq!(end, expected_end, "{program:?}");
    assert_eq!(heads, expected_heads, "{program:?}");
    if end != End::Capped {
        assert_eq!(system.logical_steps(), expected_heads.len() as u128);
    }
    if end == End::OutOfTape {
        let ss = reference.symbol_size;
        assert_eq!(
            system.tape().logical_len(),
            (reference.tape.len() / ss) as u128
        );
        if let Some((symbol, _)) = system.tape().cached() {
            let head: Vec<u8> = reference.tape.iter().take(ss).copied().collect();
            assert_eq!(symbol, &head[..]);
        }
    }
}

fn collatz(n: usize) -> TagProgram {
    let mut b = ProgramBuilder::new(2);
    b.pure("a", &["b", "c"])
        .pure("b", &["a"])
        .pure("c", &["a", "a", "a"])
        .pure("H", &[])
        .tape(&vec!["a"; n]);
    b.build().unwrap().0
}

#[test]
fn collatz_matches_uncompressed_run() {
    let mut system = TagSystem::from_program(collatz(3), NoIo).unwrap();
    let err = system
        .run(&Limits::default(), TraceMask::NONE, None)
        .unwrap_err();
    assert_eq!(err.fault, Fault::OutOfTape);
    assert_eq!(system.steps(), 14);
    assert_eq!(system.logical_steps(), 24);
    assert_eq!(system.tape().logical_len(), 1);
    assert_eq!(system.tape().cached(), Some((&[0_u8][..], 1)));

    assert_matches_reference(&collatz(3), 1_000);
    assert_matches_reference(&collatz(27), 100_000);
}

#[test]
fn collatz_27_compresses_steps() {
    let mut system = TagSystem::from_program(collatz(27), NoIo).unwrap();
    let err = system
        .run(&Limits::default(), TraceMask::NONE, None)
        .unwrap_err();
    assert_eq!(err.fault, Fault::OutOfTape);
    assert_eq!(system.steps(), 222);
    assert_eq!(system.logical_steps(), 40_656);
}

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

/// Symbols share every byte but the last, so lookups must compare whole symbols.
fn symbol(id: usize, symbol_size: usize) -> Vec<u8> {
    let mut out = vec![0x5a; symbol_size - 1];
    out.push(id as u8);
    out
}

fn random_pure_program(rng: &mut XorShift, deletion_number: u32, symbol_size: usize) -> TagProgram {
    let alphabet = 2 + rng.below(3);
    let d = deletion_number as usize;
    let mut rules = Vec::new();
    for id in 0..alphabet {
        // The last symbol sometimes has no rule.
        if id == alphabet - 1 && id != 0 && rng.below(3) == 0 {
            continue;
        }
        let len = if rng.below(8) == 0 {
            0
        } else {
            1 + rng.below(d + 2)
        };
        let appendant: Vec<u8> = (0..len)
            .flat_map(|_| symbol(rng.below(alphabet), symbol_size))
            .collect();
        rules.push(TagRule::pure(symbol(id, symbol_size), appendant));
    }
    let tape_len = 1 + rng.below(3 * d);
    let tape = (0..tape_len)
        .flat_map(|_| symbol(rng.below(alphabet), symbol_size))
        .collect();
    TagProgram {
        symbol_size: symbol_size as u32,
        deletion_number,
        rules,
        tape,
    }
}

#[test]
fn random_pure_programs_match_uncompressed_run() {
    for deletion_number in 2..=5_u32 {
        for symbol_size in 1..=3_usize {
            let mut rng = XorShift(
                0x2545_f491_4f6c_dd1d ^ (u64::from(deletion_number) << 8) ^ symbol_size as u64,
            );
            for _ in 0..25 {
                let program = random_pure_program(&mut rng, deletion_number, symbol_size);
                assert_matches_reference(&program, 3_000);
            }
        }
    }
}

#[test]
fn two_instances_are_deterministic() {
    #[derive(Default)]
    struct Events(Vec<(u64, Vec<u8>, u64)>);

    impl TraceSink for Events {
        fn mask(&self) -> TraceMask {
            TraceMask::STEP
        }

        fn step(&mut self, event: &StepEvent<'_>) {
            self.0.push((event.step, event.symbol.to_vec(), event.repetitions));
        }
    }

    let mut rng = XorShift(0x9e37_79b9_7f4a_7c15);
    for _ in 0..20 {
        let program = random_pure_program(&mut rng, 3, 2);
        let mut a = TagSystem::from_program(program.clone(), NoIo).unwrap();
        let mut b = TagSystem::from_program(program, NoIo).unwrap();
        let (mut ea, mut eb) = (Events::default(), Events::default());
        // Bounded by logical steps; tapes can grow geometrically.
        while a.logical_steps() < 2_000 {
            let ra = a.step_traced(TraceMask::STEP, Some(&mut ea));
            let rb = b.step_traced(TraceMask::STEP, Some(&mut eb));
            assert_eq!(ra, rb);
            if ra != Ok(StepOutcome::Continue) {
                break;
            }
        }

        assert_eq!(ea.0, eb.0);
        assert_eq!(a.state(), b.state());
        assert_eq!(a.logical_steps(), b.logical_steps());
        assert_eq!(a.tape().runs().unwrap(), b.tape().runs().unwrap());
        assert_eq!(a.tape().cached(), b.tape().cached());
    }
}

#[test]
fn echo_program_copies_input_to_output() {
    // "r" reads a bit and queues the matching writer; each writer writes its bit and queues "r".
    let mut b = ProgramBuilder::new(2);
    b.input("r", &["zero", "x"], &["one", "x"])
        .output("zero", &["r", "x"], false)
        .output("one", &["r", "x"], true)
        .tape(&["r", "x"]);
    let (program, _) = b.build().unwrap();

    let input = [0xa5_u8, 0x3c];
    let mut system = TagSystem::from_program(program, MemoryIo::new(input)).unwrap();
    let err = system
        .run(&Limits::default(), TraceMask::NONE, None)
        .unwrap_err();

    assert_eq!(
        err,
        FaultInfo {
            step: 32,
            fault: Fault::Io(IoError::Eof)
        }
    );
    assert_eq!(system.pending_output_bits(), 0);
    assert_eq!(system.io().output(), input);
    assert!(system.io().remaining_input().is_empty());
}

#[test]
fn fixed_output_program_halts_after_writing() {
    // 'A' is 0b0100_0001; bits go out least significant first.
    let bits = [true, false, false, false, false, false, true, false];
    let names: Vec<String> = (0..8).map(|i| format!("b{i}")).collect();
    let mut b = ProgramBuilder::new(2);
    for (i, bit) in bits.into_iter().enumerate() {
        let next = names.get(i + 1).map_or("halt", String::as_str);
        b.output(&names[i], &[next, "x"], bit);
    }
    b.pure("halt", &[]).tape(&["b0", "x"]);
    let (program, _) = b.build().unwrap();

    let mut system = TagSystem::from_program(program, MemoryIo::default()).unwrap();
    let summary = system
        .run(&Limits::default(), TraceMask::NONE, None)
        .unwrap();
    assert_eq!(
        summary,
        RunSummary {
            outcome: RunOutcome::Halted,
            steps: 9
        }
    );
    assert_eq!(system.state(), State::Halted);
    assert_eq!(system.into_io().into_output(), b"A");
}

#[test]
fn halting_run_reports_halt_status() {
    let mut b = ProgramBuilder::new(2);
    b.pure("a", &["h", "h", "h"])
        .pure("h", &[])
        .tape(&["a", "a"]);
    let (program, _) = b.build().unwrap();
    let mut system = TagSystem::from_program(program, NoIo).unwrap();

    assert_eq!(system.step(), Ok(StepOutcome::Continue));
    let outcome = system.step().unwrap();
    assert_eq!(outcome, StepOutcome::Halted);
    assert_eq!(outcome.status(), Status::Halt);
    // The halting group is consumed; the trailing "h" stays.
    assert_eq!(system.tape().logical_len(), 1);
    assert_eq!(system.step(), Ok(StepOutcome::Halted));
}

#[test]
fn loader_rejects_malformed_programs() {
    let good = sample_program().encode().unwrap();

    let err = TagProgram::decode(&good[..HEADER_LEN - 1]).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Decode(DecodeError::UnexpectedEof { .. })
    ));
    assert_eq!(err.status(), Status::BadLength);

    let err = TagProgram::decode(&good[..good.len() - 1]).unwrap_err();
    assert!(matches!(err, LoadError::Decode(_)));

    let mut bytes = header(1, 0, 0, 2);
    bytes.extend_from_slice(&good[HEADER_LEN..]);
    assert_eq!(
        TagProgram::decode(&bytes).unwrap_err(),
        LoadError::BadSymbolSize
    );

    let bytes = header(0, 2, 3, 2);
    assert_eq!(
        TagProgram::decode(&bytes).unwrap_err(),
        LoadError::BadLength { rule: None, len: 3 }
    );

    let bytes = header(0, 1, 0, 1);
    let err = TagProgram::decode(&bytes).unwrap_err();
    assert_eq!(err, LoadError::BadDeletionNumber { deletion_number: 1 });
    assert_eq!(err.status(), Status::BadDeletionNumber);

    let mut bytes = good.clone();
    bytes[HEADER_LEN] = 7;
    let err = TagProgram::decode(&bytes).unwrap_err();
    assert_eq!(err, LoadError::BadEnum { rule: 0, tag: 7 });
    assert_eq!(err.status(), Status::BadEnum);
}

#[test]
fn loaded_programs_are_validated_on_construction() {
    let bytes = header(0, 1, 2, 2)
        .into_iter()
        .chain(*b"aa")
        .collect::<Vec<u8>>();
    let program = TagProgram::decode(&bytes).unwrap();
    let err = TagSystem::from_program(program, NoIo).unwrap_err();
    assert_eq!(err, InitError::BadRuleCount);
    assert_eq!(err.status(), Status::BadRuleCount);

    let mut program = sample_program();
    program.rules.push(TagRule::pure(*b"a", *b"a"));
    let bytes = program.encode().unwrap();
    let err = TagSystem::from_program(TagProgram::decode(&bytes).unwrap(), NoIo).unwrap_err();
    assert_eq!(err, InitError::Rule(RuleError::DuplicateRule));
}
