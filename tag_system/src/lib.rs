// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `tag_system`: an interpreter for generalized Tag systems over a run-length-compressed tape.
//!
//! A Tag system repeatedly reads the first symbol of its tape, deletes the first
//! `deletion_number` symbols, and appends the production that symbol selects. This crate
//! generalizes the classic model with multi-byte symbols and bit I/O rules, and stores the tape
//! as runs of identical group heads so that long periodic tapes step in one operation per run.
//!
//! - [`system`]: the stepper ([`TagSystem`]).
//! - [`queue`]: the compressed tape ([`TagQueue`]).
//! - [`rule`]: rules and the production table.
//! - [`binary`]: the binary program container.
//! - [`builder`]: building programs from named symbols.
//! - [`bitio`]: bit-level I/O over an embedder-provided byte stream.
//! - [`trace`]: optional event hooks.
//!
//! ## Example
//!
//! ```
//! use tag_system::bitio::NoIo;
//! use tag_system::builder::ProgramBuilder;
//! use tag_system::system::{Fault, Limits, TagSystem};
//! use tag_system::trace::TraceMask;
//!
//! // Collatz sequence from n = 3, encoded as a^n.
//! let mut b = ProgramBuilder::new(2);
//! b.pure("a", &["b", "c"])
//!     .pure("b", &["a"])
//!     .pure("c", &["a", "a", "a"])
//!     .tape(&["a", "a", "a"]);
//! let (program, _symbols) = b.build()?;
//!
//! let mut system = TagSystem::from_program(program, NoIo)?;
//! let fault = system
//!     .run(&Limits::default(), TraceMask::NONE, None)
//!     .unwrap_err();
//! assert_eq!(fault.fault, Fault::OutOfTape);
//! assert_eq!(system.logical_steps(), 24);
//! assert_eq!(system.tape().logical_len(), 1);
//! # Ok::<(), Box<dyn core::error::Error>>(())
//! ```

#![no_std]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod binary;
pub mod bitio;
pub mod blob;
pub mod builder;
pub mod dump;
pub mod format;
pub mod queue;
pub mod ring;
pub mod rule;
pub mod status;
pub mod system;
pub mod trace;

pub use binary::TagProgram;
pub use queue::TagQueue;
pub use rule::{Production, RuleStyle, TagRule};
pub use status::Status;
pub use system::TagSystem;
