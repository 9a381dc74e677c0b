// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Encoding/decoding primitives for the `tag_system` binary format.
//!
//! Integers are stored in host byte order.

use alloc::vec::Vec;
use core::fmt;

/// A decode error for `tag_system` binary programs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ended unexpectedly.
    UnexpectedEof {
        /// Offset of the read that ran past the end.
        offset: usize,
        /// Bytes the read needed.
        needed: usize,
    },
    /// A length/offset computation overflowed.
    OutOfBounds,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof { offset, needed } => {
                write!(f, "unexpected end of input at {offset} (needed {needed} bytes)")
            }
            Self::OutOfBounds => write!(f, "out of bounds"),
        }
    }
}

impl core::error::Error for DecodeError {}

/// A simple byte reader with bounds checks.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader over `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Returns the current cursor offset.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or(DecodeError::OutOfBounds)?;
        let slice = self
            .bytes
            .get(self.offset..end)
            .ok_or(DecodeError::UnexpectedEof {
                offset: self.offset,
                needed: len,
            })?;
        self.offset = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0_u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads a `u8`.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a host-endian `u16`.
    pub fn read_u16_ne(&mut self) -> Result<u16, DecodeError> {
        self.take_array().map(u16::from_ne_bytes)
    }

    /// Reads a host-endian `u32`.
    pub fn read_u32_ne(&mut self) -> Result<u32, DecodeError> {
        self.take_array().map(u32::from_ne_bytes)
    }

    /// Reads a host-endian `u64`.
    pub fn read_u64_ne(&mut self) -> Result<u64, DecodeError> {
        self.take_array().map(u64::from_ne_bytes)
    }

    /// Reads `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        self.take(len)
    }
}

/// A simple byte writer.
#[derive(Clone, Debug, Default)]
pub struct Writer {
    bytes: Vec<u8>,
}

impl Writer {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Consumes the writer and returns the underlying byte buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    /// Appends a `u8`.
    pub fn write_u8(&mut self, v: u8) {
        self.bytes.push(v);
    }

    /// Appends a host-endian `u16`.
    pub fn write_u16_ne(&mut self, v: u16) {
        self.bytes.extend_from_slice(&v.to_ne_bytes());
    }

    /// Appends a host-endian `u32`.
    pub fn write_u32_ne(&mut self, v: u32) {
        self.bytes.extend_from_slice(&v.to_ne_bytes());
    }

    /// Appends a host-endian `u64`.
    pub fn write_u64_ne(&mut self, v: u64) {
        self.bytes.extend_from_slice(&v.to_ne_bytes());
    }

    /// Appends raw bytes.
    pub fn write_bytes(&mut self, b: &[u8]) {
        self.bytes.extend_from_slice(b);
    }
}
