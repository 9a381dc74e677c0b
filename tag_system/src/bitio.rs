// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bit-level I/O over an embedder-provided byte stream.
//!
//! The engine exchanges single bits with its environment. [`BitIo`] packs them into bytes,
//! least significant bit first, on top of a [`ByteIo`] supplied by the embedder.

use alloc::vec::Vec;
use core::fmt;

use crate::status::Status;

/// A byte-stream operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoError {
    /// No more input is available.
    Eof,
    /// The stream failed for another reason.
    Failed,
}

impl IoError {
    /// Returns the flat status code for this error.
    #[must_use]
    pub fn status(self) -> Status {
        match self {
            Self::Eof | Self::Failed => Status::Eof,
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eof => write!(f, "end of input"),
            Self::Failed => write!(f, "i/o failure"),
        }
    }
}

impl core::error::Error for IoError {}

/// Byte-oriented I/O supplied by the embedding application.
pub trait ByteIo {
    /// Reads one byte.
    fn get_byte(&mut self) -> Result<u8, IoError>;

    /// Writes one byte.
    fn put_byte(&mut self, byte: u8) -> Result<(), IoError>;
}

impl<T: ByteIo + ?Sized> ByteIo for &mut T {
    fn get_byte(&mut self) -> Result<u8, IoError> {
        (**self).get_byte()
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), IoError> {
        (**self).put_byte(byte)
    }
}

/// A [`ByteIo`] with no input and no output; reads report [`IoError::Eof`], writes fail.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoIo;

impl ByteIo for NoIo {
    fn get_byte(&mut self) -> Result<u8, IoError> {
        Err(IoError::Eof)
    }

    fn put_byte(&mut self, _byte: u8) -> Result<(), IoError> {
        Err(IoError::Failed)
    }
}

/// Packs bits into bytes (LSB first) over a [`ByteIo`].
///
/// `get_bit` calls `get_byte` exactly once per 8 bits consumed; `put_bit` calls `put_byte`
/// exactly once per 8 bits produced. A partially filled output byte is never written.
#[derive(Clone, Debug)]
pub struct BitIo<B> {
    io: B,
    in_byte: u8,
    in_offset: u8,
    out_byte: u8,
    out_offset: u8,
}

impl<B: ByteIo> BitIo<B> {
    /// Wraps a byte stream.
    pub fn new(io: B) -> Self {
        Self {
            io,
            in_byte: 0,
            in_offset: 0,
            out_byte: 0,
            out_offset: 0,
        }
    }

    /// Reads the next input bit.
    ///
    /// Any failure of the underlying read is reported as [`IoError::Eof`]; the read is retried on
    /// the next call.
    pub fn get_bit(&mut self) -> Result<bool, IoError> {
        if self.in_offset == 0 {
            self.in_byte = self.io.get_byte().map_err(|_| IoError::Eof)?;
        }
        let bit = (self.in_byte >> self.in_offset) & 1 != 0;
        self.in_offset = (self.in_offset + 1) % 8;
        Ok(bit)
    }

    /// Writes one output bit, emitting a byte every eighth call.
    pub fn put_bit(&mut self, bit: bool) -> Result<(), IoError> {
        self.out_byte |= u8::from(bit) << self.out_offset;
        self.out_offset += 1;
        if self.out_offset == 8 {
            let byte = core::mem::take(&mut self.out_byte);
            self.out_offset = 0;
            self.io.put_byte(byte)?;
        }
        Ok(())
    }
}

impl<B> BitIo<B> {
    /// Returns the number of bits buffered for the next output byte.
    #[must_use]
    pub fn pending_output_bits(&self) -> u8 {
        self.out_offset
    }

    /// Returns the underlying stream.
    pub fn get_ref(&self) -> &B {
        &self.io
    }

    /// Returns the underlying stream mutably.
    pub fn get_mut(&mut self) -> &mut B {
        &mut self.io
    }

    /// Unwraps the underlying stream, dropping any buffered bits.
    pub fn into_inner(self) -> B {
        self.io
    }
}

/// In-memory [`ByteIo`]: reads from a fixed input buffer and captures output.
#[derive(Clone, Debug, Default)]
pub struct MemoryIo {
    input: Vec<u8>,
    pos: usize,
    output: Vec<u8>,
    output_limit: Option<usize>,
}

impl MemoryIo {
    /// Creates a stream that yields `input` and then reports [`IoError::Eof`].
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Fails writes with [`IoError::Failed`] once `limit` bytes have been captured.
    #[must_use]
    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = Some(limit);
        self
    }

    /// Returns the bytes written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Returns the input bytes not yet read.
    #[must_use]
    pub fn remaining_input(&self) -> &[u8] {
        &self.input[self.pos..]
    }

    /// Consumes the stream, returning the captured output.
    #[must_use]
    pub fn into_output(self) -> Vec<u8> {
        self.output
    }
}

impl ByteIo for MemoryIo {
    fn get_byte(&mut self) -> Result<u8, IoError> {
        let b = *self.input.get(self.pos).ok_or(IoError::Eof)?;
        self.pos += 1;
        Ok(b)
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), IoError> {
        if self.output_limit.is_some_and(|limit| self.output.len() >= limit) {
            return Err(IoError::Failed);
        }
        self.output.try_reserve(1).map_err(|_| IoError::Failed)?;
        self.output.push(byte);
        Ok(())
    }
}

/// [`ByteIo`] over `std::io` streams, such as stdin and stdout.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct StdIo<R, W> {
    reader: R,
    writer: W,
}

#[cfg(feature = "std")]
impl<R: std::io::Read, W: std::io::Write> StdIo<R, W> {
    /// Wraps a reader and a writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<(), IoError> {
        self.writer.flush().map_err(|_| IoError::Failed)
    }

    /// Unwraps the reader and writer.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read, W: std::io::Write> ByteIo for StdIo<R, W> {
    fn get_byte(&mut self) -> Result<u8, IoError> {
        let mut b = [0_u8; 1];
        self.reader.read_exact(&mut b).map_err(|e| match e.kind() {
            std::io::ErrorKind::UnexpectedEof => IoError::Eof,
            _ => IoError::Failed,
        })?;
        Ok(b[0])
    }

    fn put_byte(&mut self, byte: u8) -> Result<(), IoError> {
        self.writer.write_all(&[byte]).map_err(|_| IoError::Failed)
    }
}
