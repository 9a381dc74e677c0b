// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owned, growable byte buffers.
//!
//! A [`Blob`] tracks an active length separately from its backing capacity. Capacity only ever
//! grows; every allocation goes through [`try_alloc_zeroed`] so running out of memory is reported
//! as [`BlobError::OutOfMemory`] instead of aborting.

use alloc::vec::Vec;
use core::fmt;

use crate::status::Status;

/// A [`Blob`] operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlobError {
    /// The allocator could not provide the requested buffer.
    OutOfMemory,
    /// A resize asked for fewer bytes than are active.
    Shrink {
        /// The current active length.
        len: usize,
        /// The requested active length.
        requested: usize,
    },
}

impl BlobError {
    /// Returns the flat status code for this error.
    #[must_use]
    pub fn status(self) -> Status {
        match self {
            Self::OutOfMemory => Status::OutOfMemory,
            Self::Shrink { .. } => Status::BadArgument,
        }
    }
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::Shrink { len, requested } => {
                write!(f, "cannot shrink blob from {len} to {requested} bytes")
            }
        }
    }
}

impl core::error::Error for BlobError {}

/// Allocates `len` zeroed bytes, reporting allocator failure instead of aborting.
pub(crate) fn try_alloc_zeroed(len: usize) -> Result<Vec<u8>, BlobError> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| BlobError::OutOfMemory)?;
    out.resize(len, 0);
    Ok(out)
}

/// An owned byte buffer with an active length (`len`) and a capacity.
///
/// Invariant: `len() <= capacity()`. Bytes past the active length are kept but never exposed.
#[derive(Clone, Default)]
pub struct Blob {
    // `data.len()` is the capacity; every byte of it is initialized.
    data: Vec<u8>,
    size: usize,
}

impl Blob {
    /// Creates an empty blob that owns no memory.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            size: 0,
        }
    }

    /// Creates a blob holding a copy of `bytes`.
    ///
    /// An empty slice yields an empty blob without allocating.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BlobError> {
        let mut out = Self::new();
        out.copy_from_slice(bytes)?;
        Ok(out)
    }

    /// Replaces the contents with a copy of `source`.
    ///
    /// Capacity grows only when `source` does not fit; the active length always becomes
    /// `source.len()`.
    pub fn copy_from(&mut self, source: &Self) -> Result<(), BlobError> {
        self.copy_from_slice(source.as_slice())
    }

    /// Replaces the contents with a copy of `bytes`.
    pub fn copy_from_slice(&mut self, bytes: &[u8]) -> Result<(), BlobError> {
        if self.data.len() < bytes.len() {
            self.data = try_alloc_zeroed(bytes.len())?;
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.size = bytes.len();
        Ok(())
    }

    /// Returns an independently owned copy of this blob.
    ///
    /// Unlike [`Clone`], allocation failure is reported. The copy's capacity equals this
    /// blob's active length.
    pub fn duplicate(&self) -> Result<Self, BlobError> {
        Self::from_bytes(self.as_slice())
    }

    /// Grows the active length to `size`.
    ///
    /// Existing active bytes are preserved and the newly active region is zero-filled. A `size`
    /// below the active length is rejected with [`BlobError::Shrink`].
    pub fn resize(&mut self, size: usize) -> Result<(), BlobError> {
        if size < self.size {
            return Err(BlobError::Shrink {
                len: self.size,
                requested: size,
            });
        }
        if self.data.len() < size {
            let mut grown = try_alloc_zeroed(size)?;
            grown[..self.size].copy_from_slice(self.as_slice());
            self.data = grown;
        }
        self.data[self.size..size].fill(0);
        self.size = size;
        Ok(())
    }

    /// Releases the backing memory and resets the blob to empty.
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.size = 0;
    }

    /// Returns the active bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.size]
    }

    /// Returns the active bytes mutably.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[..self.size]
    }

    /// Returns the active length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the active length is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of bytes the blob can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }
}

impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Blob {}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("bytes", &self.as_slice())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_copies_input() {
        let src = [1_u8, 2, 3];
        let b = Blob::from_bytes(&src).unwrap();
        assert_eq!(b.as_slice(), &src);
        assert_eq!(b.len(), 3);
        assert_eq!(b.capacity(), 3);
    }

    #[test]
    fn empty_input_allocates_nothing() {
        let b = Blob::from_bytes(&[]).unwrap();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), 0);
    }

    #[test]
    fn copy_into_smaller_source_keeps_capacity() {
        let mut b = Blob::from_bytes(b"abcdef").unwrap();
        let small = Blob::from_bytes(b"xy").unwrap();
        b.copy_from(&small).unwrap();
        assert_eq!(b.as_slice(), b"xy");
        assert_eq!(b.capacity(), 6);

        let big = Blob::from_bytes(b"0123456789").unwrap();
        b.copy_from(&big).unwrap();
        assert_eq!(b.as_slice(), b"0123456789");
        assert_eq!(b.capacity(), 10);
    }

    #[test]
    fn duplicate_is_independent() {
        let a = Blob::from_bytes(b"tag").unwrap();
        let mut b = a.duplicate().unwrap();
        b.as_mut_slice()[0] = b'b';
        assert_eq!(a.as_slice(), b"tag");
        assert_eq!(b.as_slice(), b"bag");
    }

    #[test]
    fn resize_zero_fills_new_region() {
        let mut b = Blob::from_bytes(&[7, 7]).unwrap();
        b.resize(5).unwrap();
        assert_eq!(b.as_slice(), &[7, 7, 0, 0, 0]);

        // Regrowing into spare capacity must not resurrect stale bytes.
        b.copy_from_slice(&[7]).unwrap();
        assert_eq!(b.capacity(), 5);
        b.resize(5).unwrap();
        assert_eq!(b.as_slice(), &[7, 0, 0, 0, 0]);
    }

    #[test]
    fn resize_rejects_shrinking() {
        let mut b = Blob::from_bytes(b"tape").unwrap();
        let err = b.resize(2).unwrap_err();
        assert_eq!(
            err,
            BlobError::Shrink {
                len: 4,
                requested: 2
            }
        );
        assert_eq!(err.status(), Status::BadArgument);
        assert_eq!(b.as_slice(), b"tape");
        b.resize(4).unwrap();
        assert_eq!(b.as_slice(), b"tape");
    }

    #[test]
    fn release_drops_memory() {
        let mut b = Blob::from_bytes(b"data").unwrap();
        b.release();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), 0);
    }
}
