// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A circular byte buffer.
//!
//! [`RingBuffer`] is the storage substrate of the tape. Bytes are written at `head` and read
//! from `tail`; both cursors wrap at `capacity`. Reads and writes that straddle the end of the
//! backing array are split into two copies.
//!
//! Two capacity policies exist:
//! - [`RingPolicy::Fixed`]: a push that does not fit fails with [`RingError::Full`] and leaves
//!   the ring untouched.
//! - [`RingPolicy::Expandable`]: a push that does not fit first reallocates (see
//!   [`RingBuffer::expand`]).

use alloc::vec::Vec;
use core::fmt;

use crate::blob::try_alloc_zeroed;
use crate::status::Status;

/// Capacity used when a ring is requested with capacity `0`.
pub const MIN_RING_CAPACITY: usize = 0x10;

/// Capacity policy for a [`RingBuffer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RingPolicy {
    /// Pushing beyond capacity fails.
    Fixed,
    /// Pushing beyond capacity grows the ring.
    Expandable,
}

/// A ring buffer operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingError {
    /// A fixed ring has no room for the pushed bytes.
    Full,
    /// The new active size does not fit in `usize`.
    Overflow,
    /// The allocator could not provide a larger ring.
    OutOfMemory,
    /// More bytes were requested than are queued.
    Underflow {
        /// Bytes requested by the caller.
        requested: usize,
        /// Bytes currently queued.
        available: usize,
    },
}

impl RingError {
    /// Returns the flat status code for this error.
    #[must_use]
    pub fn status(self) -> Status {
        match self {
            Self::Full => Status::RingFull,
            Self::Overflow => Status::IntegerOverflow,
            Self::OutOfMemory => Status::OutOfMemory,
            Self::Underflow { .. } => Status::BadLength,
        }
    }
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "ring is full"),
            Self::Overflow => write!(f, "ring size overflow"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::Underflow {
                requested,
                available,
            } => write!(
                f,
                "requested {requested} bytes but only {available} are queued"
            ),
        }
    }
}

impl core::error::Error for RingError {}

/// A FIFO of bytes stored in a circular array.
///
/// Invariants: `head < capacity`, `tail < capacity`, `len() <= capacity()`.
#[derive(Clone)]
pub struct RingBuffer {
    buf: Vec<u8>,
    head: usize,
    tail: usize,
    active: usize,
    policy: RingPolicy,
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("capacity", &self.capacity())
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("len", &self.active)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl RingBuffer {
    /// Creates an empty ring of `capacity` bytes.
    ///
    /// A `capacity` of `0` is raised to [`MIN_RING_CAPACITY`].
    pub fn new(capacity: usize, policy: RingPolicy) -> Result<Self, RingError> {
        let capacity = if capacity == 0 {
            MIN_RING_CAPACITY
        } else {
            capacity
        };
        Ok(Self {
            buf: try_alloc_zeroed(capacity).map_err(|_| RingError::OutOfMemory)?,
            head: 0,
            tail: 0,
            active: 0,
            policy,
        })
    }

    /// Appends `data` at the head of the ring.
    ///
    /// On error the ring is unchanged.
    pub fn push(&mut self, data: &[u8]) -> Result<(), RingError> {
        let new_size = self
            .active
            .checked_add(data.len())
            .ok_or(RingError::Overflow)?;
        if new_size > self.capacity() {
            match self.policy {
                RingPolicy::Fixed => return Err(RingError::Full),
                RingPolicy::Expandable => self.expand(new_size)?,
            }
        }

        let capacity = self.capacity();
        let slack = capacity - self.head;
        if data.len() > slack {
            let (first, second) = data.split_at(slack);
            self.buf[self.head..].copy_from_slice(first);
            self.buf[..second.len()].copy_from_slice(second);
        } else {
            self.buf[self.head..self.head + data.len()].copy_from_slice(data);
        }

        self.head = (self.head + data.len()) % capacity;
        self.active = new_size;
        Ok(())
    }

    /// Copies the oldest `out.len()` bytes into `out` without consuming them.
    pub fn peek(&self, out: &mut [u8]) -> Result<(), RingError> {
        if out.len() > self.active {
            return Err(RingError::Underflow {
                requested: out.len(),
                available: self.active,
            });
        }

        let slack = self.capacity() - self.tail;
        if out.len() > slack {
            let (first, second) = out.split_at_mut(slack);
            first.copy_from_slice(&self.buf[self.tail..]);
            second.copy_from_slice(&self.buf[..second.len()]);
        } else {
            out.copy_from_slice(&self.buf[self.tail..self.tail + out.len()]);
        }
        Ok(())
    }

    /// Copies the oldest `out.len()` bytes into `out` and consumes them.
    pub fn pop(&mut self, out: &mut [u8]) -> Result<(), RingError> {
        self.peek(out)?;
        self.tail = (self.tail + out.len()) % self.capacity();
        self.active -= out.len();
        Ok(())
    }

    /// Reallocates the ring so that it holds at least `min_size` bytes.
    ///
    /// The new capacity is the old capacity tripled (or exactly `min_size` if tripling
    /// overflows), and never less than `min_size`. Queued bytes are moved to the start of the
    /// new array, so afterwards `tail == 0` and `head == len()`.
    pub fn expand(&mut self, min_size: usize) -> Result<(), RingError> {
        let tripled = self.capacity().checked_mul(3).unwrap_or(min_size);
        let capacity = tripled.max(min_size).max(self.active);
        let mut buf = try_alloc_zeroed(capacity).map_err(|_| RingError::OutOfMemory)?;
        self.peek(&mut buf[..self.active])?;

        self.buf = buf;
        self.tail = 0;
        self.head = self.active % capacity;
        Ok(())
    }

    /// Drops all queued bytes without releasing memory.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.active = 0;
    }

    /// Returns the number of queued bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active
    }

    /// Returns `true` if no bytes are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Returns the size of the backing array.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the write cursor.
    #[must_use]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Returns the read cursor.
    #[must_use]
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Returns the capacity policy.
    #[must_use]
    pub fn policy(&self) -> RingPolicy {
        self.policy
    }
}
