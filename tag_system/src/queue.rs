// Copyright 2026 the Tag System Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The run-length-compressed tape.
//!
//! A Tag system only ever reads the first symbol of each group of `deletion_number` symbols;
//! the rest of the group is deleted unread. [`TagQueue`] therefore stores the tape as a FIFO of
//! [`Run`]s, each standing for `count` consecutive groups that all start with the same symbol,
//! and never materializes the individual symbols.
//!
//! The newest, possibly incomplete, run lives in a single cache entry that counts raw symbols.
//! Pushing symbols that extend the cached run only bumps its counter; a different group head or
//! a counter overflow flushes the complete groups into the FIFO. A residue of fewer than
//! `deletion_number` symbols (an incomplete group) always stays in the cache.
//!
//! Logical tape = for each FIFO run, `count * deletion_number` symbols headed by `symbol`,
//! followed by the cache's `raw_count` symbols.
//!
//! FIFO runs are stored by value in an expandable [`RingBuffer`], one fixed-size record each:
//! the count as a native-endian `u64` followed by the symbol bytes.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::blob::{BlobError, try_alloc_zeroed};
use crate::ring::{MIN_RING_CAPACITY, RingBuffer, RingError, RingPolicy};
use crate::status::Status;

const COUNT_BYTES: usize = size_of::<u64>();

/// A batch of `count` groups that all begin with `symbol`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    /// The group-head symbol (`symbol_size` bytes).
    pub symbol: Box<[u8]>,
    /// Number of groups in the batch. Each group is `deletion_number` symbols long.
    pub count: u64,
}

/// A [`TagQueue`] operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueError {
    /// The tape does not hold a complete group to pop.
    TooSmall,
    /// Size arithmetic overflowed.
    Overflow,
    /// An allocation failed.
    OutOfMemory,
    /// An appendant was empty or not a multiple of the symbol size.
    BadLength {
        /// Appendant length in bytes.
        len: usize,
        /// Symbol size in bytes.
        symbol_size: u32,
    },
    /// A push asked for zero repetitions.
    ZeroRepetitions,
    /// The deletion number was below `2` or the symbol size was `0`.
    BadArgument,
    /// The run storage failed.
    Ring(RingError),
}

impl QueueError {
    /// Returns the flat status code for this error.
    #[must_use]
    pub fn status(self) -> Status {
        match self {
            Self::TooSmall => Status::QueueTooSmall,
            Self::Overflow => Status::IntegerOverflow,
            Self::OutOfMemory => Status::OutOfMemory,
            Self::BadLength { .. } => Status::BadLength,
            Self::ZeroRepetitions | Self::BadArgument => Status::BadArgument,
            Self::Ring(e) => e.status(),
        }
    }
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooSmall => write!(f, "queue too small"),
            Self::Overflow => write!(f, "queue size overflow"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::BadLength { len, symbol_size } => write!(
                f,
                "appendant of {len} bytes is not a nonzero multiple of symbol size {symbol_size}"
            ),
            Self::ZeroRepetitions => write!(f, "push requires at least one repetition"),
            Self::BadArgument => write!(f, "invalid deletion number or symbol size"),
            Self::Ring(e) => write!(f, "run storage: {e}"),
        }
    }
}

impl core::error::Error for QueueError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Ring(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RingError> for QueueError {
    fn from(e: RingError) -> Self {
        match e {
            RingError::OutOfMemory => Self::OutOfMemory,
            RingError::Overflow => Self::Overflow,
            e => Self::Ring(e),
        }
    }
}

impl From<BlobError> for QueueError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::OutOfMemory => Self::OutOfMemory,
            BlobError::Shrink { .. } => Self::BadArgument,
        }
    }
}

#[derive(Clone, Debug)]
struct CachedRun {
    symbol: Box<[u8]>,
    // Raw symbols, not groups.
    raw_count: u64,
}

/// The run-length-compressed tape of a Tag system.
#[derive(Clone)]
pub struct TagQueue {
    deletion_number: u32,
    symbol_size: u32,
    runs: RingBuffer,
    // Sum of `count` over the FIFO runs.
    queued_groups: u128,
    // Scratch space for one run record.
    record: Vec<u8>,
    cache: Option<CachedRun>,
}

impl fmt::Debug for TagQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagQueue")
            .field("deletion_number", &self.deletion_number)
            .field("symbol_size", &self.symbol_size)
            .field("queued_runs", &self.queued_runs())
            .field("queued_groups", &self.queued_groups)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn boxed_symbol(bytes: &[u8]) -> Result<Box<[u8]>, QueueError> {
    let mut out = try_alloc_zeroed(bytes.len())?;
    out.copy_from_slice(bytes);
    Ok(out.into_boxed_slice())
}

fn record_count(record: &[u8]) -> u64 {
    let mut raw = [0_u8; COUNT_BYTES];
    raw.copy_from_slice(&record[..COUNT_BYTES]);
    u64::from_ne_bytes(raw)
}

impl TagQueue {
    /// Creates an empty tape.
    ///
    /// `deletion_number` must be at least `2` and `symbol_size` nonzero.
    pub fn new(deletion_number: u32, symbol_size: u32) -> Result<Self, QueueError> {
        if deletion_number < 2 || symbol_size == 0 {
            return Err(QueueError::BadArgument);
        }
        let record_len = usize::try_from(symbol_size)
            .ok()
            .and_then(|s| s.checked_add(COUNT_BYTES))
            .ok_or(QueueError::Overflow)?;
        // Sized for one record; the ring triples as runs arrive.
        Ok(Self {
            deletion_number,
            symbol_size,
            runs: RingBuffer::new(record_len.max(MIN_RING_CAPACITY), RingPolicy::Expandable)?,
            queued_groups: 0,
            record: try_alloc_zeroed(record_len)?,
            cache: None,
        })
    }

    /// Appends `repetitions` back-to-back copies of `appendant` to the tape.
    ///
    /// `appendant` must be a nonzero multiple of the symbol size and `repetitions` at least `1`.
    pub fn push(&mut self, appendant: &[u8], repetitions: u64) -> Result<(), QueueError> {
        let symbol_size = self.symbol_size_usize();
        if appendant.is_empty() || appendant.len() % symbol_size != 0 {
            return Err(QueueError::BadLength {
                len: appendant.len(),
                symbol_size: self.symbol_size,
            });
        }
        if repetitions == 0 {
            return Err(QueueError::ZeroRepetitions);
        }

        for _ in 0..repetitions {
            self.push_appendant(appendant)?;
        }
        Ok(())
    }

    /// Removes the oldest run from the tape.
    ///
    /// Queued runs are returned whole. When only the cache remains, its complete groups are
    /// returned and any incomplete residue stays behind. Fails with [`QueueError::TooSmall`] if
    /// not even one complete group is available.
    pub fn pop(&mut self) -> Result<Run, QueueError> {
        if !self.runs.is_empty() {
            // Allocate before consuming the record so an allocation failure leaves the tape intact.
            let mut symbol = try_alloc_zeroed(self.symbol_size_usize())?.into_boxed_slice();
            self.runs.pop(&mut self.record)?;
            symbol.copy_from_slice(&self.record[COUNT_BYTES..]);
            let count = record_count(&self.record);
            self.queued_groups -= u128::from(count);
            return Ok(Run { symbol, count });
        }

        let deletion_number = u64::from(self.deletion_number);
        match self.cache.take() {
            Some(cache) if cache.raw_count >= deletion_number => {
                let count = cache.raw_count / deletion_number;
                let residue = cache.raw_count % deletion_number;
                if residue == 0 {
                    return Ok(Run {
                        symbol: cache.symbol,
                        count,
                    });
                }
                match boxed_symbol(&cache.symbol) {
                    Ok(symbol) => {
                        self.cache = Some(CachedRun {
                            symbol: cache.symbol,
                            raw_count: residue,
                        });
                        Ok(Run { symbol, count })
                    }
                    Err(e) => {
                        self.cache = Some(cache);
                        Err(e)
                    }
                }
            }
            cache => {
                self.cache = cache;
                Err(QueueError::TooSmall)
            }
        }
    }

    /// Returns a snapshot of the queued runs, oldest first, without mutating the tape.
    ///
    /// The cache is not included; see [`TagQueue::cached`].
    pub fn runs(&self) -> Result<Vec<Run>, QueueError> {
        let mut bytes = try_alloc_zeroed(self.runs.len())?;
        self.runs.peek(&mut bytes)?;

        let mut out = Vec::new();
        out.try_reserve_exact(self.queued_runs())
            .map_err(|_| QueueError::OutOfMemory)?;
        for record in bytes.chunks_exact(self.record.len()) {
            out.push(Run {
                symbol: boxed_symbol(&record[COUNT_BYTES..])?,
                count: record_count(record),
            });
        }
        Ok(out)
    }

    /// Returns the cached symbol and its raw symbol count, if the cache is occupied.
    #[must_use]
    pub fn cached(&self) -> Option<(&[u8], u64)> {
        self.cache.as_ref().map(|c| (&*c.symbol, c.raw_count))
    }

    /// Returns the number of runs in the FIFO (the cache is not counted).
    #[must_use]
    pub fn queued_runs(&self) -> usize {
        self.runs.len() / self.record.len()
    }

    /// Returns the logical tape length in symbols.
    ///
    /// Saturates at `u128::MAX`.
    #[must_use]
    pub fn logical_len(&self) -> u128 {
        let raw = self.cache.as_ref().map_or(0, |c| c.raw_count);
        self.queued_groups
            .saturating_mul(u128::from(self.deletion_number))
            .saturating_add(u128::from(raw))
    }

    /// Returns `true` if a [`TagQueue::pop`] would succeed.
    #[must_use]
    pub fn can_pop(&self) -> bool {
        !self.runs.is_empty()
            || self
                .cache
                .as_ref()
                .is_some_and(|c| c.raw_count >= u64::from(self.deletion_number))
    }

    /// Returns `true` if the tape holds no symbols at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty() && self.cache.is_none()
    }

    /// Drops every symbol on the tape.
    pub fn clear(&mut self) {
        self.runs.clear();
        self.queued_groups = 0;
        self.cache = None;
    }

    /// Returns the number of symbols deleted per step.
    #[must_use]
    pub fn deletion_number(&self) -> u32 {
        self.deletion_number
    }

    /// Returns the symbol width in bytes.
    #[must_use]
    pub fn symbol_size(&self) -> u32 {
        self.symbol_size
    }

    fn symbol_size_usize(&self) -> usize {
        // `new` verified that the record length (symbol size + 8) fits in `usize`.
        self.record.len() - COUNT_BYTES
    }

    fn push_appendant(&mut self, appendant: &[u8]) -> Result<(), QueueError> {
        let deletion_number = u64::from(self.deletion_number);
        let symbol_size = self.symbol_size_usize();
        let symbol_count =
            u64::try_from(appendant.len() / symbol_size).map_err(|_| QueueError::Overflow)?;

        // Leading symbols complete the cache's unfinished group; their values are never read.
        let fill = loop {
            let raw = self.cache.as_ref().map_or(0, |c| c.raw_count);
            let residue = raw % deletion_number;
            let fill = symbol_count.min((deletion_number - residue) % deletion_number);
            match raw.checked_add(fill) {
                Some(total) => {
                    if let Some(cache) = self.cache.as_mut() {
                        cache.raw_count = total;
                    }
                    break fill;
                }
                // Only reachable with a residue, so the flush keeps the cache and the retry fits.
                None => self.flush()?,
            }
        };

        let mut i = fill;
        while i < symbol_count {
            let group = (symbol_count - i).min(deletion_number);
            let offset = usize::try_from(i)
                .ok()
                .and_then(|i| i.checked_mul(symbol_size))
                .ok_or(QueueError::Overflow)?;
            self.push_group(&appendant[offset..offset + symbol_size], group)?;
            i = i.saturating_add(deletion_number);
        }
        Ok(())
    }

    /// Adds a group of `len` symbols headed by `symbol`. Called on group boundaries only.
    fn push_group(&mut self, symbol: &[u8], len: u64) -> Result<(), QueueError> {
        debug_assert!(
            self.cache
                .as_ref()
                .is_none_or(|c| c.raw_count % u64::from(self.deletion_number) == 0),
            "push_group called off a group boundary"
        );

        if let Some(cache) = self.cache.as_mut()
            && *cache.symbol == *symbol
            && let Some(total) = cache.raw_count.checked_add(len)
        {
            cache.raw_count = total;
            return Ok(());
        }

        // Stale or saturated: on a boundary the flush empties the cache completely.
        self.flush()?;
        self.cache = Some(CachedRun {
            symbol: boxed_symbol(symbol)?,
            raw_count: len,
        });
        Ok(())
    }

    /// Moves the cache's complete groups into the FIFO, keeping any residue cached.
    fn flush(&mut self) -> Result<(), QueueError> {
        let Some(mut cache) = self.cache.take() else {
            return Ok(());
        };
        let deletion_number = u64::from(self.deletion_number);
        let count = cache.raw_count / deletion_number;
        if count > 0
            && let Err(e) = self.write_run(&cache.symbol, count)
        {
            self.cache = Some(cache);
            return Err(e);
        }
        cache.raw_count %= deletion_number;
        if cache.raw_count != 0 {
            self.cache = Some(cache);
        }
        Ok(())
    }

    fn write_run(&mut self, symbol: &[u8], count: u64) -> Result<(), QueueError> {
        self.record[..COUNT_BYTES].copy_from_slice(&count.to_ne_bytes());
        self.record[COUNT_BYTES..].copy_from_slice(symbol);
        self.runs.push(&self.record)?;
        self.queued_groups += u128::from(count);
        Ok(())
    }
}
