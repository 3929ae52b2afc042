//! Chunk index - which fixed-size regions of the file are currently resident
//!
//! A chunk is identified only by its starting offset, which is always a
//! multiple of the chunk size. The index stores presence, never contents.

use std::collections::HashSet;

/// Set of resident chunk starts for a file split into `chunk_size` regions
#[derive(Debug, Clone)]
pub struct ChunkIndex {
    /// Size of every chunk in bytes, fixed at construction
    chunk_size: u64,

    /// Starting offsets of the chunks whose bytes have been confirmed
    resident: HashSet<u64>,
}

impl ChunkIndex {
    /// Create an empty index over chunks of `chunk_size` bytes
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(chunk_size: u64) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        ChunkIndex {
            chunk_size,
            resident: HashSet::new(),
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Start of the chunk holding `offset`
    pub fn chunk_start_for(&self, offset: u64) -> u64 {
        (offset / self.chunk_size) * self.chunk_size
    }

    /// Whether `offset` falls exactly on a chunk boundary
    pub fn is_boundary(&self, offset: u64) -> bool {
        offset % self.chunk_size == 0
    }

    /// Whether the chunk holding `offset` is resident
    pub fn is_resident(&self, offset: u64) -> bool {
        self.resident.contains(&self.chunk_start_for(offset))
    }

    /// Whether `chunk_start` itself is a member of the resident set
    pub fn contains_start(&self, chunk_start: u64) -> bool {
        self.resident.contains(&chunk_start)
    }

    pub fn mark_resident(&mut self, chunk_start: u64) {
        self.resident.insert(chunk_start);
    }

    pub fn mark_evicted(&mut self, chunk_start: u64) {
        self.resident.remove(&chunk_start);
    }

    /// Resident chunk starts in ascending order
    pub fn resident_starts(&self) -> Vec<u64> {
        let mut starts: Vec<u64> = self.resident.iter().copied().collect();
        starts.sort_unstable();
        starts
    }

    pub fn len(&self) -> usize {
        self.resident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    /// Chunk boundaries covered by the region `[offset, offset + len)`
    ///
    /// The region is cut off at the largest representable offset.
    pub fn boundaries_in(&self, offset: u64, len: u64) -> impl Iterator<Item = u64> {
        let chunk_size = self.chunk_size;
        let last = len.checked_sub(1).map(|n| offset.saturating_add(n));
        let first = last.and_then(|_| offset.div_ceil(chunk_size).checked_mul(chunk_size));
        std::iter::successors(first, move |start| start.checked_add(chunk_size))
            .take_while(move |start| last.is_some_and(|last| *start <= last))
    }
}
