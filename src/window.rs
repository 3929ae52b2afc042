//! Buffer window computation
//!
//! The window around a focal chunk is a set of chunk starts rather than a
//! range, so a far jump and a one-row scroll reconcile through the same
//! set difference.

use crate::chunks::ChunkIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How many chunks above and below the focal chunk should stay resident
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferOptions {
    pub top_buffer_size: usize,
    pub bottom_buffer_size: usize,
}

impl BufferOptions {
    pub fn new(top_buffer_size: usize, bottom_buffer_size: usize) -> Self {
        BufferOptions {
            top_buffer_size,
            bottom_buffer_size,
        }
    }
}

/// Chunk starts that should be resident around `offset`
///
/// The focal chunk is always included. Chunks above are clamped to zero, so
/// several of them may collapse onto chunk 0. Chunks below are not clamped
/// to the file; the fetch gateway is the authority on where it ends. They
/// stop at the last chunk start representable as an offset.
pub fn desired_window(index: &ChunkIndex, offset: u64, options: BufferOptions) -> BTreeSet<u64> {
    let chunk_size = index.chunk_size();
    let focal = index.chunk_start_for(offset);

    let mut window = BTreeSet::new();
    window.insert(focal);
    for i in 1..=options.top_buffer_size as u64 {
        window.insert(focal.saturating_sub(i.saturating_mul(chunk_size)));
    }
    for i in 1..=options.bottom_buffer_size as u64 {
        let Some(start) = i.checked_mul(chunk_size).and_then(|d| focal.checked_add(d)) else {
            break;
        };
        window.insert(start);
    }
    window
}

/// Result of reconciling a desired window against the resident set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferPlan {
    /// Every chunk start the window wants, resident or not
    pub window: BTreeSet<u64>,

    /// Desired chunk starts that are not resident, ascending
    pub to_fetch: Vec<u64>,

    /// Resident chunk starts outside the desired window, ascending
    pub to_evict: Vec<u64>,
}

impl BufferPlan {
    /// Compute the plan for moving the window to `offset`
    pub fn compute(index: &ChunkIndex, offset: u64, options: BufferOptions) -> Self {
        let window = desired_window(index, offset, options);

        let to_fetch = window
            .iter()
            .copied()
            .filter(|start| !index.contains_start(*start))
            .collect();
        let to_evict = index
            .resident_starts()
            .into_iter()
            .filter(|start| !window.contains(start))
            .collect();

        BufferPlan {
            window,
            to_fetch,
            to_evict,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_fetch.is_empty() && self.to_evict.is_empty()
    }
}
