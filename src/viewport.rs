//! Viewport - which rows of the file are on screen
//!
//! Rows are `bytes_per_row` bytes wide. The viewport only does the row and
//! offset arithmetic; scroll events come from the host.

use crate::window::BufferOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    bytes_per_row: usize,
    visible_rows: usize,

    /// First row on screen
    top_row: u64,
}

impl Viewport {
    pub fn new(bytes_per_row: usize, visible_rows: usize) -> Self {
        Viewport {
            bytes_per_row: bytes_per_row.max(1),
            visible_rows,
            top_row: 0,
        }
    }

    pub fn top_row(&self) -> u64 {
        self.top_row
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Offset of the first byte on screen
    pub fn focal_offset(&self) -> u64 {
        self.top_row.saturating_mul(self.bytes_per_row as u64)
    }

    /// Last row that holds any byte of a file of `file_size` bytes
    pub fn last_row(&self, file_size: u64) -> u64 {
        file_size.saturating_sub(1) / self.bytes_per_row as u64
    }

    pub fn scroll_to_row(&mut self, row: u64, file_size: u64) {
        self.top_row = row.min(self.last_row(file_size));
    }

    /// Scroll so the row holding `offset` is at the top
    pub fn scroll_to_offset(&mut self, offset: u64, file_size: u64) {
        self.scroll_to_row(offset / self.bytes_per_row as u64, file_size);
    }

    /// Scroll by `delta` rows, negative is up
    pub fn scroll_by(&mut self, delta: i64, file_size: u64) {
        let row = if delta < 0 {
            self.top_row.saturating_sub(delta.unsigned_abs())
        } else {
            self.top_row.saturating_add(delta as u64)
        };
        self.scroll_to_row(row, file_size);
    }

    pub fn resize(&mut self, visible_rows: usize) {
        self.visible_rows = visible_rows;
    }

    /// Offsets of the rows on screen that hold file bytes
    pub fn visible_row_starts(&self, file_size: u64) -> Vec<u64> {
        let row_len = self.bytes_per_row as u64;
        (0..self.visible_rows as u64)
            .map(|i| (self.top_row + i) * row_len)
            .take_while(|start| *start < file_size)
            .collect()
    }

    /// Buffer options covering the visible rows plus `top` and `bottom`
    /// extra chunks
    pub fn buffer_options(&self, chunk_size: u64, top: usize, bottom: usize) -> BufferOptions {
        let span = (self.visible_rows * self.bytes_per_row) as u64;
        let visible_below = if span == 0 {
            0
        } else {
            ((self.focal_offset() % chunk_size + span - 1) / chunk_size) as usize
        };
        BufferOptions::new(top, bottom + visible_below)
    }
}
