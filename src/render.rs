//! Render sinks - consumers of decomposed fetch responses

use crate::byte_data::{ByteData, ByteUnit};
use std::collections::BTreeMap;

/// Receives byte units for display
///
/// Units may arrive out of offset order and for regions the viewport no
/// longer wants.
pub trait RenderSink {
    fn render(&mut self, units: Vec<ByteUnit>);
}

/// Collects every rendered batch, mostly useful for tests and tooling
impl RenderSink for Vec<Vec<ByteUnit>> {
    fn render(&mut self, units: Vec<ByteUnit>) {
        self.push(units);
    }
}

/// Sink that keeps rendered bytes by offset and formats them as hex rows
#[derive(Debug, Default, Clone)]
pub struct HexRows {
    bytes: BTreeMap<u64, ByteData>,
}

impl HexRows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, offset: u64) -> Option<ByteData> {
        self.bytes.get(&offset).copied()
    }

    /// Number of bytes currently held
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Drop the bytes of every chunk in `chunk_starts`
    pub fn forget_chunks(&mut self, chunk_starts: &[u64], chunk_size: u64) {
        for &start in chunk_starts {
            let end = start.saturating_add(chunk_size);
            let doomed: Vec<u64> = self.bytes.range(start..end).map(|(k, _)| *k).collect();
            for offset in doomed {
                self.bytes.remove(&offset);
            }
        }
    }

    /// Format the row starting at `row_start`
    ///
    /// Returns `None` when the row lies entirely past `file_size`. Bytes that
    /// have not been rendered yet show as `..` in the hex column and a space
    /// in the ASCII column.
    pub fn format_row(
        &self,
        row_start: u64,
        bytes_per_row: usize,
        file_size: u64,
    ) -> Option<String> {
        if row_start >= file_size {
            return None;
        }

        let mut hex = String::with_capacity(bytes_per_row * 3);
        let mut ascii = String::with_capacity(bytes_per_row);
        for i in 0..bytes_per_row as u64 {
            let offset = row_start + i;
            if i > 0 {
                hex.push(' ');
            }
            if offset >= file_size {
                hex.push_str("  ");
                continue;
            }
            match self.get(offset) {
                Some(byte) => {
                    hex.push_str(&byte.to_hex());
                    ascii.push(byte.to_ascii());
                }
                None => {
                    hex.push_str("..");
                    ascii.push(' ');
                }
            }
        }

        Some(format!("{:08x}  {}  |{}|", row_start, hex, ascii))
    }
}

impl RenderSink for HexRows {
    fn render(&mut self, units: Vec<ByteUnit>) {
        for unit in units {
            self.bytes.insert(unit.offset, unit.data);
        }
    }
}
