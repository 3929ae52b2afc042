use crate::window::BufferOptions;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Viewer configuration
///
/// Every field has a default, so a config file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Size of a chunk in bytes
    pub chunk_size: u64,

    /// Bytes shown on one row
    pub bytes_per_row: usize,

    /// Rows in the viewport
    pub visible_rows: usize,

    /// Chunks kept above the viewport while scrolling
    pub top_buffer_size: usize,

    /// Chunks kept below the viewport while scrolling
    pub bottom_buffer_size: usize,

    /// Chunks requested below offset 0 when a document is first opened
    pub initial_bottom_buffer_size: usize,

    /// How long the command-line host waits for outstanding fetches
    pub fetch_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chunk_size: 16,
            bytes_per_row: 16,
            visible_rows: 24,
            top_buffer_size: 2,
            bottom_buffer_size: 2,
            initial_bottom_buffer_size: 100,
            fetch_timeout_ms: 2000,
        }
    }
}

impl Config {
    /// Load a JSON config file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.chunk_size > 0, "chunk_size must be greater than zero");
        ensure!(self.bytes_per_row > 0, "bytes_per_row must be greater than zero");
        Ok(())
    }

    /// Buffer used for the first load of a document
    pub fn initial_buffer(&self) -> BufferOptions {
        BufferOptions::new(0, self.initial_bottom_buffer_size)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}
