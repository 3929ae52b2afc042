//! An open file: chunk handler, viewport, and rendered rows together
//!
//! One `HexDocument` is constructed per opened file and passed to whatever
//! drives it; there is no process-wide state.

use crate::chunk_handler::ChunkHandler;
use crate::config::Config;
use crate::gateway::{FetchGateway, FileGateway};
use crate::render::HexRows;
use crate::viewport::Viewport;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;

pub struct HexDocument {
    /// File backing the document, if it was opened from disk
    path: Option<PathBuf>,

    file_size: u64,

    config: Config,

    viewport: Viewport,

    handler: ChunkHandler<HexRows>,
}

impl HexDocument {
    /// Open a file on disk
    pub fn open(path: &Path, config: Config, runtime: Handle) -> anyhow::Result<Self> {
        let gateway = FileGateway::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let file_size = gateway.file_size().unwrap_or(0);
        tracing::debug!("opened {} ({} bytes)", path.display(), file_size);

        let mut document = Self::with_gateway(Arc::new(gateway), file_size, config, runtime)?;
        document.path = Some(path.to_path_buf());
        Ok(document)
    }

    /// Build a document over any gateway serving `file_size` bytes
    pub fn with_gateway(
        gateway: Arc<dyn FetchGateway>,
        file_size: u64,
        config: Config,
        runtime: Handle,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let viewport = Viewport::new(config.bytes_per_row, config.visible_rows);
        let handler = ChunkHandler::new(config.chunk_size, gateway, runtime, HexRows::new());

        Ok(HexDocument {
            path: None,
            file_size,
            config,
            viewport,
            handler,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn handler(&self) -> &ChunkHandler<HexRows> {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut ChunkHandler<HexRows> {
        &mut self.handler
    }

    /// First load: buffer from offset 0 downwards
    ///
    /// Returns the evicted chunk starts, which is empty for a fresh document.
    pub fn init(&mut self) -> Vec<u64> {
        if self.file_size == 0 {
            return Vec::new();
        }
        let evicted = self.handler.ensure_buffer(0, self.config.initial_buffer());
        self.forget(&evicted);
        evicted
    }

    pub fn scroll_to_row(&mut self, row: u64) -> Vec<u64> {
        self.viewport.scroll_to_row(row, self.file_size);
        self.refresh()
    }

    pub fn scroll_to_offset(&mut self, offset: u64) -> Vec<u64> {
        self.viewport.scroll_to_offset(offset, self.file_size);
        self.refresh()
    }

    pub fn scroll_by(&mut self, delta: i64) -> Vec<u64> {
        self.viewport.scroll_by(delta, self.file_size);
        self.refresh()
    }

    pub fn resize(&mut self, visible_rows: usize) -> Vec<u64> {
        self.viewport.resize(visible_rows);
        self.refresh()
    }

    /// Recompute the buffer around the viewport
    fn refresh(&mut self) -> Vec<u64> {
        if self.file_size == 0 {
            return Vec::new();
        }
        let options = self.viewport.buffer_options(
            self.config.chunk_size,
            self.config.top_buffer_size,
            self.config.bottom_buffer_size,
        );
        let evicted = self.handler.ensure_buffer(self.viewport.focal_offset(), options);
        self.forget(&evicted);
        evicted
    }

    fn forget(&mut self, evicted: &[u64]) {
        let chunk_size = self.handler.chunk_size();
        self.handler.sink_mut().forget_chunks(evicted, chunk_size);
    }

    /// Apply fetch completions that have already arrived
    pub fn process_pending(&mut self) -> usize {
        self.handler.process_pending()
    }

    /// Wait for outstanding fetches, up to the configured timeout
    pub fn wait_until_idle(&mut self) -> bool {
        let timeout = self.config.fetch_timeout();
        self.handler.wait_until_idle(timeout)
    }

    /// Formatted rows currently on screen
    pub fn visible_lines(&self) -> Vec<String> {
        self.viewport
            .visible_row_starts(self.file_size)
            .into_iter()
            .filter_map(|start| {
                self.handler
                    .sink()
                    .format_row(start, self.viewport.bytes_per_row(), self.file_size)
            })
            .collect()
    }
}
