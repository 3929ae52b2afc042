//! Bridge between fetch tasks on the tokio runtime and the owning thread
//!
//! Fetch tasks never touch the chunk index. They post their results here and
//! the thread that owns the handler applies them in the order it drains them.

use crate::gateway::{FetchError, Packet};
use std::sync::mpsc;
use std::time::Duration;

/// Messages sent from async tasks back to the owning thread
#[derive(Debug)]
pub enum AsyncMessage {
    /// A chunk request finished, successfully or not
    ChunkFetched {
        /// Chunk start the request was issued for
        chunk_start: u64,
        /// Ticket of the request, used to recognise stale completions
        ticket: u64,
        result: Result<Packet, FetchError>,
    },
}

/// Channel pair shared by the handler and the tasks it spawns
pub struct AsyncBridge {
    sender: mpsc::Sender<AsyncMessage>,
    receiver: mpsc::Receiver<AsyncMessage>,
}

impl AsyncBridge {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        AsyncBridge { sender, receiver }
    }

    /// Sender to hand to a spawned task
    pub fn sender(&self) -> mpsc::Sender<AsyncMessage> {
        self.sender.clone()
    }

    /// Drain every message that is already queued without blocking
    pub fn try_recv_all(&self) -> Vec<AsyncMessage> {
        self.receiver.try_iter().collect()
    }

    /// Wait up to `timeout` for the next message
    pub fn recv_timeout(&self, timeout: Duration) -> Option<AsyncMessage> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

impl Default for AsyncBridge {
    fn default() -> Self {
        Self::new()
    }
}
