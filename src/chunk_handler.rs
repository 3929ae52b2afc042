//! Chunk handler - keeps a window of resident chunks around the viewport
//!
//! The handler owns the [`ChunkIndex`] and is driven from a single thread.
//! Moving the window evicts and cancels synchronously; fetches run as tokio
//! tasks whose results come back through the [`AsyncBridge`] and are applied
//! when the owning thread drains it.
//!
//! Every outstanding request is tracked by chunk start together with a
//! ticket. A chunk that is already in flight is never requested twice, and a
//! completion whose ticket no longer matches the live request for its chunk
//! (because the chunk was cancelled, possibly re-requested since) is dropped.
//! A fetch completion therefore never marks a chunk resident once the window
//! has moved away from it.

use crate::async_bridge::{AsyncBridge, AsyncMessage};
use crate::byte_data::ByteUnit;
use crate::chunks::ChunkIndex;
use crate::gateway::FetchGateway;
use crate::render::RenderSink;
use crate::window::{BufferOptions, BufferPlan};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// An outstanding request for one chunk
struct InFlight {
    ticket: u64,
    task: JoinHandle<()>,
}

/// Orchestrates buffering, fetching, and decomposition of fetched bytes
pub struct ChunkHandler<S: RenderSink> {
    /// Resident chunk starts
    index: ChunkIndex,

    /// Outstanding requests by chunk start
    in_flight: HashMap<u64, InFlight>,

    /// Ticket handed to the next request
    next_ticket: u64,

    gateway: Arc<dyn FetchGateway>,

    /// Runtime the fetch tasks are spawned on
    runtime: Handle,

    /// Completions coming back from fetch tasks
    bridge: AsyncBridge,

    sink: S,
}

impl<S: RenderSink> ChunkHandler<S> {
    /// Create a handler over chunks of `chunk_size` bytes
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(chunk_size: u64, gateway: Arc<dyn FetchGateway>, runtime: Handle, sink: S) -> Self {
        ChunkHandler {
            index: ChunkIndex::new(chunk_size),
            in_flight: HashMap::new(),
            next_ticket: 0,
            gateway,
            runtime,
            bridge: AsyncBridge::new(),
            sink,
        }
    }

    pub fn chunk_size(&self) -> u64 {
        self.index.chunk_size()
    }

    /// Start of the chunk holding `offset`
    pub fn chunk_start_for(&self, offset: u64) -> u64 {
        self.index.chunk_start_for(offset)
    }

    /// Whether the chunk holding `offset` is resident
    pub fn has_chunk(&self, offset: u64) -> bool {
        self.index.is_resident(offset)
    }

    /// Whether a request for the chunk holding `offset` is outstanding
    pub fn is_pending(&self, offset: u64) -> bool {
        self.in_flight.contains_key(&self.index.chunk_start_for(offset))
    }

    /// Resident chunk starts, ascending
    pub fn resident_chunks(&self) -> Vec<u64> {
        self.index.resident_starts()
    }

    /// Chunk starts with an outstanding request, ascending
    pub fn pending_chunks(&self) -> Vec<u64> {
        let mut starts: Vec<u64> = self.in_flight.keys().copied().collect();
        starts.sort_unstable();
        starts
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// What [`ensure_buffer`](Self::ensure_buffer) would do for these arguments
    ///
    /// Chunks already in flight are left out of `to_fetch`.
    pub fn plan_buffer(&self, offset: u64, options: BufferOptions) -> BufferPlan {
        let mut plan = BufferPlan::compute(&self.index, offset, options);
        plan.to_fetch.retain(|start| !self.in_flight.contains_key(start));
        plan
    }

    /// Make the window around `offset` resident
    ///
    /// Evicts resident chunks outside the window, cancels outstanding
    /// requests outside the window, and requests every missing chunk inside
    /// it. Returns the evicted chunk starts in ascending order.
    pub fn ensure_buffer(&mut self, offset: u64, options: BufferOptions) -> Vec<u64> {
        let plan = self.plan_buffer(offset, options);

        for &start in &plan.to_evict {
            self.index.mark_evicted(start);
        }
        if !plan.to_evict.is_empty() {
            tracing::debug!("evicted {} chunks: {:?}", plan.to_evict.len(), plan.to_evict);
        }

        let cancelled: Vec<u64> = self
            .in_flight
            .keys()
            .copied()
            .filter(|start| !plan.window.contains(start))
            .collect();
        for start in cancelled {
            if let Some(request) = self.in_flight.remove(&start) {
                request.task.abort();
                tracing::debug!("cancelled request for chunk {}", start);
            }
        }

        for &start in &plan.to_fetch {
            self.request_chunk(start);
        }

        plan.to_evict
    }

    /// Spawn a fetch for one chunk
    fn request_chunk(&mut self, chunk_start: u64) {
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let gateway = Arc::clone(&self.gateway);
        let sender = self.bridge.sender();
        let num_elements = self.index.chunk_size() as usize;

        tracing::debug!("requesting chunk {} (ticket {})", chunk_start, ticket);
        let task = self.runtime.spawn(async move {
            let result = gateway.request(chunk_start, num_elements).await;
            // Receiver gone means the handler was dropped
            let _ = sender.send(AsyncMessage::ChunkFetched {
                chunk_start,
                ticket,
                result,
            });
        });

        self.in_flight.insert(chunk_start, InFlight { ticket, task });
    }

    /// Apply a completion from the bridge
    ///
    /// Returns true if the message was applied, false if it was stale.
    pub fn handle_message(&mut self, message: AsyncMessage) -> bool {
        match message {
            AsyncMessage::ChunkFetched {
                chunk_start,
                ticket,
                result,
            } => {
                let live = matches!(
                    self.in_flight.get(&chunk_start),
                    Some(request) if request.ticket == ticket
                );
                if !live {
                    tracing::trace!(
                        "dropping stale response for chunk {} (ticket {})",
                        chunk_start,
                        ticket
                    );
                    return false;
                }
                self.in_flight.remove(&chunk_start);

                match result {
                    Ok(packet) => self.process_chunks(packet.offset, &packet.data),
                    Err(e) => {
                        tracing::debug!("fetch for chunk {} failed: {}", chunk_start, e);
                    }
                }
                true
            }
        }
    }

    /// Apply every completion that has already arrived
    ///
    /// Returns the number of messages that were applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        for message in self.bridge.try_recv_all() {
            if self.handle_message(message) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until no request is outstanding or `timeout` elapses
    ///
    /// Returns true if every request completed in time.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.in_flight.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.bridge.recv_timeout(remaining) {
                Some(message) => {
                    self.handle_message(message);
                }
                None => return false,
            }
        }
        self.process_pending();
        true
    }

    /// Decompose a fetched region into byte units and hand them to the sink
    ///
    /// Every chunk boundary inside the region is marked resident, so a
    /// response spanning several chunks commits all of them. Bytes that
    /// would lie past the largest representable offset are dropped.
    pub fn process_chunks(&mut self, offset: u64, data: &[u8]) {
        let room = (u64::MAX - offset).saturating_add(1);
        let data = match usize::try_from(room) {
            Ok(room) if room < data.len() => &data[..room],
            _ => data,
        };

        for start in self.index.boundaries_in(offset, data.len() as u64) {
            self.index.mark_resident(start);
        }

        let units: Vec<ByteUnit> = data
            .iter()
            .enumerate()
            .map(|(i, byte)| ByteUnit::new(offset + i as u64, *byte))
            .collect();
        self.sink.render(units);
    }
}

impl<S: RenderSink> Drop for ChunkHandler<S> {
    fn drop(&mut self) {
        for (_, request) in self.in_flight.drain() {
            request.task.abort();
        }
    }
}
