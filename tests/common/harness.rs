//! Test harness driving a chunk handler against a scripted gateway

use async_trait::async_trait;
use hexview::{BufferOptions, ByteUnit, ChunkHandler, FetchError, FetchGateway, Packet};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tokio::sync::Semaphore;

/// How long tests wait for fetches before giving up
pub const WAIT: Duration = Duration::from_secs(5);

/// Gateway serving an in-memory file, recording every request
///
/// Offsets in `failing` are rejected. When gated, each request waits for a
/// permit released by the test before answering.
pub struct ScriptedGateway {
    data: Vec<u8>,
    requests: Mutex<Vec<(u64, usize)>>,
    failing: Mutex<HashSet<u64>>,
    gate: Option<Semaphore>,
}

impl ScriptedGateway {
    pub fn new(data: Vec<u8>) -> Self {
        ScriptedGateway {
            data,
            requests: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            gate: None,
        }
    }

    pub fn gated(data: Vec<u8>) -> Self {
        ScriptedGateway {
            gate: Some(Semaphore::new(0)),
            ..Self::new(data)
        }
    }

    /// Requested offsets in ascending order
    pub fn requested_offsets(&self) -> Vec<u64> {
        let mut offsets: Vec<u64> = self.requests.lock().unwrap().iter().map(|(o, _)| *o).collect();
        offsets.sort_unstable();
        offsets
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<(u64, usize)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fail_at(&self, offset: u64) {
        self.failing.lock().unwrap().insert(offset);
    }

    pub fn heal(&self, offset: u64) {
        self.failing.lock().unwrap().remove(&offset);
    }

    /// Let `n` gated requests answer
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }
}

#[async_trait]
impl FetchGateway for ScriptedGateway {
    async fn request(
        &self,
        initial_offset: u64,
        num_elements: usize,
    ) -> Result<Packet, FetchError> {
        self.requests.lock().unwrap().push((initial_offset, num_elements));

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| FetchError::Unavailable(e.to_string()))?
                .forget();
        }

        if self.failing.lock().unwrap().contains(&initial_offset) {
            return Err(FetchError::Unavailable(format!("scripted failure at {}", initial_offset)));
        }

        let file_size = self.data.len() as u64;
        if initial_offset >= file_size {
            return Err(FetchError::OutOfRange {
                offset: initial_offset,
                file_size,
            });
        }
        let start = initial_offset as usize;
        let end = (start + num_elements).min(self.data.len());
        Ok(Packet {
            offset: initial_offset,
            data: self.data[start..end].to_vec(),
        })
    }

    fn file_size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

/// Bytes `0, 1, 2, ...` wrapping at 256
pub fn sample_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 256) as u8).collect()
}

pub struct HandlerHarness {
    // Dropped before the runtime so outstanding tasks are aborted first
    pub handler: ChunkHandler<Vec<Vec<ByteUnit>>>,
    pub gateway: Arc<ScriptedGateway>,
    _runtime: Runtime,
}

impl HandlerHarness {
    pub fn new(chunk_size: u64, data: Vec<u8>) -> Self {
        Self::with_gateway(chunk_size, ScriptedGateway::new(data))
    }

    pub fn gated(chunk_size: u64, data: Vec<u8>) -> Self {
        Self::with_gateway(chunk_size, ScriptedGateway::gated(data))
    }

    fn with_gateway(chunk_size: u64, gateway: ScriptedGateway) -> Self {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        let gateway = Arc::new(gateway);
        let handler = ChunkHandler::new(
            chunk_size,
            gateway.clone(),
            runtime.handle().clone(),
            Vec::new(),
        );
        HandlerHarness {
            handler,
            gateway,
            _runtime: runtime,
        }
    }

    pub fn ensure_buffer(&mut self, offset: u64, top: usize, bottom: usize) -> Vec<u64> {
        self.handler.ensure_buffer(offset, BufferOptions::new(top, bottom))
    }

    pub fn wait_idle(&mut self) {
        assert!(self.handler.wait_until_idle(WAIT), "fetches did not complete in time");
    }

    /// Wait until the gateway has seen `n` requests
    pub fn wait_for_requests(&self, n: usize) {
        let deadline = Instant::now() + WAIT;
        while self.gateway.request_count() < n {
            assert!(Instant::now() < deadline, "gateway never saw {} requests", n);
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    /// Offsets of every rendered unit, in delivery order
    pub fn rendered_offsets(&self) -> Vec<u64> {
        self.handler
            .sink()
            .iter()
            .flat_map(|batch| batch.iter().map(|unit| unit.offset))
            .collect()
    }
}
