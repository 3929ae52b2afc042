//! Fetch gateway - the async seam through which file bytes are requested
//!
//! The chunk handler never reads files itself. It asks a [`FetchGateway`]
//! for `num_elements` bytes starting at an offset and treats the offset in
//! the returned [`Packet`] as authoritative.

use async_trait::async_trait;
use std::fmt;
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Bytes returned for a requested region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Absolute offset of the first byte in `data`
    pub offset: u64,
    pub data: Vec<u8>,
}

/// Why a fetch did not produce any bytes
#[derive(Debug)]
pub enum FetchError {
    /// The requested offset lies at or past the end of the file
    OutOfRange { offset: u64, file_size: u64 },

    /// Reading the backing file failed
    Io(io::Error),

    /// The gateway could not serve the request (closed, disconnected, ...)
    Unavailable(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { offset, file_size } => {
                write!(f, "offset {offset} is beyond end of file ({file_size} bytes)")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Unavailable(reason) => write!(f, "gateway unavailable: {reason}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FetchError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Asynchronous request/response channel for file bytes
#[async_trait]
pub trait FetchGateway: Send + Sync {
    /// Fetch up to `num_elements` bytes starting at `initial_offset`
    async fn request(&self, initial_offset: u64, num_elements: usize) -> Result<Packet, FetchError>;

    /// Total size of the file behind this gateway, if known
    fn file_size(&self) -> Option<u64> {
        None
    }
}

/// Length of the payload for a request against a file of `file_size` bytes
fn clamp_request(
    initial_offset: u64,
    num_elements: usize,
    file_size: u64,
) -> Result<usize, FetchError> {
    if initial_offset >= file_size {
        return Err(FetchError::OutOfRange {
            offset: initial_offset,
            file_size,
        });
    }
    let remaining = file_size - initial_offset;
    Ok((num_elements as u64).min(remaining) as usize)
}

/// Serves requests by reading a file on disk
///
/// The file is reopened for every request so that no handle is held while
/// the viewer is idle.
#[derive(Debug, Clone)]
pub struct FileGateway {
    path: PathBuf,
    file_size: u64,
}

impl FileGateway {
    /// Create a gateway for `path`, recording its current size
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        Ok(FileGateway {
            path,
            file_size: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FetchGateway for FileGateway {
    async fn request(
        &self,
        initial_offset: u64,
        num_elements: usize,
    ) -> Result<Packet, FetchError> {
        let len = clamp_request(initial_offset, num_elements, self.file_size)?;

        let mut file = tokio::fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(initial_offset)).await?;

        let mut data = Vec::with_capacity(len);
        file.take(len as u64).read_to_end(&mut data).await?;

        tracing::trace!(
            "read {} bytes at offset {} from {}",
            data.len(),
            initial_offset,
            self.path.display()
        );
        Ok(Packet {
            offset: initial_offset,
            data,
        })
    }

    fn file_size(&self) -> Option<u64> {
        Some(self.file_size)
    }
}

/// Serves requests from bytes already held in memory
#[derive(Debug, Clone)]
pub struct MemoryGateway {
    data: Arc<[u8]>,
}

impl MemoryGateway {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        MemoryGateway { data: data.into() }
    }
}

#[async_trait]
impl FetchGateway for MemoryGateway {
    async fn request(
        &self,
        initial_offset: u64,
        num_elements: usize,
    ) -> Result<Packet, FetchError> {
        let len = clamp_request(initial_offset, num_elements, self.data.len() as u64)?;
        let start = initial_offset as usize;
        Ok(Packet {
            offset: initial_offset,
            data: self.data[start..start + len].to_vec(),
        })
    }

    fn file_size(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}
