// Hex viewer library - exposes all core modules for testing

pub mod async_bridge;
pub mod byte_data;
pub mod chunk_handler;
pub mod chunks;
pub mod config;
pub mod document;
pub mod gateway;
pub mod render;
pub mod viewport;
pub mod window;

// Re-export commonly used types
pub use byte_data::{ByteData, ByteUnit};
pub use chunk_handler::ChunkHandler;
pub use config::Config;
pub use document::HexDocument;
pub use gateway::{FetchError, FetchGateway, FileGateway, MemoryGateway, Packet};
pub use render::{HexRows, RenderSink};
pub use window::{BufferOptions, BufferPlan};
