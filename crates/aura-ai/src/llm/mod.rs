//! LLM module - streaming chat completion client

mod client;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock_transport;
mod sse;
mod stream;
mod transport;

pub use client::{ChatRequest, Message, Role};
pub use sse::{ParseEvent, StreamFrameParser};
pub use stream::{ChatStreamClient, FragmentStream};
pub use transport::{ByteStream, ChunkTransport, HttpTransport, StreamRequest};
