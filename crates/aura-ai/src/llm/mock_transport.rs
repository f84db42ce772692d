//! Deterministic in-memory transport for chunk-boundary and cancellation tests.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use tokio::sync::Mutex;

use crate::error::{AiError, Result};

use super::transport::{ByteStream, ChunkTransport, StreamRequest};

/// One scripted delivery on a connection.
#[derive(Debug, Clone)]
pub enum ScriptedChunk {
    /// Deliver these bytes.
    Data(Bytes),
    /// Fail the connection mid-stream.
    Error(String),
    /// Never deliver anything again until the stream is dropped.
    Hang,
}

impl ScriptedChunk {
    pub fn data(bytes: impl Into<Bytes>) -> Self {
        Self::Data(bytes.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

#[derive(Debug, Default)]
struct TransportStats {
    connects: AtomicUsize,
    closes: AtomicUsize,
}

/// Scripted response for one `connect` call.
type ScriptedResponse = std::result::Result<Vec<ScriptedChunk>, String>;

/// A transport that replays scripted chunks, one script per connection.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<ScriptedResponse>>>,
    requests: Arc<Mutex<Vec<StreamRequest>>>,
    stats: Arc<TransportStats>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport whose first connection replays `chunks`.
    pub fn from_chunks(chunks: Vec<ScriptedChunk>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from([Ok(chunks)]))),
            ..Self::default()
        }
    }

    pub async fn push_response(&self, chunks: Vec<ScriptedChunk>) {
        self.responses.lock().await.push_back(Ok(chunks));
    }

    pub async fn push_connect_error(&self, message: impl Into<String>) {
        self.responses.lock().await.push_back(Err(message.into()));
    }

    /// Number of connections opened so far
    pub fn connect_count(&self) -> usize {
        self.stats.connects.load(Ordering::SeqCst)
    }

    /// Number of connections closed so far
    pub fn close_count(&self) -> usize {
        self.stats.closes.load(Ordering::SeqCst)
    }

    /// Requests seen by `connect`, in call order
    pub async fn requests(&self) -> Vec<StreamRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl ChunkTransport for ScriptedTransport {
    async fn connect(&self, request: StreamRequest) -> Result<ByteStream> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(request);

        let chunks = match self.responses.lock().await.pop_front() {
            Some(Ok(chunks)) => chunks,
            Some(Err(message)) => return Err(AiError::transport(message)),
            None => return Err(AiError::transport("no scripted response")),
        };

        Ok(Box::pin(ScriptedStream {
            chunks: chunks.into(),
            stats: self.stats.clone(),
        }))
    }
}

struct ScriptedStream {
    chunks: VecDeque<ScriptedChunk>,
    stats: Arc<TransportStats>,
}

impl Stream for ScriptedStream {
    type Item = Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match this.chunks.pop_front() {
            Some(ScriptedChunk::Data(bytes)) => Poll::Ready(Some(Ok(bytes))),
            Some(ScriptedChunk::Error(message)) => {
                Poll::Ready(Some(Err(AiError::transport(message))))
            }
            Some(ScriptedChunk::Hang) => {
                this.chunks.push_front(ScriptedChunk::Hang);
                Poll::Pending
            }
            None => Poll::Ready(None),
        }
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
    }
}
