//! Connection seam between the stream client and the network

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, Response};

use crate::error::{AiError, Result};
use crate::http_client::build_http_client;
use crate::llm::client::ChatRequest;

/// Ordered response body chunks of one connection
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Largest error body kept in an [`AiError::Http`] message
const MAX_ERROR_BODY: usize = 512;

/// Everything needed to open one streaming exchange
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub url: String,
    pub api_key: String,
    pub body: ChatRequest,
}

/// Opens connections for streaming exchanges.
///
/// Each call to [`ChunkTransport::connect`] opens exactly one connection.
/// Dropping the returned stream closes it.
#[async_trait]
pub trait ChunkTransport: Send + Sync {
    async fn connect(&self, request: StreamRequest) -> Result<ByteStream>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }
}

#[async_trait]
impl ChunkTransport for HttpTransport {
    async fn connect(&self, request: StreamRequest) -> Result<ByteStream> {
        let body = serde_json::to_vec(&request.body)?;
        let response = self
            .client
            .post(&request.url)
            .header("Authorization", format!("Bearer {}", request.api_key))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(AiError::from));
        Ok(Box::pin(stream))
    }
}

async fn response_to_error(response: Response) -> AiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();

    // Truncate error body to prevent leaking large or sensitive responses.
    let message = if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}... [truncated]", &body[..cut])
    } else {
        body
    };

    AiError::Http { status, message }
}
