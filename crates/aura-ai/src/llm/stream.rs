//! Streaming chat client: one connection per exchange, republished as text fragments

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::{Stream, StreamExt};

use crate::config::ChatConfig;
use crate::error::Result;
use crate::llm::client::{ChatRequest, Message};
use crate::llm::sse::{ParseEvent, StreamFrameParser};
use crate::llm::transport::{ChunkTransport, HttpTransport, StreamRequest};

type InnerStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Client for streaming chat exchanges against one configured endpoint
#[derive(Clone)]
pub struct ChatStreamClient {
    config: Arc<ChatConfig>,
    transport: Arc<dyn ChunkTransport>,
}

impl ChatStreamClient {
    /// Create a client that talks HTTP to the configured endpoint
    pub fn new(config: ChatConfig) -> Result<Self> {
        Ok(Self::with_transport(config, Arc::new(HttpTransport::new()?)))
    }

    pub fn with_transport(config: ChatConfig, transport: Arc<dyn ChunkTransport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Start a streaming exchange for a single user message.
    pub fn open(&self, user_message: &str) -> Result<FragmentStream> {
        self.open_with_history(&[], user_message)
    }

    /// Start a streaming exchange with prior turns sent before the new message.
    ///
    /// Configuration is checked before anything touches the transport. The
    /// connection itself is opened when the returned stream is first polled.
    pub fn open_with_history(
        &self,
        history: &[Message],
        user_message: &str,
    ) -> Result<FragmentStream> {
        let api_key = self.config.validate()?.to_string();
        let request = StreamRequest {
            url: self.config.completions_url(),
            api_key,
            body: ChatRequest::for_exchange(&self.config, history, user_message),
        };
        let transport = self.transport.clone();

        let stream = async_stream::stream! {
            let started = Instant::now();
            tracing::debug!(
                model = %request.body.model,
                messages = request.body.messages.len(),
                "Opening chat stream"
            );

            let mut chunks = match transport.connect(request).await {
                Ok(chunks) => chunks,
                Err(e) => {
                    tracing::warn!(error = %e, "Chat stream failed to connect");
                    yield Err(e);
                    return;
                }
            };

            let mut parser = StreamFrameParser::new();
            let mut fragments = 0usize;

            while let Some(chunk) = chunks.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        tracing::warn!(error = %e, fragments, "Chat stream failed mid-stream");
                        yield Err(e);
                        return;
                    }
                };

                for event in parser.feed(&chunk) {
                    match event {
                        ParseEvent::Token(text) => {
                            fragments += 1;
                            yield Ok(text);
                        }
                        ParseEvent::Done => {
                            tracing::info!(
                                fragments,
                                elapsed_ms = started.elapsed().as_millis() as u64,
                                "Chat stream finished"
                            );
                            return;
                        }
                        ParseEvent::Ignored => {}
                    }
                }
            }

            for event in parser.finish() {
                if let ParseEvent::Token(text) = event {
                    fragments += 1;
                    yield Ok(text);
                }
            }
            tracing::info!(
                fragments,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Chat stream closed without end marker"
            );
        };

        Ok(FragmentStream::new(Box::pin(stream)))
    }
}

/// Cancellable, single-consumer sequence of text fragments.
///
/// Ends with `None` on success or with one `Err` item on failure. Dropping
/// the stream, or calling [`FragmentStream::cancel`], closes the connection.
pub struct FragmentStream {
    inner: Option<InnerStream>,
}

impl FragmentStream {
    fn new(inner: InnerStream) -> Self {
        Self { inner: Some(inner) }
    }

    /// Abandon the exchange. Calling this again, or after the stream ended, does nothing.
    pub fn cancel(&mut self) {
        if self.inner.take().is_some() {
            tracing::debug!("Chat stream cancelled");
        }
    }

    /// Whether the stream has ended, failed or been cancelled
    pub fn is_finished(&self) -> bool {
        self.inner.is_none()
    }
}

impl Stream for FragmentStream {
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let Some(inner) = self.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(text))) => Poll::Ready(Some(Ok(text))),
            Poll::Ready(Some(Err(e))) => {
                self.inner = None;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PLACEHOLDER_API_KEY;
    use crate::error::AiError;
    use crate::llm::mock_transport::{ScriptedChunk, ScriptedTransport};

    fn content_line(text: &str) -> String {
        format!(
            "data: {}\n",
            serde_json::json!({ "choices": [{ "delta": { "content": text } }] })
        )
    }

    fn client_for(transport: &ScriptedTransport) -> ChatStreamClient {
        ChatStreamClient::with_transport(
            ChatConfig::new("sk-test").with_base_url("http://mock.local/v1"),
            Arc::new(transport.clone()),
        )
    }

    async fn collect(stream: &mut FragmentStream) -> (Vec<String>, Option<AiError>) {
        let mut fragments = Vec::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(text) => fragments.push(text),
                Err(e) => return (fragments, Some(e)),
            }
        }
        (fragments, None)
    }

    #[tokio::test]
    async fn test_placeholder_key_fails_before_connecting() {
        let transport = ScriptedTransport::from_chunks(vec![]);
        let client = ChatStreamClient::with_transport(
            ChatConfig::new(PLACEHOLDER_API_KEY),
            Arc::new(transport.clone()),
        );

        let err = client.open("hi").err().expect("configuration error");
        assert!(err.is_configuration());
        assert_eq!(transport.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_fragment_then_done_in_separate_chunks() {
        let transport = ScriptedTransport::from_chunks(vec![
            ScriptedChunk::data(content_line("Hi")),
            ScriptedChunk::data("data: [DONE]\n"),
        ]);
        let client = client_for(&transport);

        let mut stream = client.open("hello").unwrap();
        let (fragments, error) = collect(&mut stream).await;

        assert_eq!(fragments, vec!["Hi".to_string()]);
        assert!(error.is_none());
        assert!(stream.is_finished());
        assert_eq!(transport.connect_count(), 1);
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_request_is_built_from_config() {
        let transport = ScriptedTransport::from_chunks(vec![ScriptedChunk::data("data: [DONE]\n")]);
        let client = client_for(&transport);

        let mut stream = client.open("I feel anxious").unwrap();
        collect(&mut stream).await;

        let requests = transport.requests().await;
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, client.config().completions_url());
        assert_eq!(request.url, "http://mock.local/v1/chat/completions");
        assert_eq!(request.api_key, "sk-test");
        assert_eq!(request.body.model, client.config().model);
        assert!(request.body.is_stream());
        assert_eq!(request.body.max_tokens, 500);
        assert_eq!(request.body.messages.len(), 2);
        assert_eq!(request.body.messages[1].content, "I feel anxious");
    }

    #[tokio::test]
    async fn test_connection_is_lazy() {
        let transport = ScriptedTransport::from_chunks(vec![]);
        let client = client_for(&transport);

        let stream = client.open("hi").unwrap();
        assert_eq!(transport.connect_count(), 0);
        drop(stream);
        assert_eq!(transport.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_record_split_mid_json_is_one_fragment() {
        let transport = ScriptedTransport::from_chunks(vec![
            ScriptedChunk::data("data: {\"choices\":[{\"delta\":{\"content\":\"He"),
            ScriptedChunk::data("llo\"}}]}\n"),
            ScriptedChunk::data("data: [DONE]\n"),
        ]);
        let client = client_for(&transport);

        let mut stream = client.open("hi").unwrap();
        let (fragments, error) = collect(&mut stream).await;
        assert_eq!(fragments, vec!["Hello".to_string()]);
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn test_whole_line_then_orphan_tail() {
        let transport = ScriptedTransport::from_chunks(vec![
            ScriptedChunk::data("data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n"),
            ScriptedChunk::data("llo\"}}]}\n"),
        ]);
        let client = client_for(&transport);

        let mut stream = client.open("hi").unwrap();
        let (fragments, error) = collect(&mut stream).await;
        assert_eq!(fragments, vec!["He".to_string()]);
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn test_chunks_after_done_are_ignored() {
        let transport = ScriptedTransport::from_chunks(vec![
            ScriptedChunk::data(format!("{}data: [DONE]\n", content_line("a"))),
            ScriptedChunk::data(content_line("b")),
            ScriptedChunk::error("should never be read"),
        ]);
        let client = client_for(&transport);

        let mut stream = client.open("hi").unwrap();
        let (fragments, error) = collect(&mut stream).await;
        assert_eq!(fragments, vec!["a".to_string()]);
        assert!(error.is_none());
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_finish_reason_ends_stream() {
        let transport = ScriptedTransport::from_chunks(vec![
            ScriptedChunk::data(
                "data: {\"choices\":[{\"delta\":{\"content\":\"end\"},\"finish_reason\":\"stop\"}]}\n",
            ),
            ScriptedChunk::data(content_line("ignored")),
        ]);
        let client = client_for(&transport);

        let mut stream = client.open("hi").unwrap();
        let (fragments, error) = collect(&mut stream).await;
        assert_eq!(fragments, vec!["end".to_string()]);
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn test_clean_close_without_done_succeeds() {
        let line = content_line("last words");
        let transport = ScriptedTransport::from_chunks(vec![
            ScriptedChunk::data(content_line("first")),
            // Final record arrives without its newline.
            ScriptedChunk::data(line.trim_end().to_string()),
        ]);
        let client = client_for(&transport);

        let mut stream = client.open("hi").unwrap();
        let (fragments, error) = collect(&mut stream).await;
        assert_eq!(fragments, vec!["first".to_string(), "last words".to_string()]);
        assert!(error.is_none());
    }

    #[tokio::test]
    async fn test_mid_stream_transport_error_is_terminal() {
        let transport = ScriptedTransport::from_chunks(vec![
            ScriptedChunk::data(content_line("partial")),
            ScriptedChunk::error("connection reset"),
            ScriptedChunk::data(content_line("unreachable")),
        ]);
        let client = client_for(&transport);

        let mut stream = client.open("hi").unwrap();
        let (fragments, error) = collect(&mut stream).await;
        assert_eq!(fragments, vec!["partial".to_string()]);

        let error = error.expect("transport error");
        assert!(error.is_transport());
        assert!(error.to_string().contains("connection reset"));

        assert!(stream.is_finished());
        assert!(stream.next().await.is_none());
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_transport_error() {
        let transport = ScriptedTransport::new();
        transport.push_connect_error("dns failure").await;
        let client = client_for(&transport);

        let mut stream = client.open("hi").unwrap();
        let (fragments, error) = collect(&mut stream).await;
        assert!(fragments.is_empty());
        assert!(error.expect("connect error").is_transport());
        assert_eq!(transport.close_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_closes_connection_once() {
        let transport = ScriptedTransport::from_chunks(vec![
            ScriptedChunk::data(content_line("Hi")),
            ScriptedChunk::Hang,
        ]);
        let client = client_for(&transport);

        let mut stream = client.open("hi").unwrap();
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, "Hi");
        assert_eq!(transport.close_count(), 0);

        stream.cancel();
        assert_eq!(transport.close_count(), 1);
        assert!(stream.is_finished());
        assert!(stream.next().await.is_none());

        stream.cancel();
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_cancel_after_completion_is_noop() {
        let transport = ScriptedTransport::from_chunks(vec![ScriptedChunk::data("data: [DONE]\n")]);
        let client = client_for(&transport);

        let mut stream = client.open("hi").unwrap();
        assert!(stream.next().await.is_none());
        assert_eq!(transport.close_count(), 1);

        stream.cancel();
        assert_eq!(transport.close_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_exchanges_are_isolated() {
        let transport = ScriptedTransport::new();
        transport
            .push_response(vec![
                ScriptedChunk::data("data: {\"choices\":[{\"delta\":{\"content\":\"al"),
                ScriptedChunk::data("pha\"}}]}\ndata: [DONE]\n"),
            ])
            .await;
        transport
            .push_response(vec![
                ScriptedChunk::data(content_line("beta")),
                ScriptedChunk::data("data: [DONE]\n"),
            ])
            .await;
        let client = client_for(&transport);

        let mut first = client.open("one").unwrap();
        let mut second = client.open("two").unwrap();

        // Connect order decides which script each exchange gets.
        let a = first.next().await.unwrap().unwrap();
        let b = second.next().await.unwrap().unwrap();
        assert_eq!(a, "alpha");
        assert_eq!(b, "beta");

        assert!(first.next().await.is_none());
        assert!(second.next().await.is_none());
        assert_eq!(transport.connect_count(), 2);
        assert_eq!(transport.close_count(), 2);
    }

    #[tokio::test]
    async fn test_history_is_forwarded() {
        let transport = ScriptedTransport::from_chunks(vec![ScriptedChunk::data("data: [DONE]\n")]);
        let client = client_for(&transport);

        let history = vec![Message::user("hello"), Message::assistant("hi, how are you?")];
        let mut stream = client.open_with_history(&history, "tired").unwrap();
        collect(&mut stream).await;

        let requests = transport.requests().await;
        assert_eq!(requests[0].body.messages.len(), 4);
        assert_eq!(requests[0].body.messages[2].content, "hi, how are you?");
    }
}
