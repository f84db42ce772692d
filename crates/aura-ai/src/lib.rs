//! Aura AI - streaming counselor chat client
//!
//! This crate provides:
//! - Incremental decoder for `data:`-framed chat completion streams
//! - Cancellable streaming client for OpenAI-compatible endpoints
//! - Conversation state that collects streamed replies
//! - Offline keyword responder used when no endpoint is configured

pub mod config;
pub mod conversation;
pub mod error;
mod http_client;
pub mod llm;
pub mod responder;

// Re-export commonly used types
pub use config::ChatConfig;
pub use conversation::{ChatSession, Conversation, ConversationTurn, ReplyOutcome};
pub use error::{AiError, Result};
pub use llm::{
    ChatRequest, ChatStreamClient, ChunkTransport, FragmentStream, HttpTransport, Message,
    ParseEvent, Role, StreamFrameParser,
};
