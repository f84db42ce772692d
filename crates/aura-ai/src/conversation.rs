//! Conversation state fed by streamed replies

use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::llm::{ChatStreamClient, Message};

/// Prefix of the text that replaces a reply when its exchange fails
pub const FAILURE_PREFIX: &str = "🤖 API call failed";

/// Single turn of the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub text: String,
    pub is_from_user: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub failed: bool,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text.into(), true)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(text.into(), false)
    }

    fn new(text: String, is_from_user: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            is_from_user,
            created_at: Utc::now(),
            failed: false,
        }
    }
}

/// Ordered turns plus the "responding" flag of an in-flight reply
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
    responding: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn turn(&self, id: Uuid) -> Option<&ConversationTurn> {
        self.turns.iter().find(|turn| turn.id == id)
    }

    pub fn is_responding(&self) -> bool {
        self.responding
    }

    /// Append a user turn. Blank input is ignored.
    pub fn push_user(&mut self, text: &str) -> Option<Uuid> {
        if text.trim().is_empty() {
            return None;
        }
        let turn = ConversationTurn::user(text);
        let id = turn.id;
        self.turns.push(turn);
        Some(id)
    }

    /// Append a finished assistant turn, e.g. a greeting.
    pub fn push_assistant(&mut self, text: impl Into<String>) -> Uuid {
        let turn = ConversationTurn::assistant(text);
        let id = turn.id;
        self.turns.push(turn);
        id
    }

    /// Append an empty assistant turn that will receive streamed text.
    pub fn begin_assistant(&mut self) -> Uuid {
        self.responding = true;
        self.push_assistant(String::new())
    }

    /// Append a fragment to a turn; returns false for unknown ids.
    pub fn append(&mut self, id: Uuid, fragment: &str) -> bool {
        match self.turn_mut(id) {
            Some(turn) => {
                turn.text.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// Replace the turn's text with a failure notice.
    pub fn fail(&mut self, id: Uuid, error: &impl Display) {
        if let Some(turn) = self.turn_mut(id) {
            turn.text = format!("{FAILURE_PREFIX}: {error}");
            turn.failed = true;
        }
    }

    pub fn finish(&mut self) {
        self.responding = false;
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.responding = false;
    }

    /// Completed turns as request messages, skipping failed and empty ones.
    pub fn history(&self) -> Vec<Message> {
        self.turns
            .iter()
            .filter(|turn| !turn.failed && !turn.text.is_empty())
            .map(|turn| {
                if turn.is_from_user {
                    Message::user(turn.text.clone())
                } else {
                    Message::assistant(turn.text.clone())
                }
            })
            .collect()
    }

    fn turn_mut(&mut self, id: Uuid) -> Option<&mut ConversationTurn> {
        self.turns.iter_mut().find(|turn| turn.id == id)
    }
}

/// How a call to [`ChatSession::send`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Input was blank; nothing was sent.
    Ignored,
    /// The reply streamed to completion into this turn.
    Completed(Uuid),
    /// The reply was cancelled; the turn keeps what arrived so far.
    Cancelled(Uuid),
}

/// Drives streaming exchanges into a [`Conversation`]
pub struct ChatSession {
    client: ChatStreamClient,
    conversation: Conversation,
    send_history: bool,
}

impl ChatSession {
    pub fn new(client: ChatStreamClient) -> Self {
        Self {
            client,
            conversation: Conversation::new(),
            send_history: false,
        }
    }

    /// Send earlier turns along with each new message
    pub fn with_history(mut self, enabled: bool) -> Self {
        self.send_history = enabled;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    /// Send a message and stream the reply into the conversation.
    pub async fn send<F>(&mut self, input: &str, on_fragment: F) -> Result<ReplyOutcome>
    where
        F: FnMut(&str),
    {
        self.send_until(input, std::future::pending::<()>(), on_fragment)
            .await
    }

    /// Like [`ChatSession::send`], but stops streaming once `cancel` resolves.
    ///
    /// On failure the reply turn's text is replaced with a failure notice and
    /// the error is returned. The responding flag is cleared in every case.
    pub async fn send_until<C, F>(
        &mut self,
        input: &str,
        cancel: C,
        mut on_fragment: F,
    ) -> Result<ReplyOutcome>
    where
        C: Future<Output = ()>,
        F: FnMut(&str),
    {
        let history = if self.send_history {
            self.conversation.history()
        } else {
            Vec::new()
        };

        if self.conversation.push_user(input).is_none() {
            return Ok(ReplyOutcome::Ignored);
        }
        let reply_id = self.conversation.begin_assistant();
        let started = Instant::now();

        let mut stream = match self.client.open_with_history(&history, input) {
            Ok(stream) => stream,
            Err(e) => {
                self.conversation.fail(reply_id, &e);
                self.conversation.finish();
                return Err(e);
            }
        };

        tokio::pin!(cancel);
        let outcome = loop {
            tokio::select! {
                _ = &mut cancel => {
                    stream.cancel();
                    break Ok(ReplyOutcome::Cancelled(reply_id));
                }
                item = stream.next() => match item {
                    Some(Ok(fragment)) => {
                        self.conversation.append(reply_id, &fragment);
                        on_fragment(&fragment);
                    }
                    Some(Err(e)) => {
                        self.conversation.fail(reply_id, &e);
                        break Err(e);
                    }
                    None => break Ok(ReplyOutcome::Completed(reply_id)),
                },
            }
        };

        self.conversation.finish();
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "Reply finished"
        );
        outcome
    }
}
