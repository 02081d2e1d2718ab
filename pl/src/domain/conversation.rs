//! Append-only chat log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{Message, Role};

/// One chat turn, numbered in arrival order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub seq: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Provider-facing message for this turn
    pub fn to_message(&self) -> Message {
        match self.role {
            Role::User => Message::user(self.content.clone()),
            Role::Assistant => Message::assistant(self.content.clone()),
        }
    }
}

/// Ordered, append-only list of chat messages
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<ConversationMessage>,
    next_seq: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its sequence number
    pub fn append(&mut self, role: Role, content: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        let content = content.into();
        debug!(seq, ?role, len = content.len(), "ConversationLog::append: called");
        self.messages.push(ConversationMessage {
            seq,
            role,
            content,
            timestamp: Utc::now(),
        });
        seq
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> u64 {
        self.append(Role::User, content)
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> u64 {
        self.append(Role::Assistant, content)
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// History in provider message form
    pub fn to_messages(&self) -> Vec<Message> {
        self.messages.iter().map(ConversationMessage::to_message).collect()
    }

    /// Plain-text transcript, one "Role: content" block per message
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| {
                let who = match m.role {
                    Role::User => "You",
                    Role::Assistant => "Chad",
                };
                format!("{}: {}", who, m.content)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
