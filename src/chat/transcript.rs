use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const WELCOME_MESSAGE: &str = "Hi! I'm your Sui blockchain assistant. I can help you build transactions, query crypto prices, or answer questions about blockchain. How can I help you today?";

pub const CLEARED_MESSAGE: &str = "Chat cleared. How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only message log of one chat, opening with the assistant greeting.
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(ChatRole::Assistant, WELCOME_MESSAGE)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Append a user message; blank input is ignored.
    pub fn push_user(&mut self, content: &str) -> Option<&ChatMessage> {
        if content.trim().is_empty() {
            return None;
        }
        Some(self.push(ChatRole::User, content))
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.push(ChatRole::Assistant, content)
    }

    pub fn push_system(&mut self, content: impl Into<String>) -> &ChatMessage {
        self.push(ChatRole::System, content)
    }

    fn push(&mut self, role: ChatRole, content: impl Into<String>) -> &ChatMessage {
        self.messages.push(ChatMessage::new(role, content));
        &self.messages[self.messages.len() - 1]
    }

    /// Replace the whole log with a single fresh greeting.
    pub fn clear(&mut self) {
        self.messages = vec![ChatMessage::new(ChatRole::Assistant, CLEARED_MESSAGE)];
    }
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new()
    }
}
