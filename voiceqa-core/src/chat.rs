use crate::types::{ChatId, MessageId};
use serde::{Deserialize, Serialize};

const MAX_TITLE_CHARS: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    User,
    Assistant,
}

/// A single chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub author: Author,
    pub ts_unix_ms: i64,
}

impl Message {
    pub fn user(text: impl Into<String>, ts_unix_ms: i64) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            author: Author::User,
            ts_unix_ms,
        }
    }

    pub fn assistant(text: impl Into<String>, ts_unix_ms: i64) -> Self {
        Self {
            id: MessageId::new(),
            text: text.into(),
            author: Author::Assistant,
            ts_unix_ms,
        }
    }
}

/// A durable conversation. Messages are append-only; deletion is whole-chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: ChatId,
    pub title: String,
    pub messages: Vec<Message>,
    pub last_activity_unix_ms: i64,
}

impl ChatSession {
    pub fn new(title: impl Into<String>, ts_unix_ms: i64) -> Self {
        Self {
            id: ChatId::new(),
            title: title.into(),
            messages: Vec::new(),
            last_activity_unix_ms: ts_unix_ms,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.last_activity_unix_ms = message.ts_unix_ms.max(self.last_activity_unix_ms);
        self.messages.push(message);
    }

    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.author == Author::User)
            .map(|m| m.text.as_str())
    }
}

/// Derives a chat title from the first question asked in it.
pub fn title_from_question(question: &str) -> String {
    let q = question.trim();
    if q.is_empty() {
        return "New chat".into();
    }

    if q.chars().count() <= MAX_TITLE_CHARS {
        return q.to_string();
    }

    let truncated: String = q.chars().take(MAX_TITLE_CHARS).collect();
    format!("{}…", truncated.trim_end())
}
