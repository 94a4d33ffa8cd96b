use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const GUEST_USER: &str = "guest";
pub const GUEST_AVATAR: &str = "https://www.weavefox.cn/api/bolt/unsplash_image?keyword=cat&width=100&height=100&random=guest";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub user: String,
    #[serde(default)]
    pub avatar: String,
    pub content: String,
    pub time: DateTime<Utc>,
}

/// A message before the store has stamped it with an id and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChatMessage {
    pub user: String,
    pub avatar: String,
    pub content: String,
}

impl NewChatMessage {
    pub fn guest(content: impl Into<String>) -> Self {
        Self {
            user: GUEST_USER.to_string(),
            avatar: GUEST_AVATAR.to_string(),
            content: content.into(),
        }
    }

    pub fn stamp(self, id: i64, time: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            id,
            user: self.user,
            avatar: self.avatar,
            content: self.content,
            time,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CurrentUser {
    pub user: String,
}

#[derive(Debug, Serialize)]
pub struct OutgoingMessage<'a> {
    pub content: &'a str,
}

/// Whether a message shown in the chat made it to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    LocalOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub message: ChatMessage,
    pub delivery: Delivery,
}

impl ChatEntry {
    pub fn delivered(message: ChatMessage) -> Self {
        Self {
            message,
            delivery: Delivery::Delivered,
        }
    }

    pub fn local_only(message: ChatMessage) -> Self {
        Self {
            message,
            delivery: Delivery::LocalOnly,
        }
    }

    /// An entry read back from the local history. Only guest messages were
    /// written there by a failed send; the rest came from the server or the
    /// bundled samples.
    pub fn from_history(message: ChatMessage) -> Self {
        if message.user == GUEST_USER {
            Self::local_only(message)
        } else {
            Self::delivered(message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered { id: i64 },
    LocalOnly { id: i64 },
}

impl SendOutcome {
    pub fn id(&self) -> i64 {
        match self {
            SendOutcome::Delivered { id } | SendOutcome::LocalOnly { id } => *id,
        }
    }
}
