//! Identifier newtypes used to partition and match buffered messages.
//!
//! Smart constructors only; the inner representation is never exported.

use crate::model::message::{ChatId, Message};
use std::fmt;

/// Stable key of a conversation, derived from the chat id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationKey(String);

impl ConversationKey {
    /// Key of the chat a message was posted in.
    ///
    /// Returns `None` when the message carries no usable chat id.
    pub fn from_message(message: &Message) -> Option<Self> {
        message.chat_id().and_then(Self::from_chat_id)
    }

    /// Coerce a chat id into a key. Empty string ids are rejected.
    pub fn from_chat_id(id: &ChatId) -> Option<Self> {
        match id {
            ChatId::Id(id) => Some(Self(id.to_string())),
            ChatId::Username(name) if !name.trim().is_empty() => Some(Self(name.clone())),
            ChatId::Username(_) => None,
        }
    }

    /// The key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Distinguishes a human sender from a chat posting as itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SenderKey {
    /// Message sent by a user account.
    User(i64),
    /// Message sent on behalf of a chat or channel.
    Chat(i64),
}

impl SenderKey {
    /// The direct sender of a message: `from.id`, else `sender_chat.id`.
    pub fn from_message(message: &Message) -> Option<Self> {
        if let Some(id) = message.from.as_ref().and_then(|user| user.id) {
            return Some(SenderKey::User(id));
        }
        message
            .sender_chat
            .as_ref()
            .and_then(|chat| chat.numeric_id())
            .map(SenderKey::Chat)
    }
}

impl fmt::Display for SenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SenderKey::User(id) => write!(f, "u:{id}"),
            SenderKey::Chat(id) => write!(f, "c:{id}"),
        }
    }
}
