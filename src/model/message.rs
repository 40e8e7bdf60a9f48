//! Bot API message records.
//!
//! These mirror the subset of Telegram's `Message` object the bot reads.
//! Every field is optional and deserialised leniently: a missing *or*
//! mistyped field becomes `None` instead of rejecting the whole update, so
//! the resolvers downstream only ever deal with presence and absence.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deserialise an optional field, turning type mismatches into `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

// ===== ChatId =====

/// Chat identifier as delivered by the transport.
///
/// Telegram uses integers, but `@channelusername` strings are accepted by
/// the API as well, so both shapes are kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    /// Numeric chat id.
    Id(i64),
    /// Public username form (`@name`).
    Username(String),
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{id}"),
            ChatId::Username(name) => f.write_str(name),
        }
    }
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

// ===== User / Chat =====

/// A Telegram user or bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user id.
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    /// Whether this account is a bot.
    #[serde(default, deserialize_with = "lenient")]
    pub is_bot: Option<bool>,
    /// First name as shown in Telegram.
    #[serde(default, deserialize_with = "lenient")]
    pub first_name: Option<String>,
    /// Optional last name.
    #[serde(default, deserialize_with = "lenient")]
    pub last_name: Option<String>,
    /// Public username without the `@`.
    #[serde(default, deserialize_with = "lenient")]
    pub username: Option<String>,
}

impl User {
    /// Human-readable name: "first last", else `@username`.
    ///
    /// Returns `None` when neither a first name nor a username is present.
    pub fn display_name(&self) -> Option<String> {
        if let Some(first) = self.first_name.as_deref().filter(|s| !s.is_empty()) {
            let full = match self.last_name.as_deref().filter(|s| !s.is_empty()) {
                Some(last) => format!("{first} {last}"),
                None => first.to_string(),
            };
            let full = full.trim();
            if !full.is_empty() {
                return Some(full.to_string());
            }
        }

        self.username
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|username| format!("@{username}"))
    }
}

/// A chat, group, supergroup or channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    /// Chat identifier.
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<ChatId>,
    /// `private`, `group`, `supergroup` or `channel`.
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,
    /// Title of groups and channels.
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    /// Public username of the chat, if any.
    #[serde(default, deserialize_with = "lenient")]
    pub username: Option<String>,
}

impl Chat {
    /// Non-empty chat title, if any.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Numeric id, when the chat id is numeric.
    pub fn numeric_id(&self) -> Option<i64> {
        match self.id {
            Some(ChatId::Id(id)) => Some(id),
            _ => None,
        }
    }
}

// ===== MessageOrigin =====

/// Origin of a forwarded message or external reply (current schema).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageOrigin {
    /// Sent by a known user.
    User {
        /// The user who sent the original message.
        #[serde(default, deserialize_with = "lenient")]
        sender_user: Option<User>,
    },
    /// Sent by a user who hides their account in forwards.
    HiddenUser {
        /// Display name of the hidden user.
        #[serde(default, deserialize_with = "lenient")]
        sender_user_name: Option<String>,
    },
    /// Sent on behalf of a chat (anonymous group admin).
    Chat {
        /// The chat that sent the original message.
        #[serde(default, deserialize_with = "lenient")]
        sender_chat: Option<Chat>,
        /// Signature of the post author, if any.
        #[serde(default, deserialize_with = "lenient")]
        author_signature: Option<String>,
    },
    /// Posted in a channel.
    Channel {
        /// The channel the message was posted in.
        #[serde(default, deserialize_with = "lenient")]
        chat: Option<Chat>,
        /// Signature of the post author, if any.
        #[serde(default, deserialize_with = "lenient")]
        author_signature: Option<String>,
    },
    /// Any origin type this bot does not know about.
    #[serde(other)]
    Unknown,
}

// ===== Reply metadata =====

/// Reply to a message in another chat or forum topic.
///
/// Besides its origin this may embed the replied message, and it may also
/// carry message-like fields itself; both are treated as the "body".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalReplyInfo {
    /// Who originally sent the replied message.
    #[serde(default, deserialize_with = "lenient")]
    pub origin: Option<MessageOrigin>,
    /// Fully embedded replied message, when Telegram includes it.
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<Box<Message>>,
    /// Chat the replied message belongs to.
    #[serde(default, deserialize_with = "lenient")]
    pub chat: Option<Chat>,
    /// Id of the replied message in its chat.
    #[serde(default, deserialize_with = "lenient")]
    pub message_id: Option<i64>,
    /// Text of the replied message.
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    /// Media caption of the replied message.
    #[serde(default, deserialize_with = "lenient")]
    pub caption: Option<String>,
    /// Sender of the replied message.
    #[serde(default, deserialize_with = "lenient")]
    pub from: Option<User>,
    /// Chat the replied message was sent on behalf of.
    #[serde(default, deserialize_with = "lenient")]
    pub sender_chat: Option<Chat>,
}

impl ExternalReplyInfo {
    /// The message-like body of this reply.
    ///
    /// Prefers a fully embedded message; otherwise the reply's own
    /// message-like fields are viewed as a message.
    pub fn body(&self) -> Message {
        if let Some(message) = &self.message {
            return (**message).clone();
        }
        Message {
            message_id: self.message_id,
            chat: self.chat.clone(),
            from: self.from.clone(),
            sender_chat: self.sender_chat.clone(),
            text: self.text.clone(),
            caption: self.caption.clone(),
            ..Message::default()
        }
    }
}

/// Part of the replied message quoted by the sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuote {
    /// Quoted text.
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    /// Offset of the quote in the original text, in UTF-16 units.
    #[serde(default, deserialize_with = "lenient")]
    pub position: Option<i64>,
}

// ===== Message =====

/// An incoming message. Never mutated by the bot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Id unique within the chat.
    #[serde(default, deserialize_with = "lenient")]
    pub message_id: Option<i64>,
    /// Send time, Unix seconds.
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<i64>,
    /// Conversation the message belongs to.
    #[serde(default, deserialize_with = "lenient")]
    pub chat: Option<Chat>,
    /// Sender; absent for channel posts.
    #[serde(default, deserialize_with = "lenient")]
    pub from: Option<User>,
    /// Chat the message was sent on behalf of.
    #[serde(default, deserialize_with = "lenient")]
    pub sender_chat: Option<Chat>,
    /// Text of a text message.
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    /// Caption of a media message.
    #[serde(default, deserialize_with = "lenient")]
    pub caption: Option<String>,
    /// Message this one replies to, in the same chat.
    #[serde(default, deserialize_with = "lenient")]
    pub reply_to_message: Option<Box<Message>>,
    /// Message this one replies to, in another chat or topic.
    #[serde(default, deserialize_with = "lenient")]
    pub external_reply: Option<ExternalReplyInfo>,
    /// Part of the replied message the sender quoted.
    #[serde(default, deserialize_with = "lenient")]
    pub quote: Option<TextQuote>,
    /// Origin of a forwarded message.
    #[serde(default, deserialize_with = "lenient")]
    pub forward_origin: Option<MessageOrigin>,
    // Legacy forward fields, still sent by some clients and bridges.
    /// Original sender of a forward.
    #[serde(default, deserialize_with = "lenient")]
    pub forward_from: Option<User>,
    /// Name of a forward's sender who hides their account.
    #[serde(default, deserialize_with = "lenient")]
    pub forward_sender_name: Option<String>,
    /// Channel or chat a forward came from.
    #[serde(default, deserialize_with = "lenient")]
    pub forward_from_chat: Option<Chat>,
    /// Author signature of a forwarded channel post.
    #[serde(default, deserialize_with = "lenient")]
    pub forward_signature: Option<String>,
}

impl Message {
    /// Raw text, falling back to the media caption.
    pub fn raw_text(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// Chat id of the conversation this message belongs to.
    pub fn chat_id(&self) -> Option<&ChatId> {
        self.chat.as_ref().and_then(|chat| chat.id.as_ref())
    }
}

// ===== Update & file records =====

/// One entry of a `getUpdates` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Update {
    /// Monotonic update id; the next poll offset is this plus one.
    pub update_id: i64,
    /// New incoming message, if this update carries one.
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<Message>,
}

/// One size variant of a photo.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhotoSize {
    /// Id for `getFile`.
    #[serde(default, deserialize_with = "lenient")]
    pub file_id: Option<String>,
    /// Width in pixels.
    #[serde(default, deserialize_with = "lenient")]
    pub width: Option<u32>,
    /// Height in pixels.
    #[serde(default, deserialize_with = "lenient")]
    pub height: Option<u32>,
}

/// Result of `getUserProfilePhotos`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserProfilePhotos {
    /// Number of profile photos the user has.
    #[serde(default)]
    pub total_count: i64,
    /// Each photo is a list of sizes, smallest first.
    #[serde(default)]
    pub photos: Vec<Vec<PhotoSize>>,
}

impl UserProfilePhotos {
    /// File id of the largest size of the most recent photo.
    pub fn largest_file_id(&self) -> Option<&str> {
        self.photos
            .first()?
            .iter()
            .rev()
            .find_map(|size| size.file_id.as_deref().filter(|id| !id.is_empty()))
    }
}

/// Result of `getFile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct File {
    /// Id of the file.
    #[serde(default)]
    pub file_id: String,
    /// Download path below `/file/bot<token>/`.
    #[serde(default, deserialize_with = "lenient")]
    pub file_path: Option<String>,
}

/// Result of `getStickerSet`; only the fields the bot reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StickerSet {
    /// Short name used in `t.me/addstickers` links.
    #[serde(default)]
    pub name: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
}
