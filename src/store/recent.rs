//! Bounded per-conversation history of recently observed messages.
//!
//! Every incoming message is appended to its conversation's buffer so a
//! command sent without reply metadata can still find the message the user
//! most likely meant. Buffers are front-trimmed once they exceed their
//! capacity; old history is simply lost.

use crate::command::is_command_text;
use crate::model::{ConversationKey, Message, SenderKey};
use crate::resolve::{extract_text, resolve_identity, ReplyPayload};
use crate::store::fallback;
use std::collections::{HashMap, VecDeque};

/// Default number of messages kept per conversation.
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// Snapshot of an observed message. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMessage {
    /// Conversation the message was seen in.
    pub conversation: ConversationKey,
    /// Telegram message id, when it parsed.
    pub message_id: Option<i64>,
    /// Unix timestamp in seconds.
    pub timestamp: Option<i64>,
    /// Sender identity used by the same-sender rule.
    pub sender_key: Option<SenderKey>,
    /// Resolved author's user id (may differ from `sender_key` for forwards).
    pub sender_id: Option<i64>,
    /// Resolved display name at the time it was seen.
    pub speaker: String,
    /// Normalised text or caption.
    pub text: Option<String>,
    /// Whether the text is a bot command; those are never fallback targets.
    pub is_command: bool,
}

impl CachedMessage {
    /// Snapshot a message. `None` when it has no conversation key.
    pub fn from_message(message: &Message) -> Option<Self> {
        let conversation = ConversationKey::from_message(message)?;
        let text = extract_text(message);
        let identity = resolve_identity(message);
        let is_command = text.as_deref().is_some_and(is_command_text);

        Some(Self {
            conversation,
            message_id: message.message_id,
            timestamp: message.date,
            sender_key: SenderKey::from_message(message),
            sender_id: identity.sender_id,
            speaker: identity.speaker,
            text,
            is_command,
        })
    }
}

/// Owner of every conversation buffer.
#[derive(Debug)]
pub struct RecentMessageStore {
    capacity: usize,
    buffers: HashMap<ConversationKey, VecDeque<CachedMessage>>,
}

impl Default for RecentMessageStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl RecentMessageStore {
    /// Create a store keeping at most `capacity` messages per conversation.
    ///
    /// A capacity of 0 falls back to [`DEFAULT_HISTORY_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_HISTORY_CAPACITY
        } else {
            capacity
        };
        Self {
            capacity,
            buffers: HashMap::new(),
        }
    }

    /// Per-conversation limit.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a message. Messages without a conversation key are ignored.
    pub fn observe(&mut self, message: &Message) {
        if let Some(item) = CachedMessage::from_message(message) {
            self.push(item);
        }
    }

    /// Append an already-built snapshot, evicting the oldest on overflow.
    pub fn push(&mut self, item: CachedMessage) {
        let buffer = self.buffers.entry(item.conversation.clone()).or_default();
        buffer.push_back(item);
        while buffer.len() > self.capacity {
            buffer.pop_front();
        }
    }

    /// Buffered messages of a conversation, oldest first.
    pub fn messages(&self, conversation: &ConversationKey) -> impl DoubleEndedIterator<Item = &CachedMessage> {
        self.buffers.get(conversation).into_iter().flatten()
    }

    /// Messages buffered for `conversation`.
    pub fn len(&self, conversation: &ConversationKey) -> usize {
        self.buffers.get(conversation).map_or(0, VecDeque::len)
    }

    /// Whether nothing is buffered for `conversation`.
    pub fn is_empty(&self, conversation: &ConversationKey) -> bool {
        self.len(conversation) == 0
    }

    /// Eligible fallback candidates for a command, newest first.
    ///
    /// Commands and textless messages are skipped. When the command has an
    /// id, only messages with a strictly smaller id qualify.
    fn candidates<'a>(&'a self, command: &CachedMessage) -> Vec<&'a CachedMessage> {
        self.messages(&command.conversation)
            .rev()
            .filter(|item| item.text.is_some() && !item.is_command)
            .filter(|item| match command.message_id {
                Some(command_id) => item.message_id.is_some_and(|id| id < command_id),
                None => true,
            })
            .collect()
    }

    /// Best guess for the message a reply-less command refers to.
    pub fn query_fallback(&self, command_message: &Message) -> Option<ReplyPayload> {
        let command = CachedMessage::from_message(command_message)?;
        let candidates = self.candidates(&command);
        fallback::pick(&command, &candidates).map(fallback::to_payload)
    }

    /// Merge the `count` most recent eligible messages into one payload.
    ///
    /// `count` is clamped to `1..=`[`fallback::MAX_MERGE`]. A count of 1 uses
    /// the single-message heuristic of [`Self::query_fallback`].
    pub fn query_fallback_sequence(&self, command_message: &Message, count: usize) -> Option<ReplyPayload> {
        let count = count.clamp(1, fallback::MAX_MERGE);
        if count == 1 {
            return self.query_fallback(command_message);
        }

        let command = CachedMessage::from_message(command_message)?;
        let candidates = self.candidates(&command);
        fallback::merge(&candidates[..count.min(candidates.len())])
    }
}
