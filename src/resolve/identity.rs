//! Speaker identity extraction.
//!
//! A forwarded message's `from` is whoever forwarded it, not its author, so
//! forwarding metadata wins over the direct sender. Forward metadata exists
//! in two schema generations; the newer `forward_origin` is preferred and
//! the legacy `forward_*` fields are consulted before giving up on forwards.

use crate::model::{Message, MessageOrigin};

/// Speaker label used when nothing identifies the author.
pub const UNKNOWN_SPEAKER: &str = "Unknown";

/// Who said something, as far as the message tells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Display label. Never empty.
    pub speaker: String,
    /// Telegram user id, when the author is a resolvable user.
    pub sender_id: Option<i64>,
}

impl ResolvedIdentity {
    fn named(speaker: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            sender_id: None,
        }
    }

    /// The sentinel identity.
    pub fn unknown() -> Self {
        Self::named(UNKNOWN_SPEAKER)
    }

    /// Whether this is the sentinel identity.
    pub fn is_unknown(&self) -> bool {
        self.speaker == UNKNOWN_SPEAKER && self.sender_id.is_none()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Identity carried by a current-schema origin record.
pub fn identity_from_origin(origin: &MessageOrigin) -> Option<ResolvedIdentity> {
    match origin {
        MessageOrigin::User { sender_user } => {
            let user = sender_user.as_ref()?;
            let speaker = user.display_name()?;
            Some(ResolvedIdentity {
                speaker,
                sender_id: user.id,
            })
        }
        MessageOrigin::HiddenUser { sender_user_name } => {
            non_blank(sender_user_name.as_deref()).map(ResolvedIdentity::named)
        }
        MessageOrigin::Chat {
            sender_chat: chat,
            author_signature,
        }
        | MessageOrigin::Channel {
            chat,
            author_signature,
        } => chat
            .as_ref()
            .and_then(|chat| chat.title())
            .or_else(|| non_blank(author_signature.as_deref()))
            .map(ResolvedIdentity::named),
        MessageOrigin::Unknown => None,
    }
}

fn identity_from_legacy_forward(message: &Message) -> Option<ResolvedIdentity> {
    if let Some(user) = &message.forward_from {
        if let Some(speaker) = user.display_name() {
            return Some(ResolvedIdentity {
                speaker,
                sender_id: user.id,
            });
        }
    }

    non_blank(message.forward_sender_name.as_deref())
        .or_else(|| message.forward_from_chat.as_ref().and_then(|chat| chat.title()))
        .or_else(|| non_blank(message.forward_signature.as_deref()))
        .map(ResolvedIdentity::named)
}

fn identity_from_sender(message: &Message) -> Option<ResolvedIdentity> {
    if let Some(user) = &message.from {
        if let Some(speaker) = user.display_name() {
            return Some(ResolvedIdentity {
                speaker,
                sender_id: user.id,
            });
        }
    }

    message
        .sender_chat
        .as_ref()
        .and_then(|chat| chat.title())
        .map(ResolvedIdentity::named)
}

/// Resolve the speaker of a message. Total: falls back to [`UNKNOWN_SPEAKER`].
///
/// Order: `forward_origin`, legacy forward fields, `from`/`sender_chat`.
pub fn resolve_identity(message: &Message) -> ResolvedIdentity {
    message
        .forward_origin
        .as_ref()
        .and_then(identity_from_origin)
        .or_else(|| identity_from_legacy_forward(message))
        .or_else(|| identity_from_sender(message))
        .unwrap_or_else(ResolvedIdentity::unknown)
}
