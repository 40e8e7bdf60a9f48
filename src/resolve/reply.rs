//! Explicit reply resolution.
//!
//! Finds the message a command explicitly points at: a direct reply, a
//! cross-chat ("external") reply, or an inline quotation.

use crate::model::Message;
use crate::resolve::identity::{identity_from_origin, resolve_identity, ResolvedIdentity};
use crate::text::non_empty_text;

/// How a reply payload was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    /// `reply_to_message` on the command.
    Direct,
    /// `external_reply` on the command.
    External,
    /// `quote` on the command, attributed to the command's own sender.
    Quote,
    /// Guessed from recently observed messages.
    History,
}

impl ReplySource {
    /// Label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplySource::Direct => "direct",
            ReplySource::External => "external",
            ReplySource::Quote => "quote",
            ReplySource::History => "history",
        }
    }
}

/// Text and author of the message to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPayload {
    /// Normalised text; `None` when the target had nothing to render.
    pub text: Option<String>,
    /// Speaker label. Never empty.
    pub speaker: String,
    /// Author's user id, used to fetch an avatar.
    pub sender_id: Option<i64>,
    /// Where the payload was found.
    pub source: ReplySource,
}

impl ReplyPayload {
    /// Combine extracted text with a resolved identity.
    pub fn new(text: Option<String>, identity: ResolvedIdentity, source: ReplySource) -> Self {
        Self {
            text,
            speaker: identity.speaker,
            sender_id: identity.sender_id,
            source,
        }
    }
}

/// Normalised text or caption of a message, `None` if blank.
pub fn extract_text(message: &Message) -> Option<String> {
    message.raw_text().and_then(non_empty_text)
}

/// Resolve the explicit reply target of `incoming`.
///
/// Returns `None` when the command has no reply relationship at all; the
/// caller then consults recent history. A payload with `text == None` means
/// the target exists but has no text.
pub fn resolve_reply_payload(incoming: &Message) -> Option<ReplyPayload> {
    if let Some(replied) = &incoming.reply_to_message {
        return Some(ReplyPayload::new(
            extract_text(replied),
            resolve_identity(replied),
            ReplySource::Direct,
        ));
    }

    if let Some(external) = &incoming.external_reply {
        let body = external.body();
        // Telegram puts the visible text of an external reply into the
        // command's own quote; an embedded body wins when it has text.
        let text = extract_text(&body).or_else(|| {
            incoming
                .quote
                .as_ref()
                .and_then(|quote| quote.text.as_deref())
                .and_then(non_empty_text)
        });
        let identity = external
            .origin
            .as_ref()
            .and_then(identity_from_origin)
            .filter(|identity| !identity.is_unknown())
            .unwrap_or_else(|| resolve_identity(&body));
        return Some(ReplyPayload::new(text, identity, ReplySource::External));
    }

    if let Some(quoted) = incoming.quote.as_ref().and_then(|quote| quote.text.as_deref()) {
        if let Some(text) = non_empty_text(quoted) {
            return Some(ReplyPayload::new(
                Some(text),
                resolve_identity(incoming),
                ReplySource::Quote,
            ));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExternalReplyInfo, MessageOrigin, TextQuote, User};

    fn from_user(id: i64, name: &str) -> Option<User> {
        Some(User {
            id: Some(id),
            first_name: Some(name.to_string()),
            ..User::default()
        })
    }

    // ===== Direct reply Tests =====

    #[test]
    fn direct_reply_uses_text_and_identity() {
        let incoming = Message {
            text: Some("/sticker".into()),
            from: from_user(1, "Bob"),
            reply_to_message: Some(Box::new(Message {
                text: Some("  hello\r\nworld  ".into()),
                from: from_user(2, "Alice"),
                ..Message::default()
            })),
            ..Message::default()
        };
        let payload = resolve_reply_payload(&incoming).expect("payload");
        assert_eq!(payload.text.as_deref(), Some("hello\nworld"));
        assert_eq!(payload.speaker, "Alice");
        assert_eq!(payload.sender_id, Some(2));
        assert_eq!(payload.source, ReplySource::Direct);
    }

    #[test]
    fn direct_reply_falls_back_to_caption() {
        let incoming = Message {
            reply_to_message: Some(Box::new(Message {
                caption: Some("photo caption".into()),
                ..Message::default()
            })),
            ..Message::default()
        };
        let payload = resolve_reply_payload(&incoming).unwrap();
        assert_eq!(payload.text.as_deref(), Some("photo caption"));
    }

    #[test]
    fn direct_reply_to_media_has_no_text() {
        let incoming = Message {
            reply_to_message: Some(Box::new(Message {
                caption: Some("   ".into()),
                from: from_user(2, "Alice"),
                ..Message::default()
            })),
            ..Message::default()
        };
        let payload = resolve_reply_payload(&incoming).unwrap();
        assert_eq!(payload.text, None, "Whitespace-only caption counts as no text");
        assert_eq!(payload.source, ReplySource::Direct);
    }

    #[test]
    fn direct_reply_wins_over_quote() {
        let incoming = Message {
            reply_to_message: Some(Box::new(Message {
                text: Some("full".into()),
                ..Message::default()
            })),
            quote: Some(TextQuote {
                text: Some("part".into()),
                position: Some(0),
            }),
            ..Message::default()
        };
        assert_eq!(resolve_reply_payload(&incoming).unwrap().source, ReplySource::Direct);
    }

    // ===== External reply Tests =====

    #[test]
    fn external_reply_prefers_origin_identity() {
        let incoming = Message {
            external_reply: Some(ExternalReplyInfo {
                origin: Some(MessageOrigin::User {
                    sender_user: from_user(9, "Origin"),
                }),
                message: Some(Box::new(Message {
                    text: Some("elsewhere".into()),
                    from: from_user(10, "Body"),
                    ..Message::default()
                })),
                ..ExternalReplyInfo::default()
            }),
            ..Message::default()
        };
        let payload = resolve_reply_payload(&incoming).unwrap();
        assert_eq!(payload.speaker, "Origin");
        assert_eq!(payload.sender_id, Some(9));
        assert_eq!(payload.text.as_deref(), Some("elsewhere"));
        assert_eq!(payload.source, ReplySource::External);
    }

    #[test]
    fn external_reply_falls_back_to_body_identity() {
        let incoming = Message {
            external_reply: Some(ExternalReplyInfo {
                origin: Some(MessageOrigin::Unknown),
                text: Some("inline body".into()),
                from: from_user(11, "Embedded"),
                ..ExternalReplyInfo::default()
            }),
            ..Message::default()
        };
        let payload = resolve_reply_payload(&incoming).unwrap();
        assert_eq!(payload.speaker, "Embedded");
        assert_eq!(payload.text.as_deref(), Some("inline body"));
    }

    #[test]
    fn external_reply_text_from_quote_when_body_is_empty() {
        let incoming = Message {
            external_reply: Some(ExternalReplyInfo {
                origin: Some(MessageOrigin::HiddenUser {
                    sender_user_name: Some("Hidden".into()),
                }),
                ..ExternalReplyInfo::default()
            }),
            quote: Some(TextQuote {
                text: Some("quoted bit".into()),
                position: None,
            }),
            ..Message::default()
        };
        let payload = resolve_reply_payload(&incoming).unwrap();
        assert_eq!(payload.text.as_deref(), Some("quoted bit"));
        assert_eq!(payload.speaker, "Hidden");
    }

    // ===== Quote Tests =====

    #[test]
    fn quote_is_attributed_to_outer_message() {
        let incoming = Message {
            from: from_user(4, "Quoter"),
            quote: Some(TextQuote {
                text: Some(" quoted ".into()),
                position: Some(3),
            }),
            ..Message::default()
        };
        let payload = resolve_reply_payload(&incoming).unwrap();
        assert_eq!(payload.text.as_deref(), Some("quoted"));
        assert_eq!(payload.speaker, "Quoter");
        assert_eq!(payload.source, ReplySource::Quote);
    }

    #[test]
    fn blank_quote_is_no_reply() {
        let incoming = Message {
            quote: Some(TextQuote {
                text: Some(" ".into()),
                position: None,
            }),
            ..Message::default()
        };
        assert_eq!(resolve_reply_payload(&incoming), None);
    }

    #[test]
    fn no_relationship_returns_none() {
        let incoming = Message {
            text: Some("/sticker".into()),
            from: from_user(1, "Bob"),
            ..Message::default()
        };
        assert_eq!(resolve_reply_payload(&incoming), None);
    }
}
