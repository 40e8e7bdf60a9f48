//! Context resolution: who said what, and which message a command means.

pub mod identity;
pub mod reply;

pub use identity::{resolve_identity, ResolvedIdentity, UNKNOWN_SPEAKER};
pub use reply::{extract_text, resolve_reply_payload, ReplyPayload, ReplySource};
