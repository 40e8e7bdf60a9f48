//! Tie-break heuristic for commands sent without reply metadata.
//!
//! Candidates arrive newest first. Rules are tried in order and the first
//! candidate satisfying a rule wins:
//!
//! 1. the message whose id is exactly `command_id - 1`;
//! 2. a message from the same sender within [`SAME_SENDER_WINDOW_SECS`]
//!    (a candidate without a timestamp is accepted once the sender matches);
//! 3. any message within [`RECENT_WINDOW_SECS`];
//! 4. the newest candidate.

use crate::resolve::{ReplyPayload, ReplySource, ResolvedIdentity};
use crate::store::recent::CachedMessage;

/// Same-sender window in seconds.
pub const SAME_SENDER_WINDOW_SECS: i64 = 300;

/// Global recency window in seconds.
pub const RECENT_WINDOW_SECS: i64 = 45;

/// Upper bound on messages merged into one bubble.
pub const MAX_MERGE: usize = 4;

/// Whether `time` is at most `window` seconds before `command_time`.
///
/// Timestamps come from untrusted input; a gap that overflows is never
/// within the window.
fn within(command_time: i64, time: i64, window: i64) -> bool {
    command_time
        .checked_sub(time)
        .is_some_and(|gap| gap <= window)
}

/// Pick the most plausible target among `candidates` (newest first).
pub fn pick<'a>(command: &CachedMessage, candidates: &[&'a CachedMessage]) -> Option<&'a CachedMessage> {
    if let Some(command_id) = command.message_id {
        let predecessor = command_id.checked_sub(1).and_then(|previous| {
            candidates
                .iter()
                .find(|item| item.message_id == Some(previous))
        });
        if let Some(item) = predecessor {
            return Some(*item);
        }
    }

    if let (Some(sender), Some(command_time)) = (command.sender_key, command.timestamp) {
        let same_sender = candidates.iter().find(|item| {
            item.sender_key == Some(sender)
                && item
                    .timestamp
                    .is_none_or(|time| within(command_time, time, SAME_SENDER_WINDOW_SECS))
        });
        if let Some(item) = same_sender {
            return Some(*item);
        }
    }

    if let Some(command_time) = command.timestamp {
        let recent = candidates.iter().find(|item| {
            item.timestamp
                .is_some_and(|time| within(command_time, time, RECENT_WINDOW_SECS))
        });
        if let Some(item) = recent {
            return Some(*item);
        }
    }

    candidates.first().copied()
}

/// Wrap a picked message as a history payload.
pub fn to_payload(item: &CachedMessage) -> ReplyPayload {
    ReplyPayload::new(
        item.text.clone(),
        ResolvedIdentity {
            speaker: item.speaker.clone(),
            sender_id: item.sender_id,
        },
        ReplySource::History,
    )
}

/// Merge newest-first `items` into one payload.
///
/// Texts are joined oldest first with `\n`; the identity is the newest
/// contributor's.
pub fn merge(items: &[&CachedMessage]) -> Option<ReplyPayload> {
    let newest = items.first()?;
    let text = items
        .iter()
        .rev()
        .filter_map(|item| item.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n");

    let mut payload = to_payload(newest);
    payload.text = Some(text).filter(|t| !t.is_empty());
    Some(payload)
}
