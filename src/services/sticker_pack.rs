//! Per-user sticker packs.
//!
//! Every user gets one pack owned by this bot, named
//! `reply_memories_<user id>_by_<bot username>`. Telegram caps short names
//! and titles at 64 characters and requires the `_by_<bot>` suffix.

use tracing::info;

use crate::model::{PackError, TransportError};
use crate::transport::{InputSticker, TelegramClient};

/// Telegram's limit for both pack short names and titles.
pub const PACK_NAME_MAX_LEN: usize = 64;

/// Emoji attached to every sticker the bot adds.
pub const DEFAULT_STICKER_EMOJI: &str = "💬";

const PACK_NAME_PREFIX: &str = "reply_memories_";
const FALLBACK_TITLE: &str = "Reply Sticker Pack";

/// What [`ensure_sticker_in_pack`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutcome {
    /// Pack short name.
    pub name: String,
    /// `true` when the pack was created by this call.
    pub created: bool,
}

impl PackOutcome {
    /// Link that opens the pack in Telegram clients.
    pub fn link(&self) -> String {
        pack_link(&self.name)
    }
}

/// `t.me/addstickers` link for a pack name.
pub fn pack_link(name: &str) -> String {
    format!("https://t.me/addstickers/{name}")
}

/// Lowercase, map everything outside `[a-z0-9_]` to `_`, collapse runs of
/// `_` and trim them from both ends.
pub fn normalize_for_pack(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars().flat_map(char::to_lowercase) {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('_').to_string()
}

/// Short name of `user_id`'s pack for the bot called `bot_username`.
pub fn build_pack_name(user_id: i64, bot_username: &str) -> Result<String, PackError> {
    let bot = normalize_for_pack(bot_username);
    let bot = if bot.is_empty() { "bot" } else { bot.as_str() };
    let suffix = format!("_by_{bot}");

    let Some(room) = PACK_NAME_MAX_LEN.checked_sub(suffix.len()).filter(|room| *room > 0) else {
        return Err(PackError::BotUsernameTooLong);
    };

    let mut prefix = format!("{PACK_NAME_PREFIX}{user_id}");
    prefix.truncate(room);
    Ok(prefix + &suffix)
}

/// Collapse whitespace and cap at [`PACK_NAME_MAX_LEN`] characters.
fn clean_title(value: &str) -> String {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > PACK_NAME_MAX_LEN {
        let mut cut: String = collapsed.chars().take(PACK_NAME_MAX_LEN - 3).collect();
        cut.push_str("...");
        cut
    } else {
        collapsed
    }
}

/// Human-readable pack title for the user called `display_name`.
pub fn build_pack_title(display_name: &str) -> String {
    let name = clean_title(display_name);
    if name.is_empty() {
        return FALLBACK_TITLE.to_string();
    }
    clean_title(&format!("{name}'s Reply Stickers"))
}

fn is_missing_sticker_set(err: &TransportError) -> bool {
    err.api_description().is_some_and(|description| {
        let upper = description.to_uppercase();
        upper.contains("STICKERSET_INVALID") || upper.contains("STICKERSET_NOT_FOUND")
    })
}

async fn sticker_set_exists(client: &TelegramClient, name: &str) -> Result<bool, TransportError> {
    match client.get_sticker_set(name).await {
        Ok(_) => Ok(true),
        Err(e) if is_missing_sticker_set(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Add `sticker` to the user's pack, creating the pack on first use.
pub async fn ensure_sticker_in_pack(
    client: &TelegramClient,
    bot_username: Option<&str>,
    user_id: i64,
    display_name: &str,
    sticker: &[u8],
) -> Result<PackOutcome, PackError> {
    let bot_username = bot_username
        .filter(|name| !name.trim().is_empty())
        .ok_or(PackError::MissingBotUsername)?;
    let name = build_pack_name(user_id, bot_username)?;
    let input = InputSticker {
        bytes: sticker,
        emoji: DEFAULT_STICKER_EMOJI,
    };

    if sticker_set_exists(client, &name).await? {
        client.add_sticker_to_set(user_id, &name, &input).await?;
        info!(user_id, pack = %name, "Added sticker to existing pack");
        return Ok(PackOutcome { name, created: false });
    }

    let title = build_pack_title(display_name);
    client.create_new_sticker_set(user_id, &name, &title, &input).await?;
    info!(user_id, pack = %name, "Created sticker pack");
    Ok(PackOutcome { name, created: true })
}
