//! Command handlers.
//!
//! Handlers return `Err` only for failures nobody answered yet; the caller
//! turns those into a generic apology. Expected outcomes, including render
//! and pack failures, are answered here.

use std::sync::{Arc, PoisonError};

use tracing::{error, info, warn};

use crate::bot::capabilities::{AvatarSource, Replier, StickerPackApi, StickerSender};
use crate::bot::BotState;
use crate::command::parse_merge_count;
use crate::model::{AppError, ChatId, Message, RenderError};
use crate::render::{render_sticker, Rasterizer};
use crate::resolve::resolve_reply_payload;

/// Reply to `/start` and `/help`.
pub const USAGE: &str = "\
Usage:
1. Reply to a message in a private chat or group
2. Then send /sticker (or /sticker 3 to merge the last three messages)
3. Send /preview to see the current sticker style
4. Send /pack to add your latest sticker to your sticker pack

Tips:
- In groups, disable Group Privacy in @BotFather (/setprivacy -> Disable)
- Only messages with text (or a media caption) are supported";

/// Sent when `/sticker` finds neither a reply nor usable history.
pub const NO_TARGET: &str = "Reply to a message first, then send /sticker.";
/// Sent when the target message has no text or caption.
pub const NO_TEXT: &str = "The replied message has no text to extract (for example a plain photo or file).";
/// Sent when `/pack` cannot tell who asked.
pub const NO_USER: &str = "Could not identify your account. Send /pack from your personal account.";
/// Sent when `/pack` has nothing to add.
pub const NO_LAST_STICKER: &str =
    "You have no sticker to add yet. Generate one with /sticker or /preview first.";
/// Sent when a command fails before answering.
pub const APOLOGY: &str = "Something went wrong, please try again later.";

/// Sample text rendered by `/preview`.
pub const PREVIEW_TEXT: &str = "Hi, this is a /preview rendering test.\nDo the avatar, font size and spacing look natural?";

/// Speaker used by `/preview` when the requester has no usable name.
pub const PREVIEW_SPEAKER: &str = "Preview";

/// Where a command came from and where answers go.
#[derive(Debug, Clone, Copy)]
pub struct CommandContext<'a> {
    /// The command message.
    pub message: &'a Message,
    /// Chat to answer in.
    pub chat_id: &'a ChatId,
}

impl<'a> CommandContext<'a> {
    /// `None` when the message carries no chat to answer in.
    pub fn new(message: &'a Message) -> Option<Self> {
        Some(Self {
            message,
            chat_id: message.chat_id()?,
        })
    }

    fn message_id(&self) -> Option<i64> {
        self.message.message_id
    }

    fn requester_id(&self) -> Option<i64> {
        self.message.from.as_ref().and_then(|user| user.id)
    }

    /// Requesting user's display name, or `fallback`.
    fn requester_name(&self, fallback: &str) -> String {
        self.message
            .from
            .as_ref()
            .and_then(|user| user.display_name())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Render on the blocking pool; rasterisation is CPU-bound.
async fn render_blocking(
    rasterizer: Arc<dyn Rasterizer>,
    speaker: String,
    text: String,
    avatar: Option<Vec<u8>>,
) -> Result<Vec<u8>, RenderError> {
    tokio::task::spawn_blocking(move || {
        render_sticker(rasterizer.as_ref(), &speaker, &text, avatar.as_deref())
    })
    .await?
}

/// Fetch the avatar, render, remember and send one sticker.
async fn render_and_send<A>(
    api: &A,
    state: &BotState,
    ctx: CommandContext<'_>,
    speaker: &str,
    text: &str,
    avatar_user: Option<i64>,
) -> Result<(), AppError>
where
    A: StickerSender + AvatarSource,
{
    let avatar = match avatar_user {
        Some(user_id) => api.fetch_avatar(user_id).await,
        None => None,
    };
    info!(has_avatar = avatar.is_some(), "Rendering sticker");

    let sticker = render_blocking(
        Arc::clone(&state.rasterizer),
        speaker.to_string(),
        text.to_string(),
        avatar,
    )
    .await?;

    if let Some(user_id) = ctx.requester_id() {
        state
            .stickers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(user_id, &sticker);
    }

    api.send_sticker(ctx.chat_id, sticker, ctx.message_id()).await?;
    Ok(())
}

/// `/start` and `/help`.
pub async fn handle_help<A: Replier>(api: &A, ctx: CommandContext<'_>) -> Result<(), AppError> {
    api.reply(ctx.chat_id, USAGE, None).await?;
    Ok(())
}

/// `/sticker [n]`.
pub async fn handle_sticker<A>(api: &A, state: &BotState, ctx: CommandContext<'_>) -> Result<(), AppError>
where
    A: Replier + StickerSender + AvatarSource,
{
    let reply = resolve_reply_payload(ctx.message).or_else(|| {
        let count = ctx.message.raw_text().map(parse_merge_count).unwrap_or(1);
        state
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .query_fallback_sequence(ctx.message, count)
    });

    let Some(reply) = reply else {
        warn!(chat = %ctx.chat_id, "No reply context on /sticker");
        api.reply(ctx.chat_id, NO_TARGET, ctx.message_id()).await?;
        return Ok(());
    };

    let Some(text) = reply.text.as_deref() else {
        api.reply(ctx.chat_id, NO_TEXT, ctx.message_id()).await?;
        return Ok(());
    };

    info!(
        source = reply.source.as_str(),
        chat = %ctx.chat_id,
        has_user_id = reply.sender_id.is_some(),
        "Reply context resolved"
    );

    if let Err(e) = render_and_send(api, state, ctx, &reply.speaker, text, reply.sender_id).await {
        error!(error = %e, "Failed to render sticker");
        api.reply(ctx.chat_id, &format!("Failed to generate sticker: {e}"), ctx.message_id())
            .await?;
    }
    Ok(())
}

/// `/preview`: render sample text as the requesting user.
pub async fn handle_preview<A>(api: &A, state: &BotState, ctx: CommandContext<'_>) -> Result<(), AppError>
where
    A: Replier + StickerSender + AvatarSource,
{
    let speaker = ctx.requester_name(PREVIEW_SPEAKER);

    if let Err(e) = render_and_send(api, state, ctx, &speaker, PREVIEW_TEXT, ctx.requester_id()).await {
        error!(error = %e, "Failed to render /preview sticker");
        api.reply(ctx.chat_id, &format!("Preview failed: {e}"), ctx.message_id())
            .await?;
    }
    Ok(())
}

/// `/pack`: add the requester's last sticker to their pack.
pub async fn handle_pack<A>(api: &A, state: &BotState, ctx: CommandContext<'_>) -> Result<(), AppError>
where
    A: Replier + StickerPackApi,
{
    let Some(user_id) = ctx.requester_id() else {
        api.reply(ctx.chat_id, NO_USER, ctx.message_id()).await?;
        return Ok(());
    };

    let last = state
        .stickers
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get(user_id);
    let Some(sticker) = last else {
        api.reply(ctx.chat_id, NO_LAST_STICKER, ctx.message_id()).await?;
        return Ok(());
    };

    let display_name = ctx.requester_name("");
    let text = match api.add_to_pack(user_id, &display_name, &sticker).await {
        Ok(outcome) => {
            let action = if outcome.created {
                "Created a new sticker pack and added this sticker."
            } else {
                "Added this sticker to your sticker pack."
            };
            format!("{action}\n\nOpen the pack: {}", outcome.link())
        }
        Err(e) => {
            error!(user_id, error = %e, "Failed to add sticker to pack");
            format!("Could not add to sticker pack: {}", e.user_message())
        }
    };

    api.reply(ctx.chat_id, &text, ctx.message_id()).await?;
    Ok(())
}
