//! Narrow capabilities handed to command handlers.
//!
//! Each handler states in its signature which of these it needs. The Bot
//! API client implements all of them; tests substitute in-memory doubles.

use std::future::Future;

use crate::model::{ChatId, PackError, TransportError, Update};
use crate::services::{self, PackOutcome};
use crate::transport::TelegramClient;

/// Source of incoming updates for the polling loop.
pub trait UpdateSource {
    /// Updates with id `>= offset`, waiting up to `timeout_secs` for new ones.
    fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> impl Future<Output = Result<Vec<Update>, TransportError>> + Send;
}

/// Send a text message, optionally as a reply.
pub trait Replier {
    /// Send `text` to `chat_id`, replying to `reply_to` when given.
    fn reply(
        &self,
        chat_id: &ChatId,
        text: &str,
        reply_to: Option<i64>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Send rendered sticker bytes, optionally as a reply.
pub trait StickerSender {
    /// Upload `webp` as a sticker to `chat_id`.
    fn send_sticker(
        &self,
        chat_id: &ChatId,
        sticker: Vec<u8>,
        reply_to: Option<i64>,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Look up a user's avatar. Failures are absence.
pub trait AvatarSource {
    /// Bytes of the user's newest profile photo, or `None`.
    fn fetch_avatar(&self, user_id: i64) -> impl Future<Output = Option<Vec<u8>>> + Send;
}

/// Add a sticker to the user's personal pack.
pub trait StickerPackApi {
    /// Add `webp` to the pack owned by `user_id`, creating it on first use.
    fn add_to_pack(
        &self,
        user_id: i64,
        display_name: &str,
        sticker: &[u8],
    ) -> impl Future<Output = Result<PackOutcome, PackError>> + Send;
}

/// Bot API client paired with the bot's own username, which pack names need.
#[derive(Debug, Clone)]
pub struct TelegramApi {
    client: TelegramClient,
    bot_username: Option<String>,
}

impl TelegramApi {
    /// Pair a client with the bot's username.
    pub fn new(client: TelegramClient, bot_username: Option<String>) -> Self {
        Self { client, bot_username }
    }

    /// The underlying Bot API client.
    pub fn client(&self) -> &TelegramClient {
        &self.client
    }

    /// Username reported by `getMe`, if known.
    pub fn bot_username(&self) -> Option<&str> {
        self.bot_username.as_deref()
    }
}

impl UpdateSource for TelegramApi {
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
        self.client.get_updates(offset, timeout_secs).await
    }
}

impl Replier for TelegramApi {
    async fn reply(&self, chat_id: &ChatId, text: &str, reply_to: Option<i64>) -> Result<(), TransportError> {
        self.client.send_message(chat_id, text, reply_to).await?;
        Ok(())
    }
}

impl StickerSender for TelegramApi {
    async fn send_sticker(
        &self,
        chat_id: &ChatId,
        sticker: Vec<u8>,
        reply_to: Option<i64>,
    ) -> Result<(), TransportError> {
        self.client.send_sticker(chat_id, sticker, reply_to).await?;
        Ok(())
    }
}

impl AvatarSource for TelegramApi {
    async fn fetch_avatar(&self, user_id: i64) -> Option<Vec<u8>> {
        services::fetch_avatar(&self.client, user_id).await
    }
}

impl StickerPackApi for TelegramApi {
    async fn add_to_pack(&self, user_id: i64, display_name: &str, sticker: &[u8]) -> Result<PackOutcome, PackError> {
        services::ensure_sticker_in_pack(
            &self.client,
            self.bot_username.as_deref(),
            user_id,
            display_name,
            sticker,
        )
        .await
    }
}
