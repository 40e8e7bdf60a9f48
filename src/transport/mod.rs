//! Telegram Bot API transport.

pub mod client;

pub use client::{InputSticker, TelegramClient, DEFAULT_API_URL};
