//! Reply sticker bot.
//!
//! Telegram bot that turns the message a user replied to into a chat-bubble
//! sticker carrying the original sender's name and avatar.
//!
//! The pure core (`text`, `resolve`, `store`, `render::layout`) knows nothing
//! about the network; `transport`, `services` and `bot` form the shell around
//! it.

pub mod app;
pub mod bot;
pub mod command;
pub mod config;
pub mod logging;
pub mod model;
pub mod render;
pub mod resolve;
pub mod services;
pub mod store;
pub mod text;
pub mod transport;
