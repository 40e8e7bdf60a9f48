//! Volatile in-memory stores.
//!
//! Both stores are plain owned values; the bot wraps them in a mutex and
//! only touches them in synchronous sections.

pub mod fallback;
pub mod last_sticker;
pub mod recent;

pub use last_sticker::{LastStickerCache, DEFAULT_STICKER_CACHE_CAPACITY};
pub use recent::{CachedMessage, RecentMessageStore, DEFAULT_HISTORY_CAPACITY};
