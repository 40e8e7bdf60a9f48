//! Most recently rendered sticker per user, for `/pack`.
//!
//! Eviction is by first insertion of a key, not by access: re-storing a
//! sticker for a user already present keeps that user's original slot.

use std::collections::{HashMap, VecDeque};

/// Default number of users whose last sticker is kept.
pub const DEFAULT_STICKER_CACHE_CAPACITY: usize = 300;

/// Most recent sticker bytes per user, bounded with LRU eviction.
#[derive(Debug)]
pub struct LastStickerCache {
    capacity: usize,
    order: VecDeque<i64>,
    stickers: HashMap<i64, Vec<u8>>,
}

impl Default for LastStickerCache {
    fn default() -> Self {
        Self::new(DEFAULT_STICKER_CACHE_CAPACITY)
    }
}

impl LastStickerCache {
    /// A capacity of 0 falls back to [`DEFAULT_STICKER_CACHE_CAPACITY`].
    pub fn new(capacity: usize) -> Self {
        let capacity = if capacity == 0 {
            DEFAULT_STICKER_CACHE_CAPACITY
        } else {
            capacity
        };
        Self {
            capacity,
            order: VecDeque::new(),
            stickers: HashMap::new(),
        }
    }

    /// Store a copy of `bytes` as the user's last sticker.
    pub fn put(&mut self, user_id: i64, bytes: &[u8]) {
        if self.stickers.insert(user_id, bytes.to_vec()).is_none() {
            self.order.push_back(user_id);
        }

        while self.stickers.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.stickers.remove(&oldest);
        }
    }

    /// A copy of the user's last sticker.
    pub fn get(&self, user_id: i64) -> Option<Vec<u8>> {
        self.stickers.get(&user_id).cloned()
    }

    /// Number of users with a remembered sticker.
    pub fn len(&self) -> usize {
        self.stickers.len()
    }

    /// Whether no sticker is remembered.
    pub fn is_empty(&self) -> bool {
        self.stickers.is_empty()
    }
}
