//! Bot API workflows built on top of the transport client.

pub mod avatar;
pub mod sticker_pack;

pub use avatar::fetch_avatar;
pub use sticker_pack::{ensure_sticker_in_pack, PackOutcome};
