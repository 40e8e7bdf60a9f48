//! Domain model types (pure).
//!
//! Transport records, identifier newtypes and the error taxonomy.

pub mod error;
pub mod identifiers;
pub mod message;

// Re-export for convenience
pub use error::{AppError, PackError, RenderError, TransportError};
pub use identifiers::{ConversationKey, SenderKey};
pub use message::{
    Chat, ChatId, ExternalReplyInfo, File, Message, MessageOrigin, PhotoSize, StickerSet, TextQuote,
    Update, User, UserProfilePhotos,
};
