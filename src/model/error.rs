//! Error types for the sticker bot.
//!
//! Expected absence (no reply target, no avatar, no cached sticker) is never
//! an error here; it is modelled with `Option` by the components themselves.
//! The types below cover the failures that can actually happen.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - top-level error caught at the task boundary
//!   - [`ConfigError`](crate::config::ConfigError) - config file or token problems
//!   - [`LoggingError`](crate::logging::LoggingError) - subscriber setup failures
//!   - [`TransportError`] - Bot API and HTTP failures
//!   - [`RenderError`] - rasterisation and encoding failures
//!   - [`PackError`] - sticker pack management failures
//!
//! # Recovery Strategy
//!
//! Configuration and logging errors are fatal at startup. Everything else is
//! scoped to a single update: the handler's task logs it, answers the user
//! and the bot keeps polling.

use crate::config::ConfigError;
use crate::logging::LoggingError;
use thiserror::Error;

/// Top-level error returned from command handlers and startup.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded or is incomplete.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    /// A Bot API call failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A sticker could not be rendered.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// A sticker pack operation failed.
    #[error("Sticker pack error: {0}")]
    Pack(#[from] PackError),
}

/// Failures talking to the Bot API or downloading files from it.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network or protocol failure below the API layer.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with `ok: false`.
    ///
    /// `description` is the human-readable reason Telegram gives, e.g.
    /// `Bad Request: STICKERSET_INVALID`.
    #[error("Bot API rejected {method}: {description}")]
    Api {
        /// Method that was called.
        method: String,
        /// Telegram error code, if present.
        code: Option<i64>,
        /// Telegram error description.
        description: String,
    },

    /// The API answered `ok: true` without a usable result.
    #[error("Bot API returned no result for {method}")]
    MissingResult {
        /// Method that was called.
        method: String,
    },

    /// A file download returned a non-success status.
    #[error("File download failed with status {status}")]
    Download {
        /// HTTP status code.
        status: u16,
    },
}

impl TransportError {
    /// Telegram's error description, when the API produced one.
    pub fn api_description(&self) -> Option<&str> {
        match self {
            TransportError::Api { description, .. } => Some(description),
            _ => None,
        }
    }
}

/// Failures turning a bubble layout into image bytes.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The canvas could not be encoded; carries the encoder's status.
    #[error("Failed to encode sticker image: {0}")]
    Encode(String),

    /// The blocking render task panicked or was cancelled.
    #[error("Render task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// The font system was poisoned by an earlier panic.
    #[error("Font system unavailable")]
    FontSystemPoisoned,
}

/// Failures managing the user's sticker pack.
#[derive(Debug, Error)]
pub enum PackError {
    /// `getMe` returned no username; packs are named after the bot.
    #[error("Bot username unavailable. Please set a public username in @BotFather.")]
    MissingBotUsername,

    /// The bot username leaves no room for a pack short name.
    #[error("Bot username is too long for a sticker set short name.")]
    BotUsernameTooLong,

    /// An underlying API call failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl PackError {
    /// Short explanation suitable for sending back to the user.
    pub fn user_message(&self) -> String {
        let text = match self {
            PackError::Transport(err) => err
                .api_description()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string()),
            other => return other.to_string(),
        };
        let upper = text.to_uppercase();

        if upper.contains("STICKERSET_OWNER_ANONYMOUS") {
            return "Sticker packs cannot be managed anonymously. Send /pack from your personal account."
                .to_string();
        }
        if upper.contains("STICKER_FILE_INVALID") {
            return "This sticker file does not meet Telegram's requirements. Generate it again and retry."
                .to_string();
        }
        if upper.contains("STICKERSET_INVALID") {
            return "The sticker pack is in an unexpected state. Please try again later.".to_string();
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(description: &str) -> TransportError {
        TransportError::Api {
            method: "addStickerToSet".to_string(),
            code: Some(400),
            description: description.to_string(),
        }
    }

    #[test]
    fn api_error_display_names_method_and_reason() {
        let err = api_error("Bad Request: chat not found");
        assert_eq!(
            err.to_string(),
            "Bot API rejected addStickerToSet: Bad Request: chat not found"
        );
    }

    #[test]
    fn pack_error_translates_anonymous_owner() {
        let err = PackError::from(api_error("Bad Request: STICKERSET_OWNER_ANONYMOUS"));
        assert!(err.user_message().contains("anonymously"));
    }

    #[test]
    fn pack_error_translates_invalid_file_case_insensitively() {
        let err = PackError::from(api_error("bad request: sticker_file_invalid"));
        assert!(err.user_message().contains("requirements"));
    }

    #[test]
    fn pack_error_passes_unknown_descriptions_through() {
        let err = PackError::from(api_error("Too Many Requests: retry after 5"));
        assert_eq!(err.user_message(), "Too Many Requests: retry after 5");
    }

    #[test]
    fn pack_error_own_variants_use_display() {
        assert!(PackError::MissingBotUsername
            .user_message()
            .contains("@BotFather"));
    }

    #[test]
    fn app_error_wraps_render_error() {
        let err: AppError = RenderError::FontSystemPoisoned.into();
        assert_eq!(err.to_string(), "Render error: Font system unavailable");
    }
}
