//! Sticker rendering: pure layout followed by rasterisation.
//!
//! [`layout`] is deterministic and font-free so it can be tested without a
//! canvas. [`Rasterizer`] turns the geometry into image bytes; the bot only
//! ever talks to it through [`render_sticker`].

pub mod constants;
pub mod layout;
pub mod raster;
pub mod theme;

pub use layout::{initial_of, layout, AvatarFill, BubbleLayout};
pub use raster::{CanvasRasterizer, Rasterizer};
pub use theme::Theme;

use image::imageops::FilterType;
use image::RgbaImage;
use tracing::debug;

use crate::model::RenderError;
use constants::AVATAR_RADIUS;

/// Decode avatar bytes and crop them to the avatar square.
///
/// Returns `None` for anything the image crate cannot decode; the sticker
/// then falls back to a placeholder initial.
pub fn decode_avatar(bytes: &[u8]) -> Option<RgbaImage> {
    match image::load_from_memory(bytes) {
        Ok(image) => {
            let side = AVATAR_RADIUS * 2;
            Some(image.resize_to_fill(side, side, FilterType::Lanczos3).to_rgba8())
        }
        Err(e) => {
            debug!(error = %e, "Avatar could not be decoded, using placeholder");
            None
        }
    }
}

/// Render one reply sticker.
///
/// `speaker` and `text` are raw; clamping and wrapping happen in
/// [`layout`]. Callers must not pass empty text.
pub fn render_sticker(
    rasterizer: &dyn Rasterizer,
    speaker: &str,
    text: &str,
    avatar: Option<&[u8]>,
) -> Result<Vec<u8>, RenderError> {
    let avatar = avatar.and_then(decode_avatar);
    let layout = layout(speaker, text, avatar.is_some());
    debug!(
        lines = layout.body.len(),
        truncated = layout.truncated,
        width = layout.bubble.width,
        height = layout.bubble.height,
        "Computed bubble layout"
    );
    rasterizer.rasterize(&layout, avatar.as_ref())
}
