//! Colour theme for rendered stickers.

use image::Rgba;

/// Colours and shadow parameters used by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    /// Bubble fill.
    pub bubble: Rgba<u8>,
    /// Bubble outline.
    pub bubble_stroke: Rgba<u8>,
    /// Speaker name colour.
    pub speaker: Rgba<u8>,
    /// Body text colour.
    pub text: Rgba<u8>,
    /// Placeholder circle fill.
    pub avatar_background: Rgba<u8>,
    /// Placeholder initial colour.
    pub avatar_text: Rgba<u8>,
    /// Vertical offset of the drop shadow in pixels.
    pub shadow_offset_y: i32,
    /// Width of the shadow's soft edge in pixels.
    pub shadow_blur: f32,
    /// Peak shadow opacity in `0.0..=1.0`.
    pub shadow_opacity: f32,
}

impl Theme {
    /// Telegram's dark incoming-message look on a transparent canvas.
    pub const fn telegram_dark() -> Self {
        Self {
            bubble: Rgba([0x1f, 0x2c, 0x34, 0xff]),
            bubble_stroke: Rgba([0x2a, 0x3a, 0x44, 0xff]),
            speaker: Rgba([0x53, 0xbd, 0xeb, 0xff]),
            text: Rgba([0xe9, 0xed, 0xef, 0xff]),
            avatar_background: Rgba([0x3b, 0x82, 0xc4, 0xff]),
            avatar_text: Rgba([0xff, 0xff, 0xff, 0xff]),
            shadow_offset_y: 12,
            shadow_blur: 12.0,
            shadow_opacity: 0.28,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::telegram_dark()
    }
}
