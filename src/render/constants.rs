//! Geometry constants for the sticker canvas.
//!
//! Telegram static stickers are 512×512; all values are in canvas pixels
//! unless noted otherwise.

/// Width and height of the square canvas.
pub const CANVAS_SIZE: u32 = 512;

/// Left edge of the bubble; the avatar sits in the gutter before it.
pub const BUBBLE_X: i32 = 78;

/// Narrowest bubble, used for very short messages.
pub const BUBBLE_MIN_WIDTH: u32 = 220;

/// Widest bubble that still leaves a right margin on the canvas.
pub const BUBBLE_MAX_WIDTH: u32 = 414;

/// Bubble height for a single body line.
pub const BUBBLE_MIN_HEIGHT: u32 = 224;

/// Tallest bubble that still leaves a vertical margin on the canvas.
pub const BUBBLE_MAX_HEIGHT: u32 = 460;

/// Minimum distance between the canvas top and the bubble.
pub const BUBBLE_MIN_Y: i32 = 24;

/// Horizontal padding inside the bubble.
pub const BUBBLE_PADDING_X: u32 = 28;

/// Corner radius of the bubble.
pub const BUBBLE_RADIUS: u32 = 34;

/// Vertical space used by everything except body lines
/// (top padding, speaker line, gap, bottom padding).
pub const BUBBLE_VERTICAL_CHROME: u32 = 160;

/// Speaker label font size.
pub const SPEAKER_FONT_SIZE: f32 = 42.0;

/// Estimated pixels per width unit of the speaker label.
pub const SPEAKER_UNIT_PX: u32 = 22;

/// Offset of the speaker baseline below the bubble top.
pub const SPEAKER_BASELINE_OFFSET: i32 = 58;

/// Body font size.
pub const BODY_FONT_SIZE: f32 = 56.0;

/// Estimated pixels per width unit of body text.
pub const BODY_UNIT_PX: u32 = 30;

/// Distance between consecutive body baselines.
pub const BODY_LINE_HEIGHT: u32 = 64;

/// Offset of the first body baseline below the bubble top.
pub const BODY_BASELINE_OFFSET: i32 = 120;

/// Maximum characters of the speaker label before it is ellipsized.
pub const SPEAKER_MAX_CHARS: usize = 26;

/// Maximum characters of body text considered before wrapping.
pub const BODY_MAX_CHARS: usize = 140;

/// Maximum number of body lines.
pub const MAX_BODY_LINES: usize = 5;

/// Width units per body line.
pub const BODY_UNITS_PER_LINE: usize = 12;

/// Avatar circle radius.
pub const AVATAR_RADIUS: u32 = 30;

/// Horizontal centre of the avatar circle.
pub const AVATAR_CENTER_X: i32 = 38;

/// Offset of the avatar centre below the bubble top, level with the speaker line.
pub const AVATAR_CENTER_OFFSET_Y: i32 = 34;

/// Font size of the placeholder initial.
pub const AVATAR_INITIAL_FONT_SIZE: f32 = 34.0;
