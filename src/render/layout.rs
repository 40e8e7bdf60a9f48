//! Bubble layout engine.
//!
//! Pure function from (speaker, body, has-avatar) to pixel geometry. Text is
//! measured in width units rather than with font metrics; see
//! [`crate::text`].

use crate::render::constants::*;
use crate::text::{clamp_text, ellipsize_last_line, normalize_text, text_width, wrap_text};

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A single line of text positioned by its baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    /// Already clamped to fit.
    pub text: String,
    /// Left edge of the first glyph.
    pub x: i32,
    /// Baseline of the line in canvas pixels.
    pub baseline_y: i32,
}

/// What goes inside the avatar circle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarFill {
    /// The caller supplies avatar image bytes.
    Image,
    /// Deterministic placeholder: a filled circle with this initial.
    Initial(String),
}

/// Avatar position and fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarCircle {
    /// Circle centre, x.
    pub center_x: i32,
    /// Circle centre, y.
    pub center_y: i32,
    /// Radius in pixels.
    pub radius: u32,
    /// Photo or initial placeholder.
    pub fill: AvatarFill,
}

/// Complete geometry for one sticker. Built per render, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BubbleLayout {
    /// Side of the square canvas.
    pub canvas_size: u32,
    /// Bubble rectangle on the canvas.
    pub bubble: Rect,
    /// Avatar circle, vertically aligned with the speaker line.
    pub avatar: AvatarCircle,
    /// Speaker name line, drawn above the body.
    pub speaker: TextLine,
    /// Wrapped body lines, top to bottom.
    pub body: Vec<TextLine>,
    /// Whether body text was cut short.
    pub truncated: bool,
}

/// First character of the trimmed speaker label, uppercased; `?` if blank.
pub fn initial_of(speaker: &str) -> String {
    speaker
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

/// Clamp, wrap and ellipsize body text into at most [`MAX_BODY_LINES`] lines.
///
/// Returns the lines and whether anything was dropped.
pub fn build_body_lines(body: &str) -> (Vec<String>, bool) {
    let limited = clamp_text(body, BODY_MAX_CHARS);
    let wrapped = wrap_text(&limited, BODY_UNITS_PER_LINE, MAX_BODY_LINES);
    let truncated = limited != normalize_text(body) || wrapped.truncated;
    (
        ellipsize_last_line(wrapped.lines, truncated, BODY_UNITS_PER_LINE),
        truncated,
    )
}

/// Bubble width from the widest rendered line, clamped to the canvas budget.
pub fn bubble_width(speaker: &str, body_lines: &[String]) -> u32 {
    let speaker_px = text_width(speaker) as u32 * SPEAKER_UNIT_PX;
    let body_px = body_lines
        .iter()
        .map(|line| text_width(line) as u32 * BODY_UNIT_PX)
        .max()
        .unwrap_or(0);
    let content = speaker_px.max(body_px) + 2 * BUBBLE_PADDING_X;
    content.clamp(BUBBLE_MIN_WIDTH, BUBBLE_MAX_WIDTH)
}

/// Bubble height from the number of body lines, clamped to the canvas budget.
pub fn bubble_height(line_count: usize) -> u32 {
    let content = BUBBLE_VERTICAL_CHROME + line_count as u32 * BODY_LINE_HEIGHT;
    content.clamp(BUBBLE_MIN_HEIGHT, BUBBLE_MAX_HEIGHT)
}

/// Compute the sticker geometry.
///
/// Never fails; callers are responsible for not rendering empty text.
pub fn layout(speaker_raw: &str, body_raw: &str, has_avatar: bool) -> BubbleLayout {
    let speaker = clamp_text(speaker_raw, SPEAKER_MAX_CHARS);
    let (lines, truncated) = build_body_lines(body_raw);

    let width = bubble_width(&speaker, &lines);
    let height = bubble_height(lines.len());
    let y = ((CANVAS_SIZE as i32 - height as i32) / 2).max(BUBBLE_MIN_Y);
    let bubble = Rect {
        x: BUBBLE_X,
        y,
        width,
        height,
    };

    let text_x = BUBBLE_X + BUBBLE_PADDING_X as i32;
    let fill = if has_avatar {
        AvatarFill::Image
    } else {
        AvatarFill::Initial(initial_of(speaker_raw))
    };

    BubbleLayout {
        canvas_size: CANVAS_SIZE,
        bubble,
        avatar: AvatarCircle {
            center_x: AVATAR_CENTER_X,
            center_y: y + AVATAR_CENTER_OFFSET_Y,
            radius: AVATAR_RADIUS,
            fill,
        },
        speaker: TextLine {
            text: speaker,
            x: text_x,
            baseline_y: y + SPEAKER_BASELINE_OFFSET,
        },
        body: lines
            .into_iter()
            .enumerate()
            .map(|(index, text)| TextLine {
                text,
                x: text_x,
                baseline_y: y + BODY_BASELINE_OFFSET + (index as u32 * BODY_LINE_HEIGHT) as i32,
            })
            .collect(),
        truncated,
    }
}
