//! Rasterisation of a [`BubbleLayout`] into WebP bytes.
//!
//! Shapes are drawn directly into an RGBA buffer using signed distance
//! functions for anti-aliasing; glyphs come from cosmic-text. Fonts are
//! whatever the host provides through fontdb's system scan, with CJK and
//! emoji coverage depending on installed fonts.

use std::sync::Mutex;

use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight};
use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::model::RenderError;
use crate::render::constants::{
    AVATAR_INITIAL_FONT_SIZE, BODY_FONT_SIZE, BUBBLE_RADIUS, SPEAKER_FONT_SIZE,
};
use crate::render::layout::{AvatarFill, BubbleLayout, Rect};
use crate::render::theme::Theme;

/// Width of the bubble outline in pixels.
const STROKE_WIDTH: i32 = 2;

/// Lossy WebP quality, 0 to 100.
pub const WEBP_QUALITY: f32 = 92.0;

/// Turns a computed layout into encoded sticker bytes.
///
/// `avatar` is the already decoded and cropped avatar square; it is only
/// drawn when the layout asks for [`AvatarFill::Image`].
pub trait Rasterizer: Send + Sync {
    /// Draw `layout`, with `avatar` when decoded, and encode the result.
    fn rasterize(&self, layout: &BubbleLayout, avatar: Option<&RgbaImage>) -> Result<Vec<u8>, RenderError>;
}

struct FontState {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

#[derive(Debug, Clone, Copy)]
enum Anchor {
    Start,
    Middle,
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size: f32,
    weight: Weight,
    color: Rgba<u8>,
    anchor: Anchor,
}

/// Software rasterizer backed by `image` and `cosmic-text`.
pub struct CanvasRasterizer {
    theme: Theme,
    fonts: Mutex<FontState>,
}

impl std::fmt::Debug for CanvasRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasRasterizer")
            .field("theme", &self.theme)
            .finish_non_exhaustive()
    }
}

impl CanvasRasterizer {
    /// Scans system fonts, which is slow; build once and share.
    pub fn new(theme: Theme) -> Self {
        let font_system = FontSystem::new();
        debug!(faces = font_system.db().len(), "Loaded font database");
        Self {
            theme,
            fonts: Mutex::new(FontState {
                font_system,
                swash_cache: SwashCache::new(),
            }),
        }
    }

    /// Colours used for drawing.
    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

fn draw_text(
    fonts: &mut FontState,
    canvas: &mut RgbaImage,
    text: &str,
    x: i32,
    baseline_y: i32,
    style: TextStyle,
    clip: Rect,
) {
    if text.is_empty() {
        return;
    }

    let FontState {
        font_system,
        swash_cache,
    } = fonts;

    let mut buffer = Buffer::new(font_system, Metrics::new(style.size, style.size * 1.2));
    let attrs = Attrs::new().family(Family::SansSerif).weight(style.weight);
    buffer.set_text(font_system, text, attrs, Shaping::Advanced);
    buffer.shape_until_scroll(font_system, false);

    let Some((line_y, line_w)) = buffer.layout_runs().next().map(|run| (run.line_y, run.line_w)) else {
        return;
    };

    let origin_x = match style.anchor {
        Anchor::Start => x,
        Anchor::Middle => x - (line_w / 2.0).round() as i32,
    };
    let origin_y = baseline_y - line_y.round() as i32;
    let [r, g, b, a] = style.color.0;

    buffer.draw(font_system, swash_cache, Color::rgba(r, g, b, a), |gx, gy, w, h, color| {
        let coverage = f32::from(color.a()) / 255.0;
        let ink = Rgba([color.r(), color.g(), color.b(), 255]);
        for dy in 0..h as i32 {
            for dx in 0..w as i32 {
                let px = origin_x + gx + dx;
                let py = origin_y + gy + dy;
                if contains(clip, px, py) {
                    blend(canvas, px, py, ink, coverage);
                }
            }
        }
    });
}

impl Default for CanvasRasterizer {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl CanvasRasterizer {
    /// Draw the sticker onto a fresh transparent canvas without encoding it.
    pub fn paint(&self, layout: &BubbleLayout, avatar: Option<&RgbaImage>) -> Result<RgbaImage, RenderError> {
        let theme = &self.theme;
        let mut canvas = RgbaImage::new(layout.canvas_size, layout.canvas_size);
        let bubble = layout.bubble;

        let shadow = Rect {
            y: bubble.y + theme.shadow_offset_y,
            ..bubble
        };
        fill_soft_rounded_rect(
            &mut canvas,
            shadow,
            BUBBLE_RADIUS as f32,
            theme.shadow_blur,
            Rgba([0, 0, 0, 255]),
            theme.shadow_opacity,
        );
        fill_rounded_rect(&mut canvas, bubble, BUBBLE_RADIUS as f32, theme.bubble_stroke);
        fill_rounded_rect(
            &mut canvas,
            inset(bubble, STROKE_WIDTH),
            (BUBBLE_RADIUS as i32 - STROKE_WIDTH) as f32,
            theme.bubble,
        );

        let circle = &layout.avatar;
        let avatar_box = Rect {
            x: circle.center_x - circle.radius as i32,
            y: circle.center_y - circle.radius as i32,
            width: circle.radius * 2,
            height: circle.radius * 2,
        };
        let text_clip = inset(bubble, STROKE_WIDTH);

        let mut fonts = self.fonts.lock().map_err(|_| RenderError::FontSystemPoisoned)?;

        match (&circle.fill, avatar) {
            (AvatarFill::Image, Some(image)) => draw_avatar(&mut canvas, avatar_box, image),
            (AvatarFill::Image, None) => {
                fill_rounded_rect(&mut canvas, avatar_box, circle.radius as f32, theme.avatar_background);
            }
            (AvatarFill::Initial(initial), _) => {
                fill_rounded_rect(&mut canvas, avatar_box, circle.radius as f32, theme.avatar_background);
                draw_text(
                    &mut fonts,
                    &mut canvas,
                    initial,
                    circle.center_x,
                    circle.center_y + 13,
                    TextStyle {
                        size: AVATAR_INITIAL_FONT_SIZE,
                        weight: Weight::EXTRA_BOLD,
                        color: theme.avatar_text,
                        anchor: Anchor::Middle,
                    },
                    avatar_box,
                );
            }
        }

        draw_text(
            &mut fonts,
            &mut canvas,
            &layout.speaker.text,
            layout.speaker.x,
            layout.speaker.baseline_y,
            TextStyle {
                size: SPEAKER_FONT_SIZE,
                weight: Weight::BOLD,
                color: theme.speaker,
                anchor: Anchor::Start,
            },
            text_clip,
        );

        for line in &layout.body {
            draw_text(
                &mut fonts,
                &mut canvas,
                &line.text,
                line.x,
                line.baseline_y,
                TextStyle {
                    size: BODY_FONT_SIZE,
                    weight: Weight::BOLD,
                    color: theme.text,
                    anchor: Anchor::Start,
                },
                text_clip,
            );
        }
        drop(fonts);

        Ok(canvas)
    }
}

impl Rasterizer for CanvasRasterizer {
    fn rasterize(&self, layout: &BubbleLayout, avatar: Option<&RgbaImage>) -> Result<Vec<u8>, RenderError> {
        encode_webp(&self.paint(layout, avatar)?)
    }
}

/// Encode an RGBA canvas as lossy WebP at [`WEBP_QUALITY`].
///
/// Alpha is kept; libwebp compresses the alpha plane losslessly.
pub fn encode_webp(canvas: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let encoder = webp::Encoder::from_rgba(canvas.as_raw(), canvas.width(), canvas.height());
    let encoded = encoder
        .encode_simple(false, WEBP_QUALITY)
        .map_err(|e| RenderError::Encode(format!("{e:?}")))?;
    Ok(encoded.to_vec())
}

fn inset(rect: Rect, by: i32) -> Rect {
    Rect {
        x: rect.x + by,
        y: rect.y + by,
        width: rect.width.saturating_sub(2 * by as u32),
        height: rect.height.saturating_sub(2 * by as u32),
    }
}

fn contains(rect: Rect, x: i32, y: i32) -> bool {
    x >= rect.x && y >= rect.y && x < rect.x + rect.width as i32 && y < rect.y + rect.height as i32
}

/// Signed distance from a pixel centre to a rounded rectangle; negative inside.
fn rounded_rect_distance(rect: Rect, radius: f32, x: i32, y: i32) -> f32 {
    let half_w = rect.width as f32 / 2.0;
    let half_h = rect.height as f32 / 2.0;
    let radius = radius.min(half_w).min(half_h);
    let cx = rect.x as f32 + half_w;
    let cy = rect.y as f32 + half_h;

    let qx = (x as f32 + 0.5 - cx).abs() - (half_w - radius);
    let qy = (y as f32 + 0.5 - cy).abs() - (half_h - radius);
    let outside = qx.max(0.0).hypot(qy.max(0.0));
    let inside = qx.max(qy).min(0.0);
    outside + inside - radius
}

/// Source-over blend of `color` at `coverage` onto one pixel.
fn blend(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }
    let src_a = coverage.clamp(0.0, 1.0) * f32::from(color.0[3]) / 255.0;
    if src_a <= 0.0 {
        return;
    }

    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let dst_a = f32::from(dst.0[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    for channel in 0..3 {
        let src = f32::from(color.0[channel]);
        let prev = f32::from(dst.0[channel]);
        let value = (src * src_a + prev * dst_a * (1.0 - src_a)) / out_a;
        dst.0[channel] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst.0[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

fn fill_rounded_rect(canvas: &mut RgbaImage, rect: Rect, radius: f32, color: Rgba<u8>) {
    for y in rect.y..rect.y + rect.height as i32 {
        for x in rect.x..rect.x + rect.width as i32 {
            let coverage = 0.5 - rounded_rect_distance(rect, radius, x, y);
            if coverage > 0.0 {
                blend(canvas, x, y, color, coverage);
            }
        }
    }
}

/// Rounded rectangle with an edge that fades over `softness` pixels each way.
fn fill_soft_rounded_rect(
    canvas: &mut RgbaImage,
    rect: Rect,
    radius: f32,
    softness: f32,
    color: Rgba<u8>,
    opacity: f32,
) {
    let reach = softness.ceil() as i32;
    let softness = softness.max(1.0);
    for y in rect.y - reach..rect.y + rect.height as i32 + reach {
        for x in rect.x - reach..rect.x + rect.width as i32 + reach {
            let distance = rounded_rect_distance(rect, radius, x, y);
            let coverage = (0.5 - distance / (2.0 * softness)).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend(canvas, x, y, color, coverage * opacity);
            }
        }
    }
}

/// Draw `image` scaled into `target` and masked to a circle.
fn draw_avatar(canvas: &mut RgbaImage, target: Rect, image: &RgbaImage) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let radius = target.width.min(target.height) as f32 / 2.0;
    for y in 0..target.height {
        for x in 0..target.width {
            let px = target.x + x as i32;
            let py = target.y + y as i32;
            let coverage = 0.5 - rounded_rect_distance(target, radius, px, py);
            if coverage <= 0.0 {
                continue;
            }
            let sx = (x * image.width() / target.width).min(image.width() - 1);
            let sy = (y * image.height() / target.height).min(image.height() - 1);
            blend(canvas, px, py, *image.get_pixel(sx, sy), coverage);
        }
    }
}
