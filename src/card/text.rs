//! Text shaping, measuring and glyph rasterization on top of cosmic-text.

use std::path::PathBuf;

use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache, Weight};
use tiny_skia::{Paint, Pixmap, Rect, Transform};
use tracing::{debug, warn};

use super::wrap::TextMeasure;

/// Font size, weight and colour for one run of text.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size: f32,
    /// Bold or regular.
    pub bold: bool,
    /// Fill colour as RGB.
    pub color: [u8; 3],
}

/// Owns the font database and glyph cache used to draw card text.
pub struct TextEngine {
    fonts: FontSystem,
    glyphs: SwashCache,
    family: Option<String>,
}

impl TextEngine {
    /// Load the system fonts plus any extra font files.
    ///
    /// Unreadable font files are logged and skipped.
    #[must_use]
    pub fn new(family: Option<String>, font_files: &[PathBuf]) -> Self {
        let mut fonts = FontSystem::new();
        for path in font_files {
            if let Err(e) = fonts.db_mut().load_font_file(path) {
                warn!(path = %path.display(), error = %e, "Failed to load font file");
            }
        }
        debug!(faces = fonts.db().len(), "Font database ready");
        Self {
            fonts,
            glyphs: SwashCache::new(),
            family,
        }
    }

    fn shape(&mut self, style: TextStyle, text: &str) -> Buffer {
        let metrics = Metrics::new(style.size, style.size * 1.2);
        let mut buffer = Buffer::new(&mut self.fonts, metrics);
        buffer.set_size(&mut self.fonts, None, None);

        let family = self
            .family
            .as_deref()
            .map_or(Family::SansSerif, Family::Name);
        let weight = if style.bold {
            Weight::BOLD
        } else {
            Weight::NORMAL
        };
        let attrs = Attrs::new().family(family).weight(weight);

        buffer.set_text(&mut self.fonts, text, attrs, Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.fonts, false);
        buffer
    }

    /// Width of `text` laid out on a single line.
    pub fn measure(&mut self, style: TextStyle, text: &str) -> f32 {
        let buffer = self.shape(style, text);
        buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0, f32::max)
    }

    /// Draw `text` with its alphabetic baseline at `(x, baseline)`.
    ///
    /// The anchor matches a canvas `fillText` call with the default
    /// `alphabetic` baseline. Glyph offsets come relative to the first layout
    /// line's baseline (`line_y`), which sits below the top of a line box of
    /// 1.2× the font size, so that offset is subtracted to land on `baseline`.
    pub fn draw(
        &mut self,
        canvas: &mut Pixmap,
        style: TextStyle,
        text: &str,
        x: f32,
        baseline: f32,
    ) {
        let buffer = self.shape(style, text);
        let ascent = buffer
            .layout_runs()
            .next()
            .map_or(style.size, |run| run.line_y);
        let [r, g, b] = style.color;

        let mut paint = Paint::default();
        paint.anti_alias = false;
        buffer.draw(
            &mut self.fonts,
            &mut self.glyphs,
            Color::rgb(r, g, b),
            |gx, gy, w, h, color| {
                #[allow(clippy::cast_precision_loss)]
                let Some(rect) = Rect::from_xywh(
                    x + gx as f32,
                    baseline - ascent + gy as f32,
                    w as f32,
                    h as f32,
                ) else {
                    return;
                };
                paint.set_color_rgba8(color.r(), color.g(), color.b(), color.a());
                canvas.fill_rect(rect, &paint, Transform::identity(), None);
            },
        );
    }

    /// Bind a style so the engine can drive [`wrap_lines`](super::wrap::wrap_lines).
    pub fn measurer(&mut self, style: TextStyle) -> StyledMeasure<'_> {
        StyledMeasure {
            engine: self,
            style,
        }
    }
}

/// A [`TextEngine`] paired with the style its widths are measured in.
pub struct StyledMeasure<'a> {
    engine: &'a mut TextEngine,
    style: TextStyle,
}

impl TextMeasure for StyledMeasure<'_> {
    fn width(&mut self, text: &str) -> f32 {
        self.engine.measure(self.style, text)
    }
}
