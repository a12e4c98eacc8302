//! Quote card composition.
//!
//! A card is a 512×512 transparent canvas with an optional circular avatar on
//! the left and a white rounded panel holding the sender name and the wrapped
//! quoted text.

pub mod avatar;
pub mod text;
pub mod wrap;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Transform};
use tracing::{debug, warn};

use crate::error::QuoteError;
use crate::model::QuoteCardRequest;
use crate::ports::AvatarFetcher;
use text::{TextEngine, TextStyle};
use wrap::wrap_lines;

/// Width and height of every card.
pub const CARD_SIZE: u32 = 512;

const PANEL_X: f32 = 120.0;
const PANEL_Y: f32 = 30.0;
const PANEL_WIDTH: f32 = 360.0;
const PANEL_HEIGHT: f32 = 140.0;
const PANEL_RADIUS: f32 = 20.0;

const NAME_ANCHOR: (f32, f32) = (140.0, 70.0);
const NAME_STYLE: TextStyle = TextStyle {
    size: 30.0,
    bold: true,
    color: [0xF2, 0x8C, 0x28],
};

const BODY_ANCHOR: (f32, f32) = (140.0, 110.0);
const BODY_STYLE: TextStyle = TextStyle {
    size: 28.0,
    bold: false,
    color: [0x00, 0x00, 0x00],
};
const BODY_MAX_WIDTH: f32 = 320.0;
const BODY_LINE_HEIGHT: f32 = 35.0;

/// Draws quote cards. Shareable across tasks; text drawing is serialized on
/// the font database.
pub struct CardRenderer {
    text: Mutex<TextEngine>,
}

impl CardRenderer {
    /// Create a renderer using the system fonts plus `font_files`.
    #[must_use]
    pub fn new(font_family: Option<String>, font_files: &[PathBuf]) -> Self {
        Self {
            text: Mutex::new(TextEngine::new(font_family, font_files)),
        }
    }

    /// Render a card and return it as PNG bytes.
    ///
    /// An avatar that fails to decode is logged and left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the canvas cannot be allocated or encoded.
    pub fn render(
        &self,
        sender_name: &str,
        text: &str,
        avatar: Option<&[u8]>,
    ) -> Result<Vec<u8>, QuoteError> {
        let mut canvas = Pixmap::new(CARD_SIZE, CARD_SIZE)
            .ok_or_else(|| QuoteError::Render("Failed to allocate canvas".into()))?;

        if let Some(bytes) = avatar {
            match avatar::decode(bytes) {
                Ok(image) => avatar::draw(&mut canvas, &image)?,
                Err(e) => warn!(error = %e, "Skipping avatar"),
            }
        }

        let panel = rounded_rect(PANEL_X, PANEL_Y, PANEL_WIDTH, PANEL_HEIGHT, PANEL_RADIUS)
            .ok_or_else(|| QuoteError::Render("Invalid panel geometry".into()))?;
        let mut white = Paint::default();
        white.set_color_rgba8(255, 255, 255, 255);
        white.anti_alias = true;
        canvas.fill_path(
            &panel,
            &white,
            FillRule::Winding,
            Transform::identity(),
            None,
        );

        let mut engine = self
            .text
            .lock()
            .map_err(|e| QuoteError::Render(format!("Font lock poisoned: {e}")))?;
        engine.draw(
            &mut canvas,
            NAME_STYLE,
            sender_name,
            NAME_ANCHOR.0,
            NAME_ANCHOR.1,
        );

        let lines = wrap_lines(&mut engine.measurer(BODY_STYLE), text, BODY_MAX_WIDTH);
        debug!(lines = lines.len(), "Wrapped quote text");
        let mut baseline = BODY_ANCHOR.1;
        for line in &lines {
            engine.draw(&mut canvas, BODY_STYLE, line, BODY_ANCHOR.0, baseline);
            baseline += BODY_LINE_HEIGHT;
        }
        drop(engine);

        canvas
            .encode_png()
            .map_err(|e| QuoteError::Render(format!("Failed to encode PNG: {e}")))
    }
}

/// Compose the card for `request` as PNG bytes.
///
/// A URL avatar is fetched first; drawing runs on the blocking pool.
///
/// # Errors
///
/// Returns an error if rendering fails. Avatar problems never do.
pub async fn compose(
    renderer: Arc<CardRenderer>,
    request: QuoteCardRequest,
    fetcher: &dyn AvatarFetcher,
) -> Result<Vec<u8>, QuoteError> {
    let QuoteCardRequest {
        sender_name,
        text,
        avatar,
    } = request;
    let avatar = match avatar {
        Some(source) => avatar::resolve(source, fetcher).await,
        None => None,
    };

    tokio::task::spawn_blocking(move || renderer.render(&sender_name, &text, avatar.as_deref()))
        .await
        .map_err(|e| QuoteError::Render(format!("Render task failed: {e}")))?
}

/// Closed rounded-rectangle path with quadratic corners.
fn rounded_rect(x: f32, y: f32, width: f32, height: f32, radius: f32) -> Option<Path> {
    let (right, bottom) = (x + width, y + height);
    let mut pb = PathBuilder::new();
    pb.move_to(x + radius, y);
    pb.line_to(right - radius, y);
    pb.quad_to(right, y, right, y + radius);
    pb.line_to(right, bottom - radius);
    pb.quad_to(right, bottom, right - radius, bottom);
    pb.line_to(x + radius, bottom);
    pb.quad_to(x, bottom, x, bottom - radius);
    pb.line_to(x, y + radius);
    pb.quad_to(x, y, x + radius, y);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::avatar::tests::solid_png;

    fn decode(png: &[u8]) -> image::RgbaImage {
        image::load_from_memory_with_format(png, image::ImageFormat::Png)
            .unwrap()
            .to_rgba8()
    }

    fn renderer() -> CardRenderer {
        CardRenderer::new(None, &[])
    }

    #[test]
    fn card_is_always_512_square() {
        let renderer = renderer();
        let long = "word ".repeat(400);
        for (text, avatar) in [
            ("", None),
            ("hello world", Some(solid_png([10, 20, 30], 64))),
            (long.as_str(), None),
        ] {
            let png = renderer.render("Alice", text, avatar.as_deref()).unwrap();
            let img = decode(&png);
            assert_eq!(img.dimensions(), (CARD_SIZE, CARD_SIZE));
        }
    }

    #[test]
    fn panel_is_white_and_background_transparent() {
        let img = decode(&renderer().render("Alice", "", None).unwrap());
        assert_eq!(img.get_pixel(300, 160).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(5, 5).0[3], 0);
        assert_eq!(img.get_pixel(300, 400).0[3], 0);
        // Rounded corner leaves the exact panel corner empty.
        assert_eq!(img.get_pixel(121, 31).0[3], 0);
    }

    #[test]
    fn invalid_avatar_still_draws_panel() {
        let garbage: &[u8] = b"not an image";
        let img = decode(&renderer().render("Alice", "hello", Some(garbage)).unwrap());
        assert_eq!(img.get_pixel(300, 160).0, [255, 255, 255, 255]);
        assert_eq!(img.get_pixel(60, 60).0[3], 0);
    }

    #[test]
    fn avatar_is_drawn_and_panel_is_not_clipped() {
        let avatar = solid_png([200, 0, 0], 120);
        let img = decode(&renderer().render("Alice", "", Some(&avatar)).unwrap());
        assert_eq!(img.get_pixel(60, 60).0, [200, 0, 0, 255]);
        assert_eq!(img.get_pixel(21, 21).0[3], 0);
        assert_eq!(img.get_pixel(300, 160).0, [255, 255, 255, 255]);
    }

    #[test]
    fn body_text_wraps_within_panel_width_with_loaded_fonts() {
        let text = "lorem ipsum dolor sit amet ".repeat(8);
        let text = &text[..200];
        let renderer = renderer();
        let mut engine = renderer.text.lock().unwrap();

        let lines = wrap_lines(&mut engine.measurer(BODY_STYLE), text, BODY_MAX_WIDTH);

        assert!(lines.len() > 1);
        for line in &lines {
            if line.contains(' ') {
                let width = engine.measure(BODY_STYLE, line);
                assert!(width <= BODY_MAX_WIDTH, "{line:?} measures {width}px");
            }
        }
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(lines.join(" "), normalized);
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = renderer();
        let a = renderer.render("Bob", "the same words twice", None).unwrap();
        let b = renderer.render("Bob", "the same words twice", None).unwrap();
        assert_eq!(a, b);
    }
}
