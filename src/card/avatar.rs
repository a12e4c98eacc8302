//! Avatar loading and circular placement.

use image::imageops::FilterType;
use tiny_skia::{ColorU8, FillRule, Mask, PathBuilder, Pixmap, PixmapPaint, Transform};
use tracing::warn;

use crate::error::QuoteError;
use crate::model::AvatarSource;
use crate::ports::AvatarFetcher;

/// Top-left corner of the avatar box.
pub const ORIGIN: (i32, i32) = (20, 20);
/// Side of the square the avatar is scaled into.
pub const SIZE: u32 = 80;
/// Centre of the clipping circle.
pub const CENTER: (f32, f32) = (60.0, 60.0);
/// Radius of the clipping circle.
pub const RADIUS: f32 = 40.0;

/// Resolve an avatar source to encoded image bytes.
///
/// Fetch failures are logged and yield `None`; a card is still drawn without
/// the avatar.
pub async fn resolve(source: AvatarSource, fetcher: &dyn AvatarFetcher) -> Option<Vec<u8>> {
    match source {
        AvatarSource::Bytes(bytes) => Some(bytes),
        AvatarSource::Url(url) => match fetcher.fetch(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "Failed to fetch avatar, drawing card without it");
                None
            }
        },
    }
}

/// Decode `bytes` and scale them into an `SIZE`×`SIZE` premultiplied pixmap.
///
/// # Errors
///
/// Returns an error if the bytes are not a decodable image.
pub fn decode(bytes: &[u8]) -> Result<Pixmap, QuoteError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| QuoteError::Avatar(format!("Failed to decode avatar: {e}")))?;
    let rgba = img
        .resize_exact(SIZE, SIZE, FilterType::Triangle)
        .to_rgba8();

    let mut pixmap = Pixmap::new(SIZE, SIZE)
        .ok_or_else(|| QuoteError::Avatar("Failed to allocate avatar pixmap".into()))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

/// Draw `avatar` into its box on `canvas`, clipped to the circle.
///
/// The clip only applies to the avatar; later drawing is unaffected.
///
/// # Errors
///
/// Returns an error if the clip mask cannot be built.
pub fn draw(canvas: &mut Pixmap, avatar: &Pixmap) -> Result<(), QuoteError> {
    let circle = PathBuilder::from_circle(CENTER.0, CENTER.1, RADIUS)
        .ok_or_else(|| QuoteError::Render("Invalid avatar clip circle".into()))?;
    let mut clip = Mask::new(canvas.width(), canvas.height())
        .ok_or_else(|| QuoteError::Render("Failed to allocate clip mask".into()))?;
    clip.fill_path(&circle, FillRule::Winding, true, Transform::identity());

    canvas.draw_pixmap(
        ORIGIN.0,
        ORIGIN.1,
        avatar.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        Some(&clip),
    );
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ports::avatar::FetchFuture;

    pub(crate) fn solid_png(rgb: [u8; 3], side: u32) -> Vec<u8> {
        let img =
            image::RgbaImage::from_pixel(side, side, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    struct FailingFetcher;

    impl AvatarFetcher for FailingFetcher {
        fn fetch(&self, _url: String) -> FetchFuture<'_> {
            Box::pin(async { Err(QuoteError::Avatar("connection refused".into())) })
        }
    }

    #[test]
    fn decode_scales_to_box() {
        let pixmap = decode(&solid_png([0, 128, 255], 200)).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (SIZE, SIZE));
        let px = pixmap.pixel(40, 40).unwrap();
        assert_eq!(
            (px.red(), px.green(), px.blue(), px.alpha()),
            (0, 128, 255, 255)
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            decode(b"definitely not an image"),
            Err(QuoteError::Avatar(_))
        ));
    }

    #[test]
    fn draw_clips_to_circle() {
        let mut canvas = Pixmap::new(512, 512).unwrap();
        let avatar = decode(&solid_png([255, 0, 0], 80)).unwrap();
        draw(&mut canvas, &avatar).unwrap();

        let centre = canvas.pixel(60, 60).unwrap();
        assert_eq!((centre.red(), centre.alpha()), (255, 255));
        // Corner of the 80x80 box lies outside the circle.
        assert_eq!(canvas.pixel(21, 21).unwrap().alpha(), 0);
        // Nothing outside the box.
        assert_eq!(canvas.pixel(150, 60).unwrap().alpha(), 0);
    }

    #[tokio::test]
    async fn resolve_passes_bytes_through() {
        let bytes = resolve(AvatarSource::Bytes(vec![1, 2, 3]), &FailingFetcher).await;
        assert_eq!(bytes, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn resolve_swallows_fetch_errors() {
        let source = AvatarSource::Url("http://example.invalid/a.png".into());
        let bytes = resolve(source, &FailingFetcher).await;
        assert!(bytes.is_none());
    }
}
