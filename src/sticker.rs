//! Packaging rendered cards as lossless WebP stickers.

use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageFormat};

use crate::card::CARD_SIZE;
use crate::error::QuoteError;

/// MIME type of the packaged sticker.
pub const STICKER_MIME: &str = "image/webp";

/// Convert PNG card bytes into a 512×512 lossless WebP sticker.
///
/// # Errors
///
/// Returns an error if the input cannot be decoded or the WebP encoder fails.
pub fn encode_sticker(png: &[u8]) -> Result<Vec<u8>, QuoteError> {
    let img = image::load_from_memory_with_format(png, ImageFormat::Png)
        .map_err(|e| QuoteError::Transcode(format!("Failed to decode card: {e}")))?;

    let img = if img.width() == CARD_SIZE && img.height() == CARD_SIZE {
        img
    } else {
        img.resize_exact(CARD_SIZE, CARD_SIZE, FilterType::Lanczos3)
    };
    let rgba = img.to_rgba8();

    let mut out = Vec::new();
    WebPEncoder::new_lossless(&mut out)
        .encode(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| QuoteError::Transcode(format!("Failed to encode WebP: {e}")))?;
    Ok(out)
}
