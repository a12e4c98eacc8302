//! File naming and saving for locally rendered cards.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::QuoteError;
use crate::sticker::encode_sticker;

/// Validate the render output format.
///
/// # Errors
///
/// Returns an error if the format is not recognized.
pub fn validate_format(format: &str) -> Result<(), String> {
    match format {
        "webp" | "png" => Ok(()),
        _ => Err(format!("Unsupported format '{format}'. Valid: webp, png")),
    }
}

/// Generate an output filename from the sender name and format.
///
/// Sanitizes the first 30 characters of the name to kebab-case and appends
/// `-quote-<unix timestamp>` and the format's extension.
#[must_use]
pub fn auto_filename(sender_name: &str, format: &str) -> String {
    let sanitized = sanitize_for_filename(sender_name, 30);
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{sanitized}-quote-{timestamp}.{format}")
}

/// Sanitize a string for use in a filename.
///
/// Converts to lowercase, replaces non-alphanumeric chars with hyphens,
/// collapses consecutive hyphens, and trims to max length.
#[must_use]
pub fn sanitize_for_filename(input: &str, max_len: usize) -> String {
    let mut result = String::with_capacity(max_len);
    let mut last_was_hyphen = true; // Prevents leading hyphen

    for ch in input.chars().take(max_len * 2) {
        if result.len() >= max_len {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            result.push('-');
            last_was_hyphen = true;
        }
    }

    while result.ends_with('-') {
        result.pop();
    }

    if result.is_empty() {
        "card".to_string()
    } else {
        result
    }
}

/// Resolve the output path: use explicit path or auto-generate.
#[must_use]
pub fn resolve_output_path(explicit: Option<&str>, sender_name: &str, format: &str) -> PathBuf {
    match explicit {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(auto_filename(sender_name, format)),
    }
}

/// Write a rendered PNG card to `output_path`, packaged as a sticker for `webp`.
///
/// # Errors
///
/// Returns an error if packaging fails or the file cannot be written.
pub fn save_card(png: &[u8], format: &str, output_path: &Path) -> Result<(), QuoteError> {
    match format {
        "png" => std::fs::write(output_path, png).map_err(QuoteError::Io),
        "webp" => {
            let sticker = encode_sticker(png)?;
            std::fs::write(output_path, sticker).map_err(QuoteError::Io)
        }
        other => Err(QuoteError::InvalidArgument(format!("Unsupported format: {other}"))),
    }
}
