//! Greedy word wrapping against a measured font.

/// Measures the rendered width of a run of text.
pub trait TextMeasure {
    /// Width of `text` in pixels when drawn in a single line.
    fn width(&mut self, text: &str) -> f32;
}

/// Split `text` into lines no wider than `max_width`.
///
/// Words are accumulated greedily; each candidate line is measured with its
/// trailing space. A word that is wider than `max_width` on its own is never
/// split and ends up alone on an overflowing line.
pub fn wrap_lines<M: TextMeasure + ?Sized>(
    measure: &mut M,
    text: &str,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = format!("{line}{word} ");
        if !line.is_empty() && measure.width(&candidate) > max_width {
            lines.push(line.trim_end().to_string());
            line = format!("{word} ");
        } else {
            line = candidate;
        }
    }

    if !line.is_empty() {
        lines.push(line.trim_end().to_string());
    }
    lines
}
