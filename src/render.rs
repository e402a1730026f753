//! Text rendering of sample images.

use crate::samples::{Image, IMAGE_SIDE};

/// Intensity thresholds, densest first. A pixel takes the glyph of the first
/// threshold it strictly exceeds.
pub const GLYPH_RAMP: [(u8, char); 4] = [(200, '#'), (120, '*'), (60, ':'), (20, '.')];

/// Glyph for pixels that exceed no threshold.
pub const BLANK_GLYPH: char = ' ';

pub fn glyph(intensity: u8) -> char {
    GLYPH_RAMP
        .iter()
        .find(|&&(threshold, _)| intensity > threshold)
        .map_or(BLANK_GLYPH, |&(_, g)| g)
}

/// Renders an image as 28 lines of 28 glyphs, each line terminated by `\n`.
pub fn render_image(img: &Image) -> String {
    let mut out = String::with_capacity(IMAGE_SIDE * (IMAGE_SIDE + 1));
    for row in img.chunks_exact(IMAGE_SIDE) {
        out.extend(row.iter().map(|&v| glyph(v)));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_exclusive() {
        assert_eq!(glyph(0), ' ');
        assert_eq!(glyph(20), ' ');
        assert_eq!(glyph(21), '.');
        assert_eq!(glyph(60), '.');
        assert_eq!(glyph(61), ':');
        assert_eq!(glyph(120), ':');
        assert_eq!(glyph(121), '*');
        assert_eq!(glyph(200), '*');
        assert_eq!(glyph(201), '#');
        assert_eq!(glyph(255), '#');
    }
}
