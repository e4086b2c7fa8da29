//! Renderer errors and color parsing.

use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Parse a CSS hex color (`#rgb`, `#rrggbb` or `#rrggbbaa`).
///
/// Anything else, including named colors, falls back to black.
pub fn parse_hex_color(color: &str) -> Color {
    color
        .trim()
        .strip_prefix('#')
        .and_then(parse_hex_digits)
        .unwrap_or_else(|| {
            log::debug!("Unrecognized color {:?}, using black", color);
            Color::BLACK
        })
}

fn parse_hex_digits(hex: &str) -> Option<Color> {
    let channel = |start: usize, len: usize| u8::from_str_radix(hex.get(start..start + len)?, 16).ok();
    match hex.len() {
        // #rgb -> #rrggbb
        3 => Some(Color::from_rgba8(channel(0, 1)? * 17, channel(1, 1)? * 17, channel(2, 1)? * 17, 255)),
        6 => Some(Color::from_rgba8(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?, 255)),
        8 => Some(Color::from_rgba8(channel(0, 2)?, channel(2, 2)?, channel(4, 2)?, channel(6, 2)?)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgba(color: Color) -> [u8; 4] {
        let c = color.to_rgba8();
        [c.r, c.g, c.b, c.a]
    }

    #[test]
    fn test_short_hex() {
        assert_eq!(rgba(parse_hex_color("#fff")), [255, 255, 255, 255]);
        assert_eq!(rgba(parse_hex_color("#f00")), [255, 0, 0, 255]);
    }

    #[test]
    fn test_long_hex() {
        assert_eq!(rgba(parse_hex_color("#e11d48")), [0xe1, 0x1d, 0x48, 255]);
        assert_eq!(rgba(parse_hex_color("#0ea5e980")), [0x0e, 0xa5, 0xe9, 0x80]);
    }

    #[test]
    fn test_invalid_falls_back_to_black() {
        assert_eq!(rgba(parse_hex_color("red")), [0, 0, 0, 255]);
        assert_eq!(rgba(parse_hex_color("#zzz")), [0, 0, 0, 255]);
        assert_eq!(rgba(parse_hex_color("#12345")), [0, 0, 0, 255]);
    }
}
