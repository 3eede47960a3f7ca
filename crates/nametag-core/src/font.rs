//! Built-in 3×5 bitmap font for on-frame labels.
//!
//! Glyph rows are 3-bit integers, high bit = leftmost column. Lowercase
//! letters render as uppercase; characters outside the table render as a
//! solid block. Drawing clips at the frame edges.

use image::{Rgb, RgbImage};

pub const GLYPH_WIDTH: usize = 3;
pub const GLYPH_HEIGHT: usize = 5;
const GLYPH_SPACING: usize = 1;

/// Pixel width of `text` at the given scale.
pub fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * (GLYPH_WIDTH + GLYPH_SPACING) * scale
}

/// Pixel height of one text line at the given scale.
pub fn text_height(scale: usize) -> usize {
    GLYPH_HEIGHT * scale
}

/// Draw `text` with its top-left corner at (x, y).
pub fn draw_text(frame: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>, scale: usize) {
    let advance = ((GLYPH_WIDTH + GLYPH_SPACING) * scale) as i32;
    let mut cx = x;
    for ch in text.chars() {
        draw_glyph(frame, cx, y, ch, color, scale);
        cx += advance;
    }
}

fn draw_glyph(frame: &mut RgbImage, x: i32, y: i32, ch: char, color: Rgb<u8>, scale: usize) {
    let rows = glyph(ch);
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_WIDTH {
            if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let px = x + (col * scale + dx) as i32;
                    let py = y + (row * scale + dy) as i32;
                    if px >= 0 && py >= 0 && (px as u32) < frame.width() && (py as u32) < frame.height()
                    {
                        frame.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }
}

fn glyph(ch: char) -> [u8; GLYPH_HEIGHT] {
    match ch.to_ascii_uppercase() {
        'A' => [0x2, 0x5, 0x7, 0x5, 0x5],
        'B' => [0x6, 0x5, 0x6, 0x5, 0x6],
        'C' => [0x3, 0x4, 0x4, 0x4, 0x3],
        'D' => [0x6, 0x5, 0x5, 0x5, 0x6],
        'E' => [0x7, 0x4, 0x6, 0x4, 0x7],
        'F' => [0x7, 0x4, 0x6, 0x4, 0x4],
        'G' => [0x3, 0x4, 0x5, 0x5, 0x3],
        'H' => [0x5, 0x5, 0x7, 0x5, 0x5],
        'I' => [0x7, 0x2, 0x2, 0x2, 0x7],
        'J' => [0x1, 0x1, 0x1, 0x5, 0x2],
        'K' => [0x5, 0x5, 0x6, 0x5, 0x5],
        'L' => [0x4, 0x4, 0x4, 0x4, 0x7],
        'M' => [0x5, 0x7, 0x7, 0x5, 0x5],
        'N' => [0x6, 0x5, 0x5, 0x5, 0x5],
        'O' => [0x2, 0x5, 0x5, 0x5, 0x2],
        'P' => [0x6, 0x5, 0x6, 0x4, 0x4],
        'Q' => [0x2, 0x5, 0x5, 0x6, 0x3],
        'R' => [0x6, 0x5, 0x6, 0x5, 0x5],
        'S' => [0x3, 0x4, 0x2, 0x1, 0x6],
        'T' => [0x7, 0x2, 0x2, 0x2, 0x2],
        'U' => [0x5, 0x5, 0x5, 0x5, 0x7],
        'V' => [0x5, 0x5, 0x5, 0x5, 0x2],
        'W' => [0x5, 0x5, 0x7, 0x7, 0x5],
        'X' => [0x5, 0x5, 0x2, 0x5, 0x5],
        'Y' => [0x5, 0x5, 0x2, 0x2, 0x2],
        'Z' => [0x7, 0x1, 0x2, 0x4, 0x7],
        '0' => [0x7, 0x5, 0x5, 0x5, 0x7],
        '1' => [0x2, 0x6, 0x2, 0x2, 0x7],
        '2' => [0x7, 0x1, 0x7, 0x4, 0x7],
        '3' => [0x7, 0x1, 0x7, 0x1, 0x7],
        '4' => [0x5, 0x5, 0x7, 0x1, 0x1],
        '5' => [0x7, 0x4, 0x7, 0x1, 0x7],
        '6' => [0x7, 0x4, 0x7, 0x5, 0x7],
        '7' => [0x7, 0x1, 0x2, 0x4, 0x4],
        '8' => [0x7, 0x5, 0x7, 0x5, 0x7],
        '9' => [0x7, 0x5, 0x7, 0x1, 0x7],
        ' ' => [0x0, 0x0, 0x0, 0x0, 0x0],
        '-' => [0x0, 0x0, 0x7, 0x0, 0x0],
        '_' => [0x0, 0x0, 0x0, 0x0, 0x7],
        '.' => [0x0, 0x0, 0x0, 0x0, 0x2],
        '\'' => [0x2, 0x2, 0x0, 0x0, 0x0],
        _ => [0x7, 0x7, 0x7, 0x7, 0x7],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INK: Rgb<u8> = Rgb([255, 0, 0]);
    const PAPER: Rgb<u8> = Rgb([0, 0, 0]);

    fn ink_count(frame: &RgbImage) -> usize {
        frame.pixels().filter(|p| **p == INK).count()
    }

    #[test]
    fn test_text_metrics() {
        assert_eq!(text_width("AB", 1), 8);
        assert_eq!(text_width("AB", 3), 24);
        assert_eq!(text_height(2), 10);
    }

    #[test]
    fn test_draw_sets_glyph_pixels() {
        let mut frame = RgbImage::from_pixel(16, 8, PAPER);
        draw_text(&mut frame, 0, 0, "I", INK, 1);
        // 'I' = rows 7,2,2,2,7 → 3 + 1 + 1 + 1 + 3 pixels
        assert_eq!(ink_count(&frame), 9);
        assert_eq!(*frame.get_pixel(0, 0), INK);
        assert_eq!(*frame.get_pixel(1, 1), INK);
        assert_eq!(*frame.get_pixel(0, 1), PAPER);
    }

    #[test]
    fn test_scale_multiplies_pixels() {
        let mut small = RgbImage::from_pixel(8, 8, PAPER);
        let mut big = RgbImage::from_pixel(16, 16, PAPER);
        draw_text(&mut small, 0, 0, "L", INK, 1);
        draw_text(&mut big, 0, 0, "L", INK, 2);
        assert_eq!(ink_count(&big), ink_count(&small) * 4);
    }

    #[test]
    fn test_lowercase_matches_uppercase() {
        let mut upper = RgbImage::from_pixel(8, 8, PAPER);
        let mut lower = RgbImage::from_pixel(8, 8, PAPER);
        draw_text(&mut upper, 0, 0, "A", INK, 1);
        draw_text(&mut lower, 0, 0, "a", INK, 1);
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_clipping_out_of_frame() {
        let mut frame = RgbImage::from_pixel(4, 4, PAPER);
        draw_text(&mut frame, -2, -2, "W", INK, 1);
        draw_text(&mut frame, 100, 100, "W", INK, 1);
        // No panic; some pixels of the first glyph may land in-frame.
        assert!(ink_count(&frame) <= 16);
    }
}
