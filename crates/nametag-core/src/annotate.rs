//! Frame annotation: box outlines, label strips, label text.
//!
//! Mirrors the classic tagging look — a 2 px outline around each face, a
//! filled strip along the bottom edge of the box, and the label drawn dark
//! on the strip. Everything clips at the frame edges.

use crate::font;
use crate::pipeline::TaggedFace;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const LABEL_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const OUTLINE_THICKNESS: i32 = 2;
const LABEL_STRIP_HEIGHT: i32 = 35;
const LABEL_INSET: i32 = 6;
const LABEL_TEXT_SCALE: usize = 4;

/// Draw every tagged face onto the frame, in the order given.
pub fn draw_tags(frame: &mut RgbImage, tags: &[TaggedFace]) {
    for tag in tags {
        draw_tag(frame, tag);
    }
}

fn draw_tag(frame: &mut RgbImage, tag: &TaggedFace) {
    let left = tag.bbox.x.round() as i32;
    let top = tag.bbox.y.round() as i32;
    let width = (tag.bbox.width.round() as i32).max(1);
    let height = (tag.bbox.height.round() as i32).max(1);
    let bottom = top + height;

    for inset in 0..OUTLINE_THICKNESS {
        let w = width - 2 * inset;
        let h = height - 2 * inset;
        if w <= 0 || h <= 0 {
            break;
        }
        draw_hollow_rect_mut(
            frame,
            Rect::at(left + inset, top + inset).of_size(w as u32, h as u32),
            BOX_COLOR,
        );
    }

    draw_filled_rect_mut(
        frame,
        Rect::at(left, bottom - LABEL_STRIP_HEIGHT).of_size(width as u32, LABEL_STRIP_HEIGHT as u32),
        BOX_COLOR,
    );

    let text_y = bottom - LABEL_INSET - font::text_height(LABEL_TEXT_SCALE) as i32;
    font::draw_text(
        frame,
        left + LABEL_INSET,
        text_y,
        &tag.label,
        LABEL_COLOR,
        LABEL_TEXT_SCALE,
    );
}
