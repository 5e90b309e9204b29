//! Bounding-box and label overlay.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Context, Result};
use image::Rgb;
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::frame::{BoundingBox, Frame};

pub const VEHICLE_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
pub const SIGN_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const BOX_THICKNESS: i32 = 2;
const LABEL_SCALE: f32 = 24.0;
const LABEL_GAP: i32 = 10;

/// Draws detections onto frames. Built once, shared by all handlers.
///
/// Label text needs a TrueType font; without one only the boxes are drawn.
pub struct Annotator {
    font: Option<FontVec>,
    scale: PxScale,
}

impl Annotator {
    pub fn without_font() -> Self {
        Self {
            font: None,
            scale: PxScale::from(LABEL_SCALE),
        }
    }

    pub fn with_font(font: FontVec) -> Self {
        Self {
            font: Some(font),
            scale: PxScale::from(LABEL_SCALE),
        }
    }

    pub fn load_font<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font {}", path.display()))?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| anyhow!("invalid font {}: {}", path.display(), e))?;
        Ok(Self::with_font(font))
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Draw a hollow box with its label above the top-left corner.
    pub fn draw(&self, frame: &mut Frame, bbox: &BoundingBox, label: &str, color: Rgb<u8>) {
        let (fw, fh) = frame.dimensions();
        // Edges beyond the margin are off-screen either way.
        let clamp_x = |x: i32| x.clamp(-BOX_THICKNESS, fw as i32 + BOX_THICKNESS);
        let clamp_y = |y: i32| y.clamp(-BOX_THICKNESS, fh as i32 + BOX_THICKNESS);
        let (x0, x1) = (clamp_x(bbox.x_min), clamp_x(bbox.x_max));
        let (y0, y1) = (clamp_y(bbox.y_min), clamp_y(bbox.y_max));
        let (left, top) = (x0.min(x1), y0.min(y1));
        let width = x0.abs_diff(x1);
        let height = y0.abs_diff(y1);
        if width == 0 || height == 0 {
            return;
        }

        for inset in 0..BOX_THICKNESS {
            let (w, h) = (width as i32 - 2 * inset, height as i32 - 2 * inset);
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(left + inset, top + inset).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(frame, rect, color);
        }

        if let Some(font) = &self.font {
            let y = top - LABEL_GAP - self.scale.y as i32;
            draw_text_mut(frame, color, left, y, self.scale, font, label);
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::without_font()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_box_outline_in_place() {
        let mut frame = Frame::new(50, 50);
        Annotator::without_font().draw(
            &mut frame,
            &BoundingBox::new(10, 10, 30, 20),
            "car 14.00 m",
            VEHICLE_COLOR,
        );
        assert_eq!(frame.get_pixel(10, 10), &VEHICLE_COLOR);
        assert_eq!(frame.get_pixel(29, 19), &VEHICLE_COLOR);
        assert_eq!(frame.get_pixel(11, 11), &VEHICLE_COLOR);
        assert_eq!(frame.get_pixel(20, 15), &Rgb([0, 0, 0]));
    }

    #[test]
    fn degenerate_and_offscreen_boxes_do_not_panic() {
        let mut frame = Frame::new(20, 20);
        let annotator = Annotator::default();
        annotator.draw(&mut frame, &BoundingBox::new(5, 5, 5, 9), "", SIGN_COLOR);
        annotator.draw(&mut frame, &BoundingBox::new(-30, -30, 100, 100), "", SIGN_COLOR);
        annotator.draw(&mut frame, &BoundingBox::new(15, 15, 5, 5), "", SIGN_COLOR);
        assert!(!annotator.has_font());
    }

    #[test]
    fn huge_boxes_are_clipped_to_the_frame() {
        let mut frame = Frame::new(20, 20);
        let bbox = BoundingBox::new(i32::MIN, 2, i32::MAX, 12);
        Annotator::default().draw(&mut frame, &bbox, "car", VEHICLE_COLOR);
        assert_eq!(frame.get_pixel(10, 2), &VEHICLE_COLOR);
        assert_eq!(frame.get_pixel(10, 11), &VEHICLE_COLOR);
        assert_eq!(frame.get_pixel(10, 7), &Rgb([0, 0, 0]));
    }

    #[test]
    fn missing_font_file_is_an_error() {
        assert!(Annotator::load_font("/nonexistent/font.ttf").is_err());
    }
}
