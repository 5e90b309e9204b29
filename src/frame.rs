//! Per-event frame buffer and pixel-space boxes.
//!
//! A `Frame` lives for exactly one inbound event: decoded, annotated in
//! place, re-encoded, dropped. It is never shared across invocations.

use image::{imageops, RgbImage};

/// Raw 8-bit RGB frame (height × width × 3).
pub type Frame = RgbImage;

/// Integer pixel box. `x_min < x_max` and `y_min < y_max` are expected but
/// not enforced; detector output is taken as-is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl BoundingBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Build from raw detector coordinates, truncating toward zero.
    ///
    /// Returns `None` unless exactly four values are given.
    pub fn from_coords(coords: &[f32]) -> Option<Self> {
        match coords {
            [x_min, y_min, x_max, y_max] => Some(Self::new(
                *x_min as i32,
                *y_min as i32,
                *x_max as i32,
                *y_max as i32,
            )),
            _ => None,
        }
    }

    /// Signed extent along x. Widened so saturated coordinates cannot overflow.
    pub fn width(&self) -> i64 {
        i64::from(self.x_max) - i64::from(self.x_min)
    }

    pub fn height(&self) -> i64 {
        i64::from(self.y_max) - i64::from(self.y_min)
    }
}

/// Copy the region of interest under `bbox`, clamped to the frame.
///
/// Returns `None` when nothing of the box lies inside the frame.
pub fn crop_roi(frame: &Frame, bbox: &BoundingBox) -> Option<RgbImage> {
    let (width, height) = frame.dimensions();
    let x0 = bbox.x_min.clamp(0, width as i32) as u32;
    let y0 = bbox.y_min.clamp(0, height as i32) as u32;
    let x1 = bbox.x_max.clamp(0, width as i32) as u32;
    let y1 = bbox.y_max.clamp(0, height as i32) as u32;
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(imageops::crop_imm(frame, x0, y0, x1 - x0, y1 - y0).to_image())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn coords_truncate_toward_zero() {
        let bbox = BoundingBox::from_coords(&[10.9, 20.2, 110.7, 80.99]).unwrap();
        assert_eq!(bbox, BoundingBox::new(10, 20, 110, 80));
        assert_eq!(bbox.width(), 100);
        assert_eq!(bbox.height(), 60);
    }

    #[test]
    fn saturated_coords_keep_a_positive_extent() {
        let bbox = BoundingBox::from_coords(&[-3.0e9, 0.0, 3.0e9, 10.0]).unwrap();
        assert_eq!(bbox.x_min, i32::MIN);
        assert_eq!(bbox.x_max, i32::MAX);
        assert_eq!(bbox.width(), u32::MAX as i64);
        assert_eq!(bbox.height(), 10);
    }

    #[test]
    fn wrong_coordinate_count_is_rejected() {
        assert!(BoundingBox::from_coords(&[1.0, 2.0, 3.0]).is_none());
        assert!(BoundingBox::from_coords(&[1.0, 2.0, 3.0, 4.0, 5.0]).is_none());
        assert!(BoundingBox::from_coords(&[]).is_none());
    }

    #[test]
    fn roi_is_clamped_to_frame() {
        let mut frame = Frame::new(40, 30);
        frame.put_pixel(39, 29, Rgb([9, 8, 7]));
        let roi = crop_roi(&frame, &BoundingBox::new(30, 20, 100, 100)).unwrap();
        assert_eq!(roi.dimensions(), (10, 10));
        assert_eq!(roi.get_pixel(9, 9), &Rgb([9, 8, 7]));
    }

    #[test]
    fn roi_outside_frame_is_empty() {
        let frame = Frame::new(40, 30);
        assert!(crop_roi(&frame, &BoundingBox::new(50, 0, 60, 10)).is_none());
        assert!(crop_roi(&frame, &BoundingBox::new(20, 10, 10, 20)).is_none());
    }
}
