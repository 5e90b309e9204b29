//! YOLOv8 detection-head decoding.
//!
//! The head emits one `[4 + nc, N]` tensor per image: rows 0..4 hold
//! `cx, cy, w, h` in model-input pixels, the remaining rows hold per-class
//! scores for each of the `N` anchors.

use anyhow::{anyhow, Result};

use crate::detect::result::RawBox;

const CXYWH_OFFSET: usize = 4;

/// Decoding parameters for one model.
#[derive(Clone, Copy, Debug)]
pub struct YoloDecode {
    pub confidence: f32,
    pub iou: f32,
    /// Frame-to-input scale factors (`frame_w / input_w`, `frame_h / input_h`).
    pub scale_x: f32,
    pub scale_y: f32,
    pub frame_width: f32,
    pub frame_height: f32,
}

/// Decode a row-major `[4 + nc, anchors]` output into frame-space boxes.
pub fn decode_output(output: &[f32], anchors: usize, params: &YoloDecode) -> Result<Vec<RawBox>> {
    if anchors == 0 {
        return Ok(Vec::new());
    }
    if output.len() % anchors != 0 || output.len() / anchors <= CXYWH_OFFSET {
        return Err(anyhow!(
            "unexpected detection head size {} for {} anchors",
            output.len(),
            anchors
        ));
    }
    let rows = output.len() / anchors;
    let at = |row: usize, anchor: usize| output[row * anchors + anchor];

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (class_id, confidence) = (CXYWH_OFFSET..rows)
            .map(|row| (row - CXYWH_OFFSET, at(row, anchor)))
            .fold((0, f32::NEG_INFINITY), |best, x| if x.1 > best.1 { x } else { best });
        if confidence < params.confidence {
            continue;
        }

        let cx = at(0, anchor) * params.scale_x;
        let cy = at(1, anchor) * params.scale_y;
        let w = at(2, anchor) * params.scale_x;
        let h = at(3, anchor) * params.scale_y;
        let x_min = (cx - w / 2.0).clamp(0.0, params.frame_width);
        let y_min = (cy - h / 2.0).clamp(0.0, params.frame_height);
        let x_max = (cx + w / 2.0).clamp(0.0, params.frame_width);
        let y_max = (cy + h / 2.0).clamp(0.0, params.frame_height);
        candidates.push(RawBox::new(
            vec![x_min, y_min, x_max, y_max],
            class_id as i64,
            confidence,
        ));
    }

    non_max_suppression(&mut candidates, params.iou);
    Ok(candidates)
}

/// Greedy NMS, highest confidence first. Keeps the survivors sorted by
/// descending confidence.
pub fn non_max_suppression(boxes: &mut Vec<RawBox>, iou_threshold: f32) {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut current_index = 0;
    for index in 0..boxes.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            if iou(&boxes[prev_index].coords, &boxes[index].coords) > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            boxes.swap(current_index, index);
            current_index += 1;
        }
    }
    boxes.truncate(current_index);
}

fn iou(a: &[f32], b: &[f32]) -> f32 {
    let area = |c: &[f32]| (c[2] - c[0]).max(0.0) * (c[3] - c[1]).max(0.0);
    let w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = w * h;
    let union = area(a) + area(b) - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}
