//! Per-frame detection fusion.
//!
//! One call to [`FusionPipeline::run`] turns one decoded frame into one
//! annotated frame plus one detection list:
//!
//! 1. The object detector runs; only cars and buses are kept, each with a
//!    monocular distance estimate.
//! 2. The sign detector runs on the same un-annotated pixels. Signs whose
//!    class belongs to the expected-words table are cropped, read by the OCR
//!    oracle, and re-classified when the text matches a rule.
//! 3. Both passes draw onto the frame; vehicles come first in the output,
//!    then signs, each in detector order.
//!
//! Nothing is carried between frames.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::annotate::{Annotator, SIGN_COLOR, VEHICLE_COLOR};
use crate::detect::{Detection, ObjectDetector, RawBox};
use crate::distance::{estimate_distance, reference_width, FOCAL_LENGTH};
use crate::frame::{crop_roi, BoundingBox, Frame};
use crate::ocr::{self, OcrOracle};
use crate::signs::{normalize_fragments, ExpectedWordsTable};

/// Annotated frame and fused detections for one inbound event.
#[derive(Debug)]
pub struct FusionOutput {
    pub detections: Vec<Detection>,
    pub frame: Frame,
}

/// Collaborators are built once at startup and shared read-only.
pub struct FusionPipeline {
    objects: Arc<dyn ObjectDetector>,
    signs: Arc<dyn ObjectDetector>,
    ocr: Arc<dyn OcrOracle>,
    words: Arc<ExpectedWordsTable>,
    annotator: Arc<Annotator>,
}

impl FusionPipeline {
    pub fn new(
        objects: Arc<dyn ObjectDetector>,
        signs: Arc<dyn ObjectDetector>,
        ocr: Arc<dyn OcrOracle>,
        words: Arc<ExpectedWordsTable>,
        annotator: Arc<Annotator>,
    ) -> Self {
        Self {
            objects,
            signs,
            ocr,
            words,
            annotator,
        }
    }

    /// Run both detector passes over `frame` and annotate it in place.
    ///
    /// Detector and OCR failures abort the whole frame; malformed boxes are
    /// skipped one by one.
    pub fn run(&self, mut frame: Frame) -> Result<FusionOutput> {
        // Detectors and OCR must see the pixels as received, not our overlays.
        let source = frame.clone();
        let mut detections = Vec::new();

        let vehicles = self
            .objects
            .detect(&source)
            .with_context(|| format!("{} detector failed", self.objects.name()))?;
        self.fuse_vehicles(vehicles, &mut frame, &mut detections);

        let signs = self
            .signs
            .detect(&source)
            .with_context(|| format!("{} detector failed", self.signs.name()))?;
        self.fuse_signs(signs, &source, &mut frame, &mut detections)?;

        Ok(FusionOutput { detections, frame })
    }

    fn fuse_vehicles(&self, boxes: Vec<RawBox>, canvas: &mut Frame, out: &mut Vec<Detection>) {
        let labels = self.objects.labels();
        for raw in boxes {
            let Some(bbox) = checked_box(&raw, self.objects.name()) else {
                continue;
            };
            let class_name = labels.resolve(raw.class_id);
            let Some(real_width) = reference_width(&class_name) else {
                continue;
            };

            let distance = estimate_distance(bbox.width() as f64, real_width, FOCAL_LENGTH);
            let label = match distance {
                Some(meters) => format!("{} {:.2} m", class_name, meters),
                None => format!("{} n/a", class_name),
            };
            self.annotator.draw(canvas, &bbox, &label, VEHICLE_COLOR);
            out.push(Detection::vehicle(
                bbox,
                raw.confidence,
                raw.class_id,
                class_name,
                distance,
            ));
        }
    }

    fn fuse_signs(
        &self,
        boxes: Vec<RawBox>,
        source: &Frame,
        canvas: &mut Frame,
        out: &mut Vec<Detection>,
    ) -> Result<()> {
        let labels = self.signs.labels();
        for raw in boxes {
            let Some(bbox) = checked_box(&raw, self.signs.name()) else {
                continue;
            };
            let detected = labels.resolve(raw.class_id);
            let class_name = if self.words.contains(&detected) {
                self.reclassify(source, &bbox, detected)?
            } else {
                detected
            };

            let label = format!("{} {:.2}", class_name, raw.confidence);
            self.annotator.draw(canvas, &bbox, &label, SIGN_COLOR);
            out.push(Detection::sign(
                bbox,
                raw.confidence,
                raw.class_id,
                class_name,
            ));
        }
        Ok(())
    }

    /// Read the sign text and return the matched category, or the detected
    /// class when nothing matches.
    fn reclassify(&self, source: &Frame, bbox: &BoundingBox, detected: String) -> Result<String> {
        let Some(roi) = crop_roi(source, bbox) else {
            log::debug!("sign {} box {:?} lies outside the frame; skipping OCR", detected, bbox);
            return Ok(detected);
        };
        let readings = self
            .ocr
            .read(&roi)
            .with_context(|| format!("OCR failed for {} sign", detected))?;
        let cleaned = normalize_fragments(&ocr::fragments(&readings));

        match self.words.match_fragments(&cleaned) {
            Some(category) => {
                log::debug!("sign {} updated to {} from text {:?}", detected, category, cleaned);
                Ok(category.to_string())
            }
            None => {
                log::debug!("no sign text match for {} in {:?}", detected, cleaned);
                Ok(detected)
            }
        }
    }
}

fn checked_box(raw: &RawBox, detector: &str) -> Option<BoundingBox> {
    let bbox = BoundingBox::from_coords(&raw.coords);
    if bbox.is_none() {
        log::debug!(
            "{} returned {} coordinates for class {}; skipping box",
            detector,
            raw.coords.len(),
            raw.class_id
        );
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{LabelTable, StubBackend};
    use crate::ocr::NullOcr;

    fn pipeline(objects: Vec<RawBox>, signs: Vec<RawBox>) -> FusionPipeline {
        FusionPipeline::new(
            Arc::new(StubBackend::new("objects", LabelTable::coco()).with_boxes(objects)),
            Arc::new(
                StubBackend::new(
                    "signs",
                    LabelTable::from_names(["NoParkingRed", "Stop"]),
                )
                .with_boxes(signs),
            ),
            Arc::new(NullOcr),
            Arc::new(ExpectedWordsTable::parking_signs()),
            Arc::new(Annotator::without_font()),
        )
    }

    #[test]
    fn empty_detectors_leave_frame_untouched() {
        let frame = Frame::from_pixel(32, 24, image::Rgb([7, 7, 7]));
        let out = pipeline(vec![], vec![]).run(frame.clone()).unwrap();
        assert!(out.detections.is_empty());
        assert_eq!(out.frame, frame);
    }

    #[test]
    fn vehicles_precede_signs() {
        let out = pipeline(
            vec![RawBox::new(vec![0.0, 0.0, 100.0, 40.0], 2, 0.9)],
            vec![
                RawBox::new(vec![10.0, 10.0, 20.0, 20.0], 1, 0.8),
                RawBox::new(vec![30.0, 10.0, 40.0, 20.0], 0, 0.7),
            ],
        )
        .run(Frame::new(200, 100))
        .unwrap();

        let names: Vec<_> = out.detections.iter().map(|d| d.class_name.as_str()).collect();
        assert_eq!(names, ["car", "Stop", "NoParkingRed"]);
        assert!(out.detections[0].is_vehicle());
        assert!(!out.detections[1].is_vehicle());
    }

    #[test]
    fn zero_width_vehicle_has_no_distance() {
        let out = pipeline(vec![RawBox::new(vec![50.0, 0.0, 50.0, 30.0], 5, 0.6)], vec![])
            .run(Frame::new(100, 100))
            .unwrap();
        assert_eq!(out.detections.len(), 1);
        assert_eq!(out.detections[0].class_name, "bus");
        assert_eq!(out.detections[0].distance(), None);
    }
}
