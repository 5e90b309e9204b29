use anyhow::Result;

use crate::detect::backend::ObjectDetector;
use crate::detect::labels::LabelTable;
use crate::detect::result::RawBox;
use crate::frame::Frame;

/// Stub backend. Reports the same fixed boxes for every frame.
///
/// Used when no model is configured and as a scripted detector in tests.
pub struct StubBackend {
    name: String,
    labels: LabelTable,
    boxes: Vec<RawBox>,
}

impl StubBackend {
    pub fn new(name: impl Into<String>, labels: LabelTable) -> Self {
        Self {
            name: name.into(),
            labels,
            boxes: Vec::new(),
        }
    }

    pub fn with_boxes(mut self, boxes: Vec<RawBox>) -> Self {
        self.boxes = boxes;
        self
    }
}

impl ObjectDetector for StubBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &LabelTable {
        &self.labels
    }

    fn detect(&self, _frame: &Frame) -> Result<Vec<RawBox>> {
        Ok(self.boxes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_replays_boxes_for_every_frame() {
        let backend = StubBackend::new("stub", LabelTable::coco())
            .with_boxes(vec![RawBox::new(vec![0.0, 0.0, 4.0, 4.0], 2, 0.7)]);
        let frame = Frame::new(8, 8);

        let r1 = backend.detect(&frame).unwrap();
        let r2 = backend.detect(&frame).unwrap();
        assert_eq!(r1, r2);
        assert_eq!(r1.len(), 1);
        assert_eq!(backend.labels().resolve(r1[0].class_id), "car");
    }

    #[test]
    fn empty_stub_reports_nothing() {
        let backend = StubBackend::new("signs", LabelTable::default());
        assert!(backend.detect(&Frame::new(2, 2)).unwrap().is_empty());
        assert_eq!(backend.name(), "signs");
    }
}
