//! Text-recognition seam.
//!
//! The recognition engine is opaque to the pipeline: it receives a cropped
//! region and returns whatever text it found there.

use anyhow::Result;
use image::RgbImage;

/// One recognized text line inside a region.
#[derive(Clone, Debug, PartialEq)]
pub struct OcrReading {
    /// Corner points of the text quad, relative to the region.
    pub region: [(f32, f32); 4],
    pub text: String,
    pub confidence: f32,
}

impl OcrReading {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            region: [(0.0, 0.0); 4],
            text: text.into(),
            confidence,
        }
    }
}

/// OCR engine shared read-only across frame handlers.
pub trait OcrOracle: Send + Sync {
    fn read(&self, region: &RgbImage) -> Result<Vec<OcrReading>>;
}

/// Recognizes nothing. Signs keep the class their detector gave them.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullOcr;

impl OcrOracle for NullOcr {
    fn read(&self, _region: &RgbImage) -> Result<Vec<OcrReading>> {
        Ok(Vec::new())
    }
}

/// Text of every reading, in engine order.
pub fn fragments(readings: &[OcrReading]) -> Vec<String> {
    readings.iter().map(|r| r.text.clone()).collect()
}
