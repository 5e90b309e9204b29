#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;

use crate::detect::backend::ObjectDetector;
use crate::detect::labels::LabelTable;
use crate::detect::result::RawBox;
use crate::detect::yolo::{decode_output, YoloDecode};
use crate::frame::Frame;

/// Tract-based backend for YOLOv8 ONNX detection models.
///
/// Loads a local model file with a square `input_size` input and runs it on
/// RGB frames. The frame is stretched to the model input; boxes are scaled
/// back to frame pixels after decoding.
pub struct TractBackend {
    name: String,
    model: TypedRunnableModel<TypedModel>,
    labels: LabelTable,
    input_size: u32,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(
        name: impl Into<String>,
        model_path: P,
        labels: LabelTable,
        input_size: u32,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(0, f32::fact([1, 3, side, side]).into())
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            name: name.into(),
            model,
            labels,
            input_size,
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        })
    }

    /// Override the default confidence and NMS thresholds.
    pub fn with_thresholds(mut self, confidence: f32, iou: f32) -> Self {
        self.confidence_threshold = confidence;
        self.iou_threshold = iou;
        self
    }

    fn build_input(&self, frame: &Frame) -> Tensor {
        let side = self.input_size;
        let resized = imageops::resize(frame, side, side, FilterType::Triangle);
        let side = side as usize;
        tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, channel, y, x)| {
            resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
        })
        .into_tensor()
    }
}

impl ObjectDetector for TractBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &LabelTable {
        &self.labels
    }

    fn detect(&self, frame: &Frame) -> Result<Vec<RawBox>> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let shape = view.shape().to_vec();
        if shape.len() != 3 || shape[0] != 1 {
            return Err(anyhow!("unexpected detection output shape {:?}", shape));
        }
        let data: Vec<f32> = view.iter().copied().collect();

        let params = YoloDecode {
            confidence: self.confidence_threshold,
            iou: self.iou_threshold,
            scale_x: width as f32 / self.input_size as f32,
            scale_y: height as f32 / self.input_size as f32,
            frame_width: width as f32,
            frame_height: height as f32,
        };
        decode_output(&data, shape[2], &params)
    }

    fn warm_up(&self) -> Result<()> {
        self.detect(&Frame::new(self.input_size, self.input_size))?;
        Ok(())
    }
}
