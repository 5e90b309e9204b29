//! Startup wiring: turns a `ServerConfig` into a ready `FrameHandler`.

use std::sync::Arc;

use anyhow::Result;

use crate::annotate::Annotator;
use crate::channel::FrameHandler;
use crate::config::{ModelSettings, ServerConfig};
use crate::detect::{LabelTable, ObjectDetector, StubBackend};
use crate::ocr::{NullOcr, OcrOracle};
use crate::pipeline::FusionPipeline;
use crate::signs::ExpectedWordsTable;

/// Build the process-wide collaborators and the handler that owns them.
///
/// The OCR engine is pluggable; `NullOcr` is used unless one is supplied.
pub fn build_handler(cfg: &ServerConfig, ocr: Option<Arc<dyn OcrOracle>>) -> Result<FrameHandler> {
    let objects = build_detector("objects", &cfg.objects, LabelTable::coco())?;
    let signs = build_detector("signs", &cfg.signs, LabelTable::default())?;

    let ocr = ocr.unwrap_or_else(|| {
        log::warn!("no OCR engine configured; sign classes will not be re-checked against text");
        Arc::new(NullOcr)
    });

    let annotator = match &cfg.font_path {
        Some(path) => Annotator::load_font(path)?,
        None => {
            log::warn!("no label font configured; drawing boxes without text");
            Annotator::without_font()
        }
    };

    let pipeline = FusionPipeline::new(
        objects,
        signs,
        ocr,
        Arc::new(ExpectedWordsTable::parking_signs()),
        Arc::new(annotator),
    );
    Ok(FrameHandler::new(pipeline, cfg.jpeg_quality))
}

fn build_detector(
    name: &str,
    settings: &ModelSettings,
    default_labels: LabelTable,
) -> Result<Arc<dyn ObjectDetector>> {
    let labels = match &settings.labels_path {
        Some(path) => LabelTable::load(path)?,
        None => default_labels,
    };

    let Some(model_path) = &settings.model_path else {
        log::warn!("no {} model configured; {} detector reports nothing", name, name);
        return Ok(Arc::new(StubBackend::new(name, labels)));
    };
    if labels.is_empty() {
        log::warn!("{} model has no label table; classes will be reported by id", name);
    }
    load_model(name, model_path, settings, labels)
}

#[cfg(feature = "backend-tract")]
fn load_model(
    name: &str,
    model_path: &std::path::Path,
    settings: &ModelSettings,
    labels: LabelTable,
) -> Result<Arc<dyn ObjectDetector>> {
    use crate::detect::TractBackend;

    let backend = TractBackend::new(name, model_path, labels, settings.input_size)?
        .with_thresholds(settings.confidence, settings.iou);
    backend.warm_up()?;
    log::info!("{} model loaded from {}", name, model_path.display());
    Ok(Arc::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn load_model(
    name: &str,
    model_path: &std::path::Path,
    _settings: &ModelSettings,
    _labels: LabelTable,
) -> Result<Arc<dyn ObjectDetector>> {
    Err(anyhow::anyhow!(
        "{} model {} configured but this build lacks the backend-tract feature",
        name,
        model_path.display()
    ))
}
