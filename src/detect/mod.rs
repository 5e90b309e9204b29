mod backend;
mod backends;
mod labels;
mod result;
pub mod yolo;

pub use backend::ObjectDetector;
pub use backends::StubBackend;
pub use labels::LabelTable;
pub use result::{Detection, DetectionKind, RawBox};

#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
