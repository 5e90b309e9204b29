//! Roadsight
//!
//! Streams video frames from a client, fuses two detector passes per frame,
//! and answers each frame with an annotated image plus a detection list.
//!
//! # Architecture
//!
//! ```text
//! base64 frame ─► codec::decode_frame ─► pipeline::FusionPipeline ─► codec::encode_frame ─► response
//!                                            │
//!                          ┌─────────────────┼──────────────────┐
//!                   object detector     sign detector ─► ocr ─► signs (text rules)
//!                          │
//!                     distance (pinhole estimate)
//! ```
//!
//! - `detect`: detector backend trait, label tables, stub and ONNX backends.
//! - `distance`: distance from a known reference width.
//! - `signs`: ordered text rules that re-classify parking signs.
//! - `pipeline`: the per-frame fusion.
//! - `channel` / `codec`: the request/response contract around one frame.
//! - `api`: HTTP + WebSocket transport.
//!
//! The pipeline is stateless across frames. Collaborators (detectors, OCR,
//! words table, annotator) are built once at startup and shared read-only.

pub mod annotate;
pub mod api;
pub mod channel;
pub mod codec;
pub mod config;
pub mod detect;
pub mod distance;
pub mod frame;
pub mod ocr;
pub mod pipeline;
pub mod runtime;
pub mod signs;

pub use crate::annotate::Annotator;
pub use crate::channel::{DetectionResponse, DropReason, FrameHandler, FrameOutcome};
pub use crate::codec::CodecError;
pub use crate::config::{ModelSettings, ServerConfig};
pub use crate::detect::{Detection, DetectionKind, LabelTable, ObjectDetector, RawBox, StubBackend};
pub use crate::distance::estimate_distance;
pub use crate::frame::{BoundingBox, Frame};
pub use crate::ocr::{NullOcr, OcrOracle, OcrReading};
pub use crate::pipeline::{FusionOutput, FusionPipeline};
pub use crate::signs::{normalize_fragments, ExpectedWordsTable, SignRule};
