//! Frame channel contract: one inbound `image` event in, at most one
//! `detections` event out.
//!
//! Failures never reach the client. A frame that cannot be decoded,
//! processed, or encoded is logged and dropped; the client simply receives
//! no response for it.

use serde::{Deserialize, Serialize};

use crate::codec::{decode_frame, decode_image_bytes, encode_frame, CodecError};
use crate::detect::Detection;
use crate::frame::Frame;
use crate::pipeline::FusionPipeline;

pub const IMAGE_EVENT: &str = "image";
pub const DETECTIONS_EVENT: &str = "detections";

/// Outbound payload for one processed frame.
#[derive(Clone, Debug, Serialize)]
pub struct DetectionResponse {
    pub detections: Vec<Detection>,
    /// Annotated frame, base64 JPEG.
    pub image: String,
}

/// Why a frame produced no response.
#[derive(Debug)]
pub enum DropReason {
    Decode(String),
    Pipeline(String),
    Encode(String),
}

impl DropReason {
    pub fn kind(&self) -> &'static str {
        match self {
            DropReason::Decode(_) => "decode",
            DropReason::Pipeline(_) => "pipeline",
            DropReason::Encode(_) => "encode",
        }
    }
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DropReason::Decode(msg) | DropReason::Pipeline(msg) | DropReason::Encode(msg) => {
                write!(f, "{} error: {}", self.kind(), msg)
            }
        }
    }
}

impl From<CodecError> for DropReason {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Decode(msg) => DropReason::Decode(msg),
            CodecError::Encode(msg) => DropReason::Encode(msg),
        }
    }
}

#[derive(Debug)]
pub enum FrameOutcome {
    Emitted(DetectionResponse),
    Dropped(DropReason),
}

impl FrameOutcome {
    /// Response to send, if any. Dropped frames are logged here.
    pub fn into_response(self) -> Option<DetectionResponse> {
        match self {
            FrameOutcome::Emitted(response) => Some(response),
            FrameOutcome::Dropped(reason) => {
                log::warn!("dropping frame: {}", reason);
                None
            }
        }
    }
}

/// `{"event": ..., "data": ...}` envelope used on the socket.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct OutboundMessage<'a> {
    pub event: &'static str,
    pub data: &'a DetectionResponse,
}

/// Decode → fuse → encode for one event at a time.
pub struct FrameHandler {
    pipeline: FusionPipeline,
    jpeg_quality: u8,
}

impl FrameHandler {
    pub fn new(pipeline: FusionPipeline, jpeg_quality: u8) -> Self {
        Self {
            pipeline,
            jpeg_quality,
        }
    }

    pub fn pipeline(&self) -> &FusionPipeline {
        &self.pipeline
    }

    /// Handle a base64 image payload.
    pub fn handle(&self, payload: &str) -> FrameOutcome {
        match decode_frame(payload) {
            Ok(frame) => self.handle_frame(frame),
            Err(err) => FrameOutcome::Dropped(err.into()),
        }
    }

    /// Handle raw compressed image bytes.
    pub fn handle_bytes(&self, bytes: &[u8]) -> FrameOutcome {
        match decode_image_bytes(bytes) {
            Ok(frame) => self.handle_frame(frame),
            Err(err) => FrameOutcome::Dropped(err.into()),
        }
    }

    pub fn handle_frame(&self, frame: Frame) -> FrameOutcome {
        let output = match self.pipeline.run(frame) {
            Ok(output) => output,
            Err(err) => return FrameOutcome::Dropped(DropReason::Pipeline(format!("{:#}", err))),
        };
        match encode_frame(&output.frame, self.jpeg_quality) {
            Ok(image) => FrameOutcome::Emitted(DetectionResponse {
                detections: output.detections,
                image,
            }),
            Err(err) => FrameOutcome::Dropped(err.into()),
        }
    }

    /// Handle one text message from the socket; returns the serialized
    /// `detections` envelope to send back, if any.
    pub fn handle_text(&self, text: &str) -> Option<String> {
        let message: InboundMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(err) => {
                log::debug!("ignoring non-envelope message: {}", err);
                return None;
            }
        };
        if message.event != IMAGE_EVENT {
            log::debug!("ignoring unknown event '{}'", message.event);
            return None;
        }
        let Some(payload) = message.data.as_str() else {
            log::debug!("ignoring image event without string payload");
            return None;
        };
        self.handle(payload).into_response().and_then(envelope)
    }

    /// Handle one binary message (raw JPEG/PNG bytes).
    pub fn handle_binary(&self, bytes: &[u8]) -> Option<String> {
        self.handle_bytes(bytes).into_response().and_then(envelope)
    }
}

fn envelope(response: DetectionResponse) -> Option<String> {
    let message = OutboundMessage {
        event: DETECTIONS_EVENT,
        data: &response,
    };
    match serde_json::to_string(&message) {
        Ok(json) => Some(json),
        Err(err) => {
            log::warn!("dropping frame: encode error: {}", err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::annotate::Annotator;
    use crate::detect::{LabelTable, StubBackend};
    use crate::ocr::NullOcr;
    use crate::signs::ExpectedWordsTable;

    fn handler() -> FrameHandler {
        let pipeline = FusionPipeline::new(
            Arc::new(StubBackend::new("objects", LabelTable::coco())),
            Arc::new(StubBackend::new("signs", LabelTable::default())),
            Arc::new(NullOcr),
            Arc::new(ExpectedWordsTable::parking_signs()),
            Arc::new(Annotator::without_font()),
        );
        FrameHandler::new(pipeline, 80)
    }

    #[test]
    fn undecodable_payload_is_dropped_as_decode() {
        match handler().handle("not-base64!") {
            FrameOutcome::Dropped(reason) => assert_eq!(reason.kind(), "decode"),
            other => panic!("expected drop, got {:?}", other),
        }
        assert!(handler().handle_binary(b"\x00\x01").is_none());
    }

    #[test]
    fn unknown_events_and_bad_json_are_ignored() {
        let h = handler();
        assert!(h.handle_text("hello").is_none());
        assert!(h.handle_text(r#"{"event":"ping","data":"x"}"#).is_none());
        assert!(h.handle_text(r#"{"event":"image","data":42}"#).is_none());
    }

    #[test]
    fn drop_reason_display_names_kind() {
        let reason = DropReason::Pipeline("objects detector failed".into());
        assert_eq!(reason.to_string(), "pipeline error: objects detector failed");
        let reason: DropReason = CodecError::Encode("boom".into()).into();
        assert_eq!(reason.kind(), "encode");
    }
}
