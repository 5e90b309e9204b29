//! Inbound image decoding and outbound JPEG encoding.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;

use crate::frame::Frame;

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Debug)]
pub enum CodecError {
    /// Payload is not base64 or not a decodable image.
    Decode(String),
    /// Annotated frame could not be encoded.
    Encode(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Decode(msg) => write!(f, "decode failed: {}", msg),
            CodecError::Encode(msg) => write!(f, "encode failed: {}", msg),
        }
    }
}

impl std::error::Error for CodecError {}

/// Decode a base64 image payload into an RGB frame.
///
/// Browser clients often send `data:image/jpeg;base64,...`; the data-URL
/// prefix is stripped when present.
pub fn decode_frame(payload: &str) -> Result<Frame, CodecError> {
    let encoded = match payload.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| CodecError::Decode(format!("invalid base64: {}", e)))?;
    decode_image_bytes(&bytes)
}

/// Decode compressed image bytes (JPEG, PNG) into an RGB frame.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<Frame, CodecError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| CodecError::Decode(format!("invalid image: {}", e)))?;
    Ok(image.into_rgb8())
}

/// Encode a frame as JPEG bytes.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, CodecError> {
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(frame)
        .map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Encode a frame as base64 JPEG for the outbound payload.
pub fn encode_frame(frame: &Frame, quality: u8) -> Result<String, CodecError> {
    Ok(STANDARD.encode(encode_jpeg(frame, quality)?))
}
