//! End-to-end frame handling: base64 in, `detections` envelope out.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::Rgb;
use serde_json::Value;

use roadsight::channel::{DETECTIONS_EVENT, IMAGE_EVENT};
use roadsight::codec::{decode_frame, encode_frame};
use roadsight::{
    Annotator, ExpectedWordsTable, Frame, FrameHandler, FrameOutcome, FusionPipeline, LabelTable,
    NullOcr, RawBox, StubBackend,
};

fn handler(objects: Vec<RawBox>) -> FrameHandler {
    let pipeline = FusionPipeline::new(
        Arc::new(StubBackend::new("objects", LabelTable::coco()).with_boxes(objects)),
        Arc::new(StubBackend::new("signs", LabelTable::from_names(["NoParkingRed"]))),
        Arc::new(NullOcr),
        Arc::new(ExpectedWordsTable::parking_signs()),
        Arc::new(Annotator::without_font()),
    );
    FrameHandler::new(pipeline, 85)
}

fn encoded_frame(width: u32, height: u32) -> String {
    let frame = Frame::from_fn(width, height, |x, y| Rgb([(x % 255) as u8, (y % 255) as u8, 60]));
    encode_frame(&frame, 90).expect("encode input")
}

#[test]
fn empty_frame_is_reencoded_with_same_dimensions() {
    let outcome = handler(vec![]).handle(&encoded_frame(160, 120));
    let response = match outcome {
        FrameOutcome::Emitted(response) => response,
        FrameOutcome::Dropped(reason) => panic!("frame dropped: {}", reason),
    };
    assert!(response.detections.is_empty());
    let annotated = decode_frame(&response.image).expect("decode output");
    assert_eq!(annotated.dimensions(), (160, 120));
}

#[test]
fn image_event_round_trip_over_envelope() {
    let h = handler(vec![RawBox::new(vec![20.0, 30.0, 120.0, 90.0], 2, 0.91)]);
    let request = serde_json::json!({ "event": IMAGE_EVENT, "data": encoded_frame(200, 150) });

    let reply = h
        .handle_text(&request.to_string())
        .expect("detections reply");
    let reply: Value = serde_json::from_str(&reply).unwrap();

    assert_eq!(reply["event"], DETECTIONS_EVENT);
    let detections = reply["data"]["detections"].as_array().unwrap();
    assert_eq!(detections.len(), 1);
    let car = &detections[0];
    assert_eq!(car["name"], "car");
    assert_eq!(car["class_id"], 2);
    assert_eq!(car["xmin"], 20);
    assert_eq!(car["ymin"], 30);
    assert_eq!(car["xmax"], 120);
    assert_eq!(car["ymax"], 90);
    assert!((car["distance"].as_f64().unwrap() - 14.0).abs() < 1e-9);

    let image = reply["data"]["image"].as_str().unwrap();
    assert_eq!(decode_frame(image).unwrap().dimensions(), (200, 150));
}

#[test]
fn binary_frames_are_answered_too() {
    let jpeg = STANDARD.decode(encoded_frame(64, 64)).unwrap();
    let reply = handler(vec![]).handle_binary(&jpeg).expect("reply");
    assert!(reply.contains(r#""event":"detections""#));
}

#[test]
fn invalid_image_produces_no_reply() {
    let h = handler(vec![]);
    let bogus = STANDARD.encode(b"this is not an image");
    let request = serde_json::json!({ "event": IMAGE_EVENT, "data": bogus });
    assert!(h.handle_text(&request.to_string()).is_none());

    match h.handle(&bogus) {
        FrameOutcome::Dropped(reason) => assert_eq!(reason.kind(), "decode"),
        FrameOutcome::Emitted(_) => panic!("bogus payload was answered"),
    }
}

#[test]
fn stream_continues_after_a_bad_frame() {
    let h = handler(vec![]);
    assert!(h.handle("@@@").into_response().is_none());
    assert!(h.handle(&encoded_frame(32, 32)).into_response().is_some());
}
