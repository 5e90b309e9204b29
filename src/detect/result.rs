use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::frame::BoundingBox;

/// One box as reported by a detector, before any filtering.
///
/// Coordinates are `x_min, y_min, x_max, y_max` in frame pixels. Backends
/// report whatever they produced; a wrong coordinate count is handled by the
/// pipeline, not here.
#[derive(Clone, Debug, PartialEq)]
pub struct RawBox {
    pub coords: Vec<f32>,
    pub class_id: i64,
    pub confidence: f32,
}

impl RawBox {
    pub fn new(coords: Vec<f32>, class_id: i64, confidence: f32) -> Self {
        Self {
            coords,
            class_id,
            confidence,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DetectionKind {
    /// Car or bus, with a distance estimate when the box has positive width.
    Vehicle { distance: Option<f64> },
    Sign,
}

/// Fused detection as sent to the client.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub class_id: i64,
    pub class_name: String,
    pub kind: DetectionKind,
}

impl Detection {
    pub fn vehicle(
        bbox: BoundingBox,
        confidence: f32,
        class_id: i64,
        class_name: impl Into<String>,
        distance: Option<f64>,
    ) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
            class_name: class_name.into(),
            kind: DetectionKind::Vehicle { distance },
        }
    }

    pub fn sign(
        bbox: BoundingBox,
        confidence: f32,
        class_id: i64,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            bbox,
            confidence,
            class_id,
            class_name: class_name.into(),
            kind: DetectionKind::Sign,
        }
    }

    pub fn is_vehicle(&self) -> bool {
        matches!(self.kind, DetectionKind::Vehicle { .. })
    }

    pub fn distance(&self) -> Option<f64> {
        match self.kind {
            DetectionKind::Vehicle { distance } => distance,
            DetectionKind::Sign => None,
        }
    }
}

// Wire shape: flat box fields plus `name`; `distance` only on vehicles
// (null when it could not be estimated).
impl Serialize for Detection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("xmin", &self.bbox.x_min)?;
        map.serialize_entry("ymin", &self.bbox.y_min)?;
        map.serialize_entry("xmax", &self.bbox.x_max)?;
        map.serialize_entry("ymax", &self.bbox.y_max)?;
        map.serialize_entry("confidence", &self.confidence)?;
        map.serialize_entry("class_id", &self.class_id)?;
        map.serialize_entry("name", &self.class_name)?;
        if let DetectionKind::Vehicle { distance } = self.kind {
            map.serialize_entry("distance", &distance)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_wire_shape_carries_distance() {
        let det = Detection::vehicle(BoundingBox::new(1, 2, 101, 52), 0.9, 2, "car", Some(14.0));
        let json = serde_json::to_value(&det).unwrap();
        assert_eq!(json["xmin"], 1);
        assert_eq!(json["ymax"], 52);
        assert_eq!(json["class_id"], 2);
        assert_eq!(json["name"], "car");
        assert_eq!(json["distance"], 14.0);
    }

    #[test]
    fn undefined_vehicle_distance_is_null() {
        let det = Detection::vehicle(BoundingBox::new(5, 5, 5, 9), 0.4, 5, "bus", None);
        let json = serde_json::to_value(&det).unwrap();
        assert!(json.get("distance").unwrap().is_null());
    }

    #[test]
    fn sign_wire_shape_has_no_distance() {
        let det = Detection::sign(BoundingBox::new(0, 0, 10, 10), 0.5, 3, "NoParkingRed");
        let json = serde_json::to_value(&det).unwrap();
        assert_eq!(json["name"], "NoParkingRed");
        assert!(json.get("distance").is_none());
        assert!(!det.is_vehicle());
        assert_eq!(det.distance(), None);
    }
}
