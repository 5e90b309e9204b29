use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

/// Class-id → class-name lookup for one detector model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelTable {
    names: BTreeMap<i64, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LabelFile {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl LabelTable {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .enumerate()
                .map(|(id, name)| (id as i64, name.into()))
                .collect(),
        }
    }

    /// Load labels from disk.
    ///
    /// Accepts a JSON array (`["person", ...]`), a JSON object keyed by class
    /// id (`{"0": "person", ...}`), or plain text with one name per line.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read label file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid label file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return match serde_json::from_str::<LabelFile>(trimmed)? {
                LabelFile::List(names) => Ok(Self::from_names(names)),
                LabelFile::Map(map) => {
                    let mut names = BTreeMap::new();
                    for (key, name) in map {
                        let id: i64 = key
                            .trim()
                            .parse()
                            .map_err(|_| anyhow!("label key '{}' is not a class id", key))?;
                        names.insert(id, name);
                    }
                    Ok(Self { names })
                }
            };
        }
        Ok(Self::from_names(
            raw.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        ))
    }

    /// The 80 COCO classes used by stock YOLOv8 checkpoints.
    pub fn coco() -> Self {
        Self::from_names(COCO_NAMES.iter().copied())
    }

    pub fn get(&self, class_id: i64) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    /// Resolve a class name, falling back to the numeric id.
    pub fn resolve(&self, class_id: i64) -> String {
        self.get(class_id)
            .map(str::to_string)
            .unwrap_or_else(|| class_id.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

const COCO_NAMES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];
