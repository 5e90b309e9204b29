use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::codec::DEFAULT_JPEG_QUALITY;

const DEFAULT_ADDR: &str = "0.0.0.0:5050";
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_CONFIDENCE: f32 = 0.25;
const DEFAULT_IOU: f32 = 0.45;

#[derive(Debug, Deserialize, Default)]
struct ServerConfigFile {
    addr: Option<String>,
    index_path: Option<PathBuf>,
    font_path: Option<PathBuf>,
    jpeg_quality: Option<u8>,
    objects: Option<ModelConfigFile>,
    signs: Option<ModelConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    model_path: Option<PathBuf>,
    labels_path: Option<PathBuf>,
    input_size: Option<u32>,
    confidence: Option<f32>,
    iou: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub index_path: Option<PathBuf>,
    pub font_path: Option<PathBuf>,
    pub jpeg_quality: u8,
    pub objects: ModelSettings,
    pub signs: ModelSettings,
}

/// One detector model. Without `model_path` the detector reports nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub input_size: u32,
    pub confidence: f32,
    pub iou: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self::from_file(None)
    }
}

impl ModelSettings {
    fn from_file(file: Option<ModelConfigFile>) -> Self {
        let file = file.unwrap_or_default();
        Self {
            model_path: file.model_path,
            labels_path: file.labels_path,
            input_size: file.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            confidence: file.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            iou: file.iou.unwrap_or(DEFAULT_IOU),
        }
    }

    fn validate(&self, which: &str) -> Result<()> {
        if self.input_size == 0 {
            return Err(anyhow!("{} input_size must be greater than zero", which));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(anyhow!("{} confidence must be within 0..=1", which));
        }
        if !(0.0..=1.0).contains(&self.iou) {
            return Err(anyhow!("{} iou must be within 0..=1", which));
        }
        Ok(())
    }
}

impl ServerConfig {
    /// Load from `ROADSIGHT_CONFIG` (if set), then apply env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("ROADSIGHT_CONFIG").ok().map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => Some(read_config_file(path)?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: ServerConfigFile) -> Self {
        Self {
            addr: file.addr.unwrap_or_else(|| DEFAULT_ADDR.to_string()),
            index_path: file.index_path,
            font_path: file.font_path,
            jpeg_quality: file.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY),
            objects: ModelSettings::from_file(file.objects),
            signs: ModelSettings::from_file(file.signs),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(addr) = non_empty_env("ROADSIGHT_ADDR") {
            self.addr = addr;
        }
        if let Some(path) = non_empty_env("ROADSIGHT_INDEX") {
            self.index_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty_env("ROADSIGHT_FONT") {
            self.font_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty_env("ROADSIGHT_OBJECT_MODEL") {
            self.objects.model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty_env("ROADSIGHT_SIGN_MODEL") {
            self.signs.model_path = Some(PathBuf::from(path));
        }
        if let Some(path) = non_empty_env("ROADSIGHT_SIGN_LABELS") {
            self.signs.labels_path = Some(PathBuf::from(path));
        }
        if let Some(quality) = non_empty_env("ROADSIGHT_JPEG_QUALITY") {
            self.jpeg_quality = quality
                .parse()
                .map_err(|_| anyhow!("ROADSIGHT_JPEG_QUALITY must be an integer in 1..=100"))?;
        }
        Ok(())
    }

    /// Check ranges. Callers that override fields after loading must call
    /// this again.
    pub fn validate(&self) -> Result<()> {
        if self.addr.trim().is_empty() {
            return Err(anyhow!("addr must not be empty"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(anyhow!("jpeg_quality must be within 1..=100"));
        }
        self.objects.validate("objects")?;
        self.signs.validate("signs")?;
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn read_config_file(path: &Path) -> Result<ServerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
