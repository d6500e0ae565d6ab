//! Screen configuration.
//!
//! Everything here has a fixed default matching the bundled assets; a JSON
//! file can override paths and runtime knobs for a different bundle layout.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MODEL_NAME: &str = "model.onnx";
pub const LABELS_NAME: &str = "config.json";
pub const IMAGE_RESOURCE: &str = "daisy";
pub const DEFAULT_ASSET_DIR: &str = "assets";
pub const DEFAULT_INPUT_SIZE: u32 = 224;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenConfig {
    /// Root of the bundled assets (model, label sidecar, `drawable/`).
    pub asset_dir: PathBuf,
    pub model_name: String,
    pub labels_name: String,
    /// Identifier of the drawable resource classified on creation.
    pub image_resource: String,
    /// Square edge of the model input, in pixels.
    pub input_size: u32,
    pub use_gpu: bool,
    pub intra_threads: usize,
    /// Classify only the largest centred square of the image.
    pub center_crop: bool,
    /// Categories scoring below this are not reported.
    pub score_threshold: Option<f32>,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            asset_dir: PathBuf::from(DEFAULT_ASSET_DIR),
            model_name: MODEL_NAME.to_string(),
            labels_name: LABELS_NAME.to_string(),
            image_resource: IMAGE_RESOURCE.to_string(),
            input_size: DEFAULT_INPUT_SIZE,
            use_gpu: false,
            intra_threads: 4,
            center_crop: false,
            score_threshold: None,
        }
    }
}

impl ScreenConfig {
    pub fn with_asset_dir(mut self, asset_dir: impl Into<PathBuf>) -> Self {
        self.asset_dir = asset_dir.into();
        self
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: ScreenConfig = serde_json::from_str(&content).map_err(|e| {
            AppError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if config.input_size == 0 {
            return Err(AppError::Config("input_size must be positive".into()));
        }
        if let Some(t) = config.score_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(AppError::Config(format!("score_threshold {} outside 0..=1", t)));
            }
        }
        Ok(config)
    }

    /// Reads `path` if it exists, otherwise (or on a bad file) returns defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ScreenConfig::default();
        assert_eq!(config.model_name, "model.onnx");
        assert_eq!(config.image_resource, "daisy");
        assert_eq!(config.input_size, 224);
        assert!(!config.use_gpu);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("screen.json");
        fs::write(&path, r#"{ "image_resource": "tulip", "input_size": 384 }"#).unwrap();

        let config = ScreenConfig::load(&path).unwrap();
        assert_eq!(config.image_resource, "tulip");
        assert_eq!(config.input_size, 384);
        assert_eq!(config.model_name, MODEL_NAME);
    }

    #[test]
    fn test_camera_options_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("screen.json");
        fs::write(&path, r#"{ "center_crop": true, "score_threshold": 0.9 }"#).unwrap();

        let config = ScreenConfig::load(&path).unwrap();
        assert!(config.center_crop);
        assert_eq!(config.score_threshold, Some(0.9));
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("screen.json");
        fs::write(&path, r#"{ "score_threshold": 1.5 }"#).unwrap();
        assert!(matches!(ScreenConfig::load(&path), Err(AppError::Config(_))));
    }

    #[test]
    fn test_bad_file_falls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("screen.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(ScreenConfig::load(&path), Err(AppError::Config(_))));
        assert_eq!(ScreenConfig::load_or_default(&path), ScreenConfig::default());
    }

    #[test]
    fn test_zero_input_size_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("screen.json");
        fs::write(&path, r#"{ "input_size": 0 }"#).unwrap();
        assert!(ScreenConfig::load(&path).is_err());
    }
}
