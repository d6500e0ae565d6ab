use crate::error::AppError;
use image::{DynamicImage, ImageReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DRAWABLE_DIR: &str = "drawable";

/// Extensions tried, in order, when resolving a drawable by identifier.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp", "gif"];

/// Read-only model bytes plus the name they were bundled under.
#[derive(Debug, Clone)]
pub struct ModelAsset {
    name: String,
    bytes: Arc<[u8]>,
}

impl ModelAsset {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Bundled assets and resources rooted at one directory:
///
/// ```text
/// <root>/model.onnx
/// <root>/config.json        (id2label sidecar, optional)
/// <root>/drawable/daisy.png
/// ```
#[derive(Debug, Clone)]
pub struct AssetManager {
    root: PathBuf,
}

impl AssetManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn asset_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn has_asset(&self, name: &str) -> bool {
        self.asset_path(name).is_file()
    }

    /// Reads a named asset into memory. A missing or unreadable model is a
    /// model load failure, not a plain IO error.
    pub fn open_model(&self, name: &str) -> Result<ModelAsset, AppError> {
        let path = self.asset_path(name);
        let bytes = std::fs::read(&path)
            .map_err(|e| AppError::model_load(name, format!("{}: {}", path.display(), e)))?;
        Ok(ModelAsset::new(name, bytes))
    }

    pub fn read_to_string(&self, name: &str) -> Result<String, AppError> {
        Ok(std::fs::read_to_string(self.asset_path(name))?)
    }

    pub fn resolve_resource(&self, id: &str) -> Result<PathBuf, AppError> {
        let dir = self.root.join(DRAWABLE_DIR);
        IMAGE_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", id, ext)))
            .find(|p| p.is_file())
            .ok_or_else(|| AppError::ResourceNotFound(format!("{}/{}", DRAWABLE_DIR, id)))
    }

    /// Decodes a drawable resource into an in-memory bitmap.
    pub fn decode_resource(&self, id: &str) -> Result<DynamicImage, AppError> {
        let path = self.resolve_resource(id)?;
        decode_bitmap(&path)
    }
}

pub fn decode_bitmap(path: &Path) -> Result<DynamicImage, AppError> {
    ImageReader::open(path)
        .map_err(|e| AppError::ImageDecode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .with_guessed_format()
        .map_err(|e| AppError::ImageDecode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .decode()
        .map_err(|e| AppError::ImageDecode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
