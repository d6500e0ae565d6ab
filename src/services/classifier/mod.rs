pub mod inference;
pub mod model_manager;

use crate::error::AppError;
use crate::models::classify_types::Classifications;
use crate::services::assets::AssetManager;
use inference::{ImageProcessingOptions, TensorImage};

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOptions {
    /// Upper bound on categories returned per head.
    pub max_results: usize,
    /// Categories scoring below this are dropped.
    pub score_threshold: Option<f32>,
    pub input_size: u32,
    /// Treat the model output as logits and normalise it.
    pub apply_softmax: bool,
    pub use_gpu: bool,
    pub intra_threads: usize,
    pub labels_name: String,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            max_results: usize::MAX,
            score_threshold: None,
            input_size: crate::config::DEFAULT_INPUT_SIZE,
            apply_softmax: true,
            use_gpu: false,
            intra_threads: 4,
            labels_name: crate::config::LABELS_NAME.to_string(),
        }
    }
}

impl ClassifierOptions {
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

/// Engine that turns an adapted image into ranked categories.
pub trait ImageClassifier {
    fn classify_with_options(
        &mut self,
        image: &TensorImage,
        options: &ImageProcessingOptions,
    ) -> Result<Vec<Classifications>, AppError>;

    fn classify(&mut self, image: &TensorImage) -> Result<Vec<Classifications>, AppError> {
        self.classify_with_options(image, &ImageProcessingOptions::default())
    }
}

/// Builds an engine from a named model asset.
pub trait ClassifierFactory {
    fn create_from_file_and_options(
        &self,
        assets: &AssetManager,
        model_name: &str,
        options: &ClassifierOptions,
    ) -> Result<Box<dyn ImageClassifier>, AppError>;
}
