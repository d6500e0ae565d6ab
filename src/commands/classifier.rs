use crate::config::ScreenConfig;
use crate::error::AppError;
use crate::models::classify_types::{
    Classifications, FailureStage, ScreenState, ScreenStatus, TextView,
};
use crate::services::assets::AssetManager;
use crate::services::classifier::inference::{ImageProcessingOptions, Rect, TensorImage};
use crate::services::classifier::{ClassifierFactory, ClassifierOptions, ImageClassifier};

/// Log target used for every diagnostic the screen emits.
pub const TAG: &str = "ImageClassificationStatic";

/// The screen only ever reads the single best category.
pub const MAX_RESULTS: usize = 1;

/// Screen that classifies one bundled bitmap with one bundled model when it
/// is created and shows the top label with its score.
pub struct ClassificationStaticScreen<F: ClassifierFactory> {
    config: ScreenConfig,
    assets: AssetManager,
    factory: F,
    classifier: Option<Box<dyn ImageClassifier>>,
    state: ScreenState,
}

impl<F: ClassifierFactory> ClassificationStaticScreen<F> {
    pub fn new(config: ScreenConfig, factory: F) -> Self {
        let assets = AssetManager::new(config.asset_dir.clone());
        Self {
            config,
            assets,
            factory,
            classifier: None,
            state: ScreenState::default(),
        }
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn text_view(&self) -> &TextView {
        &self.state.tv_message
    }

    pub fn status(&self) -> &ScreenStatus {
        &self.state.status
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            input_size: self.config.input_size,
            use_gpu: self.config.use_gpu,
            intra_threads: self.config.intra_threads,
            labels_name: self.config.labels_name.clone(),
            score_threshold: self.config.score_threshold,
            ..ClassifierOptions::default()
        }
        .with_max_results(MAX_RESULTS)
    }

    /// Creation callback. Runs the whole load/decode/classify sequence once;
    /// later calls leave the screen as it is.
    pub fn on_create(&mut self) -> &ScreenState {
        if self.state.status != ScreenStatus::Uninitialized {
            tracing::warn!(target: TAG, "on_create called again, ignoring");
            return &self.state;
        }

        let options = self.classifier_options();
        let classifier = match self.factory.create_from_file_and_options(
            &self.assets,
            &self.config.model_name,
            &options,
        ) {
            Ok(classifier) => self.classifier.insert(classifier),
            Err(e) => {
                tracing::error!(target: TAG, "{}", e);
                tracing::error!(target: TAG, "[ImageClassifier] IS NULL");
                return self.fail(FailureStage::ModelLoad, e);
            }
        };

        let bitmap = match self.assets.decode_resource(&self.config.image_resource) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                tracing::error!(target: TAG, "{}", e);
                return self.fail(FailureStage::ImageDecode, e);
            }
        };
        let input_image = TensorImage::from_bitmap(&bitmap);
        let processing = ImageProcessingOptions {
            roi: self
                .config
                .center_crop
                .then(|| Rect::center_square(input_image.width(), input_image.height())),
        };

        let results = match classifier.classify_with_options(&input_image, &processing) {
            Ok(results) => results,
            Err(e) => {
                tracing::error!(target: TAG, "{}", e);
                return self.fail(FailureStage::Inference, e);
            }
        };

        self.show_results(&results);
        &self.state
    }

    /// Releases the engine. The screen's displayed state is kept.
    pub fn on_destroy(&mut self) {
        if self.classifier.take().is_some() {
            tracing::debug!(target: TAG, "classifier released");
        }
    }

    fn show_results(&mut self, results: &[Classifications]) {
        let Some(category) = results.first().and_then(Classifications::top) else {
            tracing::debug!(target: TAG, "classification produced no categories");
            self.state.status = ScreenStatus::NoResult;
            return;
        };

        let msg = format!("{} {:?}", category.label, category.score);
        tracing::info!(target: TAG, "{}", msg);
        self.state.tv_message.set_text(msg);
        self.state.status = ScreenStatus::Classified {
            label: category.label.clone(),
            score: category.score,
        };
    }

    fn fail(&mut self, stage: FailureStage, err: AppError) -> &ScreenState {
        self.state.status = ScreenStatus::Failed {
            stage,
            reason: err.to_string(),
        };
        &self.state
    }
}
