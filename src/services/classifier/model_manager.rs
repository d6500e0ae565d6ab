use super::inference::{self, ImageProcessingOptions, TensorImage};
use super::{ClassifierFactory, ClassifierOptions, ImageClassifier};
use crate::error::AppError;
use crate::models::classify_types::Classifications;
use crate::services::assets::{AssetManager, ModelAsset};
use ort::session::Session;
use ort::value::Value;

/// Parses the `id2label` map of a model config sidecar into index order.
pub fn parse_id2label(content: &str) -> Result<Vec<String>, AppError> {
    let config: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| AppError::Config(format!("Failed to parse config JSON: {}", e)))?;

    let id2label = config["id2label"]
        .as_object()
        .ok_or_else(|| AppError::Config("Config missing id2label field".to_string()))?;

    let mut labels = id2label
        .iter()
        .map(|(k, v)| {
            let idx = k
                .parse::<usize>()
                .map_err(|_| AppError::Config(format!("Bad id2label key {:?}", k)))?;
            let label = v.as_str().unwrap_or("unknown").to_string();
            Ok((idx, label))
        })
        .collect::<Result<Vec<(usize, String)>, AppError>>()?;
    labels.sort_by_key(|(idx, _)| *idx);

    Ok(labels.into_iter().map(|(_, label)| label).collect())
}

/// Labels are optional; without them categories are named `class_<idx>`.
fn load_labels(assets: &AssetManager, model_name: &str, labels_name: &str) -> Result<Vec<String>, AppError> {
    if !assets.has_asset(labels_name) {
        tracing::warn!("No label sidecar {} next to {}", labels_name, model_name);
        return Ok(Vec::new());
    }
    let content = assets.read_to_string(labels_name)?;
    parse_id2label(&content).map_err(|e| AppError::model_load(model_name, e))
}

/// `ImageClassifier` backed by an ONNX Runtime session.
pub struct OnnxImageClassifier {
    session: Session,
    input_name: String,
    labels: Vec<String>,
    options: ClassifierOptions,
}

impl OnnxImageClassifier {
    pub fn create_from_asset(
        model: &ModelAsset,
        labels: Vec<String>,
        options: &ClassifierOptions,
    ) -> Result<Self, AppError> {
        let name = model.name();
        let _ = ort::init().with_name("daisy-lens").commit();

        let mut builder = Session::builder()
            .map_err(|e| AppError::model_load(name, format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| AppError::model_load(name, format!("Failed to set optimization level: {}", e)))?
            .with_intra_threads(options.intra_threads.max(1))
            .map_err(|e| AppError::model_load(name, format!("Failed to set intra threads: {}", e)))?;

        if options.use_gpu {
            builder = builder
                .with_execution_providers([
                    ort::execution_providers::CoreMLExecutionProvider::default().build(),
                    ort::execution_providers::CUDAExecutionProvider::default().build(),
                    ort::execution_providers::CPUExecutionProvider::default().build(),
                ])
                .map_err(|e| AppError::model_load(name, format!("Failed to register GPU execution providers: {}", e)))?;
        } else {
            builder = builder
                .with_execution_providers([
                    ort::execution_providers::CPUExecutionProvider::default().build(),
                ])
                .map_err(|e| AppError::model_load(name, format!("Failed to register CPU execution provider: {}", e)))?;
        }

        let session = builder
            .commit_from_memory(model.bytes())
            .map_err(|e| AppError::model_load(name, e))?;

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| AppError::model_load(name, "model declares no inputs"))?;

        tracing::debug!(
            "Loaded {} ({} labels, input {:?}, max_results {})",
            name,
            labels.len(),
            input_name,
            options.max_results
        );

        Ok(Self {
            session,
            input_name,
            labels,
            options: options.clone(),
        })
    }
}

impl ImageClassifier for OnnxImageClassifier {
    fn classify_with_options(
        &mut self,
        image: &TensorImage,
        options: &ImageProcessingOptions,
    ) -> Result<Vec<Classifications>, AppError> {
        let tensor = inference::preprocess_image(image, options, self.options.input_size)?;

        let input_tensor = Value::from_array(tensor)
            .map_err(|e| AppError::Inference(format!("Failed to create tensor value: {}", e)))?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])?;

        let output_value = outputs
            .values()
            .next()
            .ok_or_else(|| AppError::Inference("Model produced no outputs".to_string()))?;

        let (_, data) = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| AppError::Inference(format!("Failed to extract output tensor: {}", e)))?;

        Ok(vec![inference::to_classifications(
            0,
            data,
            &self.labels,
            &self.options,
        )])
    }
}

/// Production factory: reads the model asset and its label sidecar, then
/// commits an ONNX Runtime session.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxClassifierFactory;

impl ClassifierFactory for OnnxClassifierFactory {
    fn create_from_file_and_options(
        &self,
        assets: &AssetManager,
        model_name: &str,
        options: &ClassifierOptions,
    ) -> Result<Box<dyn ImageClassifier>, AppError> {
        let model = assets.open_model(model_name)?;
        let labels = load_labels(assets, model_name, &options.labels_name)?;
        let classifier = OnnxImageClassifier::create_from_asset(&model, labels, options)?;
        Ok(Box::new(classifier))
    }
}
