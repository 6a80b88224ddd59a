//! Prediction with the trained pipeline.

use anyhow::{Context, Result};
use burn::tensor::{backend::Backend, Tensor};

use crate::config::{AppConfig, InceptionSettings};
use crate::error::PipelineError;
use crate::ml::classifier::LinearClassifier;
use crate::ml::feature_extractor::FeatureExtractor;
use crate::ml::image_loader::load_pixels;
use crate::ml::label_map::LabelMap;
use crate::ml::metrics::argmax;
use crate::report;
use crate::types::{ImageData, ImagePrediction};

/// Frozen extractor, label keys and fitted classifier, chained.
pub struct TrainedModel<B: Backend> {
    extractor: Box<dyn FeatureExtractor>,
    labels: LabelMap,
    classifier: LinearClassifier<B>,
    settings: InceptionSettings,
    device: B::Device,
}

impl<B: Backend> TrainedModel<B> {
    pub fn new(
        extractor: Box<dyn FeatureExtractor>,
        labels: LabelMap,
        classifier: LinearClassifier<B>,
        settings: InceptionSettings,
        device: B::Device,
    ) -> Self {
        Self {
            extractor,
            labels,
            classifier,
            settings,
            device,
        }
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    /// Predicted label and per-class probabilities for one embedding.
    pub fn predict_embedding(&self, embedding: &[f32]) -> Result<(String, Vec<f32>)> {
        let num_features = self.classifier.num_features();
        if embedding.len() != num_features {
            return Err(PipelineError::RaggedFeatures {
                index: 0,
                expected: num_features,
                actual: embedding.len(),
            }
            .into());
        }

        let features = Tensor::<B, 1>::from_floats(embedding, &self.device)
            .reshape([1, embedding.len()]);

        let score = self
            .classifier
            .probabilities(features)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Failed to read classifier output: {:?}", e))?;

        let key = argmax(&score).ok_or_else(|| anyhow::anyhow!("Classifier produced no scores"))?;
        let label = self
            .labels
            .label_of(key)
            .ok_or_else(|| anyhow::anyhow!("Class index {} is out of range", key))?
            .to_string();

        Ok((label, score))
    }

    /// Run one image through the whole pipeline.
    pub fn predict(&self, image: &ImageData) -> Result<ImagePrediction> {
        let pixels = load_pixels(&image.image_path, &self.settings)?;
        let embedding = self
            .extractor
            .extract(&pixels)
            .with_context(|| format!("Failed to embed {}", image.image_path.display()))?;
        let (predicted_label, score) = self.predict_embedding(&embedding)?;

        Ok(ImagePrediction {
            image: image.clone(),
            predicted_label,
            score,
        })
    }

    /// Predict every row, in order.
    pub fn transform(&self, images: &[ImageData]) -> Result<Vec<ImagePrediction>> {
        images.iter().map(|image| self.predict(image)).collect()
    }
}

/// Classify the configured held-out image and print the result.
pub fn classify_single_image<B: Backend>(
    model: &TrainedModel<B>,
    config: &AppConfig,
) -> Result<ImagePrediction> {
    let image = ImageData::new(config.paths.predict_single_image.clone());
    let prediction = model.predict(&image)?;

    report::print_header(report::SINGLE_IMAGE_HEADER);
    println!("{}", report::format_prediction(&prediction));

    Ok(prediction)
}
