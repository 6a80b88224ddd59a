//! Frozen feature extractor.
//!
//! The pretrained network is never trained here; it only turns a pixel tensor
//! into an embedding that the linear classifier learns from.

use anyhow::{Context, Result};
use std::path::Path;
use tract_tensorflow::prelude::*;

use crate::config::InceptionSettings;
use crate::error::PipelineError;
use crate::ml::image_loader::{load_pixels, PixelTensor};
use crate::types::ImageData;

pub trait FeatureExtractor {
    /// Embedding for a single image (batch of one).
    fn extract(&self, pixels: &PixelTensor) -> Result<Vec<f32>>;
}

/// Frozen TensorFlow graph run through tract.
pub struct TensorFlowFeatureExtractor {
    model: TypedRunnableModel<TypedModel>,
    input_shape: [usize; 4],
}

impl TensorFlowFeatureExtractor {
    /// Load the graph and cut it between `input_node` and `output_node`.
    pub fn load(model_path: &Path, settings: &InceptionSettings) -> Result<Self> {
        let input_shape = settings.input_shape();

        let model = tract_tensorflow::tensorflow()
            .model_for_path(model_path)
            .with_context(|| format!("Failed to read model: {}", model_path.display()))?
            .with_input_names([settings.input_node.as_str()])?
            .with_output_names([settings.output_node.as_str()])?
            .with_input_fact(0, f32::fact(input_shape).into())?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()?;

        log::info!(
            "Loaded {} ({} -> {})",
            model_path.display(),
            settings.input_node,
            settings.output_node
        );

        Ok(Self { model, input_shape })
    }
}

impl FeatureExtractor for TensorFlowFeatureExtractor {
    fn extract(&self, pixels: &PixelTensor) -> Result<Vec<f32>> {
        check_input_shape(pixels, &self.input_shape)?;

        let input = Tensor::from_shape(&pixels.shape, &pixels.data)?;
        let outputs = self.model.run(tvec!(input.into()))?;
        let embedding = outputs[0].as_slice::<f32>()?.to_vec();

        Ok(embedding)
    }
}

/// Reject pixel tensors that do not match the network input.
fn check_input_shape(pixels: &PixelTensor, expected: &[usize; 4]) -> Result<()> {
    if pixels.shape != *expected || pixels.data.len() != expected.iter().product::<usize>() {
        return Err(PipelineError::PixelShapeMismatch {
            expected: expected.to_vec(),
            actual: pixels.shape.to_vec(),
        }
        .into());
    }
    Ok(())
}

/// Embed every row, in order.
pub fn embed_all(
    extractor: &dyn FeatureExtractor,
    rows: &[ImageData],
    settings: &InceptionSettings,
) -> Result<Vec<Vec<f32>>> {
    let mut embeddings = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let pixels = load_pixels(&row.image_path, settings)?;
        let embedding = extractor
            .extract(&pixels)
            .with_context(|| format!("Failed to embed {}", row.image_path.display()))?;
        log::debug!(
            "[{}/{}] {}: {} features",
            i + 1,
            rows.len(),
            row.file_name(),
            embedding.len()
        );
        embeddings.push(embedding);
    }

    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixels(shape: [usize; 4]) -> PixelTensor {
        PixelTensor {
            shape,
            data: vec![0.0; shape.iter().product()],
        }
    }

    #[test]
    fn test_matching_shape_is_accepted() {
        let expected = InceptionSettings::default().input_shape();
        assert!(check_input_shape(&pixels(expected), &expected).is_ok());
    }

    #[test]
    fn test_wrong_shape_is_error() {
        let expected = InceptionSettings::default().input_shape();
        let err = check_input_shape(&pixels([1, 3, 224, 224]), &expected).unwrap_err();

        match err.downcast_ref::<PipelineError>() {
            Some(PipelineError::PixelShapeMismatch { expected: e, actual }) => {
                assert_eq!(e, &vec![1, 224, 224, 3]);
                assert_eq!(actual, &vec![1, 3, 224, 224]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_truncated_data_is_error() {
        let expected = [1, 2, 2, 3];
        let mut short = pixels(expected);
        short.data.pop();
        assert!(check_input_shape(&short, &expected).is_err());
    }
}
