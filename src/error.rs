//! Domain errors raised by the pipeline.
//!
//! Library functions return `anyhow::Result`; these variants are wrapped into
//! it so callers can still `downcast_ref::<PipelineError>()` when they care.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{file}:{line}: image name is empty")]
    EmptyImageName { file: PathBuf, line: u64 },

    #[error("training image {0} has no label")]
    MissingLabel(PathBuf),

    #[error("no training images listed in {0}")]
    EmptyTrainingSet(PathBuf),

    #[error("label '{0}' was not seen during training")]
    UnknownLabel(String),

    #[error("pixel tensor has shape {actual:?}, expected {expected:?}")]
    PixelShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("feature vector {index} has {actual} values, expected {expected}")]
    RaggedFeatures {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("no rows with a known label to evaluate")]
    NothingToEvaluate,
}
