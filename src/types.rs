use std::path::{Path, PathBuf};

/// One row of a tags file: an image and, for training rows, its label.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub image_path: PathBuf,
    pub label: Option<String>,
}

impl ImageData {
    pub fn new<P: Into<PathBuf>>(image_path: P) -> Self {
        Self {
            image_path: image_path.into(),
            label: None,
        }
    }

    pub fn with_label<P: Into<PathBuf>, S: Into<String>>(image_path: P, label: S) -> Self {
        Self {
            image_path: image_path.into(),
            label: Some(label.into()),
        }
    }

    /// File name used in console output (falls back to the whole path).
    pub fn file_name(&self) -> String {
        display_file_name(&self.image_path)
    }
}

/// Output of the trained pipeline for one image.
#[derive(Debug, Clone)]
pub struct ImagePrediction {
    pub image: ImageData,
    pub predicted_label: String,
    /// Probability per class, indexed by label key.
    pub score: Vec<f32>,
}

impl ImagePrediction {
    /// Highest class probability, i.e. the confidence of `predicted_label`.
    pub fn max_score(&self) -> f32 {
        self.score.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
