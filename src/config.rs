//! Application configuration.
//!
//! Defaults are fixed at compile time and mirror the asset layout the demo
//! ships with. A JSON file in the working directory may override them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Compute device for the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum DeviceType {
    /// NdArray (CPU) backend
    #[default]
    Cpu,
    /// WGPU (GPU) backend, requires the `gpu` feature
    Wgpu,
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceType::Cpu => write!(f, "CPU (NdArray)"),
            DeviceType::Wgpu => write!(f, "WGPU (GPU)"),
        }
    }
}

/// How an image is brought to the network's input size.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ResizingKind {
    /// Keep aspect ratio, cover the target, crop the centre.
    #[default]
    IsoCrop,
    /// Keep aspect ratio, fit inside the target, pad with black.
    IsoPad,
    /// Stretch to the exact target size.
    Fill,
}

/// Locations of the input files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetPaths {
    pub assets_dir: PathBuf,
    pub images_folder: PathBuf,
    /// Frozen TensorFlow graph
    pub inception_model: PathBuf,
    /// Held-out image classified at the end of the run
    pub predict_single_image: PathBuf,
    pub train_tags_tsv: PathBuf,
    pub test_tags_tsv: PathBuf,
}

impl AssetPaths {
    /// Standard layout below `assets_dir`.
    pub fn under<P: AsRef<Path>>(assets_dir: P) -> Self {
        let assets_dir = assets_dir.as_ref().to_path_buf();
        let images_folder = assets_dir.join("images");
        Self {
            inception_model: assets_dir
                .join("inception")
                .join("tensorflow_inception_graph.pb"),
            predict_single_image: images_folder.join("toaster3.jpg"),
            train_tags_tsv: images_folder.join("tags.tsv"),
            test_tags_tsv: images_folder.join("test-tags.tsv"),
            images_folder,
            assets_dir,
        }
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::under(cwd.join("assets"))
    }
}

/// Input geometry and node names of the Inception graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InceptionSettings {
    pub image_width: u32,
    pub image_height: u32,
    /// Subtracted from every channel value
    pub mean: f32,
    /// Applied after the mean offset
    pub scale: f32,
    /// `[1, H, W, C]` when true, `[1, C, H, W]` otherwise
    pub channels_last: bool,
    pub input_node: String,
    pub output_node: String,
    pub resizing: ResizingKind,
}

impl Default for InceptionSettings {
    fn default() -> Self {
        Self {
            image_width: 224,
            image_height: 224,
            mean: 117.0,
            scale: 1.0,
            channels_last: true,
            input_node: "input".to_string(),
            output_node: "softmax2_pre_activation".to_string(),
            resizing: ResizingKind::IsoCrop,
        }
    }
}

impl InceptionSettings {
    /// Shape of the tensor fed to the network (batch of one).
    pub fn input_shape(&self) -> [usize; 4] {
        let (h, w) = (self.image_height as usize, self.image_width as usize);
        if self.channels_last {
            [1, h, w, 3]
        } else {
            [1, 3, h, w]
        }
    }
}

/// Classifier training settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingSettings {
    pub num_epochs: usize,
    /// 0 trains on the whole set at once
    pub batch_size: usize,
    pub learning_rate: f64,
    /// L2 penalty on the weights
    pub l2_weight: f32,
    /// Seed for mini-batch shuffling
    pub seed: u64,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            num_epochs: 300,
            batch_size: 0,
            learning_rate: 1e-2,
            l2_weight: 1e-3,
            seed: 42,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub device_type: DeviceType,
    #[serde(default)]
    pub paths: AssetPaths,
    #[serde(default)]
    pub inception: InceptionSettings,
    #[serde(default)]
    pub training: TrainingSettings,
}

impl AppConfig {
    /// Default location of the override file
    pub fn default_path() -> PathBuf {
        PathBuf::from("transfer_learning.json")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when it is missing or broken.
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!(
                    "Failed to load config ({}): {:#}. Using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn load_or_default() -> Self {
        Self::load_or_default_from(Self::default_path())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn log_summary(&self) {
        log::info!("Device: {}", self.device_type);
        log::info!("Images folder: {}", self.paths.images_folder.display());
        log::info!("Model: {}", self.paths.inception_model.display());
        log::info!(
            "Input: {}x{} (mean {}, scale {}, {:?}, channels last: {})",
            self.inception.image_width,
            self.inception.image_height,
            self.inception.mean,
            self.inception.scale,
            self.inception.resizing,
            self.inception.channels_last
        );
        log::info!(
            "Training: {} epochs, batch {}, lr {}, l2 {}",
            self.training.num_epochs,
            self.training.batch_size,
            self.training.learning_rate,
            self.training.l2_weight
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.device_type, DeviceType::Cpu);
        assert_eq!(config.inception.image_width, 224);
        assert_eq!(config.inception.image_height, 224);
        assert_eq!(config.inception.mean, 117.0);
        assert!(config.inception.channels_last);
        assert_eq!(config.inception.output_node, "softmax2_pre_activation");
    }

    #[test]
    fn test_asset_layout() {
        let paths = AssetPaths::under("/data/assets");
        assert_eq!(paths.images_folder, Path::new("/data/assets/images"));
        assert_eq!(
            paths.inception_model,
            Path::new("/data/assets/inception/tensorflow_inception_graph.pb")
        );
        assert_eq!(paths.train_tags_tsv, Path::new("/data/assets/images/tags.tsv"));
        assert_eq!(paths.test_tags_tsv, Path::new("/data/assets/images/test-tags.tsv"));
        assert_eq!(
            paths.predict_single_image,
            Path::new("/data/assets/images/toaster3.jpg")
        );
    }

    #[test]
    fn test_input_shape() {
        let mut settings = InceptionSettings::default();
        assert_eq!(settings.input_shape(), [1, 224, 224, 3]);
        settings.channels_last = false;
        assert_eq!(settings.input_shape(), [1, 3, 224, 224]);
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "device_type": "Wgpu" }"#).unwrap();
        assert_eq!(config.device_type, DeviceType::Wgpu);
        assert_eq!(config.training, TrainingSettings::default());
    }

    #[test]
    fn test_partial_section_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transfer_learning.json");
        fs::write(
            &path,
            r#"{ "training": { "num_epochs": 50 }, "inception": { "mean": 128.0 } }"#,
        )
        .unwrap();

        let config = AppConfig::load_or_default_from(&path);
        assert_eq!(config.training.num_epochs, 50);
        assert_eq!(config.training.batch_size, TrainingSettings::default().batch_size);
        assert_eq!(config.inception.mean, 128.0);
        assert_eq!(config.inception.image_width, 224);
        assert_eq!(config.inception.output_node, "softmax2_pre_activation");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = AppConfig::default();
        config.training.num_epochs = 7;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.training.num_epochs, 7);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default_from(dir.path().join("nope.json"));
        assert_eq!(config.inception, InceptionSettings::default());
    }

    #[test]
    fn test_load_or_default_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let config = AppConfig::load_or_default_from(&path);
        assert_eq!(config.training, TrainingSettings::default());
    }

    #[test]
    fn test_device_type_display() {
        assert_eq!(format!("{}", DeviceType::Wgpu), "WGPU (GPU)");
        assert_eq!(format!("{}", DeviceType::Cpu), "CPU (NdArray)");
    }
}
