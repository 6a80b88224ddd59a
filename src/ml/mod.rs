pub mod classifier;
pub mod feature_extractor;
pub mod image_loader;
pub mod inference;
pub mod label_map;
pub mod metrics;
pub mod training;

pub use classifier::{ClassifierConfig, LinearClassifier};
pub use feature_extractor::{embed_all, FeatureExtractor, TensorFlowFeatureExtractor};
pub use image_loader::{extract_pixels, load_image, load_pixels, resize_image, PixelTensor};
pub use inference::{classify_single_image, TrainedModel};
pub use label_map::LabelMap;
pub use metrics::{evaluate, MulticlassMetrics};
pub use training::{generate_model, train_classifier};
