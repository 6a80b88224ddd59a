//! Transfer learning on top of a frozen Inception graph.
//!
//! The pretrained network turns each image into an embedding; only a linear
//! classifier on those embeddings is trained.

pub mod config;
pub mod error;
pub mod ml;
pub mod report;
pub mod tsv_loader;
pub mod types;

pub use config::AppConfig;
pub use error::PipelineError;
pub use types::{ImageData, ImagePrediction};
