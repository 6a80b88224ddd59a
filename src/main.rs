use anyhow::Result;
use burn::backend::{Autodiff, NdArray};
use burn::tensor::backend::AutodiffBackend;

use image_transfer_learning_lib::config::{AppConfig, DeviceType};
use image_transfer_learning_lib::ml::{
    classify_single_image, generate_model, TensorFlowFeatureExtractor,
};

fn run<B: AutodiffBackend>(config: &AppConfig, device: B::Device) -> Result<()> {
    let extractor =
        TensorFlowFeatureExtractor::load(&config.paths.inception_model, &config.inception)?;

    let (model, _metrics) = generate_model::<B>(config, Box::new(extractor), &device)?;

    classify_single_image(&model, config)?;

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::load_or_default();
    config.log_summary();

    match config.device_type {
        DeviceType::Cpu => run::<Autodiff<NdArray<f32>>>(&config, Default::default()),
        #[cfg(feature = "gpu")]
        DeviceType::Wgpu => run::<Autodiff<burn::backend::Wgpu>>(&config, Default::default()),
        #[cfg(not(feature = "gpu"))]
        DeviceType::Wgpu => anyhow::bail!("WGPU device requested but the `gpu` feature is disabled"),
    }
}
