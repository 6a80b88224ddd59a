//! Classifier training and the build/train/evaluate pipeline.

use anyhow::{Context, Result};
use burn::{
    module::AutodiffModule,
    optim::{decay::WeightDecayConfig, AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, ElementConversion, Int, Tensor},
};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::config::{AppConfig, TrainingSettings};
use crate::error::PipelineError;
use crate::ml::classifier::{ClassifierConfig, LinearClassifier};
use crate::ml::feature_extractor::{embed_all, FeatureExtractor};
use crate::ml::inference::TrainedModel;
use crate::ml::label_map::LabelMap;
use crate::ml::metrics::{evaluate, MulticlassMetrics};
use crate::report;
use crate::tsv_loader::read_from_tsv;

/// How often (in epochs) the training loss is logged.
const LOG_EVERY: usize = 50;

/// Fit a linear classifier on precomputed embeddings.
///
/// `targets[i]` is the label key of `features[i]`. With `batch_size == 0` every
/// step sees the whole set; otherwise mini-batches are reshuffled each epoch.
pub fn train_classifier<B: AutodiffBackend>(
    features: &[Vec<f32>],
    targets: &[usize],
    num_classes: usize,
    settings: &TrainingSettings,
    device: &B::Device,
) -> Result<LinearClassifier<B::InnerBackend>> {
    if features.is_empty() || num_classes == 0 {
        anyhow::bail!("Cannot train on {} samples and {} classes", features.len(), num_classes);
    }
    if features.len() != targets.len() {
        anyhow::bail!("{} feature rows but {} targets", features.len(), targets.len());
    }

    let num_features = features[0].len();
    for (index, row) in features.iter().enumerate() {
        if row.len() != num_features {
            return Err(PipelineError::RaggedFeatures {
                index,
                expected: num_features,
                actual: row.len(),
            }
            .into());
        }
    }

    let num_samples = features.len();
    let batch_size = match settings.batch_size {
        0 => num_samples,
        n => n.min(num_samples),
    };

    log::info!(
        "Training on {} samples, {} features, {} classes",
        num_samples,
        num_features,
        num_classes
    );

    let mut model = ClassifierConfig::new(num_features, num_classes).init::<B>(device);
    let mut optim = AdamConfig::new()
        .with_weight_decay(Some(WeightDecayConfig::new(settings.l2_weight)))
        .init::<B, LinearClassifier<B>>();

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut indices: Vec<usize> = (0..num_samples).collect();

    for epoch in 1..=settings.num_epochs {
        if batch_size < num_samples {
            indices.shuffle(&mut rng);
        }

        let mut epoch_loss = 0.0f64;
        let mut num_batches = 0usize;

        for chunk in indices.chunks(batch_size) {
            let (inputs, labels) = batch::<B>(features, targets, chunk, num_features, device);

            let output = model.forward_classification(inputs, labels);
            epoch_loss += output.loss.clone().into_scalar().elem::<f64>();
            num_batches += 1;

            let grads = GradientsParams::from_grads(output.loss.backward(), &model);
            model = optim.step(settings.learning_rate, model, grads);
        }

        if epoch == 1 || epoch % LOG_EVERY == 0 || epoch == settings.num_epochs {
            log::info!(
                "Epoch {}/{}: loss {:.6}",
                epoch,
                settings.num_epochs,
                epoch_loss / num_batches as f64
            );
        }
    }

    Ok(model.valid())
}

fn batch<B: AutodiffBackend>(
    features: &[Vec<f32>],
    targets: &[usize],
    indices: &[usize],
    num_features: usize,
    device: &B::Device,
) -> (Tensor<B, 2>, Tensor<B, 1, Int>) {
    let mut all_features = Vec::with_capacity(indices.len() * num_features);
    let mut all_targets = Vec::with_capacity(indices.len());

    for &i in indices {
        all_features.extend_from_slice(&features[i]);
        all_targets.push(targets[i] as i64);
    }

    let inputs = Tensor::<B, 1>::from_floats(all_features.as_slice(), device)
        .reshape([indices.len(), num_features]);
    let labels = Tensor::<B, 1, Int>::from_ints(all_targets.as_slice(), device);

    (inputs, labels)
}

/// Build, train and evaluate the transfer learning pipeline.
///
/// Reads the training tags, embeds every image with the frozen extractor,
/// fits the classifier, then prints predictions and metrics for the test tags.
pub fn generate_model<B: AutodiffBackend>(
    config: &AppConfig,
    extractor: Box<dyn FeatureExtractor>,
    device: &B::Device,
) -> Result<(TrainedModel<B::InnerBackend>, MulticlassMetrics)> {
    let paths = &config.paths;

    let training_rows = read_from_tsv(&paths.train_tags_tsv, &paths.images_folder)?;
    if training_rows.is_empty() {
        return Err(PipelineError::EmptyTrainingSet(paths.train_tags_tsv.clone()).into());
    }

    let mut labels = LabelMap::default();
    let mut targets = Vec::with_capacity(training_rows.len());
    for row in &training_rows {
        let label = row
            .label
            .as_deref()
            .ok_or_else(|| PipelineError::MissingLabel(row.image_path.clone()))?;
        targets.push(labels.insert(label));
    }
    log::info!("Labels: {}", labels.labels().join(", "));

    report::print_header(report::TRAINING_HEADER);

    let features = embed_all(extractor.as_ref(), &training_rows, &config.inception)
        .context("Failed to embed training images")?;

    let classifier = train_classifier::<B>(
        &features,
        &targets,
        labels.len(),
        &config.training,
        device,
    )?;

    let model = TrainedModel::new(
        extractor,
        labels,
        classifier,
        config.inception.clone(),
        device.clone(),
    );

    let test_rows = read_from_tsv(&paths.test_tags_tsv, &paths.images_folder)?;
    let predictions = model.transform(&test_rows)?;
    report::display_results(&predictions);

    let metrics = evaluate(&predictions, model.labels())?;
    report::print_metrics(&metrics, model.labels());

    Ok((model, metrics))
}
