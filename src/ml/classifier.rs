//! Linear multiclass classifier trained on top of the frozen embeddings.

use burn::{
    config::Config,
    module::Module,
    nn::{loss::CrossEntropyLossConfig, Linear, LinearConfig},
    tensor::{activation::softmax, backend::Backend, Int, Tensor},
    train::ClassificationOutput,
};

/// Classifier configuration
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    /// Embedding size
    pub num_features: usize,
    /// Number of label keys
    pub num_classes: usize,
}

impl ClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LinearClassifier<B> {
        log::debug!(
            "[Classifier] Linear: {} -> {}",
            self.num_features,
            self.num_classes
        );

        LinearClassifier {
            linear: LinearConfig::new(self.num_features, self.num_classes).init(device),
        }
    }
}

/// Softmax regression (maximum entropy) over embeddings.
#[derive(Module, Debug)]
pub struct LinearClassifier<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> LinearClassifier<B> {
    /// Embedding size the classifier was built for.
    pub fn num_features(&self) -> usize {
        self.linear.weight.val().dims()[0]
    }

    /// `features` [batch_size, num_features] -> logits [batch_size, num_classes]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(features)
    }

    /// Class probabilities, each row sums to 1.
    pub fn probabilities(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.forward(features), 1)
    }

    /// Forward pass plus cross-entropy loss, for training.
    pub fn forward_classification(
        &self,
        features: Tensor<B, 2>,
        targets: Tensor<B, 1, Int>,
    ) -> ClassificationOutput<B> {
        let output = self.forward(features);
        let loss = CrossEntropyLossConfig::new()
            .init(&output.device())
            .forward(output.clone(), targets.clone());

        ClassificationOutput::new(loss, output, targets)
    }
}
