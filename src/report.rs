//! Console report.
//!
//! Results go to stdout; diagnostics go through `log`.

use crate::ml::label_map::LabelMap;
use crate::ml::metrics::MulticlassMetrics;
use crate::types::ImagePrediction;

pub const TRAINING_HEADER: &str = "Training classification model";
pub const METRICS_HEADER: &str = "Classification metrics";
pub const SINGLE_IMAGE_HEADER: &str = "Making single image classification";

pub fn header(title: &str) -> String {
    format!("=============== {} ===============", title)
}

pub fn print_header(title: &str) {
    println!("{}", header(title));
}

pub fn format_prediction(prediction: &ImagePrediction) -> String {
    format!(
        "Image: {} predicted as: {} with score: {} ",
        prediction.image.file_name(),
        prediction.predicted_label,
        prediction.max_score()
    )
}

pub fn display_results(predictions: &[ImagePrediction]) {
    for prediction in predictions {
        println!("{}", format_prediction(prediction));
    }
}

pub fn print_metrics(metrics: &MulticlassMetrics, labels: &LabelMap) {
    print_header(METRICS_HEADER);
    println!("LogLoss is: {}", metrics.log_loss);
    println!("PerClassLogLoss is: {}", metrics.per_class_log_loss_line());
    println!("LogLossReduction is: {}", metrics.log_loss_reduction);
    println!("MicroAccuracy is: {}", metrics.micro_accuracy);
    println!("MacroAccuracy is: {}", metrics.macro_accuracy);
    println!("Confusion matrix (rows: truth, columns: predicted):");
    for line in confusion_matrix_lines(metrics, labels) {
        println!("{}", line);
    }
}

fn confusion_matrix_lines(metrics: &MulticlassMetrics, labels: &LabelMap) -> Vec<String> {
    let width = labels
        .labels()
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max(5);

    let mut lines = Vec::with_capacity(labels.len() + 1);
    let mut head = format!("{:width$}", "", width = width);
    for label in labels.labels() {
        head.push_str(&format!(" {:>width$}", label, width = width));
    }
    lines.push(head);

    for (label, row) in labels.labels().iter().zip(&metrics.confusion_matrix) {
        let mut line = format!("{:width$}", label, width = width);
        for count in row {
            line.push_str(&format!(" {:>width$}", count, width = width));
        }
        lines.push(line);
    }

    lines
}
