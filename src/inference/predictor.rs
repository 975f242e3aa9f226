//! Inference Predictor Module
//!
//! Runs the classifier over new images in fixed-size batches with dropout
//! disabled and concatenates the logit rows in input order. Inputs that do
//! not fill a final whole batch are skipped, so fewer rows than inputs come
//! back when the length is not a multiple of the batch size.

use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::{batches, Image};
use crate::model::ConvClassifier;
use crate::utils::error::{ClassifierError, Result};
use crate::utils::metrics::argmax;

/// Class decision for one input row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Predicted class index
    pub predicted_class: usize,

    /// Softmax probability of the predicted class
    pub confidence: f32,

    /// Softmax distribution over all classes
    pub probabilities: Vec<f32>,
}

impl PredictionResult {
    /// Build a result from one row of logits
    pub fn from_logits(logits: &[f32]) -> Option<Self> {
        let predicted_class = argmax(logits)?;
        let probabilities = softmax(logits);
        Some(Self {
            predicted_class,
            confidence: probabilities[predicted_class],
            probabilities,
        })
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}

/// Batched inference over a classifier
#[derive(Debug, Clone, Copy)]
pub struct Predictor {
    batch_size: usize,
}

impl Default for Predictor {
    fn default() -> Self {
        Self { batch_size: 32 }
    }
}

impl Predictor {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Logit rows for every input covered by a whole batch, in input order
    pub fn predict<B: AutodiffBackend>(
        &self,
        classifier: &ConvClassifier<B>,
        inputs: &[Image],
    ) -> Result<Vec<Vec<f32>>> {
        // Fail on a closed classifier even when no batch would run
        classifier.network()?;

        let n_out = classifier.config().n_out;
        let batches = batches(inputs, self.batch_size)?;

        let skipped = batches.remainder().len();
        if skipped > 0 {
            warn!(
                "Skipping {} trailing inputs that do not fill a batch of {}",
                skipped, self.batch_size
            );
        }

        let mut rows = Vec::with_capacity(inputs.len() - skipped);
        for batch in batches {
            let logits = classifier.forward(batch, 1.0)?;
            let values = logits
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| ClassifierError::Tensor(format!("{:?}", e)))?;
            rows.extend(values.chunks_exact(n_out).map(|row| row.to_vec()));
        }

        debug!("Predicted {} of {} inputs", rows.len(), inputs.len());
        Ok(rows)
    }

    /// Arg-max class of every predicted row
    pub fn predict_classes<B: AutodiffBackend>(
        &self,
        classifier: &ConvClassifier<B>,
        inputs: &[Image],
    ) -> Result<Vec<usize>> {
        Ok(self
            .predict_detailed(classifier, inputs)?
            .into_iter()
            .map(|result| result.predicted_class)
            .collect())
    }

    /// Class, confidence and probability distribution of every predicted row
    pub fn predict_detailed<B: AutodiffBackend>(
        &self,
        classifier: &ConvClassifier<B>,
        inputs: &[Image],
    ) -> Result<Vec<PredictionResult>> {
        self.predict(classifier, inputs)?
            .iter()
            .map(|row| {
                PredictionResult::from_logits(row)
                    .ok_or_else(|| ClassifierError::Tensor("empty logit row".to_string()))
            })
            .collect()
    }
}
