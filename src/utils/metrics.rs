//! Host-side metric helpers
//!
//! Small utilities shared by the trainer (validation averaging) and the
//! predictor (class decisions over logit rows).

use serde::{Deserialize, Serialize};

/// Arithmetic mean over a stream of per-batch values
///
/// Every pushed value has the same weight regardless of how many samples
/// produced it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunningMean {
    sum: f64,
    count: usize,
}

impl RunningMean {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Mean of the pushed values, `None` when nothing was pushed
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Index of the largest value (first one on ties), `None` for an empty row
pub fn argmax(row: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in row.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Fraction of predicted classes equal to the ground truth classes
///
/// Only the overlapping prefix is compared, which matters when predictions
/// were truncated to whole batches.
pub fn prediction_accuracy(predictions: &[usize], ground_truth: &[usize]) -> f64 {
    let total = predictions.len().min(ground_truth.len());
    if total == 0 {
        return 0.0;
    }

    let correct = predictions
        .iter()
        .zip(ground_truth.iter())
        .filter(|(p, g)| p == g)
        .count();

    correct as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_mean() {
        let mut mean = RunningMean::new();
        assert_eq!(mean.mean(), None);

        mean.push(1.0);
        mean.push(2.0);
        mean.push(6.0);
        assert_eq!(mean.count(), 3);
        assert!((mean.mean().unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[-3.0, -1.0, -2.0]), Some(1));
        assert_eq!(argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_prediction_accuracy() {
        assert_eq!(prediction_accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(prediction_accuracy(&[1, 1], &[1, 1, 0, 0]), 1.0);
        assert_eq!(prediction_accuracy(&[], &[1]), 0.0);
    }
}
