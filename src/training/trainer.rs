//! Training loop
//!
//! [`Trainer::fit`] re-initializes the classifier, then for every epoch runs
//! one Adam update per whole batch, re-evaluates that batch with dropout
//! disabled, optionally averages the validation set, and appends one
//! [`EpochRecord`] to the returned [`TrainingLog`].
//!
//! Progress lines go through `tracing` (see [`TrainingLogger`]); the log
//! itself only holds numbers.

use std::path::Path;

use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::config::TrainingConfig;
use super::scheduler::LearningRateSchedule;
use crate::dataset::{batch_count, zip_batches, Image};
use crate::model::{BatchMetrics, ConvClassifier};
use crate::utils::error::{ClassifierError, Result};
use crate::utils::logging::TrainingLogger;
use crate::utils::metrics::RunningMean;

/// Metrics of one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// 1-indexed epoch number
    pub epoch: usize,
    /// Loss of the epoch's last batch, evaluated after its update
    pub loss: f64,
    /// Accuracy of the epoch's last batch, evaluated after its update
    pub accuracy: f64,
    /// Mean of per-batch validation losses
    pub val_loss: Option<f64>,
    /// Mean of per-batch validation accuracies
    pub val_accuracy: Option<f64>,
    /// Learning rate of the epoch's last update
    pub learning_rate: f64,
}

/// Append-only per-epoch history of a `fit` run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    pub epochs: Vec<EpochRecord>,
}

impl TrainingLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, record: EpochRecord) {
        self.epochs.push(record);
    }

    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    pub fn last(&self) -> Option<&EpochRecord> {
        self.epochs.last()
    }

    /// Training loss history (per epoch)
    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|r| r.loss).collect()
    }

    /// Training accuracy history (per epoch)
    pub fn accuracies(&self) -> Vec<f64> {
        self.epochs.iter().map(|r| r.accuracy).collect()
    }

    /// Validation loss history; empty when no validation data was given
    pub fn val_losses(&self) -> Vec<f64> {
        self.epochs.iter().filter_map(|r| r.val_loss).collect()
    }

    /// Validation accuracy history; empty when no validation data was given
    pub fn val_accuracies(&self) -> Vec<f64> {
        self.epochs.iter().filter_map(|r| r.val_accuracy).collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the log as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        info!("Training log saved to {:?}", path);
        Ok(())
    }
}

/// Drives a [`ConvClassifier`] through a full training run
#[derive(Debug, Clone)]
pub struct Trainer {
    pub config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Train `classifier` from freshly drawn parameters
    ///
    /// The first failing step aborts the run; no partial log is returned.
    pub fn fit<B: AutodiffBackend>(
        &self,
        classifier: &mut ConvClassifier<B>,
        inputs: &[Image],
        labels: &[Vec<f32>],
        validation: Option<(&[Image], &[Vec<f32>])>,
    ) -> Result<TrainingLog> {
        let config = &self.config;
        config.validate()?;

        if inputs.len() != labels.len() {
            return Err(ClassifierError::ShapeMismatch(format!(
                "{} training inputs but {} labels",
                inputs.len(),
                labels.len()
            )));
        }

        let schedule = LearningRateSchedule::for_run(
            config.epochs,
            inputs.len(),
            config.batch_size,
            config.use_lr_decay,
        )?;
        let steps_per_epoch = batch_count(inputs.len(), config.batch_size)?;

        if let Some((val_inputs, val_labels)) = validation {
            if val_inputs.len() != val_labels.len() {
                return Err(ClassifierError::ShapeMismatch(format!(
                    "{} validation inputs but {} labels",
                    val_inputs.len(),
                    val_labels.len()
                )));
            }
            if batch_count(val_inputs.len(), config.batch_size)? == 0 {
                return Err(ClassifierError::Config(format!(
                    "validation set of {} samples is smaller than one batch of {}",
                    val_inputs.len(),
                    config.batch_size
                )));
            }
        }

        B::seed(config.seed);
        classifier.reset_parameters()?;

        let mut logger = TrainingLogger::new(config.epochs, steps_per_epoch);
        logger.log_start(inputs.len(), validation.map(|(x, _)| x.len()));

        let mut log = TrainingLog::new();
        let mut global_step = 0usize;

        for epoch in 0..config.epochs {
            logger.start_epoch(epoch);

            let mut last: Option<(BatchMetrics, f64)> = None;

            for (i, (x_batch, y_batch)) in
                zip_batches(inputs, labels, config.batch_size)?.enumerate()
            {
                let lr = schedule.rate(global_step);
                classifier.update(x_batch, y_batch, lr, config.dropout_keep_prob)?;
                global_step += 1;

                let metrics = classifier.evaluate(x_batch, y_batch)?;

                if is_progress_step(i, config.progress_interval) {
                    logger.log_step(i + 1, lr, metrics.loss, metrics.accuracy);
                }

                last = Some((metrics, lr));
            }

            let (metrics, learning_rate) = last.ok_or_else(|| {
                ClassifierError::Config("epoch produced no training batch".to_string())
            })?;

            let validation_metrics = match validation {
                Some((val_inputs, val_labels)) => Some(self.validate(
                    classifier,
                    val_inputs,
                    val_labels,
                )?),
                None => None,
            };

            logger.end_epoch(
                metrics.loss,
                metrics.accuracy,
                validation_metrics.map(|m| (m.loss, m.accuracy)),
                learning_rate,
            );

            log.push(EpochRecord {
                epoch: epoch + 1,
                loss: metrics.loss,
                accuracy: metrics.accuracy,
                val_loss: validation_metrics.map(|m| m.loss),
                val_accuracy: validation_metrics.map(|m| m.accuracy),
                learning_rate,
            });
        }

        logger.log_complete();
        Ok(log)
    }

    /// Mean of per-batch loss and accuracy over the validation set
    fn validate<B: AutodiffBackend>(
        &self,
        classifier: &ConvClassifier<B>,
        inputs: &[Image],
        labels: &[Vec<f32>],
    ) -> Result<BatchMetrics> {
        let mut loss = RunningMean::new();
        let mut accuracy = RunningMean::new();

        for (x_batch, y_batch) in zip_batches(inputs, labels, self.config.batch_size)? {
            let metrics = classifier.evaluate(x_batch, y_batch)?;
            loss.push(metrics.loss);
            accuracy.push(metrics.accuracy);
        }

        match (loss.mean(), accuracy.mean()) {
            (Some(loss), Some(accuracy)) => Ok(BatchMetrics { loss, accuracy }),
            _ => Err(ClassifierError::Config(
                "validation set produced no batch".to_string(),
            )),
        }
    }
}

/// Whether the 0-based batch `index` is a progress step: every
/// `interval`-th batch counted from 1, never when `interval` is 0
fn is_progress_step(index: usize, interval: usize) -> bool {
    interval > 0 && (index + 1) % interval == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic::{generate, SyntheticConfig};
    use crate::model::ModelConfig;
    use burn::backend::Autodiff;
    use burn_ndarray::NdArray;

    type TestBackend = Autodiff<NdArray>;

    fn data(n: usize) -> (Vec<Image>, Vec<Vec<f32>>) {
        let dataset = generate(&SyntheticConfig {
            num_samples: n,
            img_h: 8,
            img_w: 8,
            n_out: 2,
            ..Default::default()
        })
        .unwrap();
        (dataset.images, dataset.labels)
    }

    fn classifier() -> ConvClassifier<TestBackend> {
        ConvClassifier::new(ModelConfig::new(8, 8, 2), Default::default()).unwrap()
    }

    #[test]
    fn test_fit_appends_one_record_per_epoch() {
        let (x, y) = data(16);
        let mut model = classifier();
        let trainer = Trainer::new(TrainingConfig::new(2, 8));

        let log = trainer.fit(&mut model, &x, &y, None).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(log.epochs[0].epoch, 1);
        assert!(log.epochs.iter().all(|r| r.val_loss.is_none()));
        assert!(log.val_losses().is_empty());
    }

    #[test]
    fn test_fit_with_validation() {
        let (x, y) = data(16);
        let (vx, vy) = data(12);
        let mut model = classifier();
        let trainer = Trainer::new(TrainingConfig::new(1, 4));

        let log = trainer
            .fit(&mut model, &x, &y, Some((vx.as_slice(), vy.as_slice())))
            .unwrap();

        let record = log.last().unwrap();
        let val_loss = record.val_loss.unwrap();
        let val_acc = record.val_accuracy.unwrap();
        assert!(val_loss.is_finite() && val_loss >= 0.0);
        assert!((0.0..=1.0).contains(&val_acc));
    }

    #[test]
    fn test_last_learning_rate_follows_schedule() {
        let (x, y) = data(16);
        let mut model = classifier();
        let trainer = Trainer::new(TrainingConfig::new(2, 8));
        let log = trainer.fit(&mut model, &x, &y, None).unwrap();

        let schedule = LearningRateSchedule::for_run(2, 16, 8, true).unwrap();
        // Two steps per epoch; the last update of epoch e uses step 2e + 1
        assert_eq!(log.epochs[0].learning_rate, schedule.rate(1));
        assert_eq!(log.epochs[1].learning_rate, schedule.rate(3));
    }

    #[test]
    fn test_constant_rate_without_decay() {
        let (x, y) = data(8);
        let mut model = classifier();
        let trainer = Trainer::new(TrainingConfig::new(1, 4).with_lr_decay(false));
        let log = trainer.fit(&mut model, &x, &y, None).unwrap();
        assert_eq!(log.epochs[0].learning_rate, 0.001);
    }

    #[test]
    fn test_progress_step_every_hundredth_batch() {
        assert!(!is_progress_step(0, 100));
        assert!(!is_progress_step(98, 100));
        assert!(is_progress_step(99, 100));
        assert!(is_progress_step(199, 100));
        assert!(!is_progress_step(99, 0));
        assert!(is_progress_step(0, 1));
    }

    #[test]
    fn test_log_holds_last_batch_metrics_after_update() {
        let (x, y) = data(16);
        let mut model = classifier();
        let trainer = Trainer::new(TrainingConfig::new(1, 8));
        let log = trainer.fit(&mut model, &x, &y, None).unwrap();

        // No update happens after the final batch, so re-evaluating it
        // reproduces the logged numbers
        let metrics = model.evaluate(&x[8..16], &y[8..16]).unwrap();
        let record = log.last().unwrap();
        assert!((record.loss - metrics.loss).abs() <= 1e-6 * metrics.loss.abs() + 1e-12);
        assert_eq!(record.accuracy, metrics.accuracy);
    }

    #[test]
    fn test_validation_is_mean_of_batch_means() {
        let (x, y) = data(16);
        let (vx, vy) = data(11);
        let mut model = classifier();
        let trainer = Trainer::new(TrainingConfig::new(1, 4));
        let log = trainer
            .fit(&mut model, &x, &y, Some((vx.as_slice(), vy.as_slice())))
            .unwrap();

        // 11 samples in batches of 4: two batches, the last 3 samples skipped
        let mut loss = RunningMean::new();
        let mut accuracy = RunningMean::new();
        for (xb, yb) in zip_batches(&vx, &vy, 4).unwrap() {
            let metrics = model.evaluate(xb, yb).unwrap();
            loss.push(metrics.loss);
            accuracy.push(metrics.accuracy);
        }
        assert_eq!(loss.count(), 2);

        let record = log.last().unwrap();
        let expected_loss = loss.mean().unwrap();
        assert!(
            (record.val_loss.unwrap() - expected_loss).abs()
                <= 1e-6 * expected_loss.abs() + 1e-12
        );
        assert!((record.val_accuracy.unwrap() - accuracy.mean().unwrap()).abs() < 1e-12);
    }

    #[test]
    fn test_fit_rejects_bad_inputs() {
        let (x, y) = data(8);
        let mut model = classifier();

        // Fewer samples than one batch
        let trainer = Trainer::new(TrainingConfig::new(1, 16));
        assert!(matches!(
            trainer.fit(&mut model, &x, &y, None),
            Err(ClassifierError::Config(_))
        ));

        // Misaligned labels
        let trainer = Trainer::new(TrainingConfig::new(1, 4));
        assert!(matches!(
            trainer.fit(&mut model, &x, &y[..6], None),
            Err(ClassifierError::ShapeMismatch(_))
        ));

        // Validation set smaller than one batch
        let (vx, vy) = data(2);
        assert!(matches!(
            trainer.fit(&mut model, &x, &y, Some((vx.as_slice(), vy.as_slice()))),
            Err(ClassifierError::Config(_))
        ));
    }

    #[test]
    fn test_fit_after_close_fails() {
        let (x, y) = data(8);
        let mut model = classifier();
        model.close().unwrap();
        let trainer = Trainer::new(TrainingConfig::new(1, 4));
        assert!(matches!(
            trainer.fit(&mut model, &x, &y, None),
            Err(ClassifierError::Closed(_))
        ));
    }

    #[test]
    fn test_log_save() {
        let log = TrainingLog {
            epochs: vec![EpochRecord {
                epoch: 1,
                loss: 0.5,
                accuracy: 0.75,
                val_loss: None,
                val_accuracy: None,
                learning_rate: 0.003,
            }],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("log.json");
        log.save(&path).unwrap();

        let restored: TrainingLog =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored, log);
        assert_eq!(log.losses(), vec![0.5]);
        assert_eq!(log.accuracies(), vec![0.75]);
    }
}
