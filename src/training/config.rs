//! Hyperparameters of a `fit` run

use serde::{Deserialize, Serialize};

use crate::utils::error::{ClassifierError, Result};

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Number of passes over the training set
    pub epochs: usize,

    /// Samples per batch; trailing partial batches are skipped
    pub batch_size: usize,

    /// Probability of keeping a hidden unit during training updates
    pub dropout_keep_prob: f64,

    /// Decay the learning rate exponentially instead of holding it fixed
    pub use_lr_decay: bool,

    /// Emit a progress line every this many batches (0 disables)
    pub progress_interval: usize,

    /// Seed for the backend RNG (initialization and dropout)
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 10,
            batch_size: 32,
            dropout_keep_prob: 0.5,
            use_lr_decay: true,
            progress_interval: 100,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        Self {
            epochs,
            batch_size,
            ..Default::default()
        }
    }

    pub fn with_dropout_keep_prob(mut self, keep_prob: f64) -> Self {
        self.dropout_keep_prob = keep_prob;
        self
    }

    pub fn with_lr_decay(mut self, use_lr_decay: bool) -> Self {
        self.use_lr_decay = use_lr_decay;
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(ClassifierError::Config(
                "epochs must be greater than 0".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(ClassifierError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if !(self.dropout_keep_prob > 0.0 && self.dropout_keep_prob <= 1.0) {
            return Err(ClassifierError::Config(format!(
                "dropout_keep_prob must be in (0, 1], got {}",
                self.dropout_keep_prob
            )));
        }

        Ok(())
    }
}
