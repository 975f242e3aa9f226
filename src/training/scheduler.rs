//! Learning Rate Scheduler Module
//!
//! Two strategies: a fixed rate, or an exponential decay from [`MAX_LR`] down
//! to [`MIN_LR`] spread over every step of the run. The rate is a pure
//! function of the global step; schedules carry no mutable state.

use serde::{Deserialize, Serialize};

use crate::dataset::batch_count;
use crate::utils::error::{ClassifierError, Result};

/// Rate used when decay is disabled
pub const CONSTANT_LR: f64 = 0.001;

/// Rate at global step 0 when decaying
pub const MAX_LR: f64 = 0.003;

/// Rate reached at the final step when decaying
pub const MIN_LR: f64 = 0.0001;

/// Learning rate as a function of the global step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LearningRateSchedule {
    /// Constant learning rate (no scheduling)
    Constant { lr: f64 },

    /// `max_lr * exp(-k * step)` with `k` chosen so the rate reaches
    /// `min_lr` at `total_steps`
    ExponentialDecay {
        max_lr: f64,
        min_lr: f64,
        total_steps: usize,
    },
}

impl LearningRateSchedule {
    pub fn constant(lr: f64) -> Self {
        Self::Constant { lr }
    }

    /// Decay from `max_lr` to `min_lr` over `total_steps`
    pub fn exponential_decay(max_lr: f64, min_lr: f64, total_steps: usize) -> Result<Self> {
        if total_steps == 0 {
            return Err(ClassifierError::Config(
                "learning rate decay needs at least one step".to_string(),
            ));
        }
        if !(max_lr > 0.0 && min_lr > 0.0) {
            return Err(ClassifierError::Config(format!(
                "decay bounds must be positive, got max {} min {}",
                max_lr, min_lr
            )));
        }
        Ok(Self::ExponentialDecay {
            max_lr,
            min_lr,
            total_steps,
        })
    }

    /// Schedule for a run of `epochs` over `dataset_size` samples
    ///
    /// Steps per epoch count whole batches only, matching what the batch
    /// iterator yields. Fails when the run contains no step at all.
    pub fn for_run(
        epochs: usize,
        dataset_size: usize,
        batch_size: usize,
        use_decay: bool,
    ) -> Result<Self> {
        if epochs == 0 {
            return Err(ClassifierError::Config(
                "epochs must be greater than 0".to_string(),
            ));
        }

        let steps_per_epoch = batch_count(dataset_size, batch_size)?;
        if steps_per_epoch == 0 {
            return Err(ClassifierError::Config(format!(
                "dataset of {} samples is smaller than one batch of {}",
                dataset_size, batch_size
            )));
        }

        if use_decay {
            Self::exponential_decay(MAX_LR, MIN_LR, epochs * steps_per_epoch)
        } else {
            Ok(Self::constant(CONSTANT_LR))
        }
    }

    /// Decay constant `k`; zero for a constant schedule
    pub fn decay_rate(&self) -> f64 {
        match self {
            Self::Constant { .. } => 0.0,
            Self::ExponentialDecay {
                max_lr,
                min_lr,
                total_steps,
            } => (min_lr / max_lr).ln() / -(*total_steps as f64),
        }
    }

    /// Learning rate at `global_step`
    pub fn rate(&self, global_step: usize) -> f64 {
        match self {
            Self::Constant { lr } => *lr,
            Self::ExponentialDecay { max_lr, .. } => {
                max_lr * (-self.decay_rate() * global_step as f64).exp()
            }
        }
    }
}

/// Learning rate at `global_step` for the given run
pub fn rate(
    global_step: usize,
    total_epochs: usize,
    dataset_size: usize,
    batch_size: usize,
    use_decay: bool,
) -> Result<f64> {
    let schedule =
        LearningRateSchedule::for_run(total_epochs, dataset_size, batch_size, use_decay)?;
    Ok(schedule.rate(global_step))
}
