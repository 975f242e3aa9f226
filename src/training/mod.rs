//! Training module
//!
//! - `config`: hyperparameters of a run
//! - `scheduler`: constant or exponentially decaying learning rate
//! - `trainer`: the epoch/batch loop and its per-epoch log

pub mod config;
pub mod scheduler;
pub mod trainer;

pub use config::TrainingConfig;
pub use scheduler::{rate, LearningRateSchedule, CONSTANT_LR, MAX_LR, MIN_LR};
pub use trainer::{EpochRecord, Trainer, TrainingLog};
