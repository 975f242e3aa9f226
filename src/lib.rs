//! # Conv Classifier
//!
//! A small image-classification training harness built on the Burn framework.
//! It trains a fixed two-layer convolutional network with Adam and an
//! exponentially decaying learning rate, reports per-epoch metrics, and
//! predicts on new data in fixed-size batches.
//!
//! ## Modules
//!
//! - `dataset`: batching, the `Image` sample type, JSON dataset files, synthetic data
//! - `model`: the network and the `ConvClassifier` that owns its session
//! - `training`: learning-rate schedule and the training loop
//! - `inference`: batched prediction
//! - `config`: TOML experiment files
//! - `utils`: errors, logging and metric helpers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conv_classifier::backend::{default_device, TrainingBackend};
//! use conv_classifier::{ConvClassifier, ModelConfig, TrainingConfig};
//!
//! let log = ConvClassifier::<TrainingBackend>::scoped(
//!     ModelConfig::new(28, 28, 10),
//!     default_device(),
//!     |clf| clf.fit(&images, &labels, None, &TrainingConfig::new(10, 32)),
//! )?;
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

// Re-export commonly used items for convenience
pub use config::{DataConfig, ExperimentConfig};
pub use dataset::{Dataset, DatasetSplits, Image};
pub use inference::{PredictionResult, Predictor};
pub use model::{BatchMetrics, ConvClassifier, ModelConfig};
pub use training::{EpochRecord, LearningRateSchedule, Trainer, TrainingConfig, TrainingLog};
pub use utils::error::{ClassifierError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
