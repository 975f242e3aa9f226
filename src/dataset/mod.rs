//! Dataset module: samples, batching and data sources
//!
//! This module provides:
//! - Fixed-size batching over in-memory sequences (`batch`)
//! - The single-channel `Image` sample type and tensor upload (`image`)
//! - JSON dataset files (`loader`)
//! - Seeded synthetic data (`synthetic`) and train/validation splits (`split`)

pub mod batch;
pub mod image;
pub mod loader;
pub mod split;
pub mod synthetic;

pub use batch::{batch_count, batches, zip_batches, Batches};
pub use image::{images_to_tensor, labels_to_tensor, one_hot, Image};
pub use loader::{Dataset, DatasetFile, SampleRecord};
pub use split::{train_validation_split, DatasetSplits};
pub use synthetic::SyntheticConfig;
