//! Experiment configuration file
//!
//! A TOML file with `[model]`, `[training]` and `[data]` tables. Every table
//! and every key is optional; missing values fall back to the defaults.
//!
//! ```toml
//! [model]
//! img_h = 28
//! img_w = 28
//! n_out = 10
//!
//! [training]
//! epochs = 5
//! batch_size = 64
//!
//! [data]
//! path = "data/digits.json"
//! validation_ratio = 0.1
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dataset::synthetic::{generate, SyntheticConfig};
use crate::dataset::{train_validation_split, Dataset, DatasetSplits};
use crate::model::ModelConfig;
use crate::training::TrainingConfig;
use crate::utils::error::{ClassifierError, Result};

/// Where the samples come from and how they are split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// JSON dataset file; synthetic data is generated when unset
    pub path: Option<PathBuf>,

    /// Number of synthetic samples
    pub synthetic_samples: usize,

    /// Fraction of samples held out for validation
    pub validation_ratio: f64,

    /// Seed for synthetic generation and the split shuffle
    pub seed: u64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            synthetic_samples: 512,
            validation_ratio: 0.2,
            seed: 42,
        }
    }
}

impl DataConfig {
    /// Load or generate the dataset for `model`
    ///
    /// A loaded file must match the model's geometry and class count.
    pub fn load(&self, model: &ModelConfig) -> Result<Dataset> {
        let dataset = match &self.path {
            Some(path) => Dataset::load(path)?,
            None => generate(&SyntheticConfig {
                num_samples: self.synthetic_samples,
                img_h: model.img_h,
                img_w: model.img_w,
                n_out: model.n_out,
                seed: self.seed,
                ..Default::default()
            })?,
        };

        if (dataset.img_h, dataset.img_w, dataset.n_out) != (model.img_h, model.img_w, model.n_out)
        {
            return Err(ClassifierError::ShapeMismatch(format!(
                "dataset is {}x{} with {} classes, model expects {}x{} with {}",
                dataset.img_h, dataset.img_w, dataset.n_out, model.img_h, model.img_w, model.n_out
            )));
        }

        Ok(dataset)
    }

    /// Load the dataset and split it into train and validation sets
    pub fn load_splits(&self, model: &ModelConfig) -> Result<DatasetSplits> {
        train_validation_split(self.load(model)?, self.validation_ratio, self.seed)
    }
}

/// Complete experiment configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub data: DataConfig,
}

impl ExperimentConfig {
    /// Load from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        load_toml_config(path)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.training.validate()?;
        if !(0.0..1.0).contains(&self.data.validation_ratio) {
            return Err(ClassifierError::Config(format!(
                "validation_ratio must be in [0.0, 1.0), got {}",
                self.data.validation_ratio
            )));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ClassifierError::Serialization(e.to_string()))
    }
}

/// Read and deserialize a TOML file
pub fn load_toml_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = fs::read_to_string(path).map_err(|e| {
        ClassifierError::Config(format!("Failed to read config {}: {e}", path.display()))
    })?;

    toml::from_str(&content).map_err(|e| {
        ClassifierError::Config(format!("Failed to parse config {}: {e}", path.display()))
    })
}
