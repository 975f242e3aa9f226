//! Model Configuration Module
//!
//! The architecture is fixed; only the input geometry and the number of
//! output classes vary. Layer sizes below are derived from those three
//! numbers.

use serde::{Deserialize, Serialize};

use crate::utils::error::{ClassifierError, Result};

/// Side length of both convolution kernels
pub const KERNEL_SIZE: usize = 5;

/// Output channels of the first convolution
pub const CONV1_CHANNELS: usize = 32;

/// Output channels of the second convolution
pub const CONV2_CHANNELS: usize = 64;

/// Width of the hidden dense layer
pub const HIDDEN_UNITS: usize = 1024;

/// Batch-norm epsilon
pub const NORM_EPSILON: f64 = 1e-3;

/// Batch-norm running-statistics momentum (moving-average decay of 0.999)
pub const NORM_MOMENTUM: f64 = 0.001;

/// Standard deviation of the normal initializer used for every weight and bias
pub const INIT_STD: f64 = 1.0;

/// Adam hyperparameters
pub const ADAM_BETA_1: f32 = 0.9;
pub const ADAM_BETA_2: f32 = 0.999;
pub const ADAM_EPSILON: f32 = 1e-8;

/// Output size of a 2x2, stride-2 pool with SAME padding
pub fn pooled_dim(dim: usize) -> usize {
    dim.div_ceil(2)
}

/// Configuration for the convolutional classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Input image height
    pub img_h: usize,

    /// Input image width
    pub img_w: usize,

    /// Number of output classes
    #[serde(default = "default_n_out")]
    pub n_out: usize,
}

fn default_n_out() -> usize {
    2
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            img_h: 28,
            img_w: 28,
            n_out: default_n_out(),
        }
    }
}

impl ModelConfig {
    pub fn new(img_h: usize, img_w: usize, n_out: usize) -> Self {
        Self {
            img_h,
            img_w,
            n_out,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.img_h == 0 || self.img_w == 0 {
            return Err(ClassifierError::Config(format!(
                "image dimensions must be positive, got {}x{}",
                self.img_h, self.img_w
            )));
        }

        if self.n_out == 0 {
            return Err(ClassifierError::Config(
                "n_out must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Spatial size of the feature map after both pooling stages
    pub fn feature_map_dims(&self) -> (usize, usize) {
        (
            pooled_dim(pooled_dim(self.img_h)),
            pooled_dim(pooled_dim(self.img_w)),
        )
    }

    /// Flattened size feeding the hidden dense layer
    pub fn dense_input_dim(&self) -> usize {
        let (h, w) = self.feature_map_dims();
        h * w * CONV2_CHANNELS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_input_dim() {
        assert_eq!(ModelConfig::new(28, 28, 10).dense_input_dim(), 7 * 7 * 64);
        assert_eq!(ModelConfig::new(8, 8, 2).dense_input_dim(), 2 * 2 * 64);
        // Odd sizes round up at every pooling stage
        assert_eq!(ModelConfig::new(9, 5, 2).dense_input_dim(), 3 * 2 * 64);
        assert_eq!(ModelConfig::new(1, 1, 2).dense_input_dim(), 64);
    }

    #[test]
    fn test_pooled_dim() {
        assert_eq!(pooled_dim(8), 4);
        assert_eq!(pooled_dim(7), 4);
        assert_eq!(pooled_dim(1), 1);
    }

    #[test]
    fn test_validate() {
        assert!(ModelConfig::new(8, 8, 2).validate().is_ok());
        assert!(ModelConfig::new(0, 8, 2).validate().is_err());
        assert!(ModelConfig::new(8, 8, 0).validate().is_err());
    }

    #[test]
    fn test_n_out_defaults_to_two() {
        let config: ModelConfig = toml::from_str("img_h = 16\nimg_w = 12").unwrap();
        assert_eq!(config, ModelConfig::new(16, 12, 2));
    }
}
