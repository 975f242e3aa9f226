//! Seeded synthetic datasets
//!
//! Each class lights up its own band of rows on top of uniform background
//! noise, so a small convolutional network can separate the classes within
//! a few epochs. Useful for smoke runs and tests without any data files.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::image::Image;
use super::loader::Dataset;
use crate::utils::error::{ClassifierError, Result};

/// Parameters of a synthetic dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticConfig {
    pub num_samples: usize,
    pub img_h: usize,
    pub img_w: usize,
    pub n_out: usize,
    /// Amplitude of the background noise
    pub noise: f32,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            num_samples: 256,
            img_h: 8,
            img_w: 8,
            n_out: 2,
            noise: 0.2,
            seed: 42,
        }
    }
}

/// Rows `[start, end)` brightened for `class`
fn class_band(class: usize, n_out: usize, img_h: usize) -> (usize, usize) {
    let start = class * img_h / n_out;
    let end = ((class + 1) * img_h / n_out).max(start + 1).min(img_h);
    (start, end)
}

/// Generate a dataset whose labels cycle through the classes
pub fn generate(config: &SyntheticConfig) -> Result<Dataset> {
    if config.img_h == 0 || config.img_w == 0 || config.n_out == 0 {
        return Err(ClassifierError::Config(
            "synthetic images need positive dimensions and at least one class".to_string(),
        ));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut images = Vec::with_capacity(config.num_samples);
    let mut classes = Vec::with_capacity(config.num_samples);

    for i in 0..config.num_samples {
        let class = i % config.n_out;
        let (start, end) = class_band(class, config.n_out, config.img_h);

        let mut pixels = Vec::with_capacity(config.img_h * config.img_w);
        for row in 0..config.img_h {
            let base = if (start..end).contains(&row) { 1.0 } else { 0.0 };
            for _ in 0..config.img_w {
                pixels.push(base + rng.gen::<f32>() * config.noise);
            }
        }

        images.push(Image::new(config.img_h, config.img_w, pixels)?);
        classes.push(class);
    }

    Dataset::from_class_labels(config.img_h, config.img_w, config.n_out, images, &classes)
}
