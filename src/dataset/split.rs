//! Train/validation splitting
//!
//! Samples are shuffled with a fixed seed before the split, so the same seed
//! always produces the same partition.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::loader::Dataset;
use crate::utils::error::{ClassifierError, Result};

/// A training set and its held-out validation set
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub train: Dataset,
    pub validation: Dataset,
}

/// Shuffle `dataset` and hold out `validation_ratio` of it for validation
pub fn train_validation_split(
    dataset: Dataset,
    validation_ratio: f64,
    seed: u64,
) -> Result<DatasetSplits> {
    if !(0.0..1.0).contains(&validation_ratio) {
        return Err(ClassifierError::Config(format!(
            "validation_ratio must be in [0.0, 1.0), got {}",
            validation_ratio
        )));
    }

    let Dataset {
        img_h,
        img_w,
        n_out,
        images,
        labels,
    } = dataset;

    let mut pairs: Vec<_> = images.into_iter().zip(labels).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    pairs.shuffle(&mut rng);

    let num_validation = (pairs.len() as f64 * validation_ratio).round() as usize;
    let train_pairs = pairs.split_off(num_validation);

    let build = |pairs: Vec<_>| {
        let (images, labels): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Dataset {
            img_h,
            img_w,
            n_out,
            images,
            labels,
        }
    };

    Ok(DatasetSplits {
        train: build(train_pairs),
        validation: build(pairs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::synthetic::{generate, SyntheticConfig};

    fn dataset(n: usize) -> Dataset {
        generate(&SyntheticConfig {
            num_samples: n,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_split_sizes() {
        let splits = train_validation_split(dataset(100), 0.2, 42).unwrap();
        assert_eq!(splits.train.len(), 80);
        assert_eq!(splits.validation.len(), 20);
        assert_eq!(splits.train.labels.len(), 80);
    }

    #[test]
    fn test_zero_ratio_keeps_everything() {
        let splits = train_validation_split(dataset(10), 0.0, 1).unwrap();
        assert_eq!(splits.train.len(), 10);
        assert!(splits.validation.is_empty());
    }

    #[test]
    fn test_split_is_reproducible() {
        let a = train_validation_split(dataset(50), 0.3, 9).unwrap();
        let b = train_validation_split(dataset(50), 0.3, 9).unwrap();
        assert_eq!(a.validation.images, b.validation.images);
    }

    #[test]
    fn test_invalid_ratio() {
        assert!(train_validation_split(dataset(10), 1.0, 1).is_err());
        assert!(train_validation_split(dataset(10), -0.1, 1).is_err());
    }
}
