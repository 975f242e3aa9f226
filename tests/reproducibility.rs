//! Seeded refits reproduce each other
//!
//! Kept in its own test binary: the backend RNG is process-global, and other
//! tests drawing from it concurrently would break the comparison.

use burn::backend::Autodiff;
use burn_ndarray::NdArray;

use conv_classifier::dataset::synthetic::{generate, SyntheticConfig};
use conv_classifier::{ConvClassifier, ModelConfig, TrainingConfig};

type TestBackend = Autodiff<NdArray>;

#[test]
fn refit_with_same_seed_reproduces_log() {
    let data = generate(&SyntheticConfig {
        num_samples: 16,
        img_h: 8,
        img_w: 8,
        n_out: 2,
        seed: 7,
        ..Default::default()
    })
    .unwrap();

    let mut classifier =
        ConvClassifier::<TestBackend>::new(ModelConfig::new(8, 8, 2), Default::default())
            .unwrap();
    let config = TrainingConfig::new(2, 8).with_seed(11);

    let first = classifier.fit(&data.images, &data.labels, None, &config).unwrap();
    let second = classifier.fit(&data.images, &data.labels, None, &config).unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    for (a, b) in first.epochs.iter().zip(&second.epochs) {
        // Without a parameter reset the second run would continue from the
        // trained weights and log a different loss
        assert!((a.loss - b.loss).abs() <= 1e-9 * a.loss.abs());
        assert_eq!(a.accuracy, b.accuracy);
        assert_eq!(a.learning_rate, b.learning_rate);
    }
}
