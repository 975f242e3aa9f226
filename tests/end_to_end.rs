//! End-to-end training and prediction on synthetic data

use burn::backend::Autodiff;
use burn_ndarray::NdArray;

use conv_classifier::dataset::synthetic::{generate, SyntheticConfig};
use conv_classifier::dataset::{batches, train_validation_split};
use conv_classifier::{
    ClassifierError, ConvClassifier, Dataset, ModelConfig, Predictor, TrainingConfig,
};

type TestBackend = Autodiff<NdArray>;

fn synthetic(num_samples: usize) -> Dataset {
    generate(&SyntheticConfig {
        num_samples,
        img_h: 8,
        img_w: 8,
        n_out: 2,
        seed: 7,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn fit_two_epochs_on_small_images() {
    let data = synthetic(32);
    let mut classifier =
        ConvClassifier::<TestBackend>::new(ModelConfig::new(8, 8, 2), Default::default())
            .unwrap();

    let config = TrainingConfig::new(2, 8).with_lr_decay(true);
    let log = classifier
        .fit(&data.images, &data.labels, None, &config)
        .unwrap();

    assert_eq!(log.len(), 2);
    for record in &log.epochs {
        assert!(!record.loss.is_nan());
        assert!(record.loss.is_finite() && record.loss >= 0.0);
        assert!((0.0..=1.0).contains(&record.accuracy));
        assert!(record.learning_rate <= 0.003 && record.learning_rate > 0.0001);
    }

    classifier.close().unwrap();
}

#[test]
fn fit_with_validation_then_predict() {
    let splits = train_validation_split(synthetic(48), 0.25, 3).unwrap();
    assert_eq!(splits.validation.len(), 12);

    let config = TrainingConfig::new(2, 4).with_dropout_keep_prob(0.8);

    let (log, rows) = ConvClassifier::<TestBackend>::scoped(
        ModelConfig::new(8, 8, 2),
        Default::default(),
        |classifier| {
            let log = classifier.fit(
                &splits.train.images,
                &splits.train.labels,
                Some((
                    splits.validation.images.as_slice(),
                    splits.validation.labels.as_slice(),
                )),
                &config,
            )?;
            let rows = classifier.predict(&splits.validation.images, 5)?;
            Ok((log, rows))
        },
    )
    .unwrap();

    assert_eq!(log.val_losses().len(), 2);
    assert_eq!(log.val_accuracies().len(), 2);
    // 12 inputs in batches of 5 leave 2 unpredicted
    assert_eq!(rows.len(), 10);
    assert!(rows.iter().all(|row| row.len() == 2));
}

#[test]
fn predict_row_counts() {
    let data = synthetic(20);
    let classifier =
        ConvClassifier::<TestBackend>::new(ModelConfig::new(8, 8, 2), Default::default())
            .unwrap();

    let predictor = Predictor::new(4);
    assert_eq!(predictor.predict(&classifier, &data.images).unwrap().len(), 20);
    assert_eq!(
        predictor.predict(&classifier, &data.images[..19]).unwrap().len(),
        16
    );
}

#[test]
fn closed_classifier_rejects_everything() {
    let data = synthetic(8);
    let mut classifier =
        ConvClassifier::<TestBackend>::new(ModelConfig::new(8, 8, 2), Default::default())
            .unwrap();
    classifier.close().unwrap();

    let config = TrainingConfig::new(1, 4);
    assert!(matches!(
        classifier.fit(&data.images, &data.labels, None, &config),
        Err(ClassifierError::Closed(_))
    ));
    assert!(matches!(
        classifier.predict(&data.images, 4),
        Err(ClassifierError::Closed(_))
    ));
    assert!(matches!(
        classifier.evaluate(&data.images, &data.labels),
        Err(ClassifierError::Closed(_))
    ));
    assert!(matches!(classifier.close(), Err(ClassifierError::Closed(_))));
}

#[test]
fn batches_are_restartable() {
    let data = synthetic(10);
    let first: Vec<_> = batches(&data.images, 3).unwrap().collect();
    let second: Vec<_> = batches(&data.images, 3).unwrap().collect();
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}
