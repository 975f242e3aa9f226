//! The classifier: network parameters, optimizer state and device handle
//!
//! A [`ConvClassifier`] owns one [`Session`], the execution context holding
//! the device, the network and the Adam state. The session is acquired in
//! [`ConvClassifier::new`] and released by [`ConvClassifier::close`] or, at
//! the latest, when the classifier is dropped. Every operation on a closed
//! classifier fails with [`ClassifierError::Closed`].

use burn::{
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, Tensor},
};
use tracing::debug;

use super::cnn::{batch_accuracy, cross_entropy, scalar, Network};
use super::config::{ModelConfig, ADAM_BETA_1, ADAM_BETA_2, ADAM_EPSILON};
use crate::dataset::{images_to_tensor, labels_to_tensor, Image};
use crate::inference::Predictor;
use crate::training::{Trainer, TrainingConfig, TrainingLog};
use crate::utils::error::{ClassifierError, Result};

type AdamOptimizer<B> = OptimizerAdaptor<Adam, Network<B>, B>;

/// Loss and accuracy of one batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchMetrics {
    pub loss: f64,
    pub accuracy: f64,
}

/// Execution context: device, parameters and optimizer state
pub struct Session<B: AutodiffBackend> {
    device: B::Device,
    network: Network<B>,
    optimizer: AdamOptimizer<B>,
}

impl<B: AutodiffBackend> Session<B> {
    fn open(config: &ModelConfig, device: B::Device) -> Self {
        debug!("Acquiring session for {}x{} -> {} model", config.img_h, config.img_w, config.n_out);
        Self {
            network: Network::new(config, &device),
            optimizer: adam(),
            device,
        }
    }
}

fn adam<B: AutodiffBackend>() -> AdamOptimizer<B> {
    AdamConfig::new()
        .with_beta_1(ADAM_BETA_1)
        .with_beta_2(ADAM_BETA_2)
        .with_epsilon(ADAM_EPSILON)
        .init()
}

/// Two-layer convolutional image classifier
pub struct ConvClassifier<B: AutodiffBackend> {
    config: ModelConfig,
    session: Option<Session<B>>,
}

impl<B: AutodiffBackend> ConvClassifier<B> {
    /// Build the model and acquire its session on `device`
    pub fn new(config: ModelConfig, device: B::Device) -> Result<Self> {
        config.validate()?;
        let session = Session::open(&config, device);
        Ok(Self {
            config,
            session: Some(session),
        })
    }

    /// Run `f` with a fresh classifier and close it afterwards, even when
    /// `f` fails
    pub fn scoped<T, F>(config: ModelConfig, device: B::Device, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut classifier = Self::new(config, device)?;
        let result = f(&mut classifier);
        let closed = classifier.close();
        let value = result?;
        closed?;
        Ok(value)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    fn session(&self) -> Result<&Session<B>> {
        self.session
            .as_ref()
            .ok_or_else(|| ClassifierError::Closed("classifier has been closed".to_string()))
    }

    fn session_mut(&mut self) -> Result<&mut Session<B>> {
        self.session
            .as_mut()
            .ok_or_else(|| ClassifierError::Closed("classifier has been closed".to_string()))
    }

    /// The network in its current state
    pub fn network(&self) -> Result<&Network<B>> {
        Ok(&self.session()?.network)
    }

    /// Re-draw every parameter and reset the optimizer state
    pub fn reset_parameters(&mut self) -> Result<()> {
        let config = self.config.clone();
        let session = self.session_mut()?;
        session.network = Network::new(&config, &session.device);
        session.optimizer = adam();
        Ok(())
    }

    fn upload(&self, images: &[Image]) -> Result<Tensor<B, 4>> {
        let session = self.session()?;
        images_to_tensor(images, self.config.img_h, self.config.img_w, &session.device)
    }

    fn upload_labels(&self, labels: &[Vec<f32>]) -> Result<Tensor<B, 2>> {
        let session = self.session()?;
        labels_to_tensor(labels, self.config.n_out, &session.device)
    }

    /// Logits for a batch of images
    pub fn forward(&self, images: &[Image], keep_prob: f64) -> Result<Tensor<B, 2>> {
        check_keep_prob(keep_prob)?;
        let input = self.upload(images)?;
        self.session()?.network.forward(input, keep_prob)
    }

    /// Mean softmax cross-entropy of `logits` against one-hot `labels`
    pub fn loss(&self, logits: Tensor<B, 2>, labels: &[Vec<f32>]) -> Result<f64> {
        let labels = self.upload_labels(labels)?;
        check_rows(&logits, &labels)?;
        Ok(scalar(cross_entropy(logits, labels)))
    }

    /// Fraction of rows where the logit argmax matches the label argmax
    pub fn accuracy(&self, logits: Tensor<B, 2>, labels: &[Vec<f32>]) -> Result<f64> {
        let labels = self.upload_labels(labels)?;
        check_rows(&logits, &labels)?;
        Ok(batch_accuracy(logits, labels))
    }

    /// Loss and accuracy of a batch with dropout disabled
    pub fn evaluate(&self, images: &[Image], labels: &[Vec<f32>]) -> Result<BatchMetrics> {
        let logits = self.forward(images, 1.0)?;
        let labels = self.upload_labels(labels)?;
        check_rows(&logits, &labels)?;

        Ok(BatchMetrics {
            loss: scalar(cross_entropy(logits.clone(), labels.clone())),
            accuracy: batch_accuracy(logits, labels),
        })
    }

    /// One Adam step on the batch loss; mutates every parameter
    pub fn update(
        &mut self,
        images: &[Image],
        labels: &[Vec<f32>],
        learning_rate: f64,
        keep_prob: f64,
    ) -> Result<()> {
        check_keep_prob(keep_prob)?;
        let input = self.upload(images)?;
        let targets = self.upload_labels(labels)?;

        let session = self.session_mut()?;
        let logits = session.network.forward(input, keep_prob)?;
        check_rows(&logits, &targets)?;
        let loss = cross_entropy(logits, targets);

        let grads = GradientsParams::from_grads(loss.backward(), &session.network);
        session.network = session
            .optimizer
            .step(learning_rate, session.network.clone(), grads);

        Ok(())
    }

    /// Train from fresh parameters; see [`Trainer::fit`]
    pub fn fit(
        &mut self,
        inputs: &[Image],
        labels: &[Vec<f32>],
        validation: Option<(&[Image], &[Vec<f32>])>,
        config: &TrainingConfig,
    ) -> Result<TrainingLog> {
        Trainer::new(config.clone()).fit(self, inputs, labels, validation)
    }

    /// Logit rows for `inputs`, processed in whole batches; see [`Predictor`]
    pub fn predict(&self, inputs: &[Image], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        Predictor::new(batch_size).predict(self, inputs)
    }

    /// Release the session; later operations fail with `Closed`
    pub fn close(&mut self) -> Result<()> {
        match self.session.take() {
            Some(_) => {
                debug!("Session released");
                Ok(())
            }
            None => Err(ClassifierError::Closed(
                "classifier was already closed".to_string(),
            )),
        }
    }
}

impl<B: AutodiffBackend> Drop for ConvClassifier<B> {
    fn drop(&mut self) {
        if self.session.take().is_some() {
            debug!("Session released on drop");
        }
    }
}

fn check_keep_prob(keep_prob: f64) -> Result<()> {
    if keep_prob > 0.0 && keep_prob <= 1.0 {
        Ok(())
    } else {
        Err(ClassifierError::Config(format!(
            "dropout keep probability must be in (0, 1], got {}",
            keep_prob
        )))
    }
}

fn check_rows<B: AutodiffBackend>(logits: &Tensor<B, 2>, labels: &Tensor<B, 2>) -> Result<()> {
    let [logit_rows, _] = logits.dims();
    let [label_rows, _] = labels.dims();
    if logit_rows != label_rows {
        return Err(ClassifierError::ShapeMismatch(format!(
            "{} logit rows but {} label rows",
            logit_rows, label_rows
        )));
    }
    Ok(())
}
