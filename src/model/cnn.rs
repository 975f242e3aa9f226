//! CNN architecture
//!
//! conv(5x5, 1->32) -> norm -> relu -> pool
//! conv(5x5, 32->64) -> norm -> relu -> pool
//! flatten -> dense(->1024) -> norm -> relu -> dropout -> dense(->n_out)
//!
//! The last layer has no activation: the network returns raw logits.

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Initializer, Linear, LinearConfig, PaddingConfig2d, Relu,
    },
    tensor::{activation::log_softmax, backend::Backend, Distribution, ElementConversion, Tensor},
};

use super::config::{
    ModelConfig, CONV1_CHANNELS, CONV2_CHANNELS, HIDDEN_UNITS, INIT_STD, KERNEL_SIZE,
    NORM_EPSILON, NORM_MOMENTUM,
};
use crate::utils::error::{ClassifierError, Result};

fn initializer() -> Initializer {
    Initializer::Normal {
        mean: 0.0,
        std: INIT_STD,
    }
}

/// Append a zero row/column to odd spatial dimensions.
///
/// Only applied to post-ReLU maps, where a zero never wins a max-pool window,
/// which makes the following valid pool behave like a SAME pool.
fn pad_to_even<B: Backend>(x: Tensor<B, 4>) -> Tensor<B, 4> {
    let [batch, channels, height, width] = x.dims();
    let device = x.device();

    let x = if height % 2 == 1 {
        let zeros = Tensor::zeros([batch, channels, 1, width], &device);
        Tensor::cat(vec![x, zeros], 2)
    } else {
        x
    };

    if width % 2 == 1 {
        let height = height + height % 2;
        let zeros = Tensor::zeros([batch, channels, height, 1], &device);
        Tensor::cat(vec![x, zeros], 3)
    } else {
        x
    }
}

/// Inverted dropout keeping each unit with probability `keep_prob`
pub fn dropout<B: Backend, const D: usize>(x: Tensor<B, D>, keep_prob: f64) -> Tensor<B, D> {
    if keep_prob >= 1.0 {
        return x;
    }

    let mask = x.random_like(Distribution::Bernoulli(keep_prob));
    (x * mask).div_scalar(keep_prob)
}

/// Convolution + bias, batch norm, ReLU and a 2x2 stride-2 max pool
#[derive(Module, Debug)]
pub struct ConvLayer<B: Backend> {
    pub conv: Conv2d<B>,
    pub norm: BatchNorm<B, 2>,
    pub pool: MaxPool2d,
    activation: Relu,
}

impl<B: Backend> ConvLayer<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [KERNEL_SIZE, KERNEL_SIZE])
            .with_padding(PaddingConfig2d::Same)
            .with_initializer(initializer())
            .init(device);

        let norm = BatchNormConfig::new(out_channels)
            .with_epsilon(NORM_EPSILON)
            .with_momentum(NORM_MOMENTUM)
            .init(device);

        let pool = MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init();

        Self {
            conv,
            norm,
            pool,
            activation: Relu::new(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.norm.forward(x);
        let x = self.activation.forward(x);
        self.pool.forward(pad_to_even(x))
    }
}

/// Fully connected layer + bias, batch norm and ReLU
#[derive(Module, Debug)]
pub struct DenseLayer<B: Backend> {
    pub linear: Linear<B>,
    pub norm: BatchNorm<B, 0>,
    activation: Relu,
}

impl<B: Backend> DenseLayer<B> {
    pub fn new(d_input: usize, d_output: usize, device: &B::Device) -> Self {
        let linear = LinearConfig::new(d_input, d_output)
            .with_initializer(initializer())
            .init(device);

        let norm = BatchNormConfig::new(d_output)
            .with_epsilon(NORM_EPSILON)
            .with_momentum(NORM_MOMENTUM)
            .init(device);

        Self {
            linear,
            norm,
            activation: Relu::new(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear.forward(x);
        let x = self.norm.forward(x);
        self.activation.forward(x)
    }
}

/// The fixed two-convolution classifier network
#[derive(Module, Debug)]
pub struct Network<B: Backend> {
    pub conv1: ConvLayer<B>,
    pub conv2: ConvLayer<B>,
    pub hidden: DenseLayer<B>,
    pub output: Linear<B>,

    img_h: usize,
    img_w: usize,
    dense_input: usize,
}

impl<B: Backend> Network<B> {
    /// Build a network with freshly initialized parameters
    pub fn new(config: &ModelConfig, device: &B::Device) -> Self {
        let dense_input = config.dense_input_dim();

        Self {
            conv1: ConvLayer::new(1, CONV1_CHANNELS, device),
            conv2: ConvLayer::new(CONV1_CHANNELS, CONV2_CHANNELS, device),
            hidden: DenseLayer::new(dense_input, HIDDEN_UNITS, device),
            output: LinearConfig::new(HIDDEN_UNITS, config.n_out)
                .with_initializer(initializer())
                .init(device),
            img_h: config.img_h,
            img_w: config.img_w,
            dense_input,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `images` - Input tensor of shape [batch_size, 1, img_h, img_w]
    /// * `keep_prob` - Dropout keep probability for the hidden layer
    ///
    /// # Returns
    /// * Logits tensor of shape [batch_size, n_out]
    pub fn forward(&self, images: Tensor<B, 4>, keep_prob: f64) -> Result<Tensor<B, 2>> {
        let [batch_size, channels, height, width] = images.dims();
        if batch_size == 0 {
            return Err(ClassifierError::ShapeMismatch(
                "input batch is empty".to_string(),
            ));
        }
        if channels != 1 || height != self.img_h || width != self.img_w {
            return Err(ClassifierError::ShapeMismatch(format!(
                "input is {}x{}x{}, model expects {}x{}x1",
                height, width, channels, self.img_h, self.img_w
            )));
        }

        let x = self.conv1.forward(images);
        let x = self.conv2.forward(x);

        let [batch_size, channels, height, width] = x.dims();
        let flat = channels * height * width;
        if flat != self.dense_input {
            return Err(ClassifierError::ShapeMismatch(format!(
                "flattened features {} != dense input {}",
                flat, self.dense_input
            )));
        }
        let x = x.reshape([batch_size, flat]);

        let x = self.hidden.forward(x);
        let x = dropout(x, keep_prob);
        Ok(self.output.forward(x))
    }
}

/// Mean softmax cross-entropy between logits and one-hot labels
pub fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 2>) -> Tensor<B, 1> {
    let log_probs = log_softmax(logits, 1);
    (labels * log_probs).sum_dim(1).mean().neg()
}

/// Read a single-element tensor back as `f64`
pub fn scalar<B: Backend>(tensor: Tensor<B, 1>) -> f64 {
    tensor.into_scalar().elem::<f64>()
}

/// Fraction of rows whose logit argmax equals the label argmax
pub fn batch_accuracy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 2>) -> f64 {
    let [batch_size, _] = logits.dims();
    if batch_size == 0 {
        return 0.0;
    }

    let correct: i64 = logits
        .argmax(1)
        .equal(labels.argmax(1))
        .int()
        .sum()
        .into_scalar()
        .elem();

    correct as f64 / batch_size as f64
}
