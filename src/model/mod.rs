//! Model module
//!
//! The network is fixed: two 5x5 convolution blocks (32 and 64 channels),
//! a 1024-unit dense layer with dropout, and a linear output layer producing
//! raw logits.

pub mod classifier;
pub mod cnn;
pub mod config;

pub use classifier::{BatchMetrics, ConvClassifier, Session};
pub use cnn::{ConvLayer, DenseLayer, Network};
pub use config::ModelConfig;
