//! Inference module for batched prediction
//!
//! Predictions are raw logit rows; `predict_classes` and
//! `predict_detailed` derive class decisions on the host.

pub mod predictor;

pub use predictor::{PredictionResult, Predictor};
