//! Prediction and inference
//!
//! Load a trained win classifier and score upcoming matches.

pub mod inference;

pub use inference::{format_prediction, Predictor};
