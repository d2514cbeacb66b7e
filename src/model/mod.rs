//! Model definitions
//!
//! Logistic win classifier built on Burn, plus its persisted artifact.

pub mod classifier;

pub use classifier::{ArtifactPaths, FeatureScaling, ModelMetadata, WinClassifier};

use burn::backend::{Autodiff, NdArray};

/// CPU backend used for inference and evaluation
pub type InferenceBackend = NdArray<f32>;

/// Autodiff backend used for fitting
pub type TrainBackend = Autodiff<InferenceBackend>;
