//! Logistic win classifier
//!
//! Architecture: standardized features(4) → Linear(1) → sigmoid = P(side A wins)

use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::nn::{Initializer, Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::MatchDataset;
use crate::{FeatureConfig, MatchFeatures, PredictError, Result};

/// Z-score standardization of the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaling {
    pub mean: [f32; MatchFeatures::DIM],
    pub std: [f32; MatchFeatures::DIM],
}

impl Default for FeatureScaling {
    fn default() -> Self {
        FeatureScaling {
            mean: [0.0; MatchFeatures::DIM],
            std: [1.0; MatchFeatures::DIM],
        }
    }
}

impl FeatureScaling {
    /// Compute from a (training) dataset; constant features get a floored std
    pub fn from_dataset(dataset: &MatchDataset) -> Self {
        if dataset.is_empty() {
            return Self::default();
        }

        let n = dataset.len() as f32;
        let mut mean = [0.0f32; MatchFeatures::DIM];
        let mut sum_sq = [0.0f32; MatchFeatures::DIM];

        for f in &dataset.features {
            for (j, v) in f.to_array().iter().enumerate() {
                mean[j] += v;
                sum_sq[j] += v * v;
            }
        }

        let mut std = [0.0f32; MatchFeatures::DIM];
        for j in 0..MatchFeatures::DIM {
            mean[j] /= n;
            std[j] = (sum_sq[j] / n - mean[j] * mean[j]).max(0.0).sqrt().max(0.001);
        }

        FeatureScaling { mean, std }
    }

    pub fn apply(&self, features: &MatchFeatures) -> [f32; MatchFeatures::DIM] {
        let mut out = features.to_array();
        for (j, v) in out.iter_mut().enumerate() {
            *v = (*v - self.mean[j]) / self.std[j];
        }
        out
    }

    /// Standardized feature tensor [n, DIM]
    pub fn to_tensor<B: Backend>(
        &self,
        features: &[MatchFeatures],
        device: &B::Device,
    ) -> Tensor<B, 2> {
        let flat: Vec<f32> = features.iter().flat_map(|f| self.apply(f)).collect();
        Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([features.len(), MatchFeatures::DIM])
    }
}

/// Everything needed besides the weights to reuse a trained model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub feature_names: Vec<String>,
    pub scaling: FeatureScaling,
    pub features: FeatureConfig,
    pub train_examples: usize,
    pub test_examples: usize,
    pub accuracy: Option<f64>,
    pub auc: Option<f64>,
    pub iterations: usize,
    pub trained_at: DateTime<Utc>,
}

impl ModelMetadata {
    pub fn new(scaling: FeatureScaling, features: FeatureConfig) -> Self {
        ModelMetadata {
            feature_names: MatchFeatures::NAMES.iter().map(|s| s.to_string()).collect(),
            scaling,
            features,
            train_examples: 0,
            test_examples: 0,
            accuracy: None,
            auc: None,
            iterations: 0,
            trained_at: Utc::now(),
        }
    }
}

/// On-disk locations of a model artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Burn record (`.mpk`)
    pub weights: PathBuf,
    /// JSON metadata
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    /// Paths for a model stem such as `model/win_model`
    pub fn new(stem: &str) -> Self {
        ArtifactPaths {
            weights: PathBuf::from(format!("{}.mpk", stem)),
            metadata: PathBuf::from(format!("{}.json", stem)),
        }
    }

    pub fn exists(&self) -> bool {
        self.weights.exists() && self.metadata.exists()
    }
}

/// Linear probabilistic classifier over the match features
#[derive(Module, Debug)]
pub struct WinClassifier<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> WinClassifier<B> {
    /// Create a zero-initialized classifier (predicts 0.5 everywhere)
    pub fn new(device: &B::Device) -> Self {
        WinClassifier {
            linear: LinearConfig::new(MatchFeatures::DIM, 1)
                .with_initializer(Initializer::Zeros)
                .init(device),
        }
    }

    /// Forward pass on standardized features [batch, DIM] → logits [batch, 1]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(features)
    }

    /// Probability that side A wins, per example
    pub fn predict_proba(
        &self,
        features: &[MatchFeatures],
        scaling: &FeatureScaling,
        device: &B::Device,
    ) -> Result<Vec<f32>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        let x = scaling.to_tensor::<B>(features, device);
        let probs = sigmoid(self.forward(x));
        probs
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| PredictError::Model(format!("{:?}", e)))
    }

    /// Learned weights (standardized space) and bias
    pub fn coefficients(&self) -> Result<(Vec<f32>, f32)> {
        let weights = self
            .linear
            .weight
            .val()
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| PredictError::Model(format!("{:?}", e)))?;
        let bias = match &self.linear.bias {
            Some(bias) => bias
                .val()
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| PredictError::Model(format!("{:?}", e)))?
                .first()
                .copied()
                .unwrap_or(0.0),
            None => 0.0,
        };
        Ok((weights, bias))
    }

    /// Save weights and metadata, replacing any previous artifact
    ///
    /// Both files are written next to their final location and renamed into place.
    pub fn save(&self, stem: &str, metadata: &ModelMetadata) -> Result<ArtifactPaths>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let paths = ArtifactPaths::new(stem);
        if let Some(parent) = paths.weights.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // The recorder appends `.mpk` to whatever stem it is given
        let partial_stem = format!("{}_partial", stem);
        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), partial_stem.clone().into())
            .map_err(|e| PredictError::Model(e.to_string()))?;
        std::fs::rename(format!("{}.mpk", partial_stem), &paths.weights)?;

        let partial_metadata = with_suffix(&paths.metadata, ".partial");
        std::fs::write(&partial_metadata, serde_json::to_string_pretty(metadata)?)?;
        std::fs::rename(&partial_metadata, &paths.metadata)?;

        log::info!("Saved model to {}", paths.weights.display());
        Ok(paths)
    }

    /// Load weights and metadata saved by [`WinClassifier::save`]
    pub fn load(device: &B::Device, stem: &str) -> Result<(Self, ModelMetadata)>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let paths = ArtifactPaths::new(stem);
        if !paths.exists() {
            return Err(PredictError::NoModel);
        }

        let metadata: ModelMetadata =
            serde_json::from_str(&std::fs::read_to_string(&paths.metadata)?)?;

        let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(stem.into(), device)
            .map_err(|e| PredictError::Model(e.to_string()))?;

        let model = Self::new(device).load_record(record);
        Ok((model, metadata))
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(suffix);
    PathBuf::from(s)
}
