//! Logistic regression fit loop
//!
//! Full-batch gradient descent on binary cross-entropy with an iteration cap.

use burn::module::AutodiffModule;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{GradientsParams, Optimizer, SgdConfig};
use burn::tensor::activation::sigmoid;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{ElementConversion, Tensor};

use crate::data::MatchDataset;
use crate::model::{FeatureScaling, WinClassifier};
use crate::training::metrics::{Metrics, TrainingHistory};
use crate::{PredictError, Result, TrainingConfig};

/// A fitted classifier with the scaling it was trained under
pub struct FitResult<B: AutodiffBackend> {
    pub model: WinClassifier<B>,
    pub scaling: FeatureScaling,
    pub history: TrainingHistory,
}

impl<B: AutodiffBackend> FitResult<B> {
    /// Evaluate on a dataset with the autodiff graph detached
    pub fn evaluate(&self, dataset: &MatchDataset, device: &B::Device) -> Result<Metrics> {
        let model = self.model.valid();
        let probs = model.predict_proba(&dataset.features, &self.scaling, device)?;
        Ok(Metrics::evaluate(&probs, &dataset.labels))
    }
}

/// Trainer for the win classifier
pub struct LogisticTrainer<B: AutodiffBackend> {
    learning_rate: f64,
    max_iterations: usize,
    tolerance: f64,
    l2_penalty: f64,
    device: B::Device,
}

impl<B: AutodiffBackend> LogisticTrainer<B> {
    /// Create a new trainer
    pub fn new(config: &TrainingConfig, device: B::Device) -> Self {
        LogisticTrainer {
            learning_rate: config.learning_rate,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            l2_penalty: config.l2_penalty,
            device,
        }
    }

    /// Fit on a training subset
    pub fn fit(&self, dataset: &MatchDataset) -> Result<FitResult<B>> {
        if dataset.is_empty() {
            return Err(PredictError::Model(
                "cannot fit a classifier on an empty dataset".to_string(),
            ));
        }

        let scaling = FeatureScaling::from_dataset(dataset);
        log::debug!(
            "Feature scaling: mean={:?}, std={:?}",
            scaling.mean,
            scaling.std
        );

        // Full batch, fixed order
        let x = scaling.to_tensor::<B>(&dataset.features, &self.device);
        let y = Tensor::<B, 1>::from_floats(dataset.labels_f32().as_slice(), &self.device)
            .reshape([dataset.len(), 1]);

        let weight_decay = (self.l2_penalty > 0.0)
            .then(|| WeightDecayConfig::new(self.l2_penalty as f32));
        let mut optimizer = SgdConfig::new()
            .with_weight_decay(weight_decay)
            .init::<B, WinClassifier<B>>();

        let mut model = WinClassifier::<B>::new(&self.device);
        let mut history = TrainingHistory::new();

        log::info!(
            "Fitting logistic classifier on {} examples (max {} iterations)",
            dataset.len(),
            self.max_iterations
        );

        for iteration in 0..self.max_iterations {
            let probs = sigmoid(model.forward(x.clone()));
            let loss = binary_cross_entropy(probs, y.clone());
            let loss_val: f32 = loss.clone().into_scalar().elem();
            history.record(loss_val as f64);

            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optimizer.step(self.learning_rate, model, grads);

            if iteration % 50 == 0 {
                log::debug!("Iteration {}: loss={:.6}", iteration + 1, loss_val);
            }

            if let Some(delta) = history.last_improvement() {
                if delta.abs() < self.tolerance {
                    history.converged = true;
                    break;
                }
            }
        }

        if history.converged {
            log::info!(
                "Converged after {} iterations (loss={:.4})",
                history.iterations(),
                history.final_loss().unwrap_or(f64::NAN)
            );
        } else {
            log::warn!(
                "Stopped at the iteration cap ({}) before converging (loss={:.4})",
                self.max_iterations,
                history.final_loss().unwrap_or(f64::NAN)
            );
        }

        Ok(FitResult {
            model,
            scaling,
            history,
        })
    }
}

/// Mean binary cross-entropy on probabilities
fn binary_cross_entropy<B: AutodiffBackend>(
    probs: Tensor<B, 2>,
    targets: Tensor<B, 2>,
) -> Tensor<B, 1> {
    let eps = 1e-7;
    let probs_clamped = probs.clamp(eps, 1.0 - eps);
    let loss = targets.clone().neg() * probs_clamped.clone().log()
        - (targets.neg() + 1.0) * (probs_clamped.neg() + 1.0).log();
    loss.mean()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrainBackend;
    use crate::MatchFeatures;

    fn separable_dataset(n: usize) -> MatchDataset {
        let mut dataset = MatchDataset::default();
        for i in 0..n {
            let strength = (i as f32 / n as f32) - 0.5;
            dataset
                .features
                .push(MatchFeatures::from_array([strength, strength * 0.5, 0.5, 1.0]));
            dataset.labels.push((strength > 0.0) as u8);
        }
        dataset
    }

    #[test]
    fn test_fit_learns_separable_data() {
        let dataset = separable_dataset(60);
        let trainer = LogisticTrainer::<TrainBackend>::new(&TrainingConfig::default(), Default::default());
        let fit = trainer.fit(&dataset).unwrap();

        assert!(fit.history.iterations() <= TrainingConfig::default().max_iterations);
        let first = fit.history.losses[0];
        let last = fit.history.final_loss().unwrap();
        assert!(last < first, "loss should decrease: {} -> {}", first, last);

        let metrics = fit.evaluate(&dataset, &Default::default()).unwrap();
        assert!(metrics.accuracy().unwrap() > 0.9);
        assert!(metrics.auc.unwrap() > 0.95);
    }

    #[test]
    fn test_fit_respects_iteration_cap() {
        let config = TrainingConfig {
            max_iterations: 5,
            tolerance: 0.0,
            ..Default::default()
        };
        let trainer = LogisticTrainer::<TrainBackend>::new(&config, Default::default());
        let fit = trainer.fit(&separable_dataset(20)).unwrap();
        assert_eq!(fit.history.iterations(), 5);
        assert!(!fit.history.converged);
    }

    #[test]
    fn test_fit_single_class() {
        let mut dataset = separable_dataset(10);
        dataset.labels = vec![1; 10];
        let trainer = LogisticTrainer::<TrainBackend>::new(&TrainingConfig::default(), Default::default());
        let fit = trainer.fit(&dataset).unwrap();
        let metrics = fit.evaluate(&dataset, &Default::default()).unwrap();
        assert_eq!(metrics.accuracy(), Some(1.0));
        assert_eq!(metrics.auc, None);
    }

    #[test]
    fn test_fit_with_l2_penalty() {
        let config = TrainingConfig {
            l2_penalty: 0.01,
            ..Default::default()
        };
        let trainer = LogisticTrainer::<TrainBackend>::new(&config, Default::default());
        let fit = trainer.fit(&separable_dataset(30)).unwrap();
        let (weights, _bias) = fit.model.valid().coefficients().unwrap();
        assert_eq!(weights.len(), MatchFeatures::DIM);
        assert!(weights.iter().all(|w| w.is_finite()));
    }

    #[test]
    fn test_fit_empty_dataset_is_rejected() {
        let trainer = LogisticTrainer::<TrainBackend>::new(&TrainingConfig::default(), Default::default());
        assert!(trainer.fit(&MatchDataset::default()).is_err());
    }
}
