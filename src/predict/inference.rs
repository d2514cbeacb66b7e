//! Model inference for predictions

use crate::data::RecordSource;
use crate::features::{PerformanceStats, TeamHistoryIndex};
use crate::model::{InferenceBackend, ModelMetadata, WinClassifier};
use crate::{ConfidenceLevel, MatchFeatures, PredictError, Result, TeamKey, WinPrediction};

/// Predictor for upcoming matches
///
/// Features are computed over the full record history, the same way the
/// model's training examples were built.
pub struct Predictor {
    model: WinClassifier<InferenceBackend>,
    metadata: ModelMetadata,
    index: TeamHistoryIndex,
    device: <InferenceBackend as burn::tensor::backend::Backend>::Device,
}

impl Predictor {
    /// Create a predictor from an already loaded model
    pub fn with_model(
        model: WinClassifier<InferenceBackend>,
        metadata: ModelMetadata,
        index: TeamHistoryIndex,
    ) -> Self {
        Predictor {
            model,
            metadata,
            index,
            device: Default::default(),
        }
    }

    /// Load the saved model and index the source's finished matches
    pub fn load<S: RecordSource>(source: &S, model_path: &str) -> Result<Self> {
        let device = Default::default();
        let (model, metadata) = WinClassifier::<InferenceBackend>::load(&device, model_path)?;

        let records = source.finished_records()?;
        let index = TeamHistoryIndex::build(&records);
        log::debug!(
            "Predictor ready: {} teams from {} matches",
            index.team_count(),
            records.len()
        );

        Ok(Predictor {
            model,
            metadata,
            index,
            device,
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Whether any finished match involves this team
    pub fn has_history(&self, team: &str) -> bool {
        TeamKey::normalize(Some(team)).is_some_and(|key| self.index.contains(&key))
    }

    /// Probability that `team_a` beats `team_b`
    ///
    /// Teams without history get neutral features rather than an error;
    /// only a blank name is rejected.
    pub fn predict(&self, team_a: &str, team_b: &str) -> Result<WinPrediction> {
        let a = TeamKey::normalize(Some(team_a))
            .ok_or_else(|| PredictError::UnknownTeam(team_a.to_string()))?;
        let b = TeamKey::normalize(Some(team_b))
            .ok_or_else(|| PredictError::UnknownTeam(team_b.to_string()))?;

        let features_config = &self.metadata.features;
        let stats = PerformanceStats::new(&self.index);
        let features = MatchFeatures::compute(
            &stats,
            &a,
            &b,
            features_config.recent_window,
            features_config.h2h_count_cap,
        );

        let confidence = ConfidenceLevel::from_history(
            stats.history(&a).len(),
            stats.history(&b).len(),
            features_config.recent_window,
        );
        if confidence == ConfidenceLevel::Low {
            log::warn!(
                "No match history for {} or {}; prediction relies on neutral defaults",
                a,
                b
            );
        }

        let probs = self
            .model
            .predict_proba(&[features], &self.metadata.scaling, &self.device)?;
        let win_probability_a = probs
            .first()
            .copied()
            .ok_or_else(|| PredictError::Model("empty model output".to_string()))?;

        Ok(WinPrediction {
            team_a: team_a.trim().to_string(),
            team_b: team_b.trim().to_string(),
            win_probability_a,
            features,
            confidence,
        })
    }
}

/// Format a prediction as a boxed summary for the terminal
pub fn format_prediction(pred: &WinPrediction) -> String {
    let winner = pred.predicted_winner();
    let win_prob = if pred.win_probability_a >= 0.5 {
        pred.win_probability_a
    } else {
        1.0 - pred.win_probability_a
    };

    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  {} vs {}
├─────────────────────────────────────────────────┤
│  Favourite:        {} {:.1}%
│  Overall form:     {:+.3}
│  Recent form:      {:+.3}
│  Head-to-head:     {:.2} over {:.0} meetings
│  Confidence:       {}
└─────────────────────────────────────────────────┘
"#,
        pred.team_a,
        pred.team_b,
        winner,
        win_prob * 100.0,
        pred.features.win_rate_diff,
        pred.features.recent_win_rate_diff,
        pred.features.h2h_win_rate,
        pred.features.h2h_count,
        pred.confidence
    )
}
