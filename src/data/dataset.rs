//! Training dataset assembly
//!
//! One feature vector and label per decided, finished match.

use crate::features::{MatchFeatures, PerformanceStats, TeamHistoryIndex};
use crate::{FeatureConfig, OutcomeRecord};

/// Feature vectors and labels as parallel sequences
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchDataset {
    pub features: Vec<MatchFeatures>,
    /// 1 if side A won, 0 if side B won
    pub labels: Vec<u8>,
}

/// Why records were left out of a dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    pub records: usize,
    pub examples: usize,
    pub not_finished: usize,
    pub unnamed_side: usize,
    pub undecided: usize,
}

impl MatchDataset {
    /// Build a dataset from records, indexing them first
    ///
    /// Unfinished records contribute neither examples nor history.
    pub fn from_records(records: &[OutcomeRecord], config: &FeatureConfig) -> Self {
        let index = TeamHistoryIndex::build(records);
        Self::assemble(records, &index, config).0
    }

    /// Build a dataset against an existing history index
    ///
    /// Records are visited in their given order; ineligible ones are skipped.
    pub fn assemble(
        records: &[OutcomeRecord],
        index: &TeamHistoryIndex,
        config: &FeatureConfig,
    ) -> (Self, AssemblyStats) {
        let stats = PerformanceStats::new(index);
        let mut dataset = MatchDataset::default();
        let mut summary = AssemblyStats {
            records: records.len(),
            ..Default::default()
        };

        for record in records {
            if !record.is_complete() {
                summary.not_finished += 1;
                continue;
            }

            let Some(label) = record.label() else {
                log::debug!(
                    "Skipping match {}: no winner (tie or missing score)",
                    record.source_match_id
                );
                summary.undecided += 1;
                continue;
            };

            let (Some(a), Some(b)) = (record.key_a(), record.key_b()) else {
                log::debug!("Skipping match {}: unnamed side", record.source_match_id);
                summary.unnamed_side += 1;
                continue;
            };

            let view = if config.strict_prior_history {
                stats.before(record.start_time)
            } else {
                stats
            };

            let features = MatchFeatures::compute(
                &view,
                &a,
                &b,
                config.recent_window,
                config.h2h_count_cap,
            );

            dataset.features.push(features);
            dataset.labels.push(label);
        }

        summary.examples = dataset.len();
        log::debug!("Dataset assembly: {:?}", summary);

        (dataset, summary)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of features per example
    pub fn feature_count(&self) -> usize {
        MatchFeatures::DIM
    }

    /// Counts of (label 0, label 1)
    pub fn class_counts(&self) -> (usize, usize) {
        let positives = self.labels.iter().filter(|&&l| l == 1).count();
        (self.labels.len() - positives, positives)
    }

    /// Number of distinct labels present
    pub fn distinct_labels(&self) -> usize {
        let (neg, pos) = self.class_counts();
        (neg > 0) as usize + (pos > 0) as usize
    }

    /// Examples at the given positions, in that order
    pub fn subset(&self, indices: &[usize]) -> Self {
        MatchDataset {
            features: indices.iter().map(|&i| self.features[i]).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }

    /// Row-major feature matrix [len, DIM]
    pub fn feature_matrix(&self) -> Vec<f32> {
        self.features.iter().flat_map(|f| f.to_array()).collect()
    }

    pub fn labels_f32(&self) -> Vec<f32> {
        self.labels.iter().map(|&l| l as f32).collect()
    }
}
