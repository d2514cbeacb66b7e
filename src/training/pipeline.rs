//! End-to-end training run
//!
//! Read records → build the history index → assemble the dataset → split →
//! fit → evaluate → persist. Each stage completes before the next starts.

use std::fmt;

use burn::module::AutodiffModule;

use crate::data::dataset::AssemblyStats;
use crate::data::{MatchDataset, RecordSource};
use crate::features::TeamHistoryIndex;
use crate::model::{ModelMetadata, TrainBackend};
use crate::training::metrics::Metrics;
use crate::training::split::train_test_split;
use crate::training::trainer::{FitResult, LogisticTrainer};
use crate::{Config, FeatureConfig, Result, TrainingConfig};

/// Diagnostics of one training run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub records: usize,
    pub teams: usize,
    pub examples: usize,
    pub feature_count: usize,
    pub train_examples: usize,
    pub test_examples: usize,
    /// Fewer examples than the configured warning threshold
    pub low_data: bool,
    pub stratified: bool,
    pub iterations: usize,
    pub accuracy: Option<f64>,
    pub auc: Option<f64>,
    pub log_loss: Option<f64>,
    /// Where the model was stored; None when nothing was trained
    pub model_path: Option<String>,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "dataset: ({}, {})", self.examples, self.feature_count)?;
        if self.low_data {
            writeln!(
                f,
                "WARNING: only {} training examples; import more matches before relying on this model",
                self.examples
            )?;
        }
        writeln!(
            f,
            "split: {} train / {} held out{}",
            self.train_examples,
            self.test_examples,
            if self.stratified { " (stratified)" } else { "" }
        )?;
        match self.accuracy {
            Some(acc) => writeln!(f, "accuracy: {:.4}", acc)?,
            None => writeln!(f, "accuracy: n/a (no held-out examples)")?,
        }
        if let Some(auc) = self.auc {
            writeln!(f, "auc: {:.4}", auc)?;
        }
        match &self.model_path {
            Some(path) => write!(f, "saved: {}", path),
            None => write!(f, "no model trained"),
        }
    }
}

/// A fitted, evaluated classifier not yet persisted
pub struct TrainingOutcome {
    pub fit: FitResult<TrainBackend>,
    pub evaluation: Metrics,
    pub train_examples: usize,
    pub test_examples: usize,
    pub stratified: bool,
}

impl TrainingOutcome {
    /// Metadata describing this outcome
    pub fn metadata(&self, features: &FeatureConfig) -> ModelMetadata {
        let mut metadata = ModelMetadata::new(self.fit.scaling, features.clone());
        metadata.train_examples = self.train_examples;
        metadata.test_examples = self.test_examples;
        metadata.accuracy = self.evaluation.accuracy();
        metadata.auc = self.evaluation.auc;
        metadata.iterations = self.fit.history.iterations();
        metadata
    }
}

/// Split, fit and evaluate. Returns None for an empty dataset.
pub fn train_and_evaluate(
    dataset: &MatchDataset,
    config: &TrainingConfig,
) -> Result<Option<TrainingOutcome>> {
    if dataset.is_empty() {
        log::warn!("No eligible matches: nothing to train on");
        return Ok(None);
    }

    if dataset.distinct_labels() < 2 {
        log::warn!("Only one outcome class present; split is not stratified and AUC is unavailable");
    }

    let split = train_test_split(&dataset.labels, config.test_fraction, config.seed);
    let train = dataset.subset(&split.train);
    let test = dataset.subset(&split.test);
    log::info!(
        "Split {} examples: train={}, test={}",
        dataset.len(),
        train.len(),
        test.len()
    );
    if test.is_empty() {
        log::warn!("Held-out subset is empty; accuracy cannot be measured");
    }

    let device = Default::default();
    let trainer = LogisticTrainer::<TrainBackend>::new(config, device);
    let fit = trainer.fit(&train)?;
    let evaluation = fit.evaluate(&test, &Default::default())?;

    if evaluation.total > 0 && evaluation.auc.is_none() {
        log::warn!("Held-out subset has a single class; AUC omitted");
    }
    log::info!("Held-out evaluation: {}", evaluation);

    Ok(Some(TrainingOutcome {
        fit,
        evaluation,
        train_examples: train.len(),
        test_examples: test.len(),
        stratified: split.stratified,
    }))
}

/// Run the full pipeline against a record source and persist the model
pub fn run_training<S: RecordSource>(source: &S, config: &Config) -> Result<RunReport> {
    config.validate()?;

    let records = source.finished_records()?;
    log::info!("Loaded {} finished matches", records.len());

    let index = TeamHistoryIndex::build(&records);
    let (dataset, assembly) = MatchDataset::assemble(&records, &index, &config.features);
    log_assembly(&assembly);

    let mut report = RunReport {
        records: records.len(),
        teams: index.team_count(),
        examples: dataset.len(),
        feature_count: dataset.feature_count(),
        low_data: dataset.len() < config.training.min_examples_warning,
        ..Default::default()
    };

    log::info!("dataset: ({}, {})", report.examples, report.feature_count);
    if report.low_data {
        log::warn!(
            "Only {} examples (threshold {}); training anyway",
            report.examples,
            config.training.min_examples_warning
        );
    }

    let Some(outcome) = train_and_evaluate(&dataset, &config.training)? else {
        return Ok(report);
    };

    let metadata = outcome.metadata(&config.features);
    let model = outcome.fit.model.valid();
    let paths = model.save(&config.data.model_path, &metadata)?;

    report.train_examples = outcome.train_examples;
    report.test_examples = outcome.test_examples;
    report.stratified = outcome.stratified;
    report.iterations = outcome.fit.history.iterations();
    report.accuracy = outcome.evaluation.accuracy();
    report.auc = outcome.evaluation.auc;
    report.log_loss = outcome.evaluation.log_loss();
    report.model_path = Some(paths.weights.display().to_string());

    Ok(report)
}

fn log_assembly(assembly: &AssemblyStats) {
    let skipped = assembly.not_finished + assembly.unnamed_side + assembly.undecided;
    if skipped > 0 {
        log::info!(
            "Skipped {} of {} matches (undecided: {}, unnamed side: {}, unfinished: {})",
            skipped,
            assembly.records,
            assembly.undecided,
            assembly.unnamed_side,
            assembly.not_finished
        );
    }
}
