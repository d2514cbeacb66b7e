//! Model training
//!
//! Train/test split, the logistic fit loop, held-out metrics and the
//! end-to-end run.

pub mod metrics;
pub mod pipeline;
pub mod split;
pub mod trainer;

pub use metrics::{roc_auc, Metrics, TrainingHistory};
pub use pipeline::{run_training, train_and_evaluate, RunReport, TrainingOutcome};
pub use split::{train_test_split, TrainTestSplit};
pub use trainer::{FitResult, LogisticTrainer};
