//! Evaluation metrics and training history

use std::fmt;

/// Decision threshold on P(side A wins)
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Held-out evaluation of a classifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    /// Number of correct predictions
    pub correct: usize,
    /// Total predictions
    pub total: usize,
    /// Sum of per-example binary cross-entropy
    pub log_loss_sum: f64,
    /// Area under the ROC curve; None unless both classes are present
    pub auc: Option<f64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate predicted probabilities against binary labels
    pub fn evaluate(probs: &[f32], labels: &[u8]) -> Self {
        let mut metrics = Metrics::new();
        for (&p, &y) in probs.iter().zip(labels) {
            let predicted = (p >= DECISION_THRESHOLD) as u8;
            if predicted == y {
                metrics.correct += 1;
            }
            let p = (p as f64).clamp(1e-7, 1.0 - 1e-7);
            metrics.log_loss_sum -= if y == 1 { p.ln() } else { (1.0 - p).ln() };
            metrics.total += 1;
        }
        metrics.auc = roc_auc(probs, labels);
        metrics
    }

    /// Accuracy, None when nothing was evaluated
    pub fn accuracy(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.correct as f64 / self.total as f64)
        }
    }

    /// Mean binary cross-entropy
    pub fn log_loss(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.log_loss_sum / self.total as f64)
        }
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.accuracy() {
            Some(acc) => write!(f, "Acc: {:.2}%", acc * 100.0)?,
            None => write!(f, "Acc: n/a")?,
        }
        if let Some(loss) = self.log_loss() {
            write!(f, " | Log loss: {:.4}", loss)?;
        }
        match self.auc {
            Some(auc) => write!(f, " | AUC: {:.4}", auc),
            None => write!(f, " | AUC: n/a"),
        }
    }
}

/// Area under the ROC curve via the rank-sum statistic
///
/// Tied scores get their average rank. Returns None unless both classes occur.
pub fn roc_auc(scores: &[f32], labels: &[u8]) -> Option<f64> {
    let n = scores.len().min(labels.len());
    let positives = labels[..n].iter().filter(|&&l| l == 1).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0f64;
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; ties share the mean of ranks i+1..=j+1
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            if labels[idx] == 1 {
                positive_rank_sum += avg_rank;
            }
        }
        i = j + 1;
    }

    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Some(u / (p * negatives as f64))
}

/// Loss trajectory of a fit
#[derive(Debug, Clone, Default)]
pub struct TrainingHistory {
    pub losses: Vec<f64>,
    /// Stopped because the loss stopped improving
    pub converged: bool,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, loss: f64) {
        self.losses.push(loss);
    }

    pub fn iterations(&self) -> usize {
        self.losses.len()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }

    /// Get improvement from last iteration
    pub fn last_improvement(&self) -> Option<f64> {
        if self.losses.len() < 2 {
            return None;
        }
        let n = self.losses.len();
        Some(self.losses[n - 2] - self.losses[n - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy_threshold() {
        let metrics = Metrics::evaluate(&[0.9, 0.5, 0.2, 0.4], &[1, 1, 0, 1]);
        assert_eq!(metrics.correct, 3);
        assert_eq!(metrics.accuracy(), Some(0.75));
    }

    #[test]
    fn test_empty_evaluation() {
        let metrics = Metrics::evaluate(&[], &[]);
        assert_eq!(metrics.accuracy(), None);
        assert_eq!(metrics.auc, None);
    }

    #[test]
    fn test_auc_perfect_and_inverted() {
        assert_eq!(roc_auc(&[0.1, 0.2, 0.8, 0.9], &[0, 0, 1, 1]), Some(1.0));
        assert_eq!(roc_auc(&[0.9, 0.8, 0.2, 0.1], &[0, 0, 1, 1]), Some(0.0));
    }

    #[test]
    fn test_auc_with_ties() {
        // All scores equal: no discrimination
        assert_eq!(roc_auc(&[0.5, 0.5, 0.5, 0.5], &[0, 1, 0, 1]), Some(0.5));
        // One of four positive/negative pairs is tied, the rest ordered
        let auc = roc_auc(&[0.1, 0.4, 0.4, 0.9], &[0, 0, 1, 1]).unwrap();
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_auc_single_class_is_undefined() {
        assert_eq!(roc_auc(&[0.2, 0.7], &[1, 1]), None);
        assert_eq!(roc_auc(&[0.2, 0.7], &[0, 0]), None);
    }

    #[test]
    fn test_history_improvement() {
        let mut history = TrainingHistory::new();
        history.record(0.7);
        assert_eq!(history.last_improvement(), None);
        history.record(0.6);
        assert!((history.last_improvement().unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(history.iterations(), 2);
    }
}
