//! Seeded train/test split

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Example positions for the training and held-out subsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    /// Whether class balance was preserved between the subsets
    pub stratified: bool,
}

/// Number of held-out examples: ceil(n * fraction), leaving at least one to train on
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    if n <= 1 {
        return 0;
    }
    let wanted = (n as f64 * test_fraction).ceil() as usize;
    wanted.clamp(1, n - 1)
}

/// Split binary labels into train/test positions
///
/// Stratified when both classes are present. The same labels, fraction and
/// seed always give the same split.
pub fn train_test_split(labels: &[u8], test_fraction: f64, seed: u64) -> TrainTestSplit {
    let n = labels.len();
    let n_test = test_size(n, test_fraction);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut by_class: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
    for (i, &label) in labels.iter().enumerate() {
        by_class[(label == 1) as usize].push(i);
    }
    let stratified = by_class.iter().all(|c| !c.is_empty());

    let (mut train, mut test) = if stratified {
        let quotas = class_quotas([by_class[0].len(), by_class[1].len()], n_test);
        let mut train = Vec::with_capacity(n - n_test);
        let mut test = Vec::with_capacity(n_test);
        for (class, quota) in by_class.iter_mut().zip(quotas) {
            class.shuffle(&mut rng);
            test.extend_from_slice(&class[..quota]);
            train.extend_from_slice(&class[quota..]);
        }
        (train, test)
    } else {
        let mut all: Vec<usize> = (0..n).collect();
        all.shuffle(&mut rng);
        let train = all.split_off(n_test);
        (train, all)
    };

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    TrainTestSplit {
        train,
        test,
        stratified,
    }
}

/// Held-out count per class, proportional to class size (largest remainder)
fn class_quotas(counts: [usize; 2], n_test: usize) -> [usize; 2] {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return [0, 0];
    }

    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| n_test as f64 * c as f64 / total as f64)
        .collect();
    let mut quotas = [exact[0].floor() as usize, exact[1].floor() as usize];

    let mut order = [0usize, 1];
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(counts[b].cmp(&counts[a]))
    });

    let mut remaining = n_test - quotas.iter().sum::<usize>();
    for &class in order.iter().cycle().take(4) {
        if remaining == 0 {
            break;
        }
        if quotas[class] < counts[class] {
            quotas[class] += 1;
            remaining -= 1;
        }
    }

    quotas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_test_size() {
        assert_eq!(test_size(0, 0.2), 0);
        assert_eq!(test_size(1, 0.2), 0);
        assert_eq!(test_size(2, 0.2), 1);
        assert_eq!(test_size(3, 0.2), 1);
        assert_eq!(test_size(10, 0.2), 2);
        assert_eq!(test_size(11, 0.2), 3);
    }

    #[test]
    fn test_split_is_reproducible() {
        let labels: Vec<u8> = (0..50).map(|i| (i % 3 == 0) as u8).collect();
        let a = train_test_split(&labels, 0.2, 42);
        let b = train_test_split(&labels, 0.2, 42);
        assert_eq!(a, b);
        let c = train_test_split(&labels, 0.2, 7);
        assert_ne!(a.test, c.test);
    }

    #[test]
    fn test_split_partitions_all_examples() {
        let labels: Vec<u8> = (0..37).map(|i| (i % 2) as u8).collect();
        let split = train_test_split(&labels, 0.2, 42);
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..37).collect::<Vec<_>>());
        assert_eq!(split.test.len(), 8);
    }

    #[test]
    fn test_split_preserves_class_balance() {
        // 80 positives, 20 negatives
        let labels: Vec<u8> = (0..100).map(|i| (i < 80) as u8).collect();
        let split = train_test_split(&labels, 0.2, 42);
        assert!(split.stratified);
        let test_pos = split.test.iter().filter(|&&i| labels[i] == 1).count();
        assert_eq!(split.test.len(), 20);
        assert_eq!(test_pos, 16);
    }

    #[test]
    fn test_single_class_is_not_stratified() {
        let labels = vec![1u8; 10];
        let split = train_test_split(&labels, 0.2, 42);
        assert!(!split.stratified);
        assert_eq!(split.test.len(), 2);
        assert_eq!(split.train.len(), 8);
    }

    #[test]
    fn test_class_quotas_sum() {
        assert_eq!(class_quotas([5, 5], 3).iter().sum::<usize>(), 3);
        assert_eq!(class_quotas([1, 9], 2), [0, 2]);
        assert_eq!(class_quotas([3, 3], 1).iter().sum::<usize>(), 1);
    }
}
