//! Data ingestion and storage
//!
//! SQLite record store, JSON import and training dataset assembly.

pub mod database;
pub mod dataset;
pub mod import;

pub use database::Database;
pub use dataset::MatchDataset;

use crate::{OutcomeRecord, Result};

/// Supplier of finished match records
///
/// Implementations return every finished record with both sides and both
/// scores present, in one eager read.
pub trait RecordSource {
    fn finished_records(&self) -> Result<Vec<OutcomeRecord>>;
}

impl RecordSource for Vec<OutcomeRecord> {
    fn finished_records(&self) -> Result<Vec<OutcomeRecord>> {
        Ok(self
            .iter()
            .filter(|r| r.is_complete() && r.team_a.is_some() && r.team_b.is_some())
            .cloned()
            .collect())
    }
}

/// Convert a stored or imported count to `u32`
///
/// Negative or overflowing values are treated as absent, with a warning.
pub(crate) fn count_or_absent(value: Option<i64>, match_id: &str, field: &str) -> Option<u32> {
    let value = value?;
    match u32::try_from(value) {
        Ok(v) => Some(v),
        Err(_) => {
            log::warn!(
                "Match {}: invalid {} {}, treating as absent",
                match_id,
                field,
                value
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_counts_are_absent() {
        assert_eq!(count_or_absent(Some(3), "m1", "score_a"), Some(3));
        assert_eq!(count_or_absent(None, "m1", "score_a"), None);
        assert_eq!(count_or_absent(Some(-1), "m1", "score_a"), None);
        assert_eq!(count_or_absent(Some(i64::from(u32::MAX) + 1), "m1", "score_b"), None);
    }
}
