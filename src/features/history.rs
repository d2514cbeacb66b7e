//! Team history index
//!
//! Groups outcome records by normalized team identity, ordered by start time.

use crate::OutcomeRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Canonical team identity: trimmed, lowercased name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamKey(String);

impl TeamKey {
    /// Normalize a team name. Absent or blank names have no identity.
    pub fn normalize(name: Option<&str>) -> Option<Self> {
        let trimmed = name?.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(TeamKey(trimmed.to_lowercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-team match history, ascending by start time
///
/// Built once per run from the full finished-record set and read-only
/// afterwards. A match between two distinct teams appears in both histories.
#[derive(Debug, Clone, Default)]
pub struct TeamHistoryIndex {
    histories: HashMap<TeamKey, Vec<OutcomeRecord>>,
}

impl TeamHistoryIndex {
    /// Build the index from a set of records
    ///
    /// Only finished records with both scores are indexed.
    pub fn build(records: &[OutcomeRecord]) -> Self {
        let mut sorted: Vec<&OutcomeRecord> = records.iter().collect();
        // Stable sort; absent start times come first
        sorted.sort_by_key(|r| r.start_time);

        let mut histories: HashMap<TeamKey, Vec<OutcomeRecord>> = HashMap::new();
        let mut skipped = 0usize;
        let mut unfinished = 0usize;

        for record in sorted {
            if !record.is_complete() {
                unfinished += 1;
                continue;
            }
            let (Some(a), Some(b)) = (record.key_a(), record.key_b()) else {
                skipped += 1;
                continue;
            };

            if a != b {
                histories.entry(b).or_default().push(record.clone());
            }
            histories.entry(a).or_default().push(record.clone());
        }

        if skipped > 0 {
            log::debug!("History index skipped {} records without two named sides", skipped);
        }
        if unfinished > 0 {
            log::debug!("History index skipped {} unfinished or unscored records", unfinished);
        }

        TeamHistoryIndex { histories }
    }

    /// History for a team (empty if the team is unknown)
    pub fn history(&self, team: &TeamKey) -> &[OutcomeRecord] {
        self.histories.get(team).map(|h| h.as_slice()).unwrap_or(&[])
    }

    /// History for a team restricted to matches that started strictly before `cutoff`
    ///
    /// With no cutoff time there is no known prior history.
    pub fn history_before(
        &self,
        team: &TeamKey,
        cutoff: Option<DateTime<Utc>>,
    ) -> &[OutcomeRecord] {
        let history = self.history(team);
        let Some(cutoff) = cutoff else {
            return &[];
        };
        let end = history.partition_point(|r| match r.start_time {
            Some(t) => t < cutoff,
            None => true,
        });
        &history[..end]
    }

    pub fn contains(&self, team: &TeamKey) -> bool {
        self.histories.contains_key(team)
    }

    /// Number of indexed teams
    pub fn team_count(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_start_time, MatchStatus};

    fn make_match(a: Option<&str>, b: Option<&str>, time: Option<&str>) -> OutcomeRecord {
        OutcomeRecord {
            source: "test".to_string(),
            source_match_id: format!("{:?}-{:?}-{:?}", a, b, time),
            start_time: time.and_then(parse_start_time),
            league: None,
            team_a: a.map(str::to_string),
            team_b: b.map(str::to_string),
            score_a: Some(2),
            score_b: Some(1),
            status: MatchStatus::Finished,
            best_of: None,
        }
    }

    fn key(name: &str) -> TeamKey {
        TeamKey::normalize(Some(name)).unwrap()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(key("  Team Liquid ").as_str(), "team liquid");
        assert_eq!(key("PRX"), key("prx"));
        assert!(TeamKey::normalize(None).is_none());
        assert!(TeamKey::normalize(Some("")).is_none());
        assert!(TeamKey::normalize(Some("   ")).is_none());
    }

    #[test]
    fn test_index_orders_by_time_with_absent_first() {
        let records = vec![
            make_match(Some("X"), Some("Y"), Some("2024-05-01T10:00:00Z")),
            make_match(Some("X"), Some("Z"), None),
            make_match(Some("Y"), Some("X"), Some("2024-01-01T10:00:00Z")),
        ];
        let index = TeamHistoryIndex::build(&records);

        let x = index.history(&key("x"));
        assert_eq!(x.len(), 3);
        assert!(x[0].start_time.is_none());
        assert!(x[1].start_time < x[2].start_time);

        assert_eq!(index.history(&key("y")).len(), 2);
        assert_eq!(index.history(&key("z")).len(), 1);
        assert_eq!(index.team_count(), 3);
    }

    #[test]
    fn test_index_skips_unnamed_sides() {
        let records = vec![
            make_match(Some("X"), None, None),
            make_match(Some("  "), Some("Y"), None),
        ];
        let index = TeamHistoryIndex::build(&records);
        assert!(index.is_empty());
        assert!(index.history(&key("x")).is_empty());
    }

    #[test]
    fn test_index_skips_unfinished_records() {
        let mut running = make_match(Some("X"), Some("Y"), Some("2024-01-01T00:00:00Z"));
        running.status = MatchStatus::Running;
        let mut unscored = make_match(Some("X"), Some("Z"), Some("2024-01-02T00:00:00Z"));
        unscored.score_b = None;
        let records = vec![
            running,
            unscored,
            make_match(Some("Y"), Some("X"), Some("2024-01-03T00:00:00Z")),
        ];
        let index = TeamHistoryIndex::build(&records);
        assert_eq!(index.history(&key("x")).len(), 1);
        assert_eq!(index.history(&key("y")).len(), 1);
        assert!(!index.contains(&key("z")));
    }

    #[test]
    fn test_empty_input() {
        assert!(TeamHistoryIndex::build(&[]).is_empty());
    }

    #[test]
    fn test_names_join_across_case_and_whitespace() {
        let records = vec![
            make_match(Some("Fnatic"), Some("G2"), None),
            make_match(Some(" FNATIC "), Some("NAVI"), None),
        ];
        let index = TeamHistoryIndex::build(&records);
        assert_eq!(index.history(&key("fnatic")).len(), 2);
    }

    #[test]
    fn test_history_before_cutoff() {
        let records = vec![
            make_match(Some("X"), Some("Y"), Some("2024-01-01T00:00:00Z")),
            make_match(Some("X"), Some("Y"), Some("2024-02-01T00:00:00Z")),
            make_match(Some("X"), Some("Y"), Some("2024-03-01T00:00:00Z")),
        ];
        let index = TeamHistoryIndex::build(&records);
        let cutoff = parse_start_time("2024-02-01T00:00:00Z");
        assert_eq!(index.history_before(&key("x"), cutoff).len(), 1);
        assert!(index.history_before(&key("x"), None).is_empty());
    }
}
