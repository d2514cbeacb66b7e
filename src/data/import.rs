//! Import of normalized match records from JSON files

use super::{count_or_absent, Database};
use crate::{parse_start_time, MatchStatus, OutcomeRecord, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// A match as delivered by an upstream adapter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMatch {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub team_a: Option<String>,
    #[serde(default)]
    pub team_b: Option<String>,
    #[serde(default)]
    pub score_a: Option<i64>,
    #[serde(default)]
    pub score_b: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub bo: Option<u32>,
}

impl RawMatch {
    /// Source match id as text; numeric ids are accepted
    fn source_match_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Convert to an outcome record; None when the match has no id
    pub fn to_record(&self, default_source: &str) -> Option<OutcomeRecord> {
        let source_match_id = self.source_match_id()?;

        let start_time = self.start_time.as_deref().and_then(|text| {
            let parsed = parse_start_time(text);
            if parsed.is_none() {
                log::warn!(
                    "Match {}: unparsable start time {:?}, treating as absent",
                    source_match_id,
                    text
                );
            }
            parsed
        });
        let score_a = count_or_absent(self.score_a, &source_match_id, "score_a");
        let score_b = count_or_absent(self.score_b, &source_match_id, "score_b");

        Some(OutcomeRecord {
            source: self
                .source
                .clone()
                .unwrap_or_else(|| default_source.to_string()),
            source_match_id,
            start_time,
            league: self.league.clone(),
            team_a: self.team_a.clone(),
            team_b: self.team_b.clone(),
            score_a,
            score_b,
            status: self
                .status
                .as_deref()
                .map(MatchStatus::parse)
                .unwrap_or_else(|| MatchStatus::Other(String::new())),
            best_of: self.bo,
        })
    }
}

/// Counts from an import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Store every match not already present
pub fn import_matches(db: &Database, raw: &[RawMatch], default_source: &str) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for m in raw {
        let Some(record) = m.to_record(default_source) else {
            log::debug!("Skipping match without id: {:?}", m);
            summary.skipped += 1;
            continue;
        };

        if db.insert_if_new(&record)? {
            summary.inserted += 1;
        } else {
            summary.skipped += 1;
        }
    }

    log::info!(
        "Imported {} matches ({} skipped)",
        summary.inserted,
        summary.skipped
    );
    Ok(summary)
}

/// Read a JSON array of matches from a file and import it
pub fn import_file<P: AsRef<Path>>(db: &Database, path: P) -> Result<ImportSummary> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let raw: Vec<RawMatch> = serde_json::from_str(&content)?;
    let default_source = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("import");
    import_matches(db, &raw, default_source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RecordSource;
    use crate::Side;

    const SAMPLE: &str = r#"[
        {"id": "demo_1", "start_time": "2026-02-10T12:00:00Z", "league": "LCK",
         "team_a": "HLE", "team_b": "T1", "score_a": 2, "score_b": 1,
         "status": "finished", "bo": 3},
        {"id": 1042, "team_a": "T1", "team_b": "GEN", "score_a": 0, "score_b": 2,
         "status": "finished"},
        {"team_a": "T1", "team_b": "DK", "status": "not_started"},
        {"id": "demo_1", "team_a": "HLE", "team_b": "T1", "status": "finished"}
    ]"#;

    #[test]
    fn test_import_dedupes_and_skips_missing_ids() {
        let db = Database::in_memory().unwrap();
        let raw: Vec<RawMatch> = serde_json::from_str(SAMPLE).unwrap();

        let summary = import_matches(&db, &raw, "test").unwrap();
        assert_eq!(summary, ImportSummary { inserted: 2, skipped: 2 });

        let again = import_matches(&db, &raw, "test").unwrap();
        assert_eq!(again.inserted, 0);

        let finished = db.finished_records().unwrap();
        assert_eq!(finished.len(), 2);
        assert_eq!(finished[0].winner(), Some(Side::A));
        assert_eq!(finished[1].source_match_id, "1042");
        assert_eq!(finished[1].source, "test");
    }

    #[test]
    fn test_negative_score_is_absent() {
        let raw = RawMatch {
            id: Some(Value::String("x".into())),
            score_a: Some(-1),
            score_b: Some(2),
            ..Default::default()
        };
        let record = raw.to_record("test").unwrap();
        assert!(record.score_a.is_none());
        assert_eq!(record.score_b, Some(2));
    }
}
