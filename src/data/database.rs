//! SQLite storage for match records

use super::{count_or_absent, RecordSource};
use crate::{parse_start_time, MatchStatus, OutcomeRecord, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS matches (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                source_match_id TEXT NOT NULL UNIQUE,
                start_time TEXT,
                league TEXT,
                team_a TEXT,
                team_b TEXT,
                score_a INTEGER,
                score_b INTEGER,
                winner TEXT,
                status TEXT,
                best_of INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(status);
            CREATE INDEX IF NOT EXISTS idx_matches_start ON matches(start_time);
            "#,
        )?;
        Ok(())
    }

    // ==================== Match Operations ====================

    /// Insert a match unless its source id is already stored
    ///
    /// Returns true when a row was inserted.
    pub fn insert_if_new(&self, record: &OutcomeRecord) -> Result<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT OR IGNORE INTO matches (source, source_match_id, start_time, league,
                                           team_a, team_b, score_a, score_b, winner,
                                           status, best_of)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.source,
                record.source_match_id,
                record.start_time.map(format_start_time),
                record.league,
                record.team_a,
                record.team_b,
                record.score_a,
                record.score_b,
                record.winner().map(|side| side.code()),
                record.status.as_str(),
                record.best_of,
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Check whether a source match id is stored
    pub fn contains(&self, source_match_id: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM matches WHERE source_match_id = ?1",
                params![source_match_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Get all matches in insertion order
    pub fn get_all_matches(&self) -> Result<Vec<OutcomeRecord>> {
        self.query_matches(&format!("{} ORDER BY id", SELECT_MATCH))
    }

    /// Finished matches with both sides and both scores present
    pub fn get_finished_matches(&self) -> Result<Vec<OutcomeRecord>> {
        self.query_matches(&format!(
            "{} WHERE status = 'finished'
               AND team_a IS NOT NULL AND team_b IS NOT NULL
               AND score_a IS NOT NULL AND score_b IS NOT NULL
             ORDER BY id",
            SELECT_MATCH
        ))
    }

    /// Distinct league names
    pub fn leagues(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT league FROM matches WHERE league IS NOT NULL AND league != '' ORDER BY league",
        )?;
        let leagues = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(leagues)
    }

    fn query_matches(&self, query: &str) -> Result<Vec<OutcomeRecord>> {
        let mut stmt = self.conn.prepare(query)?;
        let matches = stmt
            .query_map([], Self::row_to_match)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    fn row_to_match(row: &rusqlite::Row) -> rusqlite::Result<OutcomeRecord> {
        let source_match_id: String = row.get(1)?;

        let start_text: Option<String> = row.get(2)?;
        let start_time = start_text.as_deref().and_then(|text| {
            let parsed = parse_start_time(text);
            if parsed.is_none() && !text.trim().is_empty() {
                log::warn!(
                    "Match {}: unparsable start time {:?}, treating as absent",
                    source_match_id,
                    text
                );
            }
            parsed
        });

        let status: Option<String> = row.get(9)?;
        let status = status
            .as_deref()
            .map(MatchStatus::parse)
            .unwrap_or_else(|| MatchStatus::Other(String::new()));

        let score_a = count_or_absent(row.get(6)?, &source_match_id, "score_a");
        let score_b = count_or_absent(row.get(7)?, &source_match_id, "score_b");
        let best_of = count_or_absent(row.get(10)?, &source_match_id, "best_of");

        Ok(OutcomeRecord {
            source: row.get(0)?,
            source_match_id,
            start_time,
            league: row.get(3)?,
            team_a: row.get(4)?,
            team_b: row.get(5)?,
            score_a,
            score_b,
            status,
            best_of,
        })
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let match_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;

        let finished_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM matches WHERE status = 'finished'",
            [],
            |row| row.get(0),
        )?;

        let min_time: Option<String> = self
            .conn
            .query_row("SELECT MIN(start_time) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        let max_time: Option<String> = self
            .conn
            .query_row("SELECT MAX(start_time) FROM matches", [], |row| row.get(0))
            .optional()?
            .flatten();

        Ok(DatabaseStats {
            match_count: match_count as usize,
            finished_count: finished_count as usize,
            earliest_match: min_time.as_deref().and_then(parse_start_time),
            latest_match: max_time.as_deref().and_then(parse_start_time),
        })
    }
}

impl RecordSource for Database {
    fn finished_records(&self) -> Result<Vec<OutcomeRecord>> {
        self.get_finished_matches()
    }
}

const SELECT_MATCH: &str = "SELECT source, source_match_id, start_time, league, team_a, team_b,
        score_a, score_b, winner, status, best_of FROM matches";

/// Stored start times are normalized to RFC 3339 UTC so text order matches time order
fn format_start_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub match_count: usize,
    pub finished_count: usize,
    pub earliest_match: Option<DateTime<Utc>>,
    pub latest_match: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_match(id: &str, a: Option<&str>, score_a: Option<u32>, status: &str) -> OutcomeRecord {
        OutcomeRecord {
            source: "pandascore".to_string(),
            source_match_id: id.to_string(),
            start_time: parse_start_time("2024-03-01T12:00:00Z"),
            league: Some("VCT Americas".to_string()),
            team_a: a.map(str::to_string),
            team_b: Some("Sentinels".to_string()),
            score_a,
            score_b: Some(1),
            status: MatchStatus::parse(status),
            best_of: Some(3),
        }
    }

    #[test]
    fn test_create_database() {
        let db = Database::in_memory().unwrap();
        let stats = db.get_stats().unwrap();
        assert_eq!(stats.match_count, 0);
        assert!(stats.earliest_match.is_none());
    }

    #[test]
    fn test_insert_is_deduplicated() {
        let db = Database::in_memory().unwrap();
        let record = make_match("1", Some("LOUD"), Some(2), "finished");
        assert!(db.insert_if_new(&record).unwrap());
        assert!(!db.insert_if_new(&record).unwrap());
        assert!(db.contains("1").unwrap());
        assert_eq!(db.get_stats().unwrap().match_count, 1);
    }

    #[test]
    fn test_roundtrip_preserves_fields() {
        let db = Database::in_memory().unwrap();
        let record = make_match("1", Some("LOUD"), Some(2), "finished");
        db.insert_if_new(&record).unwrap();
        let loaded = db.get_all_matches().unwrap();
        assert_eq!(loaded, vec![record]);
    }

    #[test]
    fn test_finished_query_filters() {
        let db = Database::in_memory().unwrap();
        db.insert_if_new(&make_match("1", Some("LOUD"), Some(2), "finished"))
            .unwrap();
        db.insert_if_new(&make_match("2", None, Some(2), "finished"))
            .unwrap();
        db.insert_if_new(&make_match("3", Some("LOUD"), None, "finished"))
            .unwrap();
        db.insert_if_new(&make_match("4", Some("LOUD"), Some(2), "running"))
            .unwrap();

        let finished = db.finished_records().unwrap();
        assert_eq!(finished.len(), 1);
        assert_eq!(finished[0].source_match_id, "1");

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.match_count, 4);
        assert_eq!(stats.finished_count, 3);
    }

    #[test]
    fn test_unparsable_start_time_is_absent() {
        let db = Database::in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO matches (source, source_match_id, start_time, team_a, team_b,
                                      score_a, score_b, status)
                 VALUES ('x', '9', 'not a date', 'A', 'B', 2, 0, 'finished')",
                [],
            )
            .unwrap();
        let records = db.finished_records().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].start_time.is_none());
    }

    #[test]
    fn test_negative_stored_score_is_absent() {
        let db = Database::in_memory().unwrap();
        db.conn
            .execute(
                "INSERT INTO matches (source, source_match_id, team_a, team_b,
                                      score_a, score_b, status, best_of)
                 VALUES ('x', '10', 'A', 'B', -2, 1, 'finished', -3)",
                [],
            )
            .unwrap();
        let records = db.get_all_matches().unwrap();
        assert_eq!(records[0].score_a, None);
        assert_eq!(records[0].score_b, Some(1));
        assert_eq!(records[0].best_of, None);
        assert!(!records[0].is_complete());
    }

    #[test]
    fn test_leagues() {
        let db = Database::in_memory().unwrap();
        db.insert_if_new(&make_match("1", Some("LOUD"), Some(2), "finished"))
            .unwrap();
        db.insert_if_new(&make_match("2", Some("LOUD"), Some(2), "finished"))
            .unwrap();
        assert_eq!(db.leagues().unwrap(), vec!["VCT Americas".to_string()]);
    }
}
