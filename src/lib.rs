//! Esports match prediction from historical results
//!
//! Turns finished match records into per-team performance signals, assembles
//! them into a supervised dataset and fits a logistic win classifier.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;
pub mod training;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use features::match_repr::MatchFeatures;
pub use features::TeamKey;

/// Lifecycle state of a match as reported by the data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchStatus {
    NotStarted,
    Running,
    Finished,
    Canceled,
    Postponed,
    Other(String),
}

impl MatchStatus {
    /// Parse a status string, keeping unknown values verbatim
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "not_started" => MatchStatus::NotStarted,
            "running" => MatchStatus::Running,
            "finished" => MatchStatus::Finished,
            "canceled" | "cancelled" => MatchStatus::Canceled,
            "postponed" => MatchStatus::Postponed,
            _ => MatchStatus::Other(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MatchStatus::NotStarted => "not_started",
            MatchStatus::Running => "running",
            MatchStatus::Finished => "finished",
            MatchStatus::Canceled => "canceled",
            MatchStatus::Postponed => "postponed",
            MatchStatus::Other(s) => s,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One of the two competing parties, by record field order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Training label for a win by this side (1 = side A won)
    pub fn label(&self) -> u8 {
        match self {
            Side::A => 1,
            Side::B => 0,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }
}

/// A single match record from the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub source: String,
    pub source_match_id: String,
    pub start_time: Option<DateTime<Utc>>,
    pub league: Option<String>,
    pub team_a: Option<String>,
    pub team_b: Option<String>,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    pub status: MatchStatus,
    pub best_of: Option<u32>,
}

impl OutcomeRecord {
    /// Returns the winning side, or None for a tie or a missing score
    pub fn winner(&self) -> Option<Side> {
        let (a, b) = (self.score_a?, self.score_b?);
        match a.cmp(&b) {
            std::cmp::Ordering::Greater => Some(Side::A),
            std::cmp::Ordering::Less => Some(Side::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Winner label: 1 if side A won, 0 if side B won
    pub fn label(&self) -> Option<u8> {
        self.winner().map(|side| side.label())
    }

    /// Finished with both scores present
    pub fn is_complete(&self) -> bool {
        self.status == MatchStatus::Finished && self.score_a.is_some() && self.score_b.is_some()
    }

    pub fn key_a(&self) -> Option<TeamKey> {
        TeamKey::normalize(self.team_a.as_deref())
    }

    pub fn key_b(&self) -> Option<TeamKey> {
        TeamKey::normalize(self.team_b.as_deref())
    }

    /// Which side the given team played on
    pub fn side_of(&self, team: &TeamKey) -> Option<Side> {
        if self.key_a().as_ref() == Some(team) {
            Some(Side::A)
        } else if self.key_b().as_ref() == Some(team) {
            Some(Side::B)
        } else {
            None
        }
    }

    /// Check if the given team won this match
    ///
    /// None when the team did not play or the match has no winner.
    pub fn did_win(&self, team: &TeamKey) -> Option<bool> {
        let winner = self.winner()?;
        let side = self.side_of(team)?;
        Some(side == winner)
    }
}

/// Parse a record start time.
///
/// Accepts RFC 3339 as well as naive `YYYY-MM-DDTHH:MM:SS`, `YYYY-MM-DD HH:MM:SS`
/// and `YYYY-MM-DD`, the naive forms being taken as UTC.
pub fn parse_start_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Model prediction output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinPrediction {
    pub team_a: String,
    pub team_b: String,
    pub win_probability_a: f32,
    pub features: MatchFeatures,
    pub confidence: ConfidenceLevel,
}

impl WinPrediction {
    /// Get the predicted winner (side with >=50% win probability)
    pub fn predicted_winner(&self) -> &str {
        if self.win_probability_a >= 0.5 {
            &self.team_a
        } else {
            &self.team_b
        }
    }
}

/// Confidence level based on available match history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,   // Both teams have a full recent window
    Medium, // Both teams have some history
    Low,    // At least one team has no history
}

impl ConfidenceLevel {
    pub fn from_history(len_a: usize, len_b: usize, window: usize) -> Self {
        if len_a == 0 || len_b == 0 {
            ConfidenceLevel::Low
        } else if len_a >= window && len_b >= window {
            ConfidenceLevel::High
        } else {
            ConfidenceLevel::Medium
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::Low => write!(f, "Low"),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Model not trained - run `esports train` first")]
    NoModel,

    #[error("Unknown team: {0:?}")]
    UnknownTeam(String),
}

pub type Result<T> = std::result::Result<T, PredictError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub features: FeatureConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub model_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Number of most recent decided matches in the form window
    pub recent_window: usize,
    /// Cap applied to the head-to-head count feature
    pub h2h_count_cap: usize,
    /// Only use history strictly before each match when building features
    pub strict_prior_history: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub test_fraction: f64,
    pub seed: u64,
    pub max_iterations: usize,
    pub learning_rate: f64,
    pub tolerance: f64,
    pub l2_penalty: f64,
    pub min_examples_warning: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "data/esports.db".to_string(),
                model_path: "model/win_model".to_string(),
            },
            features: FeatureConfig::default(),
            training: TrainingConfig::default(),
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig {
            recent_window: 10,
            h2h_count_cap: 20,
            strict_prior_history: false,
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            test_fraction: 0.2,
            seed: 42,
            max_iterations: 200,
            learning_rate: 0.5,
            tolerance: 1e-6,
            l2_penalty: 0.0,
            min_examples_warning: 50,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PredictError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| PredictError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PredictError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let t = &self.training;
        if !(t.test_fraction > 0.0 && t.test_fraction < 1.0) {
            return Err(PredictError::Config(format!(
                "test_fraction must be in (0, 1), got {}",
                t.test_fraction
            )));
        }
        if t.max_iterations == 0 {
            return Err(PredictError::Config("max_iterations must be positive".into()));
        }
        if t.learning_rate <= 0.0 {
            return Err(PredictError::Config(format!(
                "learning_rate must be positive, got {}",
                t.learning_rate
            )));
        }
        if t.l2_penalty < 0.0 {
            return Err(PredictError::Config("l2_penalty must not be negative".into()));
        }
        if std::path::Path::new(&self.data.model_path).extension().is_some() {
            return Err(PredictError::Config(format!(
                "model_path must not have an extension (.mpk/.json are added), got {}",
                self.data.model_path
            )));
        }
        if self.features.recent_window == 0 {
            return Err(PredictError::Config("recent_window must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(a: &str, b: &str, score_a: Option<u32>, score_b: Option<u32>) -> OutcomeRecord {
        OutcomeRecord {
            source: "test".to_string(),
            source_match_id: format!("{}-{}", a, b),
            start_time: None,
            league: None,
            team_a: Some(a.to_string()),
            team_b: Some(b.to_string()),
            score_a,
            score_b,
            status: MatchStatus::Finished,
            best_of: Some(3),
        }
    }

    #[test]
    fn test_winner_label() {
        assert_eq!(record("X", "Y", Some(2), Some(0)).label(), Some(1));
        assert_eq!(record("X", "Y", Some(1), Some(2)).label(), Some(0));
        assert_eq!(record("X", "Y", Some(1), Some(1)).label(), None);
        assert_eq!(record("X", "Y", None, Some(1)).label(), None);
    }

    #[test]
    fn test_did_win_is_side_aware() {
        let m = record("Sentinels", "  FNATIC ", Some(0), Some(2));
        let fnatic = TeamKey::normalize(Some("fnatic")).unwrap();
        let sentinels = TeamKey::normalize(Some("SENTINELS")).unwrap();
        let other = TeamKey::normalize(Some("loud")).unwrap();
        assert_eq!(m.did_win(&fnatic), Some(true));
        assert_eq!(m.did_win(&sentinels), Some(false));
        assert_eq!(m.did_win(&other), None);
    }

    #[test]
    fn test_parse_start_time() {
        let a = parse_start_time("2024-03-01T12:00:00Z").unwrap();
        let b = parse_start_time("2024-03-01T14:00:00+02:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_start_time("2024-03-01").is_some());
        assert!(parse_start_time("2024-03-01T09:30:00").is_some());
        assert!(parse_start_time("yesterday").is_none());
        assert!(parse_start_time("").is_none());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(MatchStatus::parse("finished"), MatchStatus::Finished);
        assert_eq!(MatchStatus::parse("Cancelled"), MatchStatus::Canceled);
        assert_eq!(
            MatchStatus::parse("forfeit"),
            MatchStatus::Other("forfeit".to_string())
        );
    }

    #[test]
    fn test_config_roundtrip_and_validate() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
        assert!(config.validate().is_ok());

        let mut bad = Config::default();
        bad.training.test_fraction = 1.0;
        assert!(bad.validate().is_err());
    }
}
