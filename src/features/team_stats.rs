//! Team performance statistics
//!
//! Overall win rate, recent form and head-to-head record, computed from the
//! team history index. Every statistic falls back to a coin flip (0.5) when
//! there is no evidence.

use super::history::{TeamHistoryIndex, TeamKey};
use crate::OutcomeRecord;
use chrono::{DateTime, Utc};

/// Win rate used when a team has no decided matches
pub const NEUTRAL_WIN_RATE: f32 = 0.5;

/// Wins over decided matches for one team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WinRecord {
    /// Matches with a defined winner
    pub decided: usize,
    /// Matches the team won
    pub wins: usize,
}

impl WinRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update with a match result; ties, missing scores and foreign matches are ignored
    pub fn update(&mut self, record: &OutcomeRecord, team: &TeamKey) {
        if let Some(won) = record.did_win(team) {
            self.decided += 1;
            if won {
                self.wins += 1;
            }
        }
    }

    /// Win ratio (0-1)
    pub fn win_rate(&self) -> f32 {
        if self.decided == 0 {
            NEUTRAL_WIN_RATE
        } else {
            self.wins as f32 / self.decided as f32
        }
    }
}

/// Pairwise record between two teams, from the first team's perspective
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadToHead {
    /// Decided meetings between the two teams
    pub count: usize,
    /// Fraction of those meetings won by the first team
    pub win_rate: f32,
}

impl HeadToHead {
    /// Meeting count bounded to limit the influence of long rivalries
    pub fn capped_count(&self, cap: usize) -> usize {
        self.count.min(cap)
    }
}

/// Overall win rate over a team's history
pub fn win_rate(history: &[OutcomeRecord], team: &TeamKey) -> f32 {
    let mut record = WinRecord::new();
    for m in history {
        record.update(m, team);
    }
    record.win_rate()
}

/// Win rate over the `n` most recent decided, finished matches of a history
///
/// `history` must be ascending by start time.
pub fn recent_win_rate(history: &[OutcomeRecord], team: &TeamKey, n: usize) -> f32 {
    let mut record = WinRecord::new();
    for m in history
        .iter()
        .rev()
        .filter(|m| m.is_complete() && m.winner().is_some())
        .take(n)
    {
        record.update(m, team);
    }
    record.win_rate()
}

/// Head-to-head record of `x` against `y` over a set of matches
pub fn head_to_head<'a>(
    records: impl IntoIterator<Item = &'a OutcomeRecord>,
    x: &TeamKey,
    y: &TeamKey,
) -> HeadToHead {
    let mut record = WinRecord::new();
    for m in records {
        let (Some(a), Some(b)) = (m.key_a(), m.key_b()) else {
            continue;
        };
        let same_pair = (&a == x && &b == y) || (&a == y && &b == x);
        if same_pair {
            record.update(m, x);
        }
    }
    HeadToHead {
        count: record.decided,
        win_rate: record.win_rate(),
    }
}

/// Statistics over a team history index, optionally limited to earlier matches
#[derive(Debug, Clone, Copy)]
pub struct PerformanceStats<'a> {
    index: &'a TeamHistoryIndex,
    cutoff: Option<Option<DateTime<Utc>>>,
}

impl<'a> PerformanceStats<'a> {
    /// Statistics over the whole index
    pub fn new(index: &'a TeamHistoryIndex) -> Self {
        PerformanceStats {
            index,
            cutoff: None,
        }
    }

    /// Statistics restricted to matches that started strictly before `time`
    pub fn before(&self, time: Option<DateTime<Utc>>) -> Self {
        PerformanceStats {
            index: self.index,
            cutoff: Some(time),
        }
    }

    /// The history visible to this view
    pub fn history(&self, team: &TeamKey) -> &'a [OutcomeRecord] {
        match self.cutoff {
            None => self.index.history(team),
            Some(time) => self.index.history_before(team, time),
        }
    }

    pub fn win_rate(&self, team: &TeamKey) -> f32 {
        win_rate(self.history(team), team)
    }

    pub fn recent_win_rate(&self, team: &TeamKey, n: usize) -> f32 {
        recent_win_rate(self.history(team), team, n)
    }

    /// Head-to-head of `x` against `y`
    ///
    /// Every meeting of the pair is in `x`'s history, so scanning it covers
    /// the full record set.
    pub fn head_to_head(&self, x: &TeamKey, y: &TeamKey) -> HeadToHead {
        head_to_head(self.history(x), x, y)
    }
}
