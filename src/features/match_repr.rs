//! Match feature vector
//!
//! The four model inputs for one match, directional from side A's point of
//! view: positive differentials favor side A.

use super::history::TeamKey;
use super::team_stats::PerformanceStats;
use serde::{Deserialize, Serialize};

/// Model-ready features for a single match
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchFeatures {
    /// Overall win rate of A minus that of B
    pub win_rate_diff: f32,
    /// Recent-form win rate of A minus that of B
    pub recent_win_rate_diff: f32,
    /// A's win rate in head-to-head meetings with B
    pub h2h_win_rate: f32,
    /// Number of decided meetings, capped
    pub h2h_count: f32,
}

impl MatchFeatures {
    pub const DIM: usize = 4;

    pub const NAMES: [&'static str; Self::DIM] = [
        "win_rate_diff",
        "recent_win_rate_diff",
        "h2h_win_rate",
        "h2h_count",
    ];

    /// Compute features for `a` (side A) against `b` (side B)
    pub fn compute(
        stats: &PerformanceStats<'_>,
        a: &TeamKey,
        b: &TeamKey,
        recent_window: usize,
        h2h_count_cap: usize,
    ) -> Self {
        let h2h = stats.head_to_head(a, b);
        MatchFeatures {
            win_rate_diff: stats.win_rate(a) - stats.win_rate(b),
            recent_win_rate_diff: stats.recent_win_rate(a, recent_window)
                - stats.recent_win_rate(b, recent_window),
            h2h_win_rate: h2h.win_rate,
            h2h_count: h2h.capped_count(h2h_count_cap) as f32,
        }
    }

    pub fn to_array(&self) -> [f32; Self::DIM] {
        [
            self.win_rate_diff,
            self.recent_win_rate_diff,
            self.h2h_win_rate,
            self.h2h_count,
        ]
    }

    pub fn from_array(values: [f32; Self::DIM]) -> Self {
        MatchFeatures {
            win_rate_diff: values[0],
            recent_win_rate_diff: values[1],
            h2h_win_rate: values[2],
            h2h_count: values[3],
        }
    }

    /// Features of the same match seen from side B
    pub fn mirrored(&self) -> Self {
        MatchFeatures {
            win_rate_diff: -self.win_rate_diff,
            recent_win_rate_diff: -self.recent_win_rate_diff,
            h2h_win_rate: 1.0 - self.h2h_win_rate,
            h2h_count: self.h2h_count,
        }
    }
}
