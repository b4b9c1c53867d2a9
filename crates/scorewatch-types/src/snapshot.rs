//! Scorecard snapshot produced once per polling cycle.
//!
//! All fields are free-form text exactly as the source page shows them. The
//! engine never parses runs or wickets into numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One batter currently at the crease.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattingLine {
    /// Batter name.
    pub name: String,
    /// Runs scored.
    pub runs: String,
    /// Balls faced.
    pub balls: String,
}

/// One bowler in the current spell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlingLine {
    /// Bowler name.
    pub name: String,
    /// Runs conceded.
    pub runs: String,
    /// Wickets taken.
    pub wickets: String,
}

/// Immutable view of the match state at one point in time.
///
/// A snapshot with an empty score and no participant lines is still a valid
/// snapshot: it means the source had nothing to report (or could not be
/// reached) and is displayed as such.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Score line, verbatim (e.g. `"IND 120/2 (14.3)"`).
    pub score: String,
    /// Batters in page order.
    pub batters: Vec<BattingLine>,
    /// Bowlers in page order.
    pub bowlers: Vec<BowlingLine>,
    /// When the snapshot was taken.
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Create a snapshot stamped with the current time.
    pub fn new(score: String, batters: Vec<BattingLine>, bowlers: Vec<BowlingLine>) -> Self {
        Self {
            score,
            batters,
            bowlers,
            fetched_at: Utc::now(),
        }
    }

    /// The "no data" snapshot.
    pub fn empty() -> Self {
        Self::new(String::new(), Vec::new(), Vec::new())
    }

    /// Whether the snapshot carries no score and no participant lines.
    pub fn is_empty(&self) -> bool {
        self.score.trim().is_empty() && self.batters.is_empty() && self.bowlers.is_empty()
    }
}
