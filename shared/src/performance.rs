//! Per-match performance records and the score entries derived from them

use serde::{Deserialize, Serialize};

use crate::types::{AthleteId, MatchId};

/// Batting figures for one innings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattingStats {
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    /// Out (as opposed to not out or did not bat)
    #[serde(default)]
    pub dismissed: bool,
}

impl BattingStats {
    /// Runs per hundred balls; `None` when no balls were faced
    pub fn strike_rate(&self) -> Option<f64> {
        (self.balls > 0).then(|| self.runs as f64 * 100.0 / self.balls as f64)
    }
}

/// Bowling figures for one spell
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BowlingStats {
    /// Cricket notation: `3.4` is three overs and four balls
    pub overs: f64,
    pub maidens: u32,
    pub runs_conceded: u32,
    pub wickets: u32,
    #[serde(default)]
    pub dot_balls: u32,
}

impl BowlingStats {
    /// Legal balls bowled, decoding the cricket over notation
    pub fn balls(&self) -> u32 {
        let whole = self.overs.trunc();
        let part = ((self.overs - whole) * 10.0).round();
        (whole as u32).saturating_mul(6).saturating_add(part as u32)
    }

    /// Overs as a decimal quantity (`3.4` → 3.667)
    pub fn overs_decimal(&self) -> f64 {
        self.balls() as f64 / 6.0
    }

    /// Runs conceded per over; `None` when nothing was bowled
    pub fn economy(&self) -> Option<f64> {
        let balls = self.balls();
        (balls > 0).then(|| self.runs_conceded as f64 * 6.0 / balls as f64)
    }
}

/// Fielding contributions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldingStats {
    pub catches: u32,
    pub stumpings: u32,
    pub direct_run_outs: u32,
    pub indirect_run_outs: u32,
}

/// Normalised performance of one athlete in one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub athlete_id: AthleteId,
    pub match_id: MatchId,
    /// In the starting lineup
    #[serde(default)]
    pub started: bool,
    /// Came on as a tactical "impact" substitute
    #[serde(default)]
    pub impact_player: bool,
    #[serde(default)]
    pub man_of_the_match: bool,
    #[serde(default)]
    pub batting: Option<BattingStats>,
    #[serde(default)]
    pub bowling: Option<BowlingStats>,
    #[serde(default)]
    pub fielding: Option<FieldingStats>,
    /// Administrative replacement for the whole batting contribution
    #[serde(default)]
    pub batting_override: Option<i32>,
}

impl PerformanceRecord {
    /// A record with no flags and no stat blocks
    pub fn empty(athlete_id: AthleteId, match_id: MatchId) -> Self {
        Self {
            athlete_id,
            match_id,
            started: false,
            impact_player: false,
            man_of_the_match: false,
            batting: None,
            bowling: None,
            fielding: None,
            batting_override: None,
        }
    }

    pub fn key(&self) -> (AthleteId, MatchId) {
        (self.athlete_id.clone(), self.match_id)
    }
}

/// Points for one athlete within a scored roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub athlete_id: AthleteId,
    /// Points before the captaincy multiplier
    pub base: i32,
    pub motm_bonus: i32,
    pub total: i32,
    /// False when no performance record existed for this athlete
    pub has_record: bool,
}

/// Points for one participant in one match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub base: i32,
    pub motm_bonus: i32,
    pub total: i32,
    #[serde(default)]
    pub players: Vec<PlayerScore>,
}

impl ScoreEntry {
    /// Athletes in the roster that had no performance record
    pub fn missing_records(&self) -> usize {
        self.players.iter().filter(|p| !p.has_record).count()
    }
}

/// Season aggregate for one participant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonScore {
    pub matches_scored: u32,
    pub base: i64,
    pub motm_bonus: i64,
    pub total: i64,
}

impl SeasonScore {
    pub fn add(&mut self, entry: &ScoreEntry) {
        self.matches_scored = self.matches_scored.saturating_add(1);
        self.base = self.base.saturating_add(i64::from(entry.base));
        self.motm_bonus = self.motm_bonus.saturating_add(i64::from(entry.motm_bonus));
        self.total = self.total.saturating_add(i64::from(entry.total));
    }
}
