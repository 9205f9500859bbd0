//! Bulk performance import validation
//!
//! Rows arrive as a flat table keyed by (athlete, match). Either every row
//! validates and converts into a `PerformanceRecord`, or the whole batch is
//! rejected with every problem found.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use shared::{
    AthleteCatalog, AthleteId, BattingStats, BowlingStats, FieldingStats, MatchId, PerformanceRecord, Schedule,
};
use thiserror::Error;

const MAX_OVERS: f64 = 4.0;
const MAX_WICKETS: i64 = 10;
/// Ceiling for any single counting stat
const MAX_TALLY: i64 = 1000;
/// Largest batting override accepted in either direction
const MAX_OVERRIDE: i32 = 1000;

/// One problem with one row of an import batch
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("row {row} ({athlete_id}): {field} {reason}")]
pub struct ImportError {
    pub row: usize,
    pub athlete_id: String,
    pub field: String,
    pub reason: String,
}

/// Flat import row; counting stats are signed so bad input is caught here
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportRow {
    pub athlete_id: String,
    pub match_id: u32,
    pub started: bool,
    pub impact_player: bool,
    pub man_of_the_match: bool,

    pub runs: Option<i64>,
    pub balls: Option<i64>,
    pub fours: Option<i64>,
    pub sixes: Option<i64>,
    pub dismissed: bool,

    pub overs: Option<f64>,
    pub maidens: Option<i64>,
    pub runs_conceded: Option<i64>,
    pub wickets: Option<i64>,
    pub dot_balls: Option<i64>,

    pub catches: Option<i64>,
    pub stumpings: Option<i64>,
    pub direct_run_outs: Option<i64>,
    pub indirect_run_outs: Option<i64>,

    pub batting_override: Option<i32>,
}

impl ImportRow {
    fn has_batting(&self) -> bool {
        [self.runs, self.balls, self.fours, self.sixes].iter().any(Option::is_some) || self.dismissed
    }

    fn has_bowling(&self) -> bool {
        self.overs.is_some()
            || [self.maidens, self.runs_conceded, self.wickets, self.dot_balls].iter().any(Option::is_some)
    }

    fn has_fielding(&self) -> bool {
        [self.catches, self.stumpings, self.direct_run_outs, self.indirect_run_outs].iter().any(Option::is_some)
    }
}

/// Collects errors for a single row
struct RowCheck<'a> {
    row: usize,
    athlete_id: &'a str,
    errors: &'a mut Vec<ImportError>,
}

impl RowCheck<'_> {
    fn fail(&mut self, field: &str, reason: impl Into<String>) {
        self.errors.push(ImportError {
            row: self.row,
            athlete_id: self.athlete_id.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        });
    }

    /// Count within [0, MAX_TALLY]; absent means zero
    fn count(&mut self, field: &str, value: Option<i64>) -> u32 {
        match value {
            None => 0,
            Some(v) if v < 0 => {
                self.fail(field, format!("must be non-negative, got {v}"));
                0
            }
            Some(v) if v > MAX_TALLY => {
                self.fail(field, format!("must be at most {MAX_TALLY}, got {v}"));
                0
            }
            Some(v) => u32::try_from(v).unwrap_or(0),
        }
    }
}

/// Validate over notation: within [0, 4] and no more than five extra balls
fn check_overs(check: &mut RowCheck<'_>, overs: f64) -> bool {
    if !overs.is_finite() || !(0.0..=MAX_OVERS).contains(&overs) {
        check.fail("overs", format!("must be between 0 and {MAX_OVERS}, got {overs}"));
        return false;
    }
    let balls = ((overs - overs.trunc()) * 10.0).round();
    if balls > 5.0 {
        check.fail("overs", format!("invalid over notation {overs}"));
        return false;
    }
    true
}

fn batting_block(check: &mut RowCheck<'_>, row: &ImportRow) -> Option<BattingStats> {
    if !row.has_batting() {
        return None;
    }
    let batting = BattingStats {
        runs: check.count("runs", row.runs),
        balls: check.count("balls", row.balls),
        fours: check.count("fours", row.fours),
        sixes: check.count("sixes", row.sixes),
        dismissed: row.dismissed,
    };
    if batting.runs > 0 && batting.balls == 0 {
        check.fail("balls", "must be positive when runs were scored");
    }
    Some(batting)
}

fn bowling_block(check: &mut RowCheck<'_>, row: &ImportRow) -> Option<BowlingStats> {
    if !row.has_bowling() {
        return None;
    }
    let overs = row.overs.unwrap_or(0.0);
    let overs_ok = check_overs(check, overs);

    if let Some(wickets) = row.wickets {
        if wickets > MAX_WICKETS {
            check.fail("wickets", format!("must be at most {MAX_WICKETS}, got {wickets}"));
        }
    }

    let bowling = BowlingStats {
        overs: if overs_ok { overs } else { 0.0 },
        maidens: check.count("maidens", row.maidens),
        runs_conceded: check.count("runs_conceded", row.runs_conceded),
        wickets: check.count("wickets", row.wickets),
        dot_balls: check.count("dot_balls", row.dot_balls),
    };
    if overs_ok && bowling.dot_balls > bowling.balls() {
        check.fail(
            "dot_balls",
            format!("{} exceeds the {} balls bowled", bowling.dot_balls, bowling.balls()),
        );
    }
    Some(bowling)
}

fn fielding_block(check: &mut RowCheck<'_>, row: &ImportRow) -> Option<FieldingStats> {
    if !row.has_fielding() {
        return None;
    }
    Some(FieldingStats {
        catches: check.count("catches", row.catches),
        stumpings: check.count("stumpings", row.stumpings),
        direct_run_outs: check.count("direct_run_outs", row.direct_run_outs),
        indirect_run_outs: check.count("indirect_run_outs", row.indirect_run_outs),
    })
}

/// Validate a whole batch against the reference data.
///
/// Batting fields are ignored on rows that carry an override, since the
/// override replaces the batting contribution entirely.
pub fn validate_rows(
    rows: &[ImportRow],
    catalog: &AthleteCatalog,
    schedule: &Schedule,
) -> Result<Vec<PerformanceRecord>, Vec<ImportError>> {
    let mut errors = Vec::new();
    let mut records = Vec::with_capacity(rows.len());
    let mut seen = HashSet::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let mut check = RowCheck { row: index + 1, athlete_id: &row.athlete_id, errors: &mut errors };

        let athlete_id = AthleteId::new(row.athlete_id.clone());
        let match_id = MatchId(row.match_id);
        if catalog.get(&athlete_id).is_none() {
            check.fail("athlete_id", "unknown athlete");
        }
        if schedule.get(match_id).is_none() {
            check.fail("match_id", format!("unknown match {}", row.match_id));
        }
        if !seen.insert((athlete_id.clone(), match_id)) {
            check.fail("athlete_id", format!("duplicate row for {match_id}"));
        }

        let batting = match row.batting_override {
            Some(fixed) => {
                if !(-MAX_OVERRIDE..=MAX_OVERRIDE).contains(&fixed) {
                    check.fail("batting_override", format!("must be within ±{MAX_OVERRIDE}, got {fixed}"));
                }
                None
            }
            None => batting_block(&mut check, row),
        };
        let bowling = bowling_block(&mut check, row);
        let fielding = fielding_block(&mut check, row);

        records.push(PerformanceRecord {
            athlete_id,
            match_id,
            started: row.started,
            impact_player: row.impact_player,
            man_of_the_match: row.man_of_the_match,
            batting,
            bowling,
            fielding,
            batting_override: row.batting_override,
        });
    }

    if errors.is_empty() { Ok(records) } else { Err(errors) }
}
