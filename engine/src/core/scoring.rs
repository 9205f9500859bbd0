//! Scoring engine
//!
//! Pure functions from performance records to points. Nothing here reads a
//! store or a clock, so any score can be recomputed from a locked snapshot
//! and the records for its match.

use std::collections::HashMap;

use shared::{
    AthleteCatalog, AthleteId, BattingStats, BowlingStats, FieldingStats, LockedSnapshot, PerformanceRecord,
    PlayerScore, Role, ScoreEntry,
};

const STARTED: i32 = 4;
const IMPACT_PLAYER: i32 = 4;

const PER_RUN: i32 = 1;
const PER_FOUR: i32 = 2;
const PER_SIX: i32 = 4;
const DUCK: i32 = -10;
/// Balls faced before strike rate counts
const STRIKE_RATE_MIN_BALLS: u32 = 10;

const PER_WICKET: i32 = 25;
const PER_MAIDEN: i32 = 15;
/// Overs bowled before economy counts
const ECONOMY_MIN_OVERS: f64 = 2.0;

const PER_CATCH: i32 = 10;
const CATCH_HAUL: i32 = 5;
const CATCH_HAUL_MIN: u32 = 3;
const PER_STUMPING: i32 = 15;
const PER_DIRECT_RUN_OUT: i32 = 15;
const PER_INDIRECT_RUN_OUT: i32 = 6;

const CAPTAIN_MULTIPLIER: f64 = 2.0;
const VICE_CAPTAIN_MULTIPLIER: f64 = 1.5;
const CAPTAIN_MOTM_BONUS: i32 = 50;
const VICE_CAPTAIN_MOTM_BONUS: i32 = 30;

/// Armband worn by a rostered athlete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Captaincy {
    None,
    Captain,
    ViceCaptain,
}

impl Captaincy {
    pub fn of(snapshot: &LockedSnapshot, athlete: &AthleteId) -> Self {
        if snapshot.is_captain(athlete) {
            Captaincy::Captain
        } else if snapshot.is_vice_captain(athlete) {
            Captaincy::ViceCaptain
        } else {
            Captaincy::None
        }
    }

    fn multiplier(&self) -> f64 {
        match self {
            Captaincy::Captain => CAPTAIN_MULTIPLIER,
            Captaincy::ViceCaptain => VICE_CAPTAIN_MULTIPLIER,
            Captaincy::None => 1.0,
        }
    }

    fn motm_bonus(&self) -> i32 {
        match self {
            Captaincy::Captain => CAPTAIN_MOTM_BONUS,
            Captaincy::ViceCaptain => VICE_CAPTAIN_MOTM_BONUS,
            Captaincy::None => 0,
        }
    }
}

fn count(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// `n` occurrences worth `each` points, saturating at the i32 bounds
fn tally(n: u32, each: i32) -> i32 {
    count(n).saturating_mul(each)
}

fn milestone_bonus(runs: u32) -> i32 {
    match runs {
        100.. => 30,
        75.. => 20,
        50.. => 10,
        25.. => 5,
        _ => 0,
    }
}

fn strike_rate_adjustment(strike_rate: f64) -> i32 {
    if strike_rate > 170.0 {
        6
    } else if strike_rate >= 150.0 {
        4
    } else if strike_rate >= 130.0 {
        2
    } else if strike_rate < 50.0 {
        -6
    } else {
        0
    }
}

fn wicket_haul_bonus(wickets: u32) -> i32 {
    match wickets {
        5.. => 30,
        4 => 20,
        3 => 15,
        _ => 0,
    }
}

fn economy_adjustment(economy: f64) -> i32 {
    if economy < 5.0 {
        15
    } else if economy < 6.0 {
        8
    } else if economy < 7.0 {
        2
    } else if economy < 10.0 {
        0
    } else if economy < 11.0 {
        -2
    } else if economy <= 12.0 {
        -4
    } else {
        -15
    }
}

/// Points from one innings
pub fn batting_points(batting: &BattingStats, role: Role) -> i32 {
    let mut points = tally(batting.runs, PER_RUN)
        .saturating_add(tally(batting.fours, PER_FOUR))
        .saturating_add(tally(batting.sixes, PER_SIX))
        .saturating_add(milestone_bonus(batting.runs));

    if batting.balls >= STRIKE_RATE_MIN_BALLS {
        if let Some(strike_rate) = batting.strike_rate() {
            points = points.saturating_add(strike_rate_adjustment(strike_rate));
        }
    }

    if role != Role::Bowler && batting.dismissed && batting.runs == 0 {
        points = points.saturating_add(DUCK);
    }
    points
}

/// Points from one spell
pub fn bowling_points(bowling: &BowlingStats) -> i32 {
    let mut points = tally(bowling.wickets, PER_WICKET)
        .saturating_add(tally(bowling.maidens, PER_MAIDEN))
        .saturating_add(wicket_haul_bonus(bowling.wickets));

    if bowling.overs_decimal() >= ECONOMY_MIN_OVERS {
        if let Some(economy) = bowling.economy() {
            points = points.saturating_add(economy_adjustment(economy));
        }
    }
    points
}

pub fn fielding_points(fielding: &FieldingStats) -> i32 {
    let haul = if fielding.catches >= CATCH_HAUL_MIN { CATCH_HAUL } else { 0 };
    [
        tally(fielding.catches, PER_CATCH),
        haul,
        tally(fielding.stumpings, PER_STUMPING),
        tally(fielding.direct_run_outs, PER_DIRECT_RUN_OUT),
        tally(fielding.indirect_run_outs, PER_INDIRECT_RUN_OUT),
    ]
    .into_iter()
    .fold(0, i32::saturating_add)
}

/// Base points for one record, before any captaincy multiplier
pub fn score_match(record: &PerformanceRecord, role: Role) -> i32 {
    let started = if record.started { STARTED } else { 0 };
    let impact = if record.impact_player { IMPACT_PLAYER } else { 0 };

    // The override stands in for the whole batting contribution
    let batting = match record.batting_override {
        Some(fixed) => fixed,
        None => record.batting.as_ref().map(|b| batting_points(b, role)).unwrap_or(0),
    };

    (started + impact)
        .saturating_add(batting)
        .saturating_add(record.bowling.as_ref().map(bowling_points).unwrap_or(0))
        .saturating_add(record.fielding.as_ref().map(fielding_points).unwrap_or(0))
}

/// Apply captaincy to a record's base points
pub fn score_entry(record: &PerformanceRecord, role: Role, captaincy: Captaincy) -> PlayerScore {
    let base = score_match(record, role);
    let motm_bonus = if record.man_of_the_match { captaincy.motm_bonus() } else { 0 };
    // `as` saturates out-of-range floats
    let multiplied = (base as f64 * captaincy.multiplier()).round() as i32;

    PlayerScore {
        athlete_id: record.athlete_id.clone(),
        base,
        motm_bonus,
        total: multiplied.saturating_add(motm_bonus),
        has_record: true,
    }
}

/// Score a locked roster against the records for its match.
///
/// A rostered athlete with no record, or one missing from the catalog,
/// contributes zero.
pub fn score_team(
    snapshot: &LockedSnapshot,
    catalog: &AthleteCatalog,
    records: &HashMap<AthleteId, PerformanceRecord>,
) -> ScoreEntry {
    let mut entry = ScoreEntry::default();

    for athlete_id in &snapshot.players {
        let scored = match (records.get(athlete_id), catalog.get(athlete_id)) {
            (Some(record), Some(athlete)) if record.match_id == snapshot.match_id => {
                score_entry(record, athlete.role, Captaincy::of(snapshot, athlete_id))
            }
            _ => PlayerScore {
                athlete_id: athlete_id.clone(),
                base: 0,
                motm_bonus: 0,
                total: 0,
                has_record: false,
            },
        };
        entry.base = entry.base.saturating_add(scored.base);
        entry.motm_bonus = entry.motm_bonus.saturating_add(scored.motm_bonus);
        entry.total = entry.total.saturating_add(scored.total);
        entry.players.push(scored);
    }
    entry
}
