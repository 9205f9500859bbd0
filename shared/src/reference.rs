//! Read-only reference data: the athlete table and the match schedule

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{SharedError, SharedResult};
use crate::types::{Athlete, AthleteId, Match, MatchId};

/// Lookup table of every selectable athlete
#[derive(Debug, Clone, Default)]
pub struct AthleteCatalog {
    athletes: HashMap<AthleteId, Athlete>,
}

impl AthleteCatalog {
    /// Build a catalog, rejecting duplicate ids and negative costs
    pub fn new(athletes: Vec<Athlete>) -> SharedResult<Self> {
        let mut map = HashMap::with_capacity(athletes.len());
        for athlete in athletes {
            if athlete.cost.is_nan() || athlete.cost < 0.0 {
                return Err(SharedError::InvalidReference {
                    message: format!("athlete {} has invalid cost {}", athlete.id, athlete.cost),
                });
            }
            let id = athlete.id.clone();
            if map.insert(id.clone(), athlete).is_some() {
                return Err(SharedError::InvalidReference {
                    message: format!("duplicate athlete id {id}"),
                });
            }
        }
        Ok(Self { athletes: map })
    }

    pub fn get(&self, id: &AthleteId) -> Option<&Athlete> {
        self.athletes.get(id)
    }

    pub fn require(&self, id: &AthleteId) -> SharedResult<&Athlete> {
        self.get(id).ok_or_else(|| SharedError::UnknownAthlete { id: id.clone() })
    }

    pub fn len(&self) -> usize {
        self.athletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.athletes.is_empty()
    }
}

/// Season fixture list ordered by start time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    matches: Vec<Match>,
}

impl Schedule {
    /// Build a schedule, rejecting duplicate match ids
    pub fn new(mut matches: Vec<Match>) -> SharedResult<Self> {
        matches.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        let mut seen = std::collections::HashSet::with_capacity(matches.len());
        for fixture in &matches {
            if !seen.insert(fixture.id) {
                return Err(SharedError::InvalidReference {
                    message: format!("duplicate match id {}", fixture.id),
                });
            }
        }
        Ok(Self { matches })
    }

    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    /// All matches in ascending start order
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Matches whose lock window is open at `now`, in ascending start order
    pub fn lockable_at(&self, now: DateTime<Utc>, window: Duration) -> Vec<&Match> {
        self.matches.iter().filter(|m| m.is_lockable(now, window)).collect()
    }

    /// Matches whose lock window has closed at `now`
    pub fn closed_at(&self, now: DateTime<Utc>, window: Duration) -> Vec<&Match> {
        self.matches.iter().filter(|m| m.window_closed(now, window)).collect()
    }

    /// First match that has not started yet at `now`
    pub fn next_unlocked(&self, now: DateTime<Utc>) -> Option<&Match> {
        self.matches.iter().find(|m| m.start_time > now)
    }
}
