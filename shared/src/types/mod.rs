//! Core shared types and identifiers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

/// Global process ID singleton - set once at startup
static PROCESS_ID: OnceLock<ProcessId> = OnceLock::new();

/// Process identifier for the role this binary is running in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessId {
    /// Lock sweep
    Locker,
    /// Re-scoring job
    Rescorer,
    /// Bulk performance import
    Importer,
    /// Read-only queries and library use
    Cli,
}

impl ProcessId {
    /// Initialize the global process ID (first call wins)
    pub fn init(process: ProcessId) -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| process)
    }

    /// Get the global process ID, falling back to `Cli` when nothing was initialized
    pub fn current() -> &'static ProcessId {
        PROCESS_ID.get_or_init(|| ProcessId::Cli)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessId::Locker => write!(f, "locker"),
            ProcessId::Rescorer => write!(f, "rescorer"),
            ProcessId::Importer => write!(f, "importer"),
            ProcessId::Cli => write!(f, "cli"),
        }
    }
}

/// Unique identifier for a participant (the owner of a roster)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a real-world athlete in the reference table
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AthleteId(String);

impl AthleteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AthleteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequential match number within the season (1-based)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MatchId(pub u32);

impl MatchId {
    pub fn number(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.0)
    }
}

/// Playing role of an athlete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Keeper,
    Batter,
    AllRounder,
    Bowler,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Keeper, Role::Batter, Role::AllRounder, Role::Bowler];

    /// Minimum number of athletes of this role in a complete roster
    pub fn minimum(&self) -> usize {
        match self {
            Role::Keeper => 1,
            Role::Batter => 3,
            Role::AllRounder => 1,
            Role::Bowler => 3,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Keeper => write!(f, "keeper"),
            Role::Batter => write!(f, "batter"),
            Role::AllRounder => write!(f, "all-rounder"),
            Role::Bowler => write!(f, "bowler"),
        }
    }
}

/// Tournament phase; each phase carries its own substitution budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    Group,
    SuperStage,
    Knockout,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Group => write!(f, "group"),
            Phase::SuperStage => write!(f, "super-stage"),
            Phase::Knockout => write!(f, "knockout"),
        }
    }
}

/// Immutable athlete reference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Athlete {
    pub id: AthleteId,
    pub name: String,
    pub role: Role,
    /// Country or franchise the athlete plays for
    pub affiliation: String,
    /// Scarce "marquee" athlete
    #[serde(default)]
    pub marquee: bool,
    /// Cost in credits
    pub cost: f64,
}

/// Immutable fixture reference data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub start_time: DateTime<Utc>,
    pub home: String,
    pub away: String,
}

impl Match {
    /// Whether `now` falls inside `[start, start + window)`
    pub fn is_lockable(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        now >= self.start_time && now < self.start_time + window
    }

    /// Whether the lock window has already closed at `now`
    pub fn window_closed(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        now >= self.start_time + window
    }
}
