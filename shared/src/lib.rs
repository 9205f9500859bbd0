//! Shared types for the season roster lock and scoring engine
//!
//! Contains the reference data types, the roster model and the
//! performance/score records that every engine component exchanges.

pub mod errors;
pub mod logging;
pub mod performance;
pub mod reference;
pub mod roster;
pub mod types;

pub use errors::*;
pub use types::*;

pub use performance::{BattingStats, BowlingStats, FieldingStats, PerformanceRecord, PlayerScore, ScoreEntry, SeasonScore};
pub use reference::{AthleteCatalog, Schedule};
pub use roster::{LockedSnapshot, RosterLimits, SnapshotOrigin, SubstitutionLedger, WorkingRoster};
