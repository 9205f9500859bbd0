//! Shared error types for the roster and scoring system

use thiserror::Error;

use crate::types::{AthleteId, Role};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SharedError {
    #[error("Unknown athlete: {id}")]
    UnknownAthlete { id: AthleteId },

    #[error("Athlete already in roster: {id}")]
    DuplicateAthlete { id: AthleteId },

    #[error("Athlete not in roster: {id}")]
    NotInRoster { id: AthleteId },

    #[error("Roster is full ({max} athletes)")]
    RosterFull { max: usize },

    #[error("Credit budget exceeded: {total:.1} > {cap:.1}")]
    BudgetExceeded { total: f64, cap: f64 },

    #[error("Too many marquee athletes: {count} > {max}")]
    TooManyMarquee { count: usize, max: usize },

    #[error("Too many athletes from {affiliation}: {count} > {max}")]
    TooManyFromAffiliation { affiliation: String, count: usize, max: usize },

    #[error("Not enough {role}s: {count} < {min}")]
    RoleShortfall { role: Role, count: usize, min: usize },

    #[error("Captain and vice-captain must be different athletes: {id}")]
    LeadershipCollision { id: AthleteId },

    #[error("Captain not set")]
    MissingCaptain,

    #[error("Vice-captain not set")]
    MissingViceCaptain,

    #[error("Roster incomplete: {size} of {required} athletes")]
    Incomplete { size: usize, required: usize },

    #[error("Invalid reference data: {message}")]
    InvalidReference { message: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
