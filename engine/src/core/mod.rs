//! Core business logic modules
//!
//! Phase budgets, substitution deltas, lock planning, scoring and import
//! validation. Nothing here touches a store or a clock; callers pass in the
//! instant and the data they read.

pub mod import;
pub mod lock;
pub mod phase;
pub mod scoring;
pub mod substitution;

pub use import::{ImportError, ImportRow, validate_rows};
pub use lock::{LeadershipPolicy, LockInput, LockOutcome, LockPlan, SkipReason, plan_lock};
pub use phase::{PhaseBudget, PhaseRules, Remaining, SubstitutionCap};
pub use scoring::{Captaincy, score_entry, score_match, score_team};
pub use substitution::{SubstitutionDelta, substitution_delta};
