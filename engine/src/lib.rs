//! Season roster lock and scoring engine
//!
//! Freezes each participant's working roster at every match's lock instant,
//! enforces the per-phase substitution budget, and scores locked rosters from
//! performance records. Stores are injected through the traits in
//! [`traits`], so every component runs against the in-memory store in tests
//! and the JSON file store in the binary.

pub mod config;
pub mod core;
pub mod error;
pub mod importer;
pub mod locker;
pub mod rescorer;
pub mod services;
pub mod traits;

// Re-export commonly used types
pub use config::EngineConfig;
pub use core::{LeadershipPolicy, LockOutcome, PhaseRules, Remaining, SkipReason};
pub use error::{EngineError, EngineResult};
pub use importer::{ImportSummary, PerformanceImporter};
pub use locker::{LockEngine, LockResult, MissedLock, RemainingFigure, SweepReport};
pub use rescorer::{RescoreFailure, RescoreReport, RescoringJob};
pub use traits::{PerformanceStore, RosterStore, ScoreStore, SnapshotStore};
