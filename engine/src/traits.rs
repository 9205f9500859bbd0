//! Trait definitions with mockall annotations for testing
//!
//! Every piece of state the engine reads or writes sits behind one of these
//! store traits. They are injected into the lock engine and the re-scoring
//! job, so the same logic runs against the in-memory store in tests and the
//! JSON file store in the binary.

use std::collections::HashMap;

use shared::{
    AthleteId, LockedSnapshot, MatchId, ParticipantId, PerformanceRecord, ScoreEntry, SeasonScore,
    SubstitutionLedger, WorkingRoster,
};

use crate::core::SkipReason;
use crate::error::EngineResult;

/// Snapshot and ledger written together for one participant
#[derive(Debug, Clone, PartialEq)]
pub struct LockCommit {
    pub participant: ParticipantId,
    pub snapshot: LockedSnapshot,
    pub ledger: SubstitutionLedger,
    /// Ledger the plan was computed from; the commit fails if it moved
    pub expected_ledger: SubstitutionLedger,
}

/// Result of an atomic lock commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// A snapshot for this (participant, match) already existed; nothing written
    AlreadyLocked,
    /// The ledger changed since it was read; nothing written
    LedgerConflict,
}

/// Working roster store, owned by the participant-facing app
///
/// The engine only reads rosters; the write methods exist for seeding and
/// for the app layer. Saving a roster also registers its participant.
#[mockall::automock]
#[async_trait::async_trait]
pub trait RosterStore: Send + Sync {
    /// Every participant that has signed up
    async fn participants(&self) -> EngineResult<Vec<ParticipantId>>;

    /// Sign up a participant who has not built a roster yet
    async fn register_participant(&self, participant: ParticipantId) -> EngineResult<()>;

    /// Current working roster, if the participant ever built one
    async fn working_roster(&self, participant: ParticipantId) -> EngineResult<Option<WorkingRoster>>;

    async fn save_working_roster(&self, participant: ParticipantId, roster: WorkingRoster) -> EngineResult<()>;
}

/// Append-only snapshot log plus the substitution ledger
#[mockall::automock]
#[async_trait::async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn snapshot(&self, participant: ParticipantId, match_id: MatchId) -> EngineResult<Option<LockedSnapshot>>;

    /// Snapshot with the greatest match id strictly below `before`
    async fn previous_snapshot(
        &self,
        participant: ParticipantId,
        before: MatchId,
    ) -> EngineResult<Option<LockedSnapshot>>;

    /// Snapshot with the greatest match id overall
    async fn latest_snapshot(&self, participant: ParticipantId) -> EngineResult<Option<LockedSnapshot>>;

    /// All snapshots for a participant in ascending match order
    async fn snapshots(&self, participant: ParticipantId) -> EngineResult<Vec<LockedSnapshot>>;

    /// Participants that have at least one snapshot
    async fn locked_participants(&self) -> EngineResult<Vec<ParticipantId>>;

    /// Ledger for a participant; the default ledger before the first lock
    async fn ledger(&self, participant: ParticipantId) -> EngineResult<SubstitutionLedger>;

    /// Insert the snapshot and replace the ledger as one atomic step.
    ///
    /// Implementations must check for an existing snapshot and compare the
    /// expected ledger inside the same critical section as the write.
    async fn commit_lock(&self, commit: LockCommit) -> EngineResult<CommitOutcome>;

    /// Remember that a sweep found nothing lockable for this pair; the
    /// latest reason wins
    async fn record_skip(&self, participant: ParticipantId, match_id: MatchId, reason: SkipReason) -> EngineResult<()>;

    /// Skip markers for a participant in ascending match order
    async fn skips(&self, participant: ParticipantId) -> EngineResult<Vec<(MatchId, SkipReason)>>;
}

/// Performance records keyed by (athlete, match)
#[mockall::automock]
#[async_trait::async_trait]
pub trait PerformanceStore: Send + Sync {
    async fn records_for_match(&self, match_id: MatchId) -> EngineResult<HashMap<AthleteId, PerformanceRecord>>;

    /// Overwrite by key; returns how many records were written
    async fn upsert_records(&self, records: Vec<PerformanceRecord>) -> EngineResult<usize>;
}

/// Derived scores, last write wins
#[mockall::automock]
#[async_trait::async_trait]
pub trait ScoreStore: Send + Sync {
    /// Write a participant's match entries and season total in one step
    async fn upsert_scores(
        &self,
        participant: ParticipantId,
        entries: Vec<(MatchId, ScoreEntry)>,
        season: SeasonScore,
    ) -> EngineResult<()>;

    async fn score(&self, participant: ParticipantId, match_id: MatchId) -> EngineResult<Option<ScoreEntry>>;

    async fn season(&self, participant: ParticipantId) -> EngineResult<Option<SeasonScore>>;
}
