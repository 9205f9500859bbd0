//! Table-backed store shared by the in-memory and JSON file stores
//!
//! Every table lives in one `StoreState` behind a tokio `RwLock`. A write
//! runs under the write guard, so the lock commit checks for an existing
//! snapshot and compares the ledger in the same critical section as the
//! insert. The `Persistence` parameter decides what happens to a write
//! before it becomes visible.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use shared::{
    AthleteId, LockedSnapshot, MatchId, ParticipantId, PerformanceRecord, ProcessId, ScoreEntry, SeasonScore,
    SubstitutionLedger, WorkingRoster, process_debug,
};

use crate::core::SkipReason;
use crate::error::EngineResult;
use crate::traits::{CommitOutcome, LockCommit, PerformanceStore, RosterStore, ScoreStore, SnapshotStore};

/// All persisted tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreState {
    pub participants: BTreeSet<ParticipantId>,
    pub rosters: BTreeMap<ParticipantId, WorkingRoster>,
    pub snapshots: BTreeMap<ParticipantId, BTreeMap<MatchId, LockedSnapshot>>,
    pub ledgers: BTreeMap<ParticipantId, SubstitutionLedger>,
    /// Pairs a sweep saw with nothing lockable
    pub skips: BTreeMap<ParticipantId, BTreeMap<MatchId, SkipReason>>,
    pub records: BTreeMap<MatchId, BTreeMap<AthleteId, PerformanceRecord>>,
    pub scores: BTreeMap<ParticipantId, BTreeMap<MatchId, ScoreEntry>>,
    pub seasons: BTreeMap<ParticipantId, SeasonScore>,
}

/// Result of a mutation plus whether any table actually changed
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub changed: bool,
}

impl<T> Applied<T> {
    fn new(value: T, changed: bool) -> Self {
        Self { value, changed }
    }
}

impl StoreState {
    pub fn register(&mut self, participant: ParticipantId) -> Applied<()> {
        Applied::new((), self.participants.insert(participant))
    }

    pub fn save_roster(&mut self, participant: ParticipantId, roster: WorkingRoster) -> Applied<()> {
        let registered = self.participants.insert(participant);
        if self.rosters.get(&participant) == Some(&roster) {
            return Applied::new((), registered);
        }
        self.rosters.insert(participant, roster);
        Applied::new((), true)
    }

    pub fn snapshot(&self, participant: ParticipantId, match_id: MatchId) -> Option<LockedSnapshot> {
        self.snapshots.get(&participant)?.get(&match_id).cloned()
    }

    pub fn previous_snapshot(&self, participant: ParticipantId, before: MatchId) -> Option<LockedSnapshot> {
        self.snapshots
            .get(&participant)?
            .range(..before)
            .next_back()
            .map(|(_, snapshot)| snapshot.clone())
    }

    pub fn latest_snapshot(&self, participant: ParticipantId) -> Option<LockedSnapshot> {
        self.snapshots
            .get(&participant)?
            .values()
            .next_back()
            .cloned()
    }

    pub fn ledger(&self, participant: ParticipantId) -> SubstitutionLedger {
        self.ledgers.get(&participant).copied().unwrap_or_default()
    }

    /// Apply a lock commit, or report why nothing was written
    pub fn commit(&mut self, commit: LockCommit) -> Applied<CommitOutcome> {
        let LockCommit { participant, snapshot, ledger, expected_ledger } = commit;

        if self.snapshot(participant, snapshot.match_id).is_some() {
            return Applied::new(CommitOutcome::AlreadyLocked, false);
        }
        if self.ledger(participant) != expected_ledger {
            return Applied::new(CommitOutcome::LedgerConflict, false);
        }

        self.snapshots
            .entry(participant)
            .or_default()
            .insert(snapshot.match_id, snapshot);
        self.ledgers.insert(participant, ledger);
        Applied::new(CommitOutcome::Committed, true)
    }

    pub fn record_skip(&mut self, participant: ParticipantId, match_id: MatchId, reason: SkipReason) -> Applied<()> {
        let previous = self.skips.entry(participant).or_default().insert(match_id, reason);
        Applied::new((), previous != Some(reason))
    }

    pub fn upsert_records(&mut self, records: Vec<PerformanceRecord>) -> Applied<usize> {
        let count = records.len();
        let mut changed = false;
        for record in records {
            let by_athlete = self.records.entry(record.match_id).or_default();
            if by_athlete.get(&record.athlete_id) != Some(&record) {
                by_athlete.insert(record.athlete_id.clone(), record);
                changed = true;
            }
        }
        Applied::new(count, changed)
    }

    pub fn records_for_match(&self, match_id: MatchId) -> HashMap<AthleteId, PerformanceRecord> {
        self.records
            .get(&match_id)
            .map(|records| records.iter().map(|(id, record)| (id.clone(), record.clone())).collect())
            .unwrap_or_default()
    }

    pub fn upsert_scores(
        &mut self,
        participant: ParticipantId,
        entries: Vec<(MatchId, ScoreEntry)>,
        season: SeasonScore,
    ) -> Applied<()> {
        let mut changed = false;
        let by_match = self.scores.entry(participant).or_default();
        for (match_id, entry) in entries {
            if by_match.get(&match_id) != Some(&entry) {
                by_match.insert(match_id, entry);
                changed = true;
            }
        }
        if self.seasons.get(&participant) != Some(&season) {
            self.seasons.insert(participant, season);
            changed = true;
        }
        Applied::new((), changed)
    }
}

/// What a store does with a changed state before publishing it
#[async_trait]
pub trait Persistence: Send + Sync + 'static {
    /// Writes go to a copy and must be saved before they become visible
    const DURABLE: bool;

    async fn save(&self, state: &StoreState) -> EngineResult<()>;
}

/// Store over `StoreState`; see `InMemoryStore` and `JsonFileStore`
#[derive(Debug)]
pub struct StateStore<P> {
    state: RwLock<StoreState>,
    persistence: P,
}

impl<P: Persistence> StateStore<P> {
    pub(crate) fn with_persistence(state: StoreState, persistence: P) -> Self {
        Self { state: RwLock::new(state), persistence }
    }

    pub(crate) fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Copy of the current tables
    pub async fn state(&self) -> StoreState {
        self.state.read().await.clone()
    }

    async fn read<T>(&self, query: impl FnOnce(&StoreState) -> T) -> T {
        let guard = self.state.read().await;
        query(&guard)
    }

    /// Apply `change` under the write guard. Durable stores run it on a copy
    /// and save that copy only when the change reports it touched something.
    async fn update<T>(&self, change: impl FnOnce(&mut StoreState) -> Applied<T>) -> EngineResult<T> {
        let mut guard = self.state.write().await;
        if !P::DURABLE {
            return Ok(change(&mut guard).value);
        }

        let mut next = guard.clone();
        let Applied { value, changed } = change(&mut next);
        if changed {
            self.persistence.save(&next).await?;
            *guard = next;
        }
        Ok(value)
    }
}

#[async_trait]
impl<P: Persistence> RosterStore for StateStore<P> {
    async fn participants(&self) -> EngineResult<Vec<ParticipantId>> {
        Ok(self.read(|state| state.participants.iter().copied().collect()).await)
    }

    async fn register_participant(&self, participant: ParticipantId) -> EngineResult<()> {
        self.update(|state| state.register(participant)).await
    }

    async fn working_roster(&self, participant: ParticipantId) -> EngineResult<Option<WorkingRoster>> {
        Ok(self.read(|state| state.rosters.get(&participant).cloned()).await)
    }

    async fn save_working_roster(&self, participant: ParticipantId, roster: WorkingRoster) -> EngineResult<()> {
        self.update(|state| state.save_roster(participant, roster)).await
    }
}

#[async_trait]
impl<P: Persistence> SnapshotStore for StateStore<P> {
    async fn snapshot(&self, participant: ParticipantId, match_id: MatchId) -> EngineResult<Option<LockedSnapshot>> {
        Ok(self.read(|state| state.snapshot(participant, match_id)).await)
    }

    async fn previous_snapshot(
        &self,
        participant: ParticipantId,
        before: MatchId,
    ) -> EngineResult<Option<LockedSnapshot>> {
        Ok(self.read(|state| state.previous_snapshot(participant, before)).await)
    }

    async fn latest_snapshot(&self, participant: ParticipantId) -> EngineResult<Option<LockedSnapshot>> {
        Ok(self.read(|state| state.latest_snapshot(participant)).await)
    }

    async fn snapshots(&self, participant: ParticipantId) -> EngineResult<Vec<LockedSnapshot>> {
        Ok(self
            .read(|state| {
                state
                    .snapshots
                    .get(&participant)
                    .map(|by_match| by_match.values().cloned().collect())
                    .unwrap_or_default()
            })
            .await)
    }

    async fn locked_participants(&self) -> EngineResult<Vec<ParticipantId>> {
        Ok(self
            .read(|state| {
                state
                    .snapshots
                    .iter()
                    .filter(|(_, by_match)| !by_match.is_empty())
                    .map(|(participant, _)| *participant)
                    .collect()
            })
            .await)
    }

    async fn ledger(&self, participant: ParticipantId) -> EngineResult<SubstitutionLedger> {
        Ok(self.read(|state| state.ledger(participant)).await)
    }

    async fn commit_lock(&self, commit: LockCommit) -> EngineResult<CommitOutcome> {
        let (participant, match_id) = (commit.participant, commit.snapshot.match_id);
        let outcome = self.update(|state| state.commit(commit)).await?;
        process_debug!(ProcessId::current(), "🔒 Commit {} at {}: {:?}", participant, match_id, outcome);
        Ok(outcome)
    }

    async fn record_skip(&self, participant: ParticipantId, match_id: MatchId, reason: SkipReason) -> EngineResult<()> {
        self.update(|state| state.record_skip(participant, match_id, reason)).await
    }

    async fn skips(&self, participant: ParticipantId) -> EngineResult<Vec<(MatchId, SkipReason)>> {
        Ok(self
            .read(|state| {
                state
                    .skips
                    .get(&participant)
                    .map(|by_match| by_match.iter().map(|(id, reason)| (*id, *reason)).collect())
                    .unwrap_or_default()
            })
            .await)
    }
}

#[async_trait]
impl<P: Persistence> PerformanceStore for StateStore<P> {
    async fn records_for_match(&self, match_id: MatchId) -> EngineResult<HashMap<AthleteId, PerformanceRecord>> {
        Ok(self.read(|state| state.records_for_match(match_id)).await)
    }

    async fn upsert_records(&self, records: Vec<PerformanceRecord>) -> EngineResult<usize> {
        self.update(|state| state.upsert_records(records)).await
    }
}

#[async_trait]
impl<P: Persistence> ScoreStore for StateStore<P> {
    async fn upsert_scores(
        &self,
        participant: ParticipantId,
        entries: Vec<(MatchId, ScoreEntry)>,
        season: SeasonScore,
    ) -> EngineResult<()> {
        self.update(|state| state.upsert_scores(participant, entries, season)).await
    }

    async fn score(&self, participant: ParticipantId, match_id: MatchId) -> EngineResult<Option<ScoreEntry>> {
        Ok(self
            .read(|state| {
                state
                    .scores
                    .get(&participant)
                    .and_then(|by_match| by_match.get(&match_id))
                    .cloned()
            })
            .await)
    }

    async fn season(&self, participant: ParticipantId) -> EngineResult<Option<SeasonScore>> {
        Ok(self.read(|state| state.seasons.get(&participant).cloned()).await)
    }
}
