//! Test helpers and builder patterns for engine tests
//!
//! Wires a lock engine and re-scoring job to one shared in-memory store.

use std::sync::Arc;

use chrono::Duration;
use engine::services::InMemoryStore;
use engine::traits::{CommitOutcome, LockCommit, SnapshotStore};
use engine::{EngineConfig, LockEngine, RescoringJob, SweepReport};
use shared::{LockedSnapshot, MatchId, ParticipantId, SnapshotOrigin, SubstitutionLedger};

use super::fixtures::TestFixtures;

pub type MemoryLockEngine = LockEngine<InMemoryStore, InMemoryStore>;

/// Engine components sharing one store
pub struct EngineHarness {
    pub store: Arc<InMemoryStore>,
    pub engine: MemoryLockEngine,
    pub rescorer: RescoringJob<InMemoryStore, InMemoryStore, InMemoryStore>,
}

impl EngineHarness {
    /// Sweep a few minutes after `match_number` kicks off
    pub async fn sweep_at(&self, match_number: u32) -> SweepReport {
        self.engine
            .sweep(TestFixtures::kickoff(match_number) + Duration::minutes(5))
            .await
            .unwrap()
    }
}

/// Builder pattern for creating test harnesses with sensible defaults
pub struct HarnessBuilder {
    matches: Vec<u32>,
    config: EngineConfig,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self { matches: (1..=60).collect(), config: EngineConfig::default() }
    }

    pub fn with_matches(mut self, matches: impl IntoIterator<Item = u32>) -> Self {
        self.matches = matches.into_iter().collect();
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> EngineHarness {
        let store = Arc::new(InMemoryStore::new());
        let schedule = Arc::new(TestFixtures::schedule(self.matches));
        let engine = LockEngine::new(Arc::clone(&store), Arc::clone(&store), schedule, self.config);
        let rescorer = RescoringJob::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::new(TestFixtures::catalog()),
        );
        EngineHarness { store, engine, rescorer }
    }
}

/// Common test helper functions
pub struct TestHelpers;

impl TestHelpers {
    /// Write a snapshot and ledger directly, as an earlier season run would have
    pub async fn seed_snapshot(
        store: &InMemoryStore,
        participant: ParticipantId,
        match_number: u32,
        players: &[&str],
        ledger: SubstitutionLedger,
    ) {
        let expected = store.ledger(participant).await.unwrap();
        let ids = TestFixtures::ids(players);
        let snapshot = LockedSnapshot {
            match_id: MatchId(match_number),
            captain: ids[1].clone(),
            vice_captain: ids[0].clone(),
            players: ids,
            substitutions: 0,
            origin: SnapshotOrigin::Roster,
            locked_at: TestFixtures::kickoff(match_number),
        };
        let outcome = store
            .commit_lock(LockCommit { participant, snapshot, ledger, expected_ledger: expected })
            .await
            .unwrap();
        assert_eq!(outcome, CommitOutcome::Committed);
    }
}
