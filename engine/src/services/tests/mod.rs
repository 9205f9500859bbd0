//! Service-specific tests
//!
//! Each store implementation has its own test file; the helpers below build
//! the snapshots and records they share.


#[cfg(test)]
pub mod common {
    use chrono::{TimeZone, Utc};
    use shared::{
        AthleteId, LockedSnapshot, MatchId, ParticipantId, PerformanceRecord, SnapshotOrigin, SubstitutionLedger,
    };

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::error::{EngineError, EngineResult};
    use crate::services::{StateStore, StoreState, state_store::Persistence};
    use crate::traits::LockCommit;

    /// Durable persistence that counts saves instead of writing anywhere
    #[derive(Debug, Default)]
    pub struct CountingSaves {
        saves: AtomicUsize,
        read_only: bool,
    }

    impl CountingSaves {
        pub fn store() -> StateStore<CountingSaves> {
            StateStore::with_persistence(StoreState::default(), CountingSaves::default())
        }

        pub fn read_only_store() -> StateStore<CountingSaves> {
            StateStore::with_persistence(StoreState::default(), CountingSaves { read_only: true, ..Default::default() })
        }

        pub fn saves(store: &StateStore<CountingSaves>) -> usize {
            store.persistence().saves.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Persistence for CountingSaves {
        const DURABLE: bool = true;

        async fn save(&self, _state: &StoreState) -> EngineResult<()> {
            if self.read_only {
                return Err(EngineError::storage("save state", "read-only"));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Generate test participant IDs
    pub fn test_participant_id(suffix: &str) -> ParticipantId {
        ParticipantId::from_string(&format!("550e8400-e29b-41d4-a716-44665544{:0>4}", suffix))
            .expect("Valid test participant ID")
    }

    pub fn snapshot(match_number: u32, players: &[&str]) -> LockedSnapshot {
        LockedSnapshot {
            match_id: MatchId(match_number),
            players: players.iter().map(|id| AthleteId::new(*id)).collect(),
            captain: AthleteId::new(players[0]),
            vice_captain: AthleteId::new(players[1]),
            substitutions: 0,
            origin: SnapshotOrigin::Roster,
            locked_at: Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap(),
        }
    }

    pub fn commit(
        participant: ParticipantId,
        snapshot: LockedSnapshot,
        expected: SubstitutionLedger,
        ledger: SubstitutionLedger,
    ) -> LockCommit {
        LockCommit { participant, snapshot, ledger, expected_ledger: expected }
    }

    pub fn record(athlete: &str, match_number: u32, started: bool) -> PerformanceRecord {
        PerformanceRecord { started, ..PerformanceRecord::empty(AthleteId::new(athlete), MatchId(match_number)) }
    }
}
