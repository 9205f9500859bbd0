//! End-to-end tests for lock sweeps and re-scoring
//!
//! Every scenario runs real sweeps against the in-memory store; the file
//! store scenario checks the same flow survives a restart.

use std::sync::Arc;

use chrono::Duration;
use engine::core::ImportRow;
use engine::services::JsonFileStore;
use engine::traits::{RosterStore, ScoreStore, SnapshotStore};
use engine::{EngineConfig, LeadershipPolicy, LockEngine, LockOutcome, PerformanceImporter, Remaining, SkipReason};
use shared::{AthleteId, MatchId, Phase, SnapshotOrigin, SubstitutionLedger, WorkingRoster};

mod common;
use common::{HarnessBuilder, TestFixtures, TestHelpers};

/// Test a season opener followed by an in-budget swap
#[tokio::test]
async fn test_lock_then_swap_within_budget() {
    let harness = HarnessBuilder::new().with_matches(1..=3).build();
    let alice = TestFixtures::participant_1();
    harness.store.save_working_roster(alice, TestFixtures::xi_with_swaps(0)).await.unwrap();

    let opener = harness.sweep_at(1).await;
    assert_eq!(opener.outcome(alice, MatchId(1)), Some(&LockOutcome::FreeTransition { substitutions: 0 }));

    harness.store.save_working_roster(alice, TestFixtures::xi_with_swaps(2)).await.unwrap();
    let second = harness.sweep_at(2).await;
    assert_eq!(
        second.outcome(alice, MatchId(2)),
        Some(&LockOutcome::Locked { substitutions: 2, used: 2, cap: 100 })
    );

    let ledger = harness.store.ledger(alice).await.unwrap();
    assert_eq!(ledger, SubstitutionLedger { phase: Some(Phase::Group), used: 2 });
    let snapshot = harness.store.snapshot(alice, MatchId(2)).await.unwrap().unwrap();
    assert_eq!(snapshot.substitutions, 2);
    assert_eq!(snapshot.captain, AthleteId::new("b1"));
}

/// Cap 30, ledger at 28, a three-player swap must not go through
#[tokio::test]
async fn test_budget_exceeded_relocks_prior_roster() {
    let harness = HarnessBuilder::new().with_matches(41..=43).build();
    let alice = TestFixtures::participant_1();
    TestHelpers::seed_snapshot(
        &harness.store,
        alice,
        41,
        &TestFixtures::BASE_XI,
        SubstitutionLedger { phase: Some(Phase::SuperStage), used: 28 },
    )
    .await;

    harness.store.save_working_roster(alice, TestFixtures::xi_with_swaps(3)).await.unwrap();
    let report = harness.sweep_at(42).await;
    assert_eq!(
        report.outcome(alice, MatchId(42)),
        Some(&LockOutcome::BudgetExceeded { attempted: 3, used: 28, cap: 30 })
    );

    let relocked = harness.store.snapshot(alice, MatchId(42)).await.unwrap().unwrap();
    assert_eq!(relocked.origin, SnapshotOrigin::CarriedForward);
    assert_eq!(relocked.players, TestFixtures::ids(&TestFixtures::BASE_XI));
    assert_eq!(harness.store.ledger(alice).await.unwrap().used, 28);

    // Two swaps land exactly on the cap
    harness.store.save_working_roster(alice, TestFixtures::xi_with_swaps(2)).await.unwrap();
    let report = harness.sweep_at(43).await;
    assert_eq!(
        report.outcome(alice, MatchId(43)),
        Some(&LockOutcome::Locked { substitutions: 2, used: 30, cap: 30 })
    );
}

/// Matches 1, 41 and 53 open a phase: no cap, and the ledger resets
#[tokio::test]
async fn test_free_transitions_reset_the_ledger() {
    let harness = HarnessBuilder::new().with_matches([1, 2, 41, 42, 53, 54]).build();
    let alice = TestFixtures::participant_1();
    let store = &harness.store;

    let steps: [(u32, usize, LockOutcome); 6] = [
        (1, 0, LockOutcome::FreeTransition { substitutions: 0 }),
        (2, 3, LockOutcome::Locked { substitutions: 3, used: 3, cap: 100 }),
        (41, 7, LockOutcome::FreeTransition { substitutions: 4 }),
        (42, 6, LockOutcome::Locked { substitutions: 1, used: 1, cap: 30 }),
        (53, 0, LockOutcome::FreeTransition { substitutions: 6 }),
        (54, 1, LockOutcome::Locked { substitutions: 1, used: 1, cap: 5 }),
    ];
    for (match_number, swaps, expected) in steps {
        store.save_working_roster(alice, TestFixtures::xi_with_swaps(swaps)).await.unwrap();
        let report = harness.sweep_at(match_number).await;
        assert_eq!(report.outcome(alice, MatchId(match_number)), Some(&expected), "match {match_number}");
    }

    assert_eq!(
        store.ledger(alice).await.unwrap(),
        SubstitutionLedger { phase: Some(Phase::Knockout), used: 1 }
    );
}

/// A participant who misses match 41 starts the super stage from zero
#[tokio::test]
async fn test_missed_free_transition_still_resets_usage() {
    let harness = HarnessBuilder::new().with_matches([40, 41, 42]).build();
    let alice = TestFixtures::participant_1();
    TestHelpers::seed_snapshot(
        &harness.store,
        alice,
        40,
        &TestFixtures::BASE_XI,
        SubstitutionLedger { phase: Some(Phase::Group), used: 90 },
    )
    .await;

    // No sweep ran during match 41's window
    harness.store.save_working_roster(alice, TestFixtures::xi_with_swaps(5)).await.unwrap();
    let report = harness.sweep_at(42).await;

    assert_eq!(
        report.outcome(alice, MatchId(42)),
        Some(&LockOutcome::Locked { substitutions: 5, used: 5, cap: 30 })
    );
    let missed = harness.engine.missed_locks(TestFixtures::kickoff(43)).await.unwrap();
    assert_eq!(missed.len(), 1);
    assert_eq!(missed[0].match_id, MatchId(41));
    assert_eq!(missed[0].reason, None);
}

/// Delta is measured against the last snapshot, not the previous match
#[tokio::test]
async fn test_delta_spans_unlocked_matches() {
    let harness = HarnessBuilder::new().with_matches(1..=4).build();
    let alice = TestFixtures::participant_1();
    harness.store.save_working_roster(alice, TestFixtures::xi_with_swaps(0)).await.unwrap();
    harness.sweep_at(1).await;

    // Captain cleared during matches 2 and 3: those locks are skipped
    harness
        .store
        .save_working_roster(
            alice,
            WorkingRoster::from_parts(TestFixtures::ids(&TestFixtures::BASE_XI), None, None),
        )
        .await
        .unwrap();
    for number in [2, 3] {
        let report = harness.sweep_at(number).await;
        assert_eq!(report.outcome(alice, MatchId(number)), Some(&LockOutcome::MissingLeadership));
    }

    harness.store.save_working_roster(alice, TestFixtures::xi_with_swaps(2)).await.unwrap();
    let report = harness.sweep_at(4).await;
    assert_eq!(
        report.outcome(alice, MatchId(4)),
        Some(&LockOutcome::Locked { substitutions: 2, used: 2, cap: 100 })
    );
    let previous = harness.store.previous_snapshot(alice, MatchId(4)).await.unwrap().unwrap();
    assert_eq!(previous.match_id, MatchId(1));

    // The skipped windows stay reported after the later lock
    let missed = harness.engine.missed_locks(TestFixtures::kickoff(5)).await.unwrap();
    let missed: Vec<_> = missed.iter().map(|m| (m.match_id.number(), m.reason)).collect();
    assert_eq!(
        missed,
        vec![(2, Some(SkipReason::MissingLeadership)), (3, Some(SkipReason::MissingLeadership))]
    );
}

/// Auto-assign fills leadership for a full roster only
#[tokio::test]
async fn test_auto_assign_policy() {
    let config = EngineConfig { leadership_policy: LeadershipPolicy::AutoAssign, ..EngineConfig::default() };
    let harness = HarnessBuilder::new().with_matches([1]).with_config(config).build();
    let (full, short) = (TestFixtures::participant_1(), TestFixtures::participant_2());
    harness
        .store
        .save_working_roster(full, WorkingRoster::from_parts(TestFixtures::ids(&TestFixtures::BASE_XI), None, None))
        .await
        .unwrap();
    harness
        .store
        .save_working_roster(short, WorkingRoster::from_parts(TestFixtures::ids(&["k1", "b1"]), None, None))
        .await
        .unwrap();

    let report = harness.sweep_at(1).await;
    assert!(report.outcome(full, MatchId(1)).is_some_and(LockOutcome::committed));
    assert_eq!(report.outcome(short, MatchId(1)), Some(&LockOutcome::MissingLeadership));

    let snapshot = harness.store.snapshot(full, MatchId(1)).await.unwrap().unwrap();
    assert_eq!(snapshot.captain, AthleteId::new("k1"));
    assert_eq!(snapshot.vice_captain, AthleteId::new("b1"));
}

/// Two sweeps racing over the same match write one snapshot each
#[tokio::test]
async fn test_concurrent_sweeps_do_not_double_count() {
    let harness = Arc::new(HarnessBuilder::new().with_matches(1..=2).build());
    let participants = [TestFixtures::participant_1(), TestFixtures::participant_2(), TestFixtures::participant_3()];
    for participant in participants {
        harness.store.save_working_roster(participant, TestFixtures::xi_with_swaps(0)).await.unwrap();
    }
    harness.sweep_at(1).await;
    for participant in participants {
        harness.store.save_working_roster(participant, TestFixtures::xi_with_swaps(4)).await.unwrap();
    }

    let (first, second) = tokio::join!(harness.sweep_at(2), harness.sweep_at(2));

    for participant in participants {
        let outcomes = [first.outcome(participant, MatchId(2)), second.outcome(participant, MatchId(2))];
        let committed = outcomes.iter().filter(|o| o.is_some_and(LockOutcome::committed)).count();
        assert_eq!(committed, 1);
        assert!(outcomes.contains(&Some(&LockOutcome::AlreadyLocked)));
        assert_eq!(harness.store.ledger(participant).await.unwrap().used, 4);
    }
}

/// Substitution-remaining figure tracks the next match
#[tokio::test]
async fn test_remaining_figure() {
    let harness = HarnessBuilder::new().with_matches([1, 2, 40, 41]).build();
    let alice = TestFixtures::participant_1();
    harness.store.save_working_roster(alice, TestFixtures::xi_with_swaps(0)).await.unwrap();
    harness.sweep_at(1).await;
    harness.store.save_working_roster(alice, TestFixtures::xi_with_swaps(6)).await.unwrap();
    harness.sweep_at(2).await;

    let figure = harness
        .engine
        .substitutions_remaining(alice, TestFixtures::kickoff(2) + Duration::hours(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(figure.match_id, MatchId(40));
    assert_eq!(figure.remaining, Remaining::Limited(94));

    let at_transition = harness
        .engine
        .substitutions_remaining(alice, TestFixtures::kickoff(40))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(at_transition.remaining, Remaining::Unlimited);
}

/// Import, lock and score: repeated re-scoring produces the same numbers
#[tokio::test]
async fn test_import_lock_and_rescore() {
    let harness = HarnessBuilder::new().with_matches(1..=2).build();
    let alice = TestFixtures::participant_1();
    harness.store.save_working_roster(alice, TestFixtures::xi_with_swaps(0)).await.unwrap();
    harness.sweep_at(1).await;

    let importer = PerformanceImporter::new(
        Arc::clone(&harness.store),
        Arc::new(TestFixtures::catalog()),
        Arc::new(TestFixtures::schedule(1..=2)),
    );
    let rows = vec![
        // Captain: 52 off 30 with 6 fours and a six
        ImportRow {
            athlete_id: "b1".into(),
            match_id: 1,
            started: true,
            runs: Some(52),
            balls: Some(30),
            fours: Some(6),
            sixes: Some(1),
            ..Default::default()
        },
        // Five for 18 in four overs, man of the match, not rostered as leader
        ImportRow {
            athlete_id: "w1".into(),
            match_id: 1,
            started: true,
            man_of_the_match: true,
            overs: Some(4.0),
            runs_conceded: Some(18),
            wickets: Some(5),
            ..Default::default()
        },
        // Vice-captain took two catches
        ImportRow { athlete_id: "k1".into(), match_id: 1, started: true, catches: Some(2), ..Default::default() },
    ];
    let summary = importer.import(&rows).await.unwrap();
    assert_eq!(summary.records_written, 3);

    let report = harness.rescorer.run().await.unwrap();
    assert_eq!(report.entries_written, 1);
    assert_eq!(report.missing_records, 8);

    let entry = harness.store.score(alice, MatchId(1)).await.unwrap().unwrap();
    // 88 x 2 for the captain, 174 for the bowler, (4 + 20) x 1.5 for the vice
    assert_eq!(entry.base, 88 + 174 + 24);
    assert_eq!(entry.motm_bonus, 0);
    assert_eq!(entry.total, 176 + 174 + 36);

    harness.rescorer.run().await.unwrap();
    assert_eq!(harness.store.score(alice, MatchId(1)).await.unwrap().unwrap(), entry);
    assert_eq!(harness.store.season(alice).await.unwrap().unwrap().total, entry.total as i64);
}

/// The file store carries locks across process restarts
#[tokio::test]
async fn test_file_store_sweep_is_idempotent_across_restarts() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let alice = TestFixtures::participant_1();
    let schedule = Arc::new(TestFixtures::schedule(1..=2));
    let now = TestFixtures::kickoff(1) + Duration::minutes(1);

    {
        let store = Arc::new(JsonFileStore::open(temp_dir.path()).await.unwrap());
        store.save_working_roster(alice, TestFixtures::xi_with_swaps(0)).await.unwrap();
        let engine = LockEngine::new(Arc::clone(&store), Arc::clone(&store), Arc::clone(&schedule), EngineConfig::default());
        let report = engine.sweep(now).await.unwrap();
        assert_eq!(report.committed(), 1);
    }

    let store = Arc::new(JsonFileStore::open(temp_dir.path()).await.unwrap());
    let engine = LockEngine::new(Arc::clone(&store), Arc::clone(&store), schedule, EngineConfig::default());
    let report = engine.sweep(now).await.unwrap();
    assert_eq!(report.outcome(alice, MatchId(1)), Some(&LockOutcome::AlreadyLocked));
    assert_eq!(store.snapshots(alice).await.unwrap().len(), 1);
}
