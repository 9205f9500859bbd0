//! Lock engine
//!
//! Freezes working rosters into snapshots at each match's lock instant and
//! keeps the substitution ledger in step. A sweep is idempotent: running it
//! again at the same instant writes nothing new.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;

use shared::{
    MatchId, ParticipantId, Phase, ProcessId, RosterLimits, Schedule, SnapshotOrigin, logging, process_debug,
    process_info, process_warn,
};

use crate::config::EngineConfig;
use crate::core::{LockInput, LockOutcome, LockPlan, PhaseBudget, Remaining, SkipReason, plan_lock};
use crate::error::{EngineError, EngineResult};
use crate::traits::{CommitOutcome, LockCommit, RosterStore, SnapshotStore};

/// Outcome for one (participant, match) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockResult {
    pub participant: ParticipantId,
    pub match_id: MatchId,
    #[serde(flatten)]
    pub outcome: LockOutcome,
}

/// Everything one sweep did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub matches: Vec<MatchId>,
    pub results: Vec<LockResult>,
}

impl SweepReport {
    pub fn count(&self, predicate: impl Fn(&LockOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| predicate(&r.outcome)).count()
    }

    /// Snapshots written by this sweep
    pub fn committed(&self) -> usize {
        self.count(LockOutcome::committed)
    }

    pub fn failures(&self) -> usize {
        self.count(LockOutcome::is_failure)
    }

    pub fn outcome(&self, participant: ParticipantId, match_id: MatchId) -> Option<&LockOutcome> {
        self.results
            .iter()
            .find(|r| r.participant == participant && r.match_id == match_id)
            .map(|r| &r.outcome)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} match(es), {} committed, {} already locked, {} exceeded budget, {} skipped, {} failed",
            self.matches.len(),
            self.committed(),
            self.count(|o| matches!(o, LockOutcome::AlreadyLocked)),
            self.count(|o| matches!(o, LockOutcome::BudgetExceeded { .. })),
            self.count(|o| {
                matches!(
                    o,
                    LockOutcome::NoRoster
                        | LockOutcome::MissingLeadership
                        | LockOutcome::Superseded { .. }
                        | LockOutcome::Deferred
                )
            }),
            self.failures(),
        )
    }
}

/// A closed lock window with no snapshot for the participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MissedLock {
    pub participant: ParticipantId,
    pub match_id: MatchId,
    /// Last thing a sweep saw for the pair; `None` when no sweep reached it
    /// inside its window
    pub reason: Option<SkipReason>,
}

/// Substitutions available at the next match still open for edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemainingFigure {
    pub match_id: MatchId,
    pub phase: Phase,
    pub remaining: Remaining,
}

/// Time-triggered lock engine
pub struct LockEngine<R, S>
where
    R: RosterStore + 'static,
    S: SnapshotStore + 'static,
{
    rosters: Arc<R>,
    snapshots: Arc<S>,
    schedule: Arc<Schedule>,
    config: EngineConfig,
    /// Serialises plan-and-commit per participant across concurrent sweeps
    guards: Mutex<HashMap<ParticipantId, Arc<Mutex<()>>>>,
}

impl<R, S> LockEngine<R, S>
where
    R: RosterStore + 'static,
    S: SnapshotStore + 'static,
{
    pub fn new(rosters: Arc<R>, snapshots: Arc<S>, schedule: Arc<Schedule>, config: EngineConfig) -> Self {
        Self {
            rosters,
            snapshots,
            schedule,
            config,
            guards: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Lock every participant for every match whose window is open at `now`.
    ///
    /// Matches go in ascending order; participants within one match run
    /// concurrently. Per-participant problems are reported, never raised.
    pub async fn sweep(&self, now: DateTime<Utc>) -> EngineResult<SweepReport> {
        let due: Vec<MatchId> = self
            .schedule
            .lockable_at(now, self.config.lock_window)
            .into_iter()
            .map(|m| m.id)
            .collect();
        let mut report = SweepReport { matches: due.clone(), results: Vec::new() };
        if due.is_empty() {
            process_debug!(ProcessId::current(), "💤 No lock window open at {}", now.to_rfc3339());
            return Ok(report);
        }

        let participants = self.rosters.participants().await?;
        logging::log_progress(
            ProcessId::current(),
            "Lock sweep",
            &format!("{} match(es), {} participant(s)", due.len(), participants.len()),
        );

        // Participants that must not move past a match they failed to lock
        let mut blocked: HashSet<ParticipantId> = HashSet::new();

        for match_id in due {
            let budget = self.config.phase_rules.budget_for(match_id);
            let blocked_ref = &blocked;

            let mut results: Vec<LockResult> = stream::iter(participants.iter().copied())
                .map(|participant| async move {
                    let outcome = if blocked_ref.contains(&participant) {
                        LockOutcome::Deferred
                    } else {
                        self.lock_participant(participant, match_id, budget, now).await
                    };
                    LockResult { participant, match_id, outcome }
                })
                .buffer_unordered(self.config.max_concurrency)
                .collect()
                .await;

            results.sort_by_key(|r| r.participant);
            for result in &results {
                if matches!(result.outcome, LockOutcome::Failed { .. } | LockOutcome::Deferred) {
                    blocked.insert(result.participant);
                }
            }
            report.results.extend(results);
        }

        if report.failures() > 0 {
            process_warn!(ProcessId::current(), "⚠️ Lock sweep finished with failures: {}", report.summary());
        } else {
            logging::log_success(ProcessId::current(), &format!("Lock sweep: {}", report.summary()));
        }
        Ok(report)
    }

    /// Lock one participant for one match; errors become `Failed`
    pub async fn lock_participant(
        &self,
        participant: ParticipantId,
        match_id: MatchId,
        budget: PhaseBudget,
        now: DateTime<Utc>,
    ) -> LockOutcome {
        let guard = self.guard_for(participant).await;
        let _held = guard.lock().await;

        let outcome = match self.try_lock(participant, match_id, budget, now).await {
            Ok(outcome) => outcome,
            Err(e) => {
                logging::log_error(ProcessId::current(), &format!("Lock {participant} at {match_id}"), &e);
                LockOutcome::Failed { reason: e.to_string() }
            }
        };
        log_outcome(participant, match_id, &outcome);
        outcome
    }

    async fn guard_for(&self, participant: ParticipantId) -> Arc<Mutex<()>> {
        let mut guards = self.guards.lock().await;
        Arc::clone(guards.entry(participant).or_default())
    }

    async fn try_lock(
        &self,
        participant: ParticipantId,
        match_id: MatchId,
        budget: PhaseBudget,
        now: DateTime<Utc>,
    ) -> EngineResult<LockOutcome> {
        for attempt in 1..=self.config.commit_retries {
            if self.snapshots.snapshot(participant, match_id).await?.is_some() {
                return Ok(LockOutcome::AlreadyLocked);
            }
            if let Some(latest) = self.snapshots.latest_snapshot(participant).await? {
                if latest.match_id > match_id {
                    return Ok(LockOutcome::Superseded { later: latest.match_id });
                }
            }

            let roster = self.rosters.working_roster(participant).await?;
            let previous = self.snapshots.previous_snapshot(participant, match_id).await?;
            let ledger = self.snapshots.ledger(participant).await?;

            let plan = plan_lock(LockInput {
                match_id,
                budget,
                roster: roster.as_ref(),
                previous: previous.as_ref(),
                ledger,
                policy: self.config.leadership_policy,
                locked_at: now,
            });

            let (snapshot, next_ledger, outcome) = match plan {
                LockPlan::Skip(outcome) => {
                    self.record_skip(participant, match_id, &outcome).await;
                    return Ok(outcome);
                }
                LockPlan::Commit { snapshot, ledger, outcome } => (snapshot, ledger, outcome),
            };
            if snapshot.origin == SnapshotOrigin::Roster && snapshot.players.len() < RosterLimits::SIZE {
                process_warn!(
                    ProcessId::current(),
                    "⚠️ Locking incomplete roster for {} at {}: {} of {} players",
                    participant,
                    match_id,
                    snapshot.players.len(),
                    RosterLimits::SIZE
                );
            }

            let commit = LockCommit { participant, snapshot, ledger: next_ledger, expected_ledger: ledger };
            match self.snapshots.commit_lock(commit).await? {
                CommitOutcome::Committed => return Ok(outcome),
                CommitOutcome::AlreadyLocked => return Ok(LockOutcome::AlreadyLocked),
                CommitOutcome::LedgerConflict => {
                    process_warn!(
                        ProcessId::current(),
                        "🔁 Ledger moved for {} at {} (attempt {}/{})",
                        participant,
                        match_id,
                        attempt,
                        self.config.commit_retries
                    );
                }
            }
        }

        Err(EngineError::CommitFailed {
            participant,
            match_id,
            message: format!("ledger changed on each of {} attempts", self.config.commit_retries),
        })
    }

    /// Skips are a reported state; a marker that cannot be stored only
    /// loses the reason in the missed-lock report
    async fn record_skip(&self, participant: ParticipantId, match_id: MatchId, outcome: &LockOutcome) {
        let Some(reason) = outcome.skip_reason() else {
            return;
        };
        if let Err(e) = self.snapshots.record_skip(participant, match_id, reason).await {
            logging::log_error(ProcessId::current(), &format!("Skip marker for {participant} at {match_id}"), &e);
        }
    }

    /// Closed lock windows that produced no snapshot.
    ///
    /// A participant is tracked from the first match a sweep saw them at,
    /// locked or skipped. From there every closed window without a snapshot
    /// is missed, carrying the stored skip reason when there is one.
    pub async fn missed_locks(&self, now: DateTime<Utc>) -> EngineResult<Vec<MissedLock>> {
        let closed: Vec<MatchId> = self
            .schedule
            .closed_at(now, self.config.lock_window)
            .into_iter()
            .map(|m| m.id)
            .collect();
        let mut missed = Vec::new();

        for participant in self.rosters.participants().await? {
            let locked: HashSet<MatchId> = self
                .snapshots
                .snapshots(participant)
                .await?
                .into_iter()
                .map(|s| s.match_id)
                .collect();
            let skipped: HashMap<MatchId, SkipReason> = self.snapshots.skips(participant).await?.into_iter().collect();

            let Some(first) = locked.iter().chain(skipped.keys()).min().copied() else {
                continue;
            };

            missed.extend(
                closed
                    .iter()
                    .filter(|id| **id >= first && !locked.contains(id))
                    .map(|&match_id| MissedLock { participant, match_id, reason: skipped.get(&match_id).copied() }),
            );
        }

        if !missed.is_empty() {
            process_info!(ProcessId::current(), "📭 {} missed lock(s) up to {}", missed.len(), now.to_rfc3339());
        }
        Ok(missed)
    }

    /// Substitution-remaining figure for the next match not yet at its lock
    /// instant; `None` once the schedule is exhausted.
    pub async fn substitutions_remaining(
        &self,
        participant: ParticipantId,
        now: DateTime<Utc>,
    ) -> EngineResult<Option<RemainingFigure>> {
        let Some(next) = self.schedule.next_unlocked(now) else {
            return Ok(None);
        };
        let ledger = self.snapshots.ledger(participant).await?;
        let rules = &self.config.phase_rules;

        Ok(Some(RemainingFigure {
            match_id: next.id,
            phase: rules.phase_of(next.id),
            remaining: rules.remaining(next.id, &ledger),
        }))
    }
}

fn log_outcome(participant: ParticipantId, match_id: MatchId, outcome: &LockOutcome) {
    match outcome {
        LockOutcome::BudgetExceeded { attempted, used, cap } => process_warn!(
            ProcessId::current(),
            "⛔ {} at {}: {} change(s) would exceed {}/{}, locked prior roster",
            participant,
            match_id,
            attempted,
            used,
            cap
        ),
        LockOutcome::MissingLeadership => process_warn!(
            ProcessId::current(),
            "⚠️ {} at {}: captain or vice-captain missing, not locked",
            participant,
            match_id
        ),
        // Already reported through log_error
        LockOutcome::Failed { .. } => {}
        other => process_debug!(ProcessId::current(), "🔒 {} at {}: {:?}", participant, match_id, other),
    }
}
