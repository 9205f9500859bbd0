//! Lock planning
//!
//! Decides, for one participant and one match, what snapshot (if any) gets
//! committed and how the substitution ledger moves. No I/O happens here; the
//! lock engine feeds in what it read from the stores and commits the plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{AthleteId, LockedSnapshot, MatchId, RosterLimits, SnapshotOrigin, SubstitutionLedger, WorkingRoster};

use super::phase::{PhaseBudget, SubstitutionCap};
use super::substitution::substitution_delta;

/// What to do when a roster reaches its lock instant without leadership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadershipPolicy {
    /// Missing captain or vice-captain skips the lock
    #[default]
    Strict,
    /// A full roster gets the first player as captain and the next as vice
    AutoAssign,
}

impl std::str::FromStr for LeadershipPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(LeadershipPolicy::Strict),
            "auto-assign" | "auto_assign" | "auto" => Ok(LeadershipPolicy::AutoAssign),
            _ => Err(format!("Unknown leadership policy: {s}")),
        }
    }
}

/// Result of one (participant, match) lock attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LockOutcome {
    /// Snapshot taken from the working roster
    Locked { substitutions: u32, used: u32, cap: u32 },
    /// Opening match of a phase; no cap and the ledger was reset
    FreeTransition { substitutions: u32 },
    /// Not enough budget left; the previous snapshot was re-locked
    BudgetExceeded { attempted: u32, used: u32, cap: u32 },
    AlreadyLocked,
    NoRoster,
    MissingLeadership,
    /// A snapshot for a later match already exists
    Superseded { later: MatchId },
    /// An earlier match failed for this participant during the same sweep
    Deferred,
    Failed { reason: String },
}

impl LockOutcome {
    /// A snapshot was written by this attempt
    pub fn committed(&self) -> bool {
        matches!(
            self,
            LockOutcome::Locked { .. } | LockOutcome::FreeTransition { .. } | LockOutcome::BudgetExceeded { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, LockOutcome::Failed { .. })
    }

    /// Why nothing was locked, when the roster itself was the reason
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            LockOutcome::NoRoster => Some(SkipReason::NoRoster),
            LockOutcome::MissingLeadership => Some(SkipReason::MissingLeadership),
            _ => None,
        }
    }
}

/// Durable marker left when a sweep found no lockable roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoRoster,
    MissingLeadership,
}

/// Everything the planner needs for one decision
#[derive(Debug, Clone)]
pub struct LockInput<'a> {
    pub match_id: MatchId,
    pub budget: PhaseBudget,
    pub roster: Option<&'a WorkingRoster>,
    pub previous: Option<&'a LockedSnapshot>,
    pub ledger: SubstitutionLedger,
    pub policy: LeadershipPolicy,
    pub locked_at: DateTime<Utc>,
}

/// Planner decision
#[derive(Debug, Clone, PartialEq)]
pub enum LockPlan {
    /// Nothing to write
    Skip(LockOutcome),
    /// Write the snapshot and ledger together
    Commit {
        snapshot: LockedSnapshot,
        ledger: SubstitutionLedger,
        outcome: LockOutcome,
    },
}

/// Pick captain and vice-captain for the snapshot, or `None` when the roster
/// is not eligible to lock under `policy`.
pub fn resolve_leadership(roster: &WorkingRoster, policy: LeadershipPolicy) -> Option<(AthleteId, AthleteId)> {
    let may_default = policy == LeadershipPolicy::AutoAssign && roster.len() == RosterLimits::SIZE;

    let captain = match roster.captain().filter(|id| roster.contains(id)) {
        Some(id) => id.clone(),
        None if may_default => roster.players().first()?.clone(),
        None => return None,
    };

    let first_other = || roster.players().iter().find(|id| **id != captain).cloned();
    let vice = match roster.vice_captain().filter(|id| roster.contains(id)) {
        Some(id) if *id != captain => id.clone(),
        // Collision is resolved under either policy
        Some(_) => first_other()?,
        None if may_default => first_other()?,
        None => return None,
    };

    Some((captain, vice))
}

/// Decide the lock for one participant at one match
pub fn plan_lock(input: LockInput<'_>) -> LockPlan {
    let roster = match input.roster {
        Some(roster) if !roster.is_empty() => roster,
        _ => return LockPlan::Skip(LockOutcome::NoRoster),
    };

    let Some((captain, vice_captain)) = resolve_leadership(roster, input.policy) else {
        return LockPlan::Skip(LockOutcome::MissingLeadership);
    };

    // A participant's first XI is free wherever it lands
    let delta = input
        .previous
        .map(|previous| substitution_delta(&previous.players, roster.players()).cost())
        .unwrap_or(0);

    let phase = input.budget.phase;
    let (ledger, outcome) = match input.budget.cap {
        SubstitutionCap::Unlimited => (
            SubstitutionLedger::reset_for(phase),
            LockOutcome::FreeTransition { substitutions: delta },
        ),
        SubstitutionCap::Limited(cap) => {
            let used = input.ledger.used_in(phase);
            if let Some(previous) = input.previous.filter(|_| used + delta > cap) {
                return LockPlan::Commit {
                    snapshot: LockedSnapshot::carried_forward(previous, input.match_id, input.locked_at),
                    ledger: input.ledger,
                    outcome: LockOutcome::BudgetExceeded { attempted: delta, used, cap },
                };
            }
            (
                input.ledger.consumed(phase, delta),
                LockOutcome::Locked { substitutions: delta, used: used + delta, cap },
            )
        }
    };

    LockPlan::Commit {
        snapshot: LockedSnapshot {
            match_id: input.match_id,
            players: roster.players().to_vec(),
            captain,
            vice_captain,
            substitutions: delta,
            origin: SnapshotOrigin::Roster,
            locked_at: input.locked_at,
        },
        ledger,
        outcome,
    }
}
