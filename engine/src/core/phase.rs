//! Phase and substitution budget calculator
//!
//! The season is split into contiguous phases by match number. Each phase
//! has a season-long substitution cap; the first match of a phase is a free
//! transition with no cap at all.

use serde::{Deserialize, Serialize};
use shared::{MatchId, Phase, SubstitutionLedger};

/// Substitution cap enforced at a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubstitutionCap {
    /// Free transition: any number of changes, ledger resets
    Unlimited,
    /// Total changes allowed across the phase
    Limited(u32),
}

/// Phase a match belongs to and the cap it enforces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseBudget {
    pub phase: Phase,
    pub cap: SubstitutionCap,
}

impl PhaseBudget {
    pub fn is_free_transition(&self) -> bool {
        self.cap == SubstitutionCap::Unlimited
    }
}

/// Substitutions a participant may still make, for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Remaining {
    Unlimited,
    Limited(u32),
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Remaining::Unlimited => write!(f, "unlimited"),
            Remaining::Limited(n) => write!(f, "{n}"),
        }
    }
}

/// Phase boundaries and caps for a season
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseRules {
    /// First match number of the super stage
    pub super_stage_start: u32,
    /// First match number of the knockouts
    pub knockout_start: u32,
    pub group_cap: u32,
    pub super_stage_cap: u32,
    pub knockout_cap: u32,
}

impl Default for PhaseRules {
    fn default() -> Self {
        Self {
            super_stage_start: 41,
            knockout_start: 53,
            group_cap: 100,
            super_stage_cap: 30,
            knockout_cap: 5,
        }
    }
}

impl PhaseRules {
    pub fn phase_of(&self, match_id: MatchId) -> Phase {
        let number = match_id.number();
        if number >= self.knockout_start {
            Phase::Knockout
        } else if number >= self.super_stage_start {
            Phase::SuperStage
        } else {
            Phase::Group
        }
    }

    /// Opening match of a phase
    pub fn first_match_of(&self, phase: Phase) -> MatchId {
        match phase {
            Phase::Group => MatchId(1),
            Phase::SuperStage => MatchId(self.super_stage_start),
            Phase::Knockout => MatchId(self.knockout_start),
        }
    }

    fn phase_cap(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Group => self.group_cap,
            Phase::SuperStage => self.super_stage_cap,
            Phase::Knockout => self.knockout_cap,
        }
    }

    pub fn budget_for(&self, match_id: MatchId) -> PhaseBudget {
        let phase = self.phase_of(match_id);
        let cap = if self.first_match_of(phase) == match_id {
            SubstitutionCap::Unlimited
        } else {
            SubstitutionCap::Limited(self.phase_cap(phase))
        };
        PhaseBudget { phase, cap }
    }

    /// Changes still available at `match_id` given the participant's ledger
    pub fn remaining(&self, match_id: MatchId, ledger: &SubstitutionLedger) -> Remaining {
        let budget = self.budget_for(match_id);
        match budget.cap {
            SubstitutionCap::Unlimited => Remaining::Unlimited,
            SubstitutionCap::Limited(cap) => Remaining::Limited(cap.saturating_sub(ledger.used_in(budget.phase))),
        }
    }
}
