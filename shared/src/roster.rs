//! Roster model: the participant's mutable working roster, the frozen
//! per-match snapshot, and the phase-scoped substitution ledger.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{SharedError, SharedResult};
use crate::reference::AthleteCatalog;
use crate::types::{AthleteId, MatchId, Phase, Role};

/// Composition limits every working roster must respect
pub struct RosterLimits;

impl RosterLimits {
    pub const SIZE: usize = 11;
    pub const CREDIT_CAP: f64 = 100.0;
    pub const MAX_MARQUEE: usize = 4;
    pub const MAX_PER_AFFILIATION: usize = 6;

    /// Tolerance for summing fractional credit costs
    const CREDIT_EPSILON: f64 = 1e-9;
}

/// A participant's editable team for the next unlocked match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingRoster {
    /// Insertion order is kept so leadership defaults are deterministic
    players: Vec<AthleteId>,
    captain: Option<AthleteId>,
    vice_captain: Option<AthleteId>,
}

impl WorkingRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a roster without composition checks (stores, fixtures)
    pub fn from_parts(
        players: Vec<AthleteId>,
        captain: Option<AthleteId>,
        vice_captain: Option<AthleteId>,
    ) -> Self {
        let mut unique = Vec::with_capacity(players.len());
        for player in players {
            if !unique.contains(&player) {
                unique.push(player);
            }
        }
        Self { players: unique, captain, vice_captain }
    }

    pub fn players(&self) -> &[AthleteId] {
        &self.players
    }

    pub fn captain(&self) -> Option<&AthleteId> {
        self.captain.as_ref()
    }

    pub fn vice_captain(&self) -> Option<&AthleteId> {
        self.vice_captain.as_ref()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn contains(&self, id: &AthleteId) -> bool {
        self.players.contains(id)
    }

    pub fn has_leadership(&self) -> bool {
        self.captain.is_some() && self.vice_captain.is_some()
    }

    /// Add an athlete, rejecting any change that breaks a roster invariant
    pub fn add(&mut self, id: AthleteId, catalog: &AthleteCatalog) -> SharedResult<()> {
        catalog.require(&id)?;
        if self.contains(&id) {
            return Err(SharedError::DuplicateAthlete { id });
        }
        if self.players.len() >= RosterLimits::SIZE {
            return Err(SharedError::RosterFull { max: RosterLimits::SIZE });
        }

        let mut candidate = self.clone();
        candidate.players.push(id);
        candidate.validate(catalog)?;
        *self = candidate;
        Ok(())
    }

    /// Remove an athlete; leadership held by that athlete is cleared
    pub fn remove(&mut self, id: &AthleteId) -> SharedResult<()> {
        let position = self
            .players
            .iter()
            .position(|p| p == id)
            .ok_or_else(|| SharedError::NotInRoster { id: id.clone() })?;
        self.players.remove(position);
        if self.captain.as_ref() == Some(id) {
            self.captain = None;
        }
        if self.vice_captain.as_ref() == Some(id) {
            self.vice_captain = None;
        }
        Ok(())
    }

    pub fn set_captain(&mut self, id: AthleteId) -> SharedResult<()> {
        if !self.contains(&id) {
            return Err(SharedError::NotInRoster { id });
        }
        if self.vice_captain.as_ref() == Some(&id) {
            return Err(SharedError::LeadershipCollision { id });
        }
        self.captain = Some(id);
        Ok(())
    }

    pub fn set_vice_captain(&mut self, id: AthleteId) -> SharedResult<()> {
        if !self.contains(&id) {
            return Err(SharedError::NotInRoster { id });
        }
        if self.captain.as_ref() == Some(&id) {
            return Err(SharedError::LeadershipCollision { id });
        }
        self.vice_captain = Some(id);
        Ok(())
    }

    /// Check every invariant that must hold at all times.
    ///
    /// Role minimums are checked as feasibility: the open slots must still
    /// be able to cover every role shortfall.
    pub fn validate(&self, catalog: &AthleteCatalog) -> SharedResult<()> {
        match self.violations(catalog).into_iter().next() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }

    /// Every invariant violation, in a stable order
    pub fn violations(&self, catalog: &AthleteCatalog) -> Vec<SharedError> {
        let mut violations = Vec::new();

        if self.players.len() > RosterLimits::SIZE {
            violations.push(SharedError::RosterFull { max: RosterLimits::SIZE });
        }
        for id in [&self.captain, &self.vice_captain].into_iter().flatten() {
            if !self.contains(id) {
                violations.push(SharedError::NotInRoster { id: id.clone() });
            }
        }
        if let (Some(captain), Some(vice)) = (&self.captain, &self.vice_captain) {
            if captain == vice {
                violations.push(SharedError::LeadershipCollision { id: captain.clone() });
            }
        }

        let mut total_cost = 0.0;
        let mut marquee = 0;
        let mut per_affiliation: HashMap<&str, usize> = HashMap::new();
        let mut per_role: HashMap<Role, usize> = HashMap::new();
        for id in &self.players {
            let Some(athlete) = catalog.get(id) else {
                violations.push(SharedError::UnknownAthlete { id: id.clone() });
                continue;
            };
            total_cost += athlete.cost;
            if athlete.marquee {
                marquee += 1;
            }
            *per_affiliation.entry(athlete.affiliation.as_str()).or_default() += 1;
            *per_role.entry(athlete.role).or_default() += 1;
        }

        if total_cost > RosterLimits::CREDIT_CAP + RosterLimits::CREDIT_EPSILON {
            violations.push(SharedError::BudgetExceeded { total: total_cost, cap: RosterLimits::CREDIT_CAP });
        }
        if marquee > RosterLimits::MAX_MARQUEE {
            violations.push(SharedError::TooManyMarquee { count: marquee, max: RosterLimits::MAX_MARQUEE });
        }
        let mut crowded: Vec<_> = per_affiliation
            .into_iter()
            .filter(|(_, count)| *count > RosterLimits::MAX_PER_AFFILIATION)
            .collect();
        crowded.sort();
        for (affiliation, count) in crowded {
            violations.push(SharedError::TooManyFromAffiliation {
                affiliation: affiliation.to_string(),
                count,
                max: RosterLimits::MAX_PER_AFFILIATION,
            });
        }

        let open_slots = RosterLimits::SIZE.saturating_sub(self.players.len());
        let shortfall: usize = Role::ALL
            .iter()
            .map(|role| role.minimum().saturating_sub(per_role.get(role).copied().unwrap_or(0)))
            .sum();
        if shortfall > open_slots {
            for role in Role::ALL {
                let count = per_role.get(&role).copied().unwrap_or(0);
                if count < role.minimum() {
                    violations.push(SharedError::RoleShortfall { role, count, min: role.minimum() });
                }
            }
        }

        violations
    }

    /// Valid, full, and with both leaders; the error names what is missing
    pub fn require_complete(&self, catalog: &AthleteCatalog) -> SharedResult<()> {
        self.validate(catalog)?;
        if self.players.len() < RosterLimits::SIZE {
            return Err(SharedError::Incomplete { size: self.players.len(), required: RosterLimits::SIZE });
        }
        if self.captain.is_none() {
            return Err(SharedError::MissingCaptain);
        }
        if self.vice_captain.is_none() {
            return Err(SharedError::MissingViceCaptain);
        }
        Ok(())
    }

    pub fn is_complete(&self, catalog: &AthleteCatalog) -> bool {
        self.require_complete(catalog).is_ok()
    }
}

/// How a snapshot came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotOrigin {
    /// Taken from the working roster
    Roster,
    /// Budget exceeded; the previous snapshot was re-locked unchanged
    CarriedForward,
}

/// Immutable roster frozen at a match's lock instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedSnapshot {
    pub match_id: MatchId,
    pub players: Vec<AthleteId>,
    pub captain: AthleteId,
    pub vice_captain: AthleteId,
    /// Substitutions consumed relative to the previous snapshot
    pub substitutions: u32,
    pub origin: SnapshotOrigin,
    pub locked_at: DateTime<Utc>,
}

impl LockedSnapshot {
    /// Re-lock `previous` for `match_id` with no substitutions applied
    pub fn carried_forward(previous: &LockedSnapshot, match_id: MatchId, locked_at: DateTime<Utc>) -> Self {
        Self {
            match_id,
            players: previous.players.clone(),
            captain: previous.captain.clone(),
            vice_captain: previous.vice_captain.clone(),
            substitutions: 0,
            origin: SnapshotOrigin::CarriedForward,
            locked_at,
        }
    }

    pub fn is_captain(&self, id: &AthleteId) -> bool {
        &self.captain == id
    }

    pub fn is_vice_captain(&self, id: &AthleteId) -> bool {
        &self.vice_captain == id
    }

    /// Same players and captaincy, ignoring match and bookkeeping fields
    pub fn same_lineup(&self, other: &LockedSnapshot) -> bool {
        self.players == other.players && self.captain == other.captain && self.vice_captain == other.vice_captain
    }
}

/// Substitutions consumed since the start of the current phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionLedger {
    /// Phase the ledger was last reset for; `None` before the first lock
    pub phase: Option<Phase>,
    pub used: u32,
}

impl SubstitutionLedger {
    /// Usage that counts against `phase`; a ledger for another phase counts as zero
    pub fn used_in(&self, phase: Phase) -> u32 {
        if self.phase == Some(phase) { self.used } else { 0 }
    }

    /// Ledger reset to zero for `phase`
    pub fn reset_for(phase: Phase) -> Self {
        Self { phase: Some(phase), used: 0 }
    }

    /// Ledger after consuming `delta` in `phase`, resetting first on a phase change
    pub fn consumed(&self, phase: Phase, delta: u32) -> Self {
        Self { phase: Some(phase), used: self.used_in(phase) + delta }
    }
}
