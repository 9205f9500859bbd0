//! Substitution delta between two player sets

use std::collections::HashSet;

use shared::AthleteId;

/// Players that left and joined between two lineups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionDelta {
    pub removed: Vec<AthleteId>,
    pub added: Vec<AthleteId>,
}

impl SubstitutionDelta {
    /// Changes charged against the budget; a one-for-one swap costs 1
    pub fn cost(&self) -> u32 {
        self.removed.len().max(self.added.len()) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

/// Compare the previous lineup with the current one
pub fn substitution_delta(previous: &[AthleteId], current: &[AthleteId]) -> SubstitutionDelta {
    let before: HashSet<&AthleteId> = previous.iter().collect();
    let after: HashSet<&AthleteId> = current.iter().collect();

    SubstitutionDelta {
        removed: previous.iter().filter(|id| !after.contains(id)).cloned().collect(),
        added: current.iter().filter(|id| !before.contains(id)).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<AthleteId> {
        names.iter().map(|n| AthleteId::new(*n)).collect()
    }

    #[test]
    fn test_swap_costs_one() {
        let delta = substitution_delta(&ids(&["a", "b", "c"]), &ids(&["a", "b", "d"]));
        assert_eq!(delta.removed, ids(&["c"]));
        assert_eq!(delta.added, ids(&["d"]));
        assert_eq!(delta.cost(), 1);
    }

    #[test]
    fn test_cost_is_symmetric() {
        let before = ids(&["a", "b", "c", "d"]);
        let after = ids(&["a", "x", "y", "z"]);
        assert_eq!(substitution_delta(&before, &after).cost(), 3);
        assert_eq!(substitution_delta(&after, &before).cost(), 3);
    }

    #[test]
    fn test_uneven_sizes_take_the_larger_side() {
        // Dropping two and adding one costs 2
        let delta = substitution_delta(&ids(&["a", "b", "c"]), &ids(&["a", "d"]));
        assert_eq!(delta.cost(), 2);

        // Growing an empty lineup to three costs 3
        let delta = substitution_delta(&[], &ids(&["a", "b", "c"]));
        assert_eq!(delta.cost(), 3);
    }

    #[test]
    fn test_reordering_is_free() {
        let delta = substitution_delta(&ids(&["a", "b", "c"]), &ids(&["c", "a", "b"]));
        assert!(delta.is_empty());
        assert_eq!(delta.cost(), 0);
    }
}
