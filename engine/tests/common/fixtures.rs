//! Test fixtures and data for engine tests
//!
//! A small athlete catalog that can field a valid XI plus a bench, and
//! standard participant ids.

use chrono::{DateTime, Duration, TimeZone, Utc};
use shared::{Athlete, AthleteCatalog, AthleteId, Match, MatchId, ParticipantId, Role, Schedule, WorkingRoster};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// Standard test participant IDs using proper UUID format
    pub const PARTICIPANT_1: &'static str = "550e8400-e29b-41d4-a716-446655440001";
    pub const PARTICIPANT_2: &'static str = "550e8400-e29b-41d4-a716-446655440002";
    pub const PARTICIPANT_3: &'static str = "550e8400-e29b-41d4-a716-446655440003";

    /// Starting XI; valid under every roster rule
    pub const BASE_XI: [&'static str; 11] = ["k1", "b1", "b2", "b3", "a1", "a2", "w1", "w2", "w3", "b4", "w4"];

    /// Replacements used by `xi_with_swaps`, in order
    pub const BENCH: [&'static str; 7] = ["b5", "b6", "w5", "w6", "a3", "a4", "k2"];

    pub fn participant_1() -> ParticipantId {
        ParticipantId::from_string(Self::PARTICIPANT_1).unwrap()
    }

    pub fn participant_2() -> ParticipantId {
        ParticipantId::from_string(Self::PARTICIPANT_2).unwrap()
    }

    pub fn participant_3() -> ParticipantId {
        ParticipantId::from_string(Self::PARTICIPANT_3).unwrap()
    }

    pub fn catalog() -> AthleteCatalog {
        let athlete = |id: &str, role: Role, affiliation: &str, marquee: bool| Athlete {
            id: AthleteId::new(id),
            name: id.to_uppercase(),
            role,
            affiliation: affiliation.to_string(),
            marquee,
            cost: 8.5,
        };
        AthleteCatalog::new(vec![
            athlete("k1", Role::Keeper, "IND", false),
            athlete("k2", Role::Keeper, "AUS", false),
            athlete("b1", Role::Batter, "IND", true),
            athlete("b2", Role::Batter, "AUS", false),
            athlete("b3", Role::Batter, "IND", false),
            athlete("b4", Role::Batter, "AUS", false),
            athlete("b5", Role::Batter, "IND", false),
            athlete("b6", Role::Batter, "AUS", false),
            athlete("a1", Role::AllRounder, "IND", false),
            athlete("a2", Role::AllRounder, "AUS", false),
            athlete("a3", Role::AllRounder, "IND", false),
            athlete("a4", Role::AllRounder, "AUS", false),
            athlete("w1", Role::Bowler, "IND", true),
            athlete("w2", Role::Bowler, "AUS", false),
            athlete("w3", Role::Bowler, "IND", false),
            athlete("w4", Role::Bowler, "AUS", false),
            athlete("w5", Role::Bowler, "IND", false),
            athlete("w6", Role::Bowler, "AUS", false),
        ])
        .unwrap()
    }

    pub fn ids(players: &[&str]) -> Vec<AthleteId> {
        players.iter().map(|p| AthleteId::new(*p)).collect()
    }

    /// Base XI with the last `swaps` players replaced from the bench;
    /// b1 captains and k1 is vice
    pub fn xi_with_swaps(swaps: usize) -> WorkingRoster {
        let mut players = Self::BASE_XI.to_vec();
        for (slot, replacement) in Self::BENCH.iter().take(swaps).enumerate() {
            let index = players.len() - 1 - slot;
            players[index] = replacement;
        }
        WorkingRoster::from_parts(Self::ids(&players), Some(AthleteId::new("b1")), Some(AthleteId::new("k1")))
    }

    /// Season opener kicks off 2026-03-01 14:00 UTC, one match per day
    pub fn kickoff(number: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 14, 0, 0).unwrap() + Duration::days(number as i64 - 1)
    }

    pub fn schedule(numbers: impl IntoIterator<Item = u32>) -> Schedule {
        let matches = numbers
            .into_iter()
            .map(|n| Match {
                id: MatchId(n),
                start_time: Self::kickoff(n),
                home: "IND".into(),
                away: "AUS".into(),
            })
            .collect();
        Schedule::new(matches).unwrap()
    }
}
