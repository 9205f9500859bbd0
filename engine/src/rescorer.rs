//! Re-scoring job
//!
//! Recomputes every (participant, match) score entry from the locked
//! snapshots and the current performance records, then rebuilds each
//! participant's season total. Running it twice writes the same values.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use shared::{
    AthleteCatalog, AthleteId, MatchId, ParticipantId, PerformanceRecord, ProcessId, SeasonScore, logging,
    process_debug,
};

use crate::core::score_team;
use crate::error::EngineResult;
use crate::traits::{PerformanceStore, ScoreStore, SnapshotStore};

/// A participant whose scores could not be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RescoreFailure {
    pub participant: ParticipantId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RescoreReport {
    pub participants: usize,
    pub entries_written: usize,
    /// Rostered athletes with no record (or no catalog entry) for their match
    pub missing_records: usize,
    pub failures: Vec<RescoreFailure>,
}

impl RescoreReport {
    pub fn summary(&self) -> String {
        format!(
            "{} participant(s), {} entries written, {} missing record(s), {} failure(s)",
            self.participants,
            self.entries_written,
            self.missing_records,
            self.failures.len()
        )
    }
}

type MatchRecords = HashMap<AthleteId, PerformanceRecord>;

pub struct RescoringJob<S, P, C>
where
    S: SnapshotStore + 'static,
    P: PerformanceStore + 'static,
    C: ScoreStore + 'static,
{
    snapshots: Arc<S>,
    performance: Arc<P>,
    scores: Arc<C>,
    catalog: Arc<AthleteCatalog>,
}

impl<S, P, C> RescoringJob<S, P, C>
where
    S: SnapshotStore + 'static,
    P: PerformanceStore + 'static,
    C: ScoreStore + 'static,
{
    pub fn new(snapshots: Arc<S>, performance: Arc<P>, scores: Arc<C>, catalog: Arc<AthleteCatalog>) -> Self {
        Self { snapshots, performance, scores, catalog }
    }

    /// Score every snapshot; a failing participant is reported and skipped
    pub async fn run(&self) -> EngineResult<RescoreReport> {
        let participants = self.snapshots.locked_participants().await?;
        logging::log_progress(ProcessId::current(), "Re-scoring", &format!("{} participant(s)", participants.len()));

        let mut report = RescoreReport::default();
        let mut records: HashMap<MatchId, MatchRecords> = HashMap::new();

        for participant in participants {
            match self.rescore_participant(participant, &mut records, &mut report).await {
                Ok(season) => {
                    report.participants += 1;
                    process_debug!(
                        ProcessId::current(),
                        "🧮 {}: {} match(es), {} points",
                        participant,
                        season.matches_scored,
                        season.total
                    );
                }
                Err(e) => {
                    logging::log_error(ProcessId::current(), &format!("Re-scoring {participant}"), &e);
                    report.failures.push(RescoreFailure { participant, reason: e.to_string() });
                }
            }
        }

        logging::log_success(ProcessId::current(), &format!("Re-scoring: {}", report.summary()));
        Ok(report)
    }

    async fn rescore_participant(
        &self,
        participant: ParticipantId,
        records: &mut HashMap<MatchId, MatchRecords>,
        report: &mut RescoreReport,
    ) -> EngineResult<SeasonScore> {
        let mut season = SeasonScore::default();
        let mut entries = Vec::new();
        let mut missing = 0;

        for snapshot in self.snapshots.snapshots(participant).await? {
            if !records.contains_key(&snapshot.match_id) {
                let fetched = self.performance.records_for_match(snapshot.match_id).await?;
                records.insert(snapshot.match_id, fetched);
            }
            let empty = MatchRecords::new();
            let match_records = records.get(&snapshot.match_id).unwrap_or(&empty);

            let entry = score_team(&snapshot, &self.catalog, match_records);
            missing += entry.missing_records();
            season.add(&entry);
            entries.push((snapshot.match_id, entry));
        }

        // One write per participant keeps a file-backed store from rewriting per entry
        let written = entries.len();
        self.scores.upsert_scores(participant, entries, season.clone()).await?;
        report.entries_written += written;
        report.missing_records += missing;
        Ok(season)
    }
}
