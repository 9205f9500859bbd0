//! Bulk performance import
//!
//! Validates a whole batch against the reference data and upserts it only
//! when every row passes.

use std::collections::BTreeSet;
use std::sync::Arc;

use shared::{AthleteCatalog, MatchId, ProcessId, Schedule, logging, process_warn};

use crate::core::{ImportRow, validate_rows};
use crate::error::{EngineError, EngineResult};
use crate::traits::PerformanceStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub records_written: usize,
    /// Matches touched; their scores are stale until the next re-scoring run
    pub matches: Vec<MatchId>,
}

pub struct PerformanceImporter<P>
where
    P: PerformanceStore + 'static,
{
    performance: Arc<P>,
    catalog: Arc<AthleteCatalog>,
    schedule: Arc<Schedule>,
}

impl<P> PerformanceImporter<P>
where
    P: PerformanceStore + 'static,
{
    pub fn new(performance: Arc<P>, catalog: Arc<AthleteCatalog>, schedule: Arc<Schedule>) -> Self {
        Self { performance, catalog, schedule }
    }

    pub async fn import(&self, rows: &[ImportRow]) -> EngineResult<ImportSummary> {
        let records = validate_rows(rows, &self.catalog, &self.schedule).map_err(|errors| {
            for error in &errors {
                process_warn!(ProcessId::current(), "🚫 {}", error);
            }
            EngineError::Validation { errors }
        })?;

        let matches: Vec<MatchId> = records
            .iter()
            .map(|r| r.match_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let records_written = self.performance.upsert_records(records).await?;

        logging::log_success(
            ProcessId::current(),
            &format!("Imported {} record(s) across {} match(es)", records_written, matches.len()),
        );
        Ok(ImportSummary { records_written, matches })
    }
}
