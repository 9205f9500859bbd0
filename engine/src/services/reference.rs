//! JSON loaders for reference data, import batches and roster uploads

use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::fs;

use shared::{Athlete, AthleteCatalog, AthleteId, Match, Schedule, WorkingRoster, process_debug};

use crate::core::ImportRow;
use crate::error::{EngineError, EngineResult};

/// Roster upload as written by hand or exported from the app
#[derive(Debug, Clone, Deserialize)]
pub struct RosterFile {
    pub players: Vec<String>,
    #[serde(default)]
    pub captain: Option<String>,
    #[serde(default)]
    pub vice_captain: Option<String>,
}

impl RosterFile {
    /// Build a working roster through the same checks an interactive edit gets
    pub fn into_roster(self, catalog: &AthleteCatalog) -> EngineResult<WorkingRoster> {
        let mut roster = WorkingRoster::new();
        for id in self.players {
            roster.add(AthleteId::new(id), catalog)?;
        }
        if let Some(captain) = self.captain {
            roster.set_captain(AthleteId::new(captain))?;
        }
        if let Some(vice) = self.vice_captain {
            roster.set_vice_captain(AthleteId::new(vice))?;
        }
        Ok(roster)
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> EngineResult<T> {
    let content = fs::read_to_string(path).await.map_err(|e| EngineError::ReferenceError {
        message: format!("cannot read {what} file {}: {e}", path.display()),
    })?;
    serde_json::from_str(&content).map_err(|e| EngineError::ReferenceError {
        message: format!("invalid {what} file {}: {e}", path.display()),
    })
}

pub async fn load_schedule(path: impl AsRef<Path>) -> EngineResult<Schedule> {
    let matches: Vec<Match> = read_json(path.as_ref(), "schedule").await?;
    let schedule = Schedule::new(matches)?;
    process_debug!(shared::ProcessId::current(), "📅 Loaded {} matches", schedule.matches().len());
    Ok(schedule)
}

pub async fn load_athletes(path: impl AsRef<Path>) -> EngineResult<AthleteCatalog> {
    let athletes: Vec<Athlete> = read_json(path.as_ref(), "athlete").await?;
    let catalog = AthleteCatalog::new(athletes)?;
    process_debug!(shared::ProcessId::current(), "🏏 Loaded {} athletes", catalog.len());
    Ok(catalog)
}

pub async fn load_import_rows(path: impl AsRef<Path>) -> EngineResult<Vec<ImportRow>> {
    read_json(path.as_ref(), "import").await
}

pub async fn load_roster(path: impl AsRef<Path>, catalog: &AthleteCatalog) -> EngineResult<WorkingRoster> {
    let file: RosterFile = read_json(path.as_ref(), "roster").await?;
    file.into_roster(catalog)
}
