//! JSON file store implementation
//!
//! Persists the whole `StoreState` to `<data_dir>/state.json`. A write that
//! changes something is applied to a copy of the state, saved through a temp
//! file and a rename, and only then published. A failed write leaves both
//! the file and the memory state untouched; a write that changes nothing
//! never touches the disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use shared::{ProcessId, process_debug};

use super::state_store::{Persistence, StateStore, StoreState};
use crate::error::{EngineError, EngineResult};

const STATE_FILE: &str = "state.json";

/// Saves the state as pretty JSON with an atomic replace
#[derive(Debug)]
pub struct JsonFile {
    path: PathBuf,
}

#[async_trait]
impl Persistence for JsonFile {
    const DURABLE: bool = true;

    async fn save(&self, state: &StoreState) -> EngineResult<()> {
        let content = serde_json::to_string_pretty(state)?;
        let temp_path = self.path.with_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| EngineError::storage("create temp state", e.to_string()))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| EngineError::storage("write temp state", e.to_string()))?;
        file.sync_all()
            .await
            .map_err(|e| EngineError::storage("sync temp state", e.to_string()))?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| EngineError::storage("replace state", e.to_string()))?;
        Ok(())
    }
}

/// Store backed by a single JSON file
pub type JsonFileStore = StateStore<JsonFile>;

impl StateStore<JsonFile> {
    /// Open the store in `data_dir`, creating the directory if needed.
    /// A missing state file starts an empty season.
    pub async fn open(data_dir: impl AsRef<Path>) -> EngineResult<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).await?;

        let path = data_dir.join(STATE_FILE);
        let state = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(e) => return Err(e.into()),
        };

        process_debug!(ProcessId::current(), "📁 Opened store at {}", path.display());
        Ok(Self::with_persistence(state, JsonFile { path }))
    }

    pub fn path(&self) -> &Path {
        &self.persistence().path
    }
}
