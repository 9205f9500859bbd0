//! In-memory store implementation
//!
//! Writes apply in place under the write guard and live as long as the
//! process. Used by the tests and by anything embedding the engine with its
//! own persistence.

use async_trait::async_trait;

use super::state_store::{Persistence, StateStore, StoreState};
use crate::error::EngineResult;

/// Keeps every change in process memory only
#[derive(Debug, Default)]
pub struct Volatile;

#[async_trait]
impl Persistence for Volatile {
    const DURABLE: bool = false;

    async fn save(&self, _state: &StoreState) -> EngineResult<()> {
        Ok(())
    }
}

/// Store keeping every table in process memory
pub type InMemoryStore = StateStore<Volatile>;

impl StateStore<Volatile> {
    pub fn new() -> Self {
        Self::with_persistence(StoreState::default(), Volatile)
    }
}

impl Default for StateStore<Volatile> {
    fn default() -> Self {
        Self::new()
    }
}
