//! Service implementations
//!
//! Real implementations of the store traits plus the JSON loaders the
//! binary uses for reference data.

pub mod file_store;
pub mod memory_store;
pub mod reference;
pub mod state_store;

#[cfg(test)]
pub(crate) mod tests;

pub use file_store::JsonFileStore;
pub use memory_store::InMemoryStore;
pub use reference::{RosterFile, load_athletes, load_import_rows, load_roster, load_schedule};
pub use state_store::{StateStore, StoreState};
