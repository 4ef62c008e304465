//! World configuration.

use serde::{Deserialize, Serialize};

use crate::storage::StoreConfig;

/// Options a world is opened with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Which store backs the world.
    pub store: StoreConfig,
    /// Populating from an existing store: triples are assumed present,
    /// so declarations and edits skip their store writes.
    pub bulk_load: bool,
}

impl WorldConfig {
    pub fn bulk_load() -> Self {
        Self { bulk_load: true, ..Self::default() }
    }
}
