//! In-memory settings store.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use minibac_app::ports::{SettingsStore, StoreError};

/// [`SettingsStore`] keeping the latest value of every key in memory.
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: Mutex<BTreeMap<String, serde_json::Value>>,
}

impl InMemorySettingsStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl SettingsStore for InMemorySettingsStore {
    async fn save(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        tracing::trace!(key, "setting saved");
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}
