//! Settings store port — key-value persistence of configuration changes.
//!
//! The application calls [`SettingsStore::save`] after a mutation has been
//! applied. A failed save is logged and never rolls the mutation back.

use std::future::Future;

/// Failure to persist a setting.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to serialize setting: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("settings backend failure: {0}")]
    Backend(String),
}

/// Persists settings under string keys.
pub trait SettingsStore {
    fn save(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<T: SettingsStore + Send + Sync> SettingsStore for std::sync::Arc<T> {
    fn save(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).save(key, value)
    }
}
