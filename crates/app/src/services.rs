//! Application services — use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod alarm_service;
pub mod notification_class_service;
pub mod point_service;

async fn persist<S, T>(store: &S, key: &str, value: &T)
where
    S: crate::ports::SettingsStore,
    T: serde::Serialize + ?Sized,
{
    let result = match serde_json::to_value(value) {
        Ok(value) => store.save(key, value).await,
        Err(err) => Err(err.into()),
    };
    if let Err(err) = result {
        tracing::warn!(key, error = %err, "failed to persist setting");
    }
}
