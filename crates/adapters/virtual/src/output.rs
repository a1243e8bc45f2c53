//! Logging physical output.

use std::sync::{Mutex, PoisonError};

use minibac_app::ports::PhysicalOutput;
use minibac_domain::id::ObjectId;
use minibac_domain::value::PointValue;

/// [`PhysicalOutput`] that logs each applied value and keeps the last one
/// per object.
#[derive(Debug, Default)]
pub struct LoggingOutput {
    applied: Mutex<Vec<(ObjectId, PointValue)>>,
}

impl LoggingOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last value driven to `object`, if any.
    #[must_use]
    pub fn last(&self, object: ObjectId) -> Option<PointValue> {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|(id, _)| *id == object)
            .map(|(_, value)| *value)
    }

    /// Number of values applied so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PhysicalOutput for LoggingOutput {
    async fn apply(&self, object: ObjectId, old: PointValue, new: PointValue) {
        if old == new {
            tracing::debug!(%object, value = %new, "output refreshed");
        } else {
            tracing::info!(%object, %old, %new, "output changed");
        }
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((object, new));
    }
}
