//! Clock port — the device's local date and time.

use minibac_domain::time::{self, Timestamp};

/// Source of the current device-local time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// [`Clock`] backed by the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        time::now()
    }
}

impl<T: Clock> Clock for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
