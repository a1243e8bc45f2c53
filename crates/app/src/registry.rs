//! Notification class registry — the read-mostly table of notification
//! classes shared by every monitored object.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use minibac_domain::error::ProtocolError;
use minibac_domain::event_state::TransitionBits;
use minibac_domain::id::DeviceInstance;
use minibac_domain::notification_class::{
    DEFAULT_PRIORITY, Destination, NotificationClass, RecipientUpdate,
};

/// Notification classes keyed by instance number.
#[derive(Debug, Default)]
pub struct NotificationClassRegistry {
    classes: RwLock<BTreeMap<u32, NotificationClass>>,
}

impl NotificationClassRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a class.
    pub fn insert(&self, class: NotificationClass) {
        self.classes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(class.instance, class);
    }

    /// Snapshot of a class. A missing class means "no recipients configured".
    #[must_use]
    pub fn lookup(&self, instance: u32) -> Option<NotificationClass> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&instance)
            .cloned()
    }

    /// Ack requirements of a class, none when the class is missing.
    #[must_use]
    pub fn ack_required(&self, instance: u32) -> TransitionBits {
        self.lookup(instance)
            .map_or(TransitionBits::NONE, |class| class.ack_required)
    }

    /// Priorities of a class, [`DEFAULT_PRIORITY`] when the class is missing.
    #[must_use]
    pub fn priorities(&self, instance: u32) -> [u8; 3] {
        self.lookup(instance)
            .map_or([DEFAULT_PRIORITY; 3], |class| class.priority)
    }

    #[must_use]
    pub fn instances(&self) -> Vec<u32> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// Every device listed as a recipient by any class, without duplicates.
    #[must_use]
    pub fn device_recipients(&self) -> Vec<DeviceInstance> {
        let classes = self.classes.read().unwrap_or_else(PoisonError::into_inner);
        let mut devices: Vec<DeviceInstance> = classes
            .values()
            .flat_map(NotificationClass::recipients)
            .filter_map(|dest| dest.recipient.device())
            .collect();
        devices.sort_unstable();
        devices.dedup();
        devices
    }

    /// Replace the recipient list of one class.
    ///
    /// Devices dropped from this class but still listed by another class
    /// are not reported as released.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT` when the class does not exist, or the error of
    /// [`NotificationClass::set_recipients`].
    pub fn replace_recipients(
        &self,
        instance: u32,
        entries: Vec<Destination>,
    ) -> Result<RecipientUpdate, ProtocolError> {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        let class = classes
            .get_mut(&instance)
            .ok_or_else(ProtocolError::unknown_object)?;
        let mut update = class.set_recipients(entries)?;
        update.released.retain(|device| {
            !classes
                .values()
                .any(|other| other.instance != instance && other.references(*device))
        });
        Ok(update)
    }
}
