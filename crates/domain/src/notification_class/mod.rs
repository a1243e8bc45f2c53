//! Notification class — shared routing configuration for monitored objects.
//!
//! A class holds one priority and one ack-required flag per transition kind,
//! and a bounded list of [`Destination`]s. Objects reference a class by its
//! instance number; many objects may share one class.

mod recipient;

pub use recipient::{
    BROADCAST_NETWORK, Destination, LOCAL_NETWORK, MAX_MAC_LEN, NetworkAddress, Recipient,
};

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::event_state::{Transition, TransitionBits};
use crate::id::DeviceInstance;

/// Capacity of a recipient list.
pub const MAX_RECIPIENTS: usize = 10;

/// Priority used when no class is configured for an object.
pub const DEFAULT_PRIORITY: u8 = 255;

/// Side effects requested by a recipient-list replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientUpdate {
    /// Valid recipients to bind or discover, in list order.
    pub bind: Vec<Recipient>,
    /// Devices that were listed before and are no longer.
    pub released: Vec<DeviceInstance>,
}

/// Priority, ack requirements and recipients for a group of objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationClass {
    pub instance: u32,
    /// `[to-offnormal, to-fault, to-normal]`.
    pub priority: [u8; 3],
    pub ack_required: TransitionBits,
    /// `None` slots are uninitialized and end the list.
    recipients: Vec<Option<Destination>>,
}

impl NotificationClass {
    #[must_use]
    pub fn new(instance: u32) -> Self {
        Self {
            instance,
            priority: [DEFAULT_PRIORITY; 3],
            ack_required: TransitionBits::NONE,
            recipients: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: [u8; 3]) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn with_ack_required(mut self, ack_required: TransitionBits) -> Self {
        self.ack_required = ack_required;
        self
    }

    #[must_use]
    pub fn priority_for(&self, transition: Transition) -> u8 {
        self.priority[transition.index()]
    }

    #[must_use]
    pub fn ack_required_for(&self, transition: Transition) -> bool {
        self.ack_required.contains(transition)
    }

    /// Recipients in list order, stopping at the first uninitialized slot.
    pub fn recipients(&self) -> impl Iterator<Item = &Destination> {
        self.recipients.iter().map_while(Option::as_ref)
    }

    /// Raw slots, including uninitialized ones.
    #[must_use]
    pub fn slots(&self) -> &[Option<Destination>] {
        &self.recipients
    }

    /// Whether any reachable recipient targets `device`.
    #[must_use]
    pub fn references(&self, device: DeviceInstance) -> bool {
        self.recipients()
            .any(|dest| dest.recipient.device() == Some(device))
    }

    /// Replace the whole recipient list.
    ///
    /// Invalid entries are stored as uninitialized slots. The returned
    /// [`RecipientUpdate`] lists the bindings the caller must request and
    /// release.
    ///
    /// # Errors
    ///
    /// `NO_SPACE_TO_WRITE_PROPERTY` when more than [`MAX_RECIPIENTS`] entries
    /// are given; the list is left untouched.
    pub fn set_recipients(
        &mut self,
        entries: Vec<Destination>,
    ) -> Result<RecipientUpdate, ProtocolError> {
        if entries.len() > MAX_RECIPIENTS {
            return Err(ProtocolError::no_space_to_write_property());
        }

        let previous: Vec<DeviceInstance> = self
            .recipients
            .iter()
            .flatten()
            .filter_map(|dest| dest.recipient.device())
            .collect();

        self.recipients = entries
            .into_iter()
            .map(|dest| dest.recipient.is_valid().then_some(dest))
            .collect();

        let bind: Vec<Recipient> = self
            .recipients
            .iter()
            .flatten()
            .map(|dest| dest.recipient.clone())
            .collect();
        let mut released: Vec<DeviceInstance> = previous
            .into_iter()
            .filter(|device| !bind.contains(&Recipient::Device(*device)))
            .collect();
        released.sort_unstable();
        released.dedup();

        Ok(RecipientUpdate { bind, released })
    }
}
