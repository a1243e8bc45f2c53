//! Event records and the per-recipient notifications built from them.

use serde::{Deserialize, Serialize};

use crate::event_state::{EventState, EventType, NotifyType, Transition};
use crate::id::{DeviceInstance, ObjectId};
use crate::time::Timestamp;
use crate::value::{PointValue, StatusFlags};

/// What an object reported on a tick: a transition or an ack notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub object: ObjectId,
    pub notification_class: u32,
    pub timestamp: Timestamp,
    pub from_state: EventState,
    pub to_state: EventState,
    pub notify_type: NotifyType,
    pub event_type: EventType,
    pub message: String,
    pub value: PointValue,
    pub status_flags: StatusFlags,
}

impl EventRecord {
    /// Transition kind used to pick priority, ack requirement and recipients.
    #[must_use]
    pub fn transition(&self) -> Option<Transition> {
        Transition::entering(self.to_state)
    }

    #[must_use]
    pub fn is_ack_notification(&self) -> bool {
        self.notify_type == NotifyType::AckNotification
    }
}

/// A notification addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventNotification {
    pub process_id: u32,
    pub initiating_device: DeviceInstance,
    pub event_object: ObjectId,
    pub timestamp: Timestamp,
    pub notification_class: u32,
    pub priority: u8,
    pub event_type: EventType,
    pub message_text: String,
    pub notify_type: NotifyType,
    pub ack_required: bool,
    pub from_state: EventState,
    pub to_state: EventState,
    /// Absent for ack notifications.
    pub new_value: Option<PointValue>,
    pub status_flags: Option<StatusFlags>,
}
