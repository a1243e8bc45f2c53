//! Active-event and alarm summaries returned by device-wide queries.

use serde::{Deserialize, Serialize};

use crate::event_state::{EventState, NotifyType, TransitionBits};
use crate::id::ObjectId;
use crate::time::Timestamp;

/// Result of probing one object index.
///
/// `Inactive` means the index exists but has nothing to report;
/// `EndOfList` means there are no more objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot<T> {
    Active(T),
    Inactive,
    EndOfList,
}

impl<T> Slot<T> {
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::EndOfList)
    }

    #[must_use]
    pub fn active(self) -> Option<T> {
        match self {
            Self::Active(value) => Some(value),
            Self::Inactive | Self::EndOfList => None,
        }
    }
}

/// An object that is non-normal or waiting for acknowledgments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub object: ObjectId,
    pub event_state: EventState,
    pub acked_transitions: TransitionBits,
    /// `[to-offnormal, to-fault, to-normal]`.
    pub event_time_stamps: [Option<Timestamp>; 3],
    pub notify_type: NotifyType,
    pub event_enable: TransitionBits,
    pub event_priorities: [u8; 3],
}

/// An object in a non-normal state that reports alarms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSummary {
    pub object: ObjectId,
    pub alarm_state: EventState,
    pub acked_transitions: TransitionBits,
}

/// One page of device-wide event information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInformation {
    pub summaries: Vec<EventSummary>,
    /// More active events follow the last returned object.
    pub more_events: bool,
}
