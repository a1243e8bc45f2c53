//! Event — an immutable record of something that happened on this device,
//! published on the local bus.
//!
//! Bus events are produced when a point's present value changes, when an
//! object transitions between event states, and when an acknowledgment
//! notification goes out.

use serde::{Deserialize, Serialize};

use crate::event_state::{EventState, NotifyType};
use crate::id::{EventId, ObjectId};
use crate::notification::EventRecord;
use crate::time::Timestamp;
use crate::value::{PointValue, StatusFlags};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    ValueChanged {
        value: PointValue,
        status_flags: StatusFlags,
    },
    StateTransition {
        from: EventState,
        to: EventState,
        notify_type: NotifyType,
        message: String,
    },
    AckNotification {
        acked_state: EventState,
    },
}

/// A bus event about one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub object: ObjectId,
    pub kind: EventKind,
    pub timestamp: Timestamp,
}

impl Event {
    #[must_use]
    pub fn new(object: ObjectId, kind: EventKind, timestamp: Timestamp) -> Self {
        Self {
            id: EventId::new(),
            object,
            kind,
            timestamp,
        }
    }

    #[must_use]
    pub fn value_changed(
        object: ObjectId,
        value: PointValue,
        status_flags: StatusFlags,
        timestamp: Timestamp,
    ) -> Self {
        Self::new(
            object,
            EventKind::ValueChanged {
                value,
                status_flags,
            },
            timestamp,
        )
    }
}

impl From<&EventRecord> for Event {
    fn from(record: &EventRecord) -> Self {
        let kind = if record.is_ack_notification() {
            EventKind::AckNotification {
                acked_state: record.to_state,
            }
        } else {
            EventKind::StateTransition {
                from: record.from_state,
                to: record.to_state,
                notify_type: record.notify_type,
                message: record.message.clone(),
            }
        };
        Self::new(record.object, kind, record.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_state::EventType;
    use crate::id::ObjectType;
    use crate::value::BinaryPv;
    use chrono::NaiveDate;

    fn record(notify_type: NotifyType) -> EventRecord {
        EventRecord {
            object: ObjectId::new(ObjectType::BinaryOutput, 4),
            notification_class: 1,
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 6)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
            from_state: EventState::Normal,
            to_state: EventState::Offnormal,
            notify_type,
            event_type: EventType::ChangeOfState,
            message: "normal to offnormal".to_string(),
            value: PointValue::Binary(BinaryPv::Active),
            status_flags: StatusFlags::default(),
        }
    }

    #[test]
    fn should_convert_transition_record_into_state_transition() {
        let event = Event::from(&record(NotifyType::Alarm));
        assert!(matches!(
            event.kind,
            EventKind::StateTransition {
                to: EventState::Offnormal,
                ..
            }
        ));
    }

    #[test]
    fn should_convert_ack_record_into_ack_notification() {
        let event = Event::from(&record(NotifyType::AckNotification));
        assert_eq!(
            event.kind,
            EventKind::AckNotification {
                acked_state: EventState::Offnormal
            }
        );
    }

    #[test]
    fn should_serialize_kind_with_type_tag() {
        let event = Event::from(&record(NotifyType::Event));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "state_transition");
        assert_eq!(json["kind"]["notify_type"], "event");
    }
}
