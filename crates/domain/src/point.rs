//! Monitored point — a commandable object with intrinsic reporting.
//!
//! Ties a [`CommandablePoint`] to an [`EventMonitor`] through the object
//! type's alarm condition, and produces [`EventRecord`]s on ticks.

use serde::{Deserialize, Serialize};

use crate::ack::{AckOutcome, AckRequest};
use crate::commandable::{Command, CommandablePoint};
use crate::error::{AckError, MiniBacError, ProtocolError, ValidationError};
use crate::event_state::{EventState, EventType, NotifyType, Transition, TransitionBits};
use crate::id::ObjectId;
use crate::monitor::{Conditions, EventMonitor, MonitorEvent, ReportingConfig};
use crate::notification::EventRecord;
use crate::summary::{AlarmSummary, EventSummary};
use crate::time::Timestamp;
use crate::value::{BinaryPv, PointValue, Reliability, StatusFlags, WriteValue};

/// Which present values count as off-normal or fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlarmCondition {
    Binary {
        alarm_value: BinaryPv,
    },
    MultiState {
        #[serde(default)]
        alarm_values: Vec<u32>,
        #[serde(default)]
        fault_values: Vec<u32>,
    },
}

impl AlarmCondition {
    fn evaluate(&self, value: PointValue, reliability: Reliability) -> Conditions {
        let (offnormal, fault_value) = match (self, value) {
            (Self::Binary { alarm_value }, PointValue::Binary(pv)) => (pv == *alarm_value, false),
            (
                Self::MultiState {
                    alarm_values,
                    fault_values,
                },
                PointValue::MultiState(state),
            ) => (alarm_values.contains(&state), fault_values.contains(&state)),
            _ => (false, false),
        };
        Conditions {
            offnormal,
            fault: fault_value || reliability.is_fault(),
        }
    }
}

/// One object of a commandable type with its event state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredPoint {
    pub id: ObjectId,
    pub name: String,
    pub notification_class: u32,
    point: CommandablePoint,
    alarm: AlarmCondition,
    reliability: Reliability,
    monitor: EventMonitor,
}

impl MonitoredPoint {
    /// Create a builder for constructing a [`MonitoredPoint`].
    #[must_use]
    pub fn builder(id: ObjectId) -> MonitoredPointBuilder {
        MonitoredPointBuilder::new(id)
    }

    #[must_use]
    pub fn present_value(&self) -> PointValue {
        self.point.resolve()
    }

    #[must_use]
    pub fn point(&self) -> &CommandablePoint {
        &self.point
    }

    #[must_use]
    pub fn monitor(&self) -> &EventMonitor {
        &self.monitor
    }

    #[must_use]
    pub fn alarm_condition(&self) -> &AlarmCondition {
        &self.alarm
    }

    #[must_use]
    pub fn reliability(&self) -> Reliability {
        self.reliability
    }

    pub fn set_reliability(&mut self, reliability: Reliability) {
        self.reliability = reliability;
    }

    pub fn set_out_of_service(&mut self, value: bool) {
        self.point.set_out_of_service(value);
    }

    /// Mutable access to the reporting parameters.
    pub fn monitor_mut(&mut self) -> &mut EventMonitor {
        &mut self.monitor
    }

    /// # Errors
    ///
    /// See [`CommandablePoint::write`].
    pub fn write(&mut self, priority: u8, value: WriteValue) -> Result<Command, ProtocolError> {
        self.point.write(priority, value)
    }

    /// # Errors
    ///
    /// See [`CommandablePoint::relinquish`].
    pub fn relinquish(&mut self, priority: u8) -> Result<Command, ProtocolError> {
        self.point.relinquish(priority)
    }

    /// # Errors
    ///
    /// See [`CommandablePoint::set_relinquish_default`].
    pub fn set_relinquish_default(&mut self, value: PointValue) -> Result<Command, ProtocolError> {
        self.point.set_relinquish_default(value)
    }

    /// Return and clear the change-of-value flag.
    pub fn take_changed(&mut self) -> bool {
        self.point.take_changed()
    }

    #[must_use]
    pub fn status_flags(&self) -> StatusFlags {
        StatusFlags {
            in_alarm: self.monitor.state() != EventState::Normal,
            fault: self.reliability.is_fault(),
            overridden: false,
            out_of_service: self.point.out_of_service(),
        }
    }

    /// Run one evaluation tick and build the resulting event record.
    pub fn tick(&mut self, ack_required: TransitionBits, now: Timestamp) -> Option<EventRecord> {
        let value = self.point.resolve();
        let conditions = self.alarm.evaluate(value, self.reliability);
        let event = self.monitor.tick(conditions, ack_required, now)?;

        let (from_state, to_state, notify_type, message) = match event {
            MonitorEvent::Transition { from, to } => {
                let idx = Transition::entering(to).map_or(0, Transition::index);
                let message = self.monitor.event_message_texts()[idx].clone();
                (from, to, self.monitor.config().notify_type, message)
            }
            MonitorEvent::Acknowledged { acked_state } => (
                self.monitor.state(),
                acked_state,
                NotifyType::AckNotification,
                format!("{acked_state} acknowledged"),
            ),
        };

        Some(EventRecord {
            object: self.id,
            notification_class: self.notification_class,
            timestamp: now,
            from_state,
            to_state,
            notify_type,
            event_type: EventType::ChangeOfState,
            message,
            value,
            status_flags: self.status_flags(),
        })
    }

    /// # Errors
    ///
    /// See [`EventMonitor::acknowledge`].
    pub fn acknowledge(&mut self, request: &AckRequest) -> Result<AckOutcome, AckError> {
        self.monitor
            .acknowledge(request.event_state_acked, &request.timestamp)
    }

    /// Summary for event-information queries, when an event is active.
    #[must_use]
    pub fn event_summary(&self, priorities: [u8; 3]) -> Option<EventSummary> {
        if !self.monitor.has_active_event() {
            return None;
        }
        Some(EventSummary {
            object: self.id,
            event_state: self.monitor.state(),
            acked_transitions: self.monitor.acked().acked_bits(),
            event_time_stamps: *self.monitor.event_time_stamps(),
            notify_type: self.monitor.config().notify_type,
            event_enable: self.monitor.config().event_enable,
            event_priorities: priorities,
        })
    }

    /// Summary for alarm-summary queries, when an alarm is active.
    #[must_use]
    pub fn alarm_summary(&self) -> Option<AlarmSummary> {
        self.monitor.has_active_alarm().then(|| AlarmSummary {
            object: self.id,
            alarm_state: self.monitor.state(),
            acked_transitions: self.monitor.acked().acked_bits(),
        })
    }
}

/// Step-by-step builder for [`MonitoredPoint`].
#[derive(Debug)]
pub struct MonitoredPointBuilder {
    id: ObjectId,
    name: Option<String>,
    notification_class: u32,
    relinquish_default: Option<PointValue>,
    number_of_states: Option<u32>,
    alarm: Option<AlarmCondition>,
    reporting: ReportingConfig,
}

impl MonitoredPointBuilder {
    fn new(id: ObjectId) -> Self {
        Self {
            id,
            name: None,
            notification_class: 0,
            relinquish_default: None,
            number_of_states: None,
            alarm: None,
            reporting: ReportingConfig::default(),
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn notification_class(mut self, class: u32) -> Self {
        self.notification_class = class;
        self
    }

    #[must_use]
    pub fn relinquish_default(mut self, value: PointValue) -> Self {
        self.relinquish_default = Some(value);
        self
    }

    #[must_use]
    pub fn number_of_states(mut self, count: u32) -> Self {
        self.number_of_states = Some(count);
        self
    }

    #[must_use]
    pub fn alarm(mut self, alarm: AlarmCondition) -> Self {
        self.alarm = Some(alarm);
        self
    }

    #[must_use]
    pub fn reporting(mut self, reporting: ReportingConfig) -> Self {
        self.reporting = reporting;
        self
    }

    /// Consume the builder, validate, and return a [`MonitoredPoint`].
    ///
    /// Binary points default to `inactive` with `active` as alarm value;
    /// multi-state points default to state 1 with no alarm values.
    ///
    /// # Errors
    ///
    /// Returns [`MiniBacError::Validation`] if the name is empty or the
    /// default value and alarm condition do not fit the object type.
    pub fn build(self) -> Result<MonitoredPoint, MiniBacError> {
        let name = self.name.unwrap_or_default();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let binary = self.id.object_type.is_binary();
        let (default, states) = if binary {
            (
                self.relinquish_default
                    .unwrap_or(PointValue::Binary(BinaryPv::Inactive)),
                None,
            )
        } else {
            (
                self.relinquish_default.unwrap_or(PointValue::MultiState(1)),
                Some(self.number_of_states.unwrap_or(2)),
            )
        };
        let alarm = match self.alarm {
            Some(alarm) => alarm,
            None if binary => AlarmCondition::Binary {
                alarm_value: BinaryPv::Active,
            },
            None => AlarmCondition::MultiState {
                alarm_values: Vec::new(),
                fault_values: Vec::new(),
            },
        };
        if matches!(alarm, AlarmCondition::Binary { .. }) != binary {
            return Err(ValidationError::ValueKindMismatch.into());
        }
        if let (AlarmCondition::MultiState { alarm_values, fault_values }, Some(max)) =
            (&alarm, states)
        {
            if let Some(&value) = alarm_values
                .iter()
                .chain(fault_values)
                .find(|v| **v == 0 || **v > max)
            {
                return Err(ValidationError::StateOutOfRange { value, max }.into());
            }
        }

        Ok(MonitoredPoint {
            id: self.id,
            name,
            notification_class: self.notification_class,
            point: CommandablePoint::new(default, states)?,
            alarm,
            reliability: Reliability::NoFaultDetected,
            monitor: EventMonitor::new(self.reporting),
        })
    }
}
