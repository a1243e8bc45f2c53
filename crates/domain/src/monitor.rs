//! Event monitor — the intrinsic-reporting state machine of one object.
//!
//! The monitor is driven by an external evaluation tick. On each tick it
//! consumes two signals computed from the object's present value and
//! reliability: whether the off-normal condition holds, and whether a fault
//! is present.
//!
//! Timed transitions (`NORMAL <-> OFFNORMAL`) share one countdown. While the
//! condition for leaving the current state holds and the matching transition
//! is enabled, each tick decrements the countdown and the transition fires on
//! the tick where it reaches exactly zero. A tick where the condition does not
//! hold reloads the full delay. Fault transitions ignore the delay and
//! suspend timed evaluation until the fault clears.

use serde::{Deserialize, Serialize};

use crate::ack::{AckOutcome, AckTracker};
use crate::error::AckError;
use crate::event_state::{EventState, NotifyType, Transition, TransitionBits};
use crate::time::{EventTimeStamp, Timestamp};

/// Signals evaluated from the object on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Conditions {
    pub offnormal: bool,
    pub fault: bool,
}

/// What a tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorEvent {
    Transition {
        from: EventState,
        to: EventState,
    },
    /// A previously accepted acknowledgment of `acked_state` must be announced.
    Acknowledged {
        acked_state: EventState,
    },
}

/// Intrinsic reporting parameters of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Ticks the condition must hold before a timed transition fires.
    pub time_delay: u32,
    pub event_enable: TransitionBits,
    pub notify_type: NotifyType,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            time_delay: 0,
            event_enable: TransitionBits::ALL,
            notify_type: NotifyType::Alarm,
        }
    }
}

/// Per-object event state machine with acknowledgment bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMonitor {
    config: ReportingConfig,
    state: EventState,
    remaining_time_delay: u32,
    acked: AckTracker,
    event_time_stamps: [Option<Timestamp>; 3],
    event_message_texts: [String; 3],
    pending_ack: Option<EventState>,
}

impl EventMonitor {
    #[must_use]
    pub fn new(config: ReportingConfig) -> Self {
        Self {
            config,
            state: EventState::Normal,
            remaining_time_delay: config.time_delay,
            acked: AckTracker::default(),
            event_time_stamps: [None; 3],
            event_message_texts: Default::default(),
            pending_ack: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> EventState {
        self.state
    }

    #[must_use]
    pub fn config(&self) -> &ReportingConfig {
        &self.config
    }

    #[must_use]
    pub fn remaining_time_delay(&self) -> u32 {
        self.remaining_time_delay
    }

    #[must_use]
    pub fn acked(&self) -> &AckTracker {
        &self.acked
    }

    #[must_use]
    pub fn event_time_stamps(&self) -> &[Option<Timestamp>; 3] {
        &self.event_time_stamps
    }

    #[must_use]
    pub fn event_message_texts(&self) -> &[String; 3] {
        &self.event_message_texts
    }

    /// The state an acknowledgment notification is pending for, if any.
    #[must_use]
    pub fn pending_ack(&self) -> Option<EventState> {
        self.pending_ack
    }

    /// Change the time delay; the countdown restarts from the new value.
    pub fn set_time_delay(&mut self, time_delay: u32) {
        self.config.time_delay = time_delay;
        self.remaining_time_delay = time_delay;
    }

    pub fn set_event_enable(&mut self, event_enable: TransitionBits) {
        self.config.event_enable = event_enable;
    }

    pub fn set_notify_type(&mut self, notify_type: NotifyType) {
        self.config.notify_type = notify_type;
    }

    /// Non-normal, or some transition still waits for an acknowledgment.
    #[must_use]
    pub fn has_active_event(&self) -> bool {
        self.state != EventState::Normal || !self.acked.all_acked()
    }

    /// Non-normal and reported as an alarm.
    #[must_use]
    pub fn has_active_alarm(&self) -> bool {
        self.state != EventState::Normal && self.config.notify_type == NotifyType::Alarm
    }

    /// Run one evaluation tick.
    ///
    /// A pending acknowledgment notification pre-empts state evaluation for
    /// this tick. `ack_required` decides whether a transition fired now must
    /// later be acknowledged.
    pub fn tick(
        &mut self,
        conditions: Conditions,
        ack_required: TransitionBits,
        now: Timestamp,
    ) -> Option<MonitorEvent> {
        if let Some(acked_state) = self.pending_ack.take() {
            return Some(MonitorEvent::Acknowledged { acked_state });
        }

        let enable = self.config.event_enable;
        if conditions.fault {
            if self.state == EventState::Fault {
                return None;
            }
            if enable.contains(Transition::ToFault) {
                return Some(self.transition(Transition::ToFault, ack_required, now));
            }
        } else if self.state == EventState::Fault {
            if enable.contains(Transition::ToNormal) {
                return Some(self.transition(Transition::ToNormal, ack_required, now));
            }
            return None;
        }

        let (leaving, transition) = match self.state {
            EventState::Normal => (conditions.offnormal, Transition::ToOffnormal),
            EventState::Offnormal => (!conditions.offnormal, Transition::ToNormal),
            _ => return None,
        };

        if !leaving || !enable.contains(transition) {
            self.remaining_time_delay = self.config.time_delay;
            return None;
        }

        self.remaining_time_delay = self.remaining_time_delay.saturating_sub(1);
        if self.remaining_time_delay == 0 {
            Some(self.transition(transition, ack_required, now))
        } else {
            None
        }
    }

    /// Apply an acknowledgment; an accepted one is announced on the next tick.
    ///
    /// # Errors
    ///
    /// See [`AckTracker::acknowledge`].
    pub fn acknowledge(
        &mut self,
        acked_state: EventState,
        timestamp: &EventTimeStamp,
    ) -> Result<AckOutcome, AckError> {
        let outcome = self.acked.acknowledge(acked_state, self.state, timestamp)?;
        if outcome == AckOutcome::Acknowledged {
            self.pending_ack = Some(acked_state);
        }
        Ok(outcome)
    }

    fn transition(
        &mut self,
        transition: Transition,
        ack_required: TransitionBits,
        now: Timestamp,
    ) -> MonitorEvent {
        let from = self.state;
        let to = transition.target();
        self.state = to;
        self.remaining_time_delay = self.config.time_delay;
        self.event_time_stamps[transition.index()] = Some(now);
        self.event_message_texts[transition.index()] = format!("{from} to {to}");
        self.acked
            .record(transition, now, ack_required.contains(transition));
        MonitorEvent::Transition { from, to }
    }
}
