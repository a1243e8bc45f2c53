//! Acknowledgment tracking — acked/unacked status per transition kind.

use serde::{Deserialize, Serialize};

use crate::error::{AckError, ProtocolError};
use crate::event_state::{EventState, Transition, TransitionBits};
use crate::id::ObjectId;
use crate::time::{EventTimeStamp, Timestamp};

/// Acknowledgment status of the most recent transition of one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckedTransition {
    pub is_acked: bool,
    /// Time of the transition; `None` until the first transition of this kind.
    pub timestamp: Option<Timestamp>,
}

impl Default for AckedTransition {
    fn default() -> Self {
        Self {
            is_acked: true,
            timestamp: None,
        }
    }
}

/// Successful acknowledgment result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The transition is now acked; an ack notification is pending.
    Acknowledged,
    /// The transition was already acked and matches the current state.
    AlreadyAcknowledged,
}

/// An acknowledgment request addressed to one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckRequest {
    pub acknowledging_process_id: u32,
    pub event_object: ObjectId,
    pub event_state_acked: EventState,
    /// Timestamp of the transition being acknowledged.
    pub timestamp: EventTimeStamp,
    pub source: String,
    pub time_of_ack: EventTimeStamp,
}

/// Per-transition acked flags and timestamps of one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckTracker {
    transitions: [AckedTransition; 3],
}

impl AckTracker {
    #[must_use]
    pub fn get(&self, transition: Transition) -> AckedTransition {
        self.transitions[transition.index()]
    }

    /// Flags as a bit mask, set bits meaning acked.
    #[must_use]
    pub fn acked_bits(&self) -> TransitionBits {
        Transition::ALL
            .into_iter()
            .fold(TransitionBits::NONE, |bits, t| bits.with(t, self.get(t).is_acked))
    }

    #[must_use]
    pub fn all_acked(&self) -> bool {
        self.transitions.iter().all(|t| t.is_acked)
    }

    /// Record a transition; it starts un-acked only when an ack is required.
    pub fn record(&mut self, transition: Transition, at: Timestamp, ack_required: bool) {
        self.transitions[transition.index()] = AckedTransition {
            is_acked: !ack_required,
            timestamp: Some(at),
        };
    }

    /// Validate and apply an acknowledgment of `acked_state`.
    ///
    /// # Errors
    ///
    /// - [`AckError::UnsupportedState`] when `acked_state` has no transition kind
    /// - `INVALID_EVENT_STATE` when the transition is already acked and
    ///   `acked_state` is not the `current` state
    /// - `INVALID_TIME_STAMP` when `timestamp` is not a date-time or is older
    ///   than the stored transition time
    pub fn acknowledge(
        &mut self,
        acked_state: EventState,
        current: EventState,
        timestamp: &EventTimeStamp,
    ) -> Result<AckOutcome, AckError> {
        let transition =
            Transition::entering(acked_state).ok_or(AckError::UnsupportedState(acked_state))?;
        let entry = &mut self.transitions[transition.index()];

        if entry.is_acked {
            if acked_state != current {
                return Err(ProtocolError::invalid_event_state().into());
            }
            return Ok(AckOutcome::AlreadyAcknowledged);
        }

        let at = timestamp
            .as_date_time()
            .ok_or_else(ProtocolError::invalid_time_stamp)?;
        if entry.timestamp.is_some_and(|stored| at < stored) {
            return Err(ProtocolError::invalid_time_stamp().into());
        }
        entry.is_acked = true;
        Ok(AckOutcome::Acknowledged)
    }
}
