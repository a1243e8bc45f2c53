//! Event states, transition kinds, and the per-transition bit masks.

use serde::{Deserialize, Serialize};

/// Event state of an object.
///
/// Intrinsic reporting of the supported object types only ever enters
/// `Normal`, `Offnormal` and `Fault`; the limit and life-safety states can
/// still arrive in acknowledgment requests and are rejected there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventState {
    #[default]
    Normal,
    Fault,
    Offnormal,
    HighLimit,
    LowLimit,
    LifeSafetyAlarm,
}

impl std::fmt::Display for EventState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Normal => "normal",
            Self::Fault => "fault",
            Self::Offnormal => "offnormal",
            Self::HighLimit => "high-limit",
            Self::LowLimit => "low-limit",
            Self::LifeSafetyAlarm => "life-safety-alarm",
        };
        f.write_str(text)
    }
}

/// The three transition kinds, in protocol order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transition {
    ToOffnormal,
    ToFault,
    ToNormal,
}

impl Transition {
    pub const ALL: [Self; 3] = [Self::ToOffnormal, Self::ToFault, Self::ToNormal];

    /// Transition kind that ends in `state`, if the state is supported.
    #[must_use]
    pub fn entering(state: EventState) -> Option<Self> {
        match state {
            EventState::Offnormal => Some(Self::ToOffnormal),
            EventState::Fault => Some(Self::ToFault),
            EventState::Normal => Some(Self::ToNormal),
            EventState::HighLimit | EventState::LowLimit | EventState::LifeSafetyAlarm => None,
        }
    }

    /// Index into `[offnormal, fault, normal]` arrays.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::ToOffnormal => 0,
            Self::ToFault => 1,
            Self::ToNormal => 2,
        }
    }

    #[must_use]
    pub fn target(self) -> EventState {
        match self {
            Self::ToOffnormal => EventState::Offnormal,
            Self::ToFault => EventState::Fault,
            Self::ToNormal => EventState::Normal,
        }
    }
}

/// One flag per transition kind; used for event enable, ack required,
/// recipient transition filters, and acked transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionBits {
    pub to_offnormal: bool,
    pub to_fault: bool,
    pub to_normal: bool,
}

impl TransitionBits {
    pub const NONE: Self = Self {
        to_offnormal: false,
        to_fault: false,
        to_normal: false,
    };
    pub const ALL: Self = Self {
        to_offnormal: true,
        to_fault: true,
        to_normal: true,
    };

    #[must_use]
    pub fn contains(self, transition: Transition) -> bool {
        match transition {
            Transition::ToOffnormal => self.to_offnormal,
            Transition::ToFault => self.to_fault,
            Transition::ToNormal => self.to_normal,
        }
    }

    #[must_use]
    pub fn with(mut self, transition: Transition, value: bool) -> Self {
        match transition {
            Transition::ToOffnormal => self.to_offnormal = value,
            Transition::ToFault => self.to_fault = value,
            Transition::ToNormal => self.to_normal = value,
        }
        self
    }

    /// Build from a raw mask: bit 0 = to-offnormal, bit 1 = to-fault, bit 2 = to-normal.
    #[must_use]
    pub fn from_bits(bits: u8) -> Self {
        Self {
            to_offnormal: bits & 0b001 != 0,
            to_fault: bits & 0b010 != 0,
            to_normal: bits & 0b100 != 0,
        }
    }

    #[must_use]
    pub fn bits(self) -> u8 {
        u8::from(self.to_offnormal)
            | (u8::from(self.to_fault) << 1)
            | (u8::from(self.to_normal) << 2)
    }
}

/// Whether transitions are reported as alarms or as plain events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyType {
    #[default]
    Alarm,
    Event,
    AckNotification,
}

/// Event algorithm that produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    #[default]
    ChangeOfState,
}
