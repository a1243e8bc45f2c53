//! Point values, reliability and status flags.

use serde::{Deserialize, Serialize};

/// Present value of a binary object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryPv {
    #[default]
    Inactive,
    Active,
}

impl std::fmt::Display for BinaryPv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactive => f.write_str("inactive"),
            Self::Active => f.write_str("active"),
        }
    }
}

/// Resolved value of a commandable point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PointValue {
    Binary(BinaryPv),
    /// 1-based state number.
    MultiState(u32),
}

impl PointValue {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Binary(_) => ValueKind::Binary,
            Self::MultiState(_) => ValueKind::MultiState,
        }
    }
}

impl std::fmt::Display for PointValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary(pv) => pv.fmt(f),
            Self::MultiState(state) => write!(f, "state {state}"),
        }
    }
}

/// Type tag expected by a commandable point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Binary,
    MultiState,
}

/// Decoded value carried by a priority write.
///
/// `Null` relinquishes the addressed priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteValue {
    Null,
    Value(PointValue),
}

impl From<PointValue> for WriteValue {
    fn from(value: PointValue) -> Self {
        Self::Value(value)
    }
}

/// Reliability of the underlying input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reliability {
    #[default]
    NoFaultDetected,
    NoSensor,
    OverRange,
    UnderRange,
    OpenLoop,
    ShortedLoop,
    NoOutput,
    UnreliableOther,
    ProcessError,
    MultiStateFault,
    CommunicationFailure,
}

impl Reliability {
    #[must_use]
    pub fn is_fault(self) -> bool {
        self != Self::NoFaultDetected
    }
}

/// The four status flags reported alongside values and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusFlags {
    pub in_alarm: bool,
    pub fault: bool,
    pub overridden: bool,
    pub out_of_service: bool,
}
