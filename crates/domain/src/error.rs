//! Common error types used across the workspace.
//!
//! Protocol-facing operations report failures as an
//! ([`ErrorClass`], [`ErrorCode`]) pair wrapped in a [`ProtocolError`].
//! Construction-time invariant failures use [`ValidationError`]. Both
//! convert into the workspace-wide [`MiniBacError`] via `#[from]`.

use serde::{Deserialize, Serialize};

use crate::event_state::EventState;
use crate::id::{ObjectId, ObjectType};

/// Broad category of a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Object,
    Property,
    Resources,
    Services,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object => f.write_str("object"),
            Self::Property => f.write_str("property"),
            Self::Resources => f.write_str("resources"),
            Self::Services => f.write_str("services"),
        }
    }
}

/// Specific reason for a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    WriteAccessDenied,
    ValueOutOfRange,
    InvalidDataType,
    UnknownObject,
    UnknownProperty,
    InvalidArrayIndex,
    PropertyIsNotAnArray,
    InvalidEventState,
    InvalidTimeStamp,
    NoSpaceToWriteProperty,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::WriteAccessDenied => "write-access-denied",
            Self::ValueOutOfRange => "value-out-of-range",
            Self::InvalidDataType => "invalid-data-type",
            Self::UnknownObject => "unknown-object",
            Self::UnknownProperty => "unknown-property",
            Self::InvalidArrayIndex => "invalid-array-index",
            Self::PropertyIsNotAnArray => "property-is-not-an-array",
            Self::InvalidEventState => "invalid-event-state",
            Self::InvalidTimeStamp => "invalid-time-stamp",
            Self::NoSpaceToWriteProperty => "no-space-to-write-property",
        };
        f.write_str(text)
    }
}

/// An (error-class, error-code) pair returned to the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{class}: {code}")]
pub struct ProtocolError {
    pub class: ErrorClass,
    pub code: ErrorCode,
}

impl ProtocolError {
    #[must_use]
    pub const fn new(class: ErrorClass, code: ErrorCode) -> Self {
        Self { class, code }
    }

    /// Priority 6 or a read-only property.
    #[must_use]
    pub const fn write_access_denied() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::WriteAccessDenied)
    }

    #[must_use]
    pub const fn value_out_of_range() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::ValueOutOfRange)
    }

    #[must_use]
    pub const fn invalid_data_type() -> Self {
        Self::new(ErrorClass::Property, ErrorCode::InvalidDataType)
    }

    #[must_use]
    pub const fn unknown_object() -> Self {
        Self::new(ErrorClass::Object, ErrorCode::UnknownObject)
    }

    #[must_use]
    pub const fn invalid_event_state() -> Self {
        Self::new(ErrorClass::Services, ErrorCode::InvalidEventState)
    }

    #[must_use]
    pub const fn invalid_time_stamp() -> Self {
        Self::new(ErrorClass::Services, ErrorCode::InvalidTimeStamp)
    }

    #[must_use]
    pub const fn no_space_to_write_property() -> Self {
        Self::new(ErrorClass::Resources, ErrorCode::NoSpaceToWriteProperty)
    }
}

/// Domain invariant violations detected while building objects.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("number of states must be at least 1")]
    NoStates,
    #[error("value {value} is outside 1..={max}")]
    StateOutOfRange { value: u32, max: u32 },
    #[error("value kind does not match the object type")]
    ValueKindMismatch,
    #[error("object {object} does not belong to a {expected} table")]
    WrongObjectType { object: ObjectId, expected: ObjectType },
    #[error("object {0} already exists")]
    DuplicateObject(ObjectId),
}

/// Outcome of a rejected acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AckError {
    /// The request violated ordering or state rules; the caller may retry.
    #[error("acknowledgment rejected")]
    Rejected(#[from] ProtocolError),
    /// The acknowledged event state is not handled by this object type.
    #[error("event state {0} cannot be acknowledged")]
    UnsupportedState(EventState),
}

/// Workspace-wide error.
#[derive(Debug, thiserror::Error)]
pub enum MiniBacError {
    #[error("protocol error")]
    Protocol(#[from] ProtocolError),

    #[error("validation error")]
    Validation(#[from] ValidationError),
}
