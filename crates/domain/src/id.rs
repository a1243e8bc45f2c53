//! Identifiers: object identifiers, device instances, and event ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Largest valid object or device instance number (22 bits).
pub const MAX_INSTANCE: u32 = 0x003F_FFFF;

/// Object types that carry a commandable point and intrinsic reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectType {
    BinaryOutput,
    BinaryValue,
    MultiStateOutput,
    MultiStateValue,
}

impl ObjectType {
    /// All supported object types, in ascending protocol order.
    pub const ALL: [Self; 4] = [
        Self::BinaryOutput,
        Self::BinaryValue,
        Self::MultiStateOutput,
        Self::MultiStateValue,
    ];

    /// Whether the present value is binary (active/inactive).
    #[must_use]
    pub fn is_binary(self) -> bool {
        matches!(self, Self::BinaryOutput | Self::BinaryValue)
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BinaryOutput => f.write_str("binary-output"),
            Self::BinaryValue => f.write_str("binary-value"),
            Self::MultiStateOutput => f.write_str("multi-state-output"),
            Self::MultiStateValue => f.write_str("multi-state-value"),
        }
    }
}

/// `(object type, instance)` pair identifying an object within a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    pub object_type: ObjectType,
    pub instance: u32,
}

impl ObjectId {
    #[must_use]
    pub const fn new(object_type: ObjectType, instance: u32) -> Self {
        Self {
            object_type,
            instance,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.instance)
    }
}

/// Instance number of a device on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceInstance(pub u32);

impl DeviceInstance {
    /// Instance `0` is never a valid recipient.
    #[must_use]
    pub fn is_assigned(self) -> bool {
        self.0 != 0 && self.0 <= MAX_INSTANCE
    }
}

impl fmt::Display for DeviceInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device:{}", self.0)
    }
}

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for an [`Event`](crate::event::Event) published on the local bus.
    EventId
);
