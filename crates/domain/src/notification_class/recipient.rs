//! Recipient — one destination of a notification class.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::event_state::{Transition, TransitionBits};
use crate::id::DeviceInstance;
use crate::time::{self, DaysOfWeek, Timestamp};

/// Network number meaning "all networks".
pub const BROADCAST_NETWORK: u16 = 0xFFFF;

/// Network number of the local network.
pub const LOCAL_NETWORK: u16 = 0;

/// Longest MAC / station address in bytes.
pub const MAX_MAC_LEN: usize = 7;

/// Network-layer address of a station.
///
/// On the local network (`network == 0`) `mac` is the link-layer address;
/// on a remote network it is the station address on that network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkAddress {
    pub network: u16,
    #[serde(default)]
    pub mac: Vec<u8>,
}

impl NetworkAddress {
    #[must_use]
    pub fn local(mac: impl Into<Vec<u8>>) -> Self {
        Self {
            network: LOCAL_NETWORK,
            mac: mac.into(),
        }
    }

    #[must_use]
    pub fn remote(network: u16, mac: impl Into<Vec<u8>>) -> Self {
        Self {
            network,
            mac: mac.into(),
        }
    }

    /// Global broadcast on all networks.
    #[must_use]
    pub fn broadcast() -> Self {
        Self {
            network: BROADCAST_NETWORK,
            mac: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.network == BROADCAST_NETWORK
    }

    /// Local station with a MAC, remote station with an address on an
    /// assigned network, or the broadcast sentinel.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_broadcast() || (1..=MAX_MAC_LEN).contains(&self.mac.len())
    }
}

impl std::fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_broadcast() {
            return f.write_str("broadcast");
        }
        write!(f, "{}:", self.network)?;
        for byte in &self.mac {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Who receives the notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    /// Resolved to an address through the binding table.
    Device(DeviceInstance),
    /// Sent directly.
    Address(NetworkAddress),
}

impl Recipient {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Device(device) => device.is_assigned(),
            Self::Address(address) => address.is_valid(),
        }
    }

    #[must_use]
    pub fn device(&self) -> Option<DeviceInstance> {
        match self {
            Self::Device(device) => Some(*device),
            Self::Address(_) => None,
        }
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Device(device) => device.fmt(f),
            Self::Address(address) => address.fmt(f),
        }
    }
}

/// A recipient with its delivery window and transition filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    #[serde(default)]
    pub valid_days: DaysOfWeek,
    #[serde(default = "start_of_day")]
    pub from_time: NaiveTime,
    #[serde(default = "end_of_day")]
    pub to_time: NaiveTime,
    pub recipient: Recipient,
    #[serde(default)]
    pub process_id: u32,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default = "all_transitions")]
    pub transitions: TransitionBits,
}

impl Destination {
    /// Every day, all day, all transitions, unconfirmed.
    #[must_use]
    pub fn new(recipient: Recipient) -> Self {
        Self {
            valid_days: DaysOfWeek::ALL,
            from_time: start_of_day(),
            to_time: end_of_day(),
            recipient,
            process_id: 0,
            confirmed: false,
            transitions: TransitionBits::ALL,
        }
    }

    /// Whether a notification for `transition` at `now` goes to this destination.
    ///
    /// The window is compared at whole-second precision.
    #[must_use]
    pub fn admits(&self, transition: Transition, now: Timestamp) -> bool {
        let time_of_day = now.time();
        let time_of_day = time_of_day.with_nanosecond(0).unwrap_or(time_of_day);
        self.transitions.contains(transition)
            && self.valid_days.contains(time::weekday(now))
            && time::in_window(time_of_day, self.from_time, self.to_time)
    }
}

fn start_of_day() -> NaiveTime {
    NaiveTime::default()
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
}

fn all_transitions() -> TransitionBits {
    TransitionBits::ALL
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn wednesday(h: u32, m: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn office_hours(recipient: Recipient) -> Destination {
        Destination {
            valid_days: DaysOfWeek::WEEKDAYS,
            from_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            to_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            ..Destination::new(recipient)
        }
    }

    #[test]
    fn should_admit_weekday_recipient_inside_window() {
        let a = office_hours(Recipient::Device(DeviceInstance(1)));
        assert!(a.admits(Transition::ToOffnormal, wednesday(14, 0)));
    }

    #[test]
    fn should_reject_weekend_only_recipient_on_wednesday() {
        let b = Destination {
            valid_days: DaysOfWeek::WEEKEND,
            ..office_hours(Recipient::Device(DeviceInstance(2)))
        };
        assert!(!b.admits(Transition::ToOffnormal, wednesday(14, 0)));
    }

    #[test]
    fn should_reject_recipient_without_transition_bit() {
        let c = Destination {
            transitions: TransitionBits::ALL.with(Transition::ToOffnormal, false),
            ..office_hours(Recipient::Device(DeviceInstance(3)))
        };
        assert!(!c.admits(Transition::ToOffnormal, wednesday(14, 0)));
        assert!(c.admits(Transition::ToNormal, wednesday(14, 0)));
    }

    #[test]
    fn should_reject_recipient_outside_window() {
        let a = office_hours(Recipient::Device(DeviceInstance(1)));
        assert!(!a.admits(Transition::ToOffnormal, wednesday(7, 59)));
        assert!(a.admits(Transition::ToOffnormal, wednesday(18, 0)));
        assert!(!a.admits(Transition::ToOffnormal, wednesday(18, 1)));
    }

    #[test]
    fn should_admit_all_day_recipient_in_last_second_of_day() {
        let last_second = NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 500)
            .unwrap();
        let all_day = Destination::new(Recipient::Device(DeviceInstance(1)));
        assert!(all_day.admits(Transition::ToOffnormal, last_second));

        let json = serde_json::json!({ "recipient": { "device": 1 } });
        let defaulted: Destination = serde_json::from_value(json).unwrap();
        assert!(defaulted.admits(Transition::ToOffnormal, last_second));
    }

    #[test]
    fn should_admit_window_end_within_its_second() {
        let a = office_hours(Recipient::Device(DeviceInstance(1)));
        let end = NaiveDate::from_ymd_opt(2024, 3, 6)
            .unwrap()
            .and_hms_milli_opt(18, 0, 0, 750)
            .unwrap();
        assert!(a.admits(Transition::ToOffnormal, end));
    }

    #[test]
    fn should_reject_recipient_with_inverted_window() {
        let night = Destination {
            from_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            to_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
            ..Destination::new(Recipient::Device(DeviceInstance(1)))
        };
        assert!(!night.admits(Transition::ToOffnormal, wednesday(23, 0)));
        assert!(!night.admits(Transition::ToOffnormal, wednesday(5, 0)));
        assert!(!night.admits(Transition::ToOffnormal, wednesday(12, 0)));
    }

    #[test]
    fn should_validate_address_shapes() {
        assert!(NetworkAddress::local([192, 168, 1, 10, 0xBA, 0xC0]).is_valid());
        assert!(!NetworkAddress::local(Vec::new()).is_valid());
        assert!(NetworkAddress::remote(5, [0x21]).is_valid());
        assert!(!NetworkAddress::remote(5, Vec::new()).is_valid());
        assert!(!NetworkAddress::remote(5, [0; 8]).is_valid());
        assert!(NetworkAddress::broadcast().is_valid());
    }

    #[test]
    fn should_reject_device_zero() {
        assert!(!Recipient::Device(DeviceInstance(0)).is_valid());
        assert!(Recipient::Device(DeviceInstance(42)).is_valid());
    }

    #[test]
    fn should_display_address_as_network_and_hex() {
        let address = NetworkAddress::remote(7, [0x0A, 0xFF]);
        assert_eq!(address.to_string(), "7:0aff");
        assert_eq!(NetworkAddress::broadcast().to_string(), "broadcast");
    }

    #[test]
    fn should_deserialize_destination_with_defaults() {
        let json = serde_json::json!({ "recipient": { "device": 1234 } });
        let dest: Destination = serde_json::from_value(json).unwrap();
        assert_eq!(dest.recipient, Recipient::Device(DeviceInstance(1234)));
        assert_eq!(dest.valid_days, DaysOfWeek::ALL);
        assert_eq!(dest.transitions, TransitionBits::ALL);
        assert!(!dest.confirmed);
    }
}
