//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `minibac.toml` in the working directory (or the path in
//! `MINIBAC_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::collections::BTreeSet;

use serde::Deserialize;

use minibac_domain::error::MiniBacError;
use minibac_domain::event_state::{NotifyType, TransitionBits};
use minibac_domain::id::{DeviceInstance, MAX_INSTANCE, ObjectId, ObjectType};
use minibac_domain::monitor::ReportingConfig;
use minibac_domain::notification_class::{
    DEFAULT_PRIORITY, Destination, MAX_RECIPIENTS, NetworkAddress, NotificationClass,
};
use minibac_domain::point::{AlarmCondition, MonitoredPoint};
use minibac_domain::value::{BinaryPv, PointValue};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity of this device.
    pub device: DeviceConfig,
    /// Tick and sweep cadence.
    pub engine: EngineConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Notification classes with their recipient lists.
    pub notification_class: Vec<NotificationClassConfig>,
    /// Monitored points.
    pub point: Vec<PointConfig>,
    /// Devices answering discovery on the virtual network.
    pub peer: Vec<PeerConfig>,
}

/// Device identity.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device instance used as initiating device of notifications.
    pub instance: u32,
    pub name: String,
}

/// Engine cadence.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Evaluation tick period in milliseconds.
    pub tick_ms: u64,
    /// Address-resolution sweep period in seconds.
    pub sweep_secs: u64,
    /// Capacity of the local event bus.
    pub bus_capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// One notification class.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationClassConfig {
    pub instance: u32,
    /// `[to-offnormal, to-fault, to-normal]`.
    #[serde(default = "default_priority")]
    pub priority: [u8; 3],
    #[serde(default)]
    pub ack_required: TransitionBits,
    #[serde(default)]
    pub recipients: Vec<Destination>,
}

/// A present value as written in the file: `"active"` / `"inactive"` for
/// binary objects, a state number for multi-state objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ValueConfig {
    Binary(BinaryPv),
    State(u32),
}

impl From<ValueConfig> for PointValue {
    fn from(value: ValueConfig) -> Self {
        match value {
            ValueConfig::Binary(pv) => Self::Binary(pv),
            ValueConfig::State(state) => Self::MultiState(state),
        }
    }
}

/// A priority write applied at startup.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CommandConfig {
    pub priority: u8,
    pub value: ValueConfig,
}

/// One monitored point.
#[derive(Debug, Clone, Deserialize)]
pub struct PointConfig {
    pub object_type: ObjectType,
    pub instance: u32,
    pub name: String,
    #[serde(default)]
    pub notification_class: u32,
    pub relinquish_default: Option<ValueConfig>,
    /// Multi-state objects only.
    pub number_of_states: Option<u32>,
    /// Binary objects only; defaults to `active`.
    pub alarm_value: Option<BinaryPv>,
    /// Multi-state objects only.
    #[serde(default)]
    pub alarm_values: Vec<u32>,
    /// Multi-state objects only.
    #[serde(default)]
    pub fault_values: Vec<u32>,
    /// Ticks an alarm condition must hold before the transition fires.
    #[serde(default)]
    pub time_delay: u32,
    #[serde(default = "all_transitions")]
    pub event_enable: TransitionBits,
    #[serde(default)]
    pub notify_type: NotifyType,
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

impl PointConfig {
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        ObjectId::new(self.object_type, self.instance)
    }

    /// Build the monitored point described by this entry.
    ///
    /// # Errors
    ///
    /// Returns [`MiniBacError::Validation`] when the entry does not describe
    /// a valid point of its object type.
    pub fn build(&self) -> Result<MonitoredPoint, MiniBacError> {
        let alarm = if self.object_type.is_binary() {
            AlarmCondition::Binary {
                alarm_value: self.alarm_value.unwrap_or(BinaryPv::Active),
            }
        } else {
            AlarmCondition::MultiState {
                alarm_values: self.alarm_values.clone(),
                fault_values: self.fault_values.clone(),
            }
        };
        let mut builder = MonitoredPoint::builder(self.object_id())
            .name(self.name.clone())
            .notification_class(self.notification_class)
            .alarm(alarm)
            .reporting(ReportingConfig {
                time_delay: self.time_delay,
                event_enable: self.event_enable,
                notify_type: self.notify_type,
            });
        if let Some(value) = self.relinquish_default {
            builder = builder.relinquish_default(value.into());
        }
        if let Some(count) = self.number_of_states {
            builder = builder.number_of_states(count);
        }
        builder.build()
    }
}

/// A device answering discovery at a fixed address.
#[derive(Debug, Clone, Deserialize)]
pub struct PeerConfig {
    pub device: u32,
    #[serde(default)]
    pub network: u16,
    pub mac: Vec<u8>,
}

impl PeerConfig {
    #[must_use]
    pub fn address(&self) -> NetworkAddress {
        NetworkAddress::remote(self.network, self.mac.clone())
    }
}

impl NotificationClassConfig {
    /// The class without its recipients; those are set through the
    /// notification class service so that bindings get requested.
    #[must_use]
    pub fn class(&self) -> NotificationClass {
        NotificationClass::new(self.instance)
            .with_priority(self.priority)
            .with_ack_required(self.ack_required)
    }
}

impl Config {
    /// Load configuration from `minibac.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("MINIBAC_CONFIG").unwrap_or_else(|_| "minibac.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(instance) = env_parse("MINIBAC_DEVICE_INSTANCE") {
            self.device.instance = instance;
        }
        if let Some(tick_ms) = env_parse("MINIBAC_TICK_MS") {
            self.engine.tick_ms = tick_ms;
        }
        if let Ok(val) = std::env::var("MINIBAC_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !DeviceInstance(self.device.instance).is_assigned() {
            return Err(ConfigError::Validation(format!(
                "device instance must be within 1..={MAX_INSTANCE}"
            )));
        }
        if self.engine.tick_ms == 0 {
            return Err(ConfigError::Validation("tick_ms must be non-zero".to_string()));
        }
        if self.engine.sweep_secs == 0 {
            return Err(ConfigError::Validation("sweep_secs must be non-zero".to_string()));
        }
        if self.engine.bus_capacity == 0 {
            return Err(ConfigError::Validation("bus_capacity must be non-zero".to_string()));
        }

        let mut classes = BTreeSet::new();
        for nc in &self.notification_class {
            if !classes.insert(nc.instance) {
                return Err(ConfigError::Validation(format!(
                    "notification class {} is defined twice",
                    nc.instance
                )));
            }
            if nc.recipients.len() > MAX_RECIPIENTS {
                return Err(ConfigError::Validation(format!(
                    "notification class {} lists more than {MAX_RECIPIENTS} recipients",
                    nc.instance
                )));
            }
        }

        let mut objects = BTreeSet::new();
        for point in &self.point {
            if !objects.insert(point.object_id()) {
                return Err(ConfigError::Validation(format!(
                    "point {} is defined twice",
                    point.object_id()
                )));
            }
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            instance: 260_001,
            name: "minibac".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            sweep_secs: 60,
            bus_capacity: 256,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "minibacd=info,minibac_app=info,minibac_adapter_virtual=info".to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

fn default_priority() -> [u8; 3] {
    [DEFAULT_PRIORITY; 3]
}

fn all_transitions() -> TransitionBits {
    TransitionBits::ALL
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
