//! # minibac-adapter-virtual
//!
//! In-memory adapters for running and testing the event subsystem without
//! a physical network.
//!
//! ## Provided adapters
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`VirtualNetwork`] | `AddressResolver`, `NotificationTransport` | Binding table filled by discovery of configured peers; records every transmission |
//! | [`LoggingOutput`] | `PhysicalOutput` | Logs and records every applied value |
//! | [`InMemorySettingsStore`] | `SettingsStore` | Keeps the latest value per key |
//!
//! ## Dependency rule
//!
//! Depends on `minibac-app` (port traits) and `minibac-domain` only.

mod network;
mod output;
mod settings;

pub use network::{Transmission, VirtualNetwork};
pub use output::LoggingOutput;
pub use settings::InMemorySettingsStore;
