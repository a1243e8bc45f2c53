//! # minibac-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `AddressResolver` — device address bindings and discovery
//!   - `NotificationTransport` — confirmed / unconfirmed delivery
//!   - `PhysicalOutput` — hardware effect of a resolved value
//!   - `SettingsStore` — persistence of configuration changes
//!   - `Clock` — device-local time
//!   - `EventPublisher` — local bus
//! - Define **driving/inbound ports** as use-case structs/traits:
//!   - `PointService` — priority writes, relinquish, out-of-service
//!   - `NotificationClassService` — recipient list replacement
//!   - `AlarmService` — event information, alarm summary, acknowledgment
//!   - `EventEngine` — evaluation tick and address sweep
//! - Hold per-object-type state in `PointManager`s exposed through the
//!   `IntrinsicReporting` capability
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `minibac-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod dispatcher;
pub mod event_bus;
pub mod event_engine;
pub mod point_manager;
pub mod ports;
pub mod registry;
pub mod reporting;
pub mod services;
