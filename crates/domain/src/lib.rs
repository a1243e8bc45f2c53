//! # minibac-domain
//!
//! Pure domain model for the minibac event/alarm subsystem.
//!
//! ## Responsibilities
//! - Foundational types: object identifiers, error codes, device timestamps
//! - Define the **Commandable Point** (16-level priority ladder + change detection)
//! - Define the **Event Monitor** (intrinsic-reporting state machine with time delay)
//! - Define **Acknowledgment** tracking per transition kind
//! - Define **Notification Classes** and their **Recipients** (day/time/transition filters)
//! - Define **Event records**, per-recipient **notifications**, and summaries
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod ack;
pub mod commandable;
pub mod event;
pub mod event_state;
pub mod monitor;
pub mod notification;
pub mod notification_class;
pub mod point;
pub mod summary;
pub mod value;
