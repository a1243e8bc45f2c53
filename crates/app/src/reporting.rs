//! Intrinsic reporting capability and the object table built from it.
//!
//! Each object type implements [`IntrinsicReporting`] once. The daemon
//! assembles the implementations into an [`ObjectTable`] at startup; the
//! table is never mutated afterwards.

use std::sync::Arc;

use minibac_domain::ack::{AckOutcome, AckRequest};
use minibac_domain::error::AckError;
use minibac_domain::event::Event;
use minibac_domain::id::{ObjectId, ObjectType};
use minibac_domain::notification::EventRecord;
use minibac_domain::summary::{AlarmSummary, EventSummary, Slot};
use minibac_domain::time::Timestamp;

use crate::registry::NotificationClassRegistry;

/// What one evaluation tick of an object type produced.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Transitions and ack notifications, in object order.
    pub records: Vec<EventRecord>,
    /// Present-value changes detected since the previous tick.
    pub changes: Vec<Event>,
}

impl TickReport {
    pub fn append(&mut self, mut other: TickReport) {
        self.records.append(&mut other.records);
        self.changes.append(&mut other.changes);
    }
}

/// Event-reporting operations every monitored object type provides.
///
/// Objects are addressed by a dense index in ascending instance order.
pub trait IntrinsicReporting: Send + Sync {
    fn object_type(&self) -> ObjectType;

    /// Number of objects of this type.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn object_id(&self, index: usize) -> Option<ObjectId>;

    /// Evaluate every object once.
    fn tick(&self, registry: &NotificationClassRegistry, now: Timestamp) -> TickReport;

    /// Active-event summary of the object at `index`.
    fn event_information(
        &self,
        index: usize,
        registry: &NotificationClassRegistry,
    ) -> Slot<EventSummary>;

    /// Alarm summary of the object at `index`.
    fn alarm_summary(&self, index: usize) -> Slot<AlarmSummary>;

    /// Acknowledge a transition of the object with the given instance.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT` for a missing instance, otherwise the monitor's
    /// acknowledgment errors.
    fn alarm_ack(&self, instance: u32, request: &AckRequest) -> Result<AckOutcome, AckError>;
}

/// Immutable table of reporting object types, in ascending type order.
#[derive(Default, Clone)]
pub struct ObjectTable {
    reporters: Vec<Arc<dyn IntrinsicReporting>>,
}

impl ObjectTable {
    /// Build the table. When a type appears twice the first entry wins.
    #[must_use]
    pub fn new(mut reporters: Vec<Arc<dyn IntrinsicReporting>>) -> Self {
        reporters.sort_by_key(|reporter| reporter.object_type());
        reporters.dedup_by_key(|reporter| reporter.object_type());
        Self { reporters }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn IntrinsicReporting> {
        self.reporters.iter().map(|reporter| &**reporter)
    }

    #[must_use]
    pub fn find(&self, object_type: ObjectType) -> Option<&dyn IntrinsicReporting> {
        self.iter()
            .find(|reporter| reporter.object_type() == object_type)
    }
}

impl std::fmt::Debug for ObjectTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|reporter| reporter.object_type()))
            .finish()
    }
}
