//! Point manager — the ordered table of monitored points of one object type.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use minibac_domain::ack::{AckOutcome, AckRequest};
use minibac_domain::error::{AckError, ProtocolError, ValidationError};
use minibac_domain::event::Event;
use minibac_domain::id::{ObjectId, ObjectType};
use minibac_domain::point::MonitoredPoint;
use minibac_domain::summary::{AlarmSummary, EventSummary, Slot};
use minibac_domain::time::Timestamp;

use crate::registry::NotificationClassRegistry;
use crate::reporting::{IntrinsicReporting, TickReport};

/// Monitored points of one object type keyed by instance.
///
/// Each point sits behind its own mutex so that writes, ticks and
/// acknowledgments on the same object are serialized.
#[derive(Debug)]
pub struct PointManager {
    object_type: ObjectType,
    points: BTreeMap<u32, Mutex<MonitoredPoint>>,
}

impl PointManager {
    #[must_use]
    pub fn new(object_type: ObjectType) -> Self {
        Self {
            object_type,
            points: BTreeMap::new(),
        }
    }

    /// Add a point at startup.
    ///
    /// # Errors
    ///
    /// [`ValidationError::WrongObjectType`] when the point has another type,
    /// [`ValidationError::DuplicateObject`] when the instance is taken.
    pub fn insert(&mut self, point: MonitoredPoint) -> Result<(), ValidationError> {
        if point.id.object_type != self.object_type {
            return Err(ValidationError::WrongObjectType {
                object: point.id,
                expected: self.object_type,
            });
        }
        if self.points.contains_key(&point.id.instance) {
            return Err(ValidationError::DuplicateObject(point.id));
        }
        self.points.insert(point.id.instance, Mutex::new(point));
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, instance: u32) -> bool {
        self.points.contains_key(&instance)
    }

    /// Run `f` with exclusive access to one point.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT` when no point has this instance.
    pub fn with_point<R>(
        &self,
        instance: u32,
        f: impl FnOnce(&mut MonitoredPoint) -> R,
    ) -> Result<R, ProtocolError> {
        let point = self
            .points
            .get(&instance)
            .ok_or_else(ProtocolError::unknown_object)?;
        Ok(f(&mut lock(point)))
    }

    /// Copy of one point's current state.
    #[must_use]
    pub fn snapshot(&self, instance: u32) -> Option<MonitoredPoint> {
        self.points.get(&instance).map(|point| lock(point).clone())
    }

    fn at(&self, index: usize) -> Option<&Mutex<MonitoredPoint>> {
        self.points.values().nth(index)
    }
}

fn lock(point: &Mutex<MonitoredPoint>) -> MutexGuard<'_, MonitoredPoint> {
    point.lock().unwrap_or_else(PoisonError::into_inner)
}

impl IntrinsicReporting for PointManager {
    fn object_type(&self) -> ObjectType {
        self.object_type
    }

    fn len(&self) -> usize {
        self.points.len()
    }

    fn object_id(&self, index: usize) -> Option<ObjectId> {
        self.points
            .keys()
            .nth(index)
            .map(|instance| ObjectId::new(self.object_type, *instance))
    }

    fn tick(&self, registry: &NotificationClassRegistry, now: Timestamp) -> TickReport {
        let mut report = TickReport::default();
        for point in self.points.values() {
            let mut point = lock(point);
            if point.take_changed() {
                report.changes.push(Event::value_changed(
                    point.id,
                    point.present_value(),
                    point.status_flags(),
                    now,
                ));
            }
            let ack_required = registry.ack_required(point.notification_class);
            if let Some(record) = point.tick(ack_required, now) {
                report.records.push(record);
            }
        }
        report
    }

    fn event_information(
        &self,
        index: usize,
        registry: &NotificationClassRegistry,
    ) -> Slot<EventSummary> {
        let Some(point) = self.at(index) else {
            return Slot::EndOfList;
        };
        let point = lock(point);
        point
            .event_summary(registry.priorities(point.notification_class))
            .map_or(Slot::Inactive, Slot::Active)
    }

    fn alarm_summary(&self, index: usize) -> Slot<AlarmSummary> {
        let Some(point) = self.at(index) else {
            return Slot::EndOfList;
        };
        lock(point)
            .alarm_summary()
            .map_or(Slot::Inactive, Slot::Active)
    }

    fn alarm_ack(&self, instance: u32, request: &AckRequest) -> Result<AckOutcome, AckError> {
        self.with_point(instance, |point| point.acknowledge(request))?
    }
}
