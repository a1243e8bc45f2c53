//! Event engine — drives the evaluation tick and the address sweep.
//!
//! On every tick each reporting object type is evaluated once. Value changes
//! and transitions are published on the local bus, and every event record is
//! handed to the dispatcher together with its notification class. Delivery
//! happens inline with the tick that produced the record.

use std::sync::Arc;

use minibac_domain::event::Event;
use minibac_domain::notification::EventRecord;

use crate::dispatcher::Dispatcher;
use crate::ports::{AddressResolver, Clock, EventPublisher, NotificationTransport};
use crate::registry::NotificationClassRegistry;
use crate::reporting::{ObjectTable, TickReport};

/// Periodic intrinsic-reporting driver.
pub struct EventEngine<A, T, P, C> {
    table: ObjectTable,
    registry: Arc<NotificationClassRegistry>,
    dispatcher: Dispatcher<A, T>,
    publisher: P,
    clock: C,
}

impl<A, T, P, C> EventEngine<A, T, P, C>
where
    A: AddressResolver,
    T: NotificationTransport,
    P: EventPublisher,
    C: Clock,
{
    /// Create a new engine.
    pub fn new(
        table: ObjectTable,
        registry: Arc<NotificationClassRegistry>,
        dispatcher: Dispatcher<A, T>,
        publisher: P,
        clock: C,
    ) -> Self {
        Self {
            table,
            registry,
            dispatcher,
            publisher,
            clock,
        }
    }

    /// Evaluate every object once and deliver what it produced.
    ///
    /// Records referencing a missing notification class are published on
    /// the bus but sent to nobody.
    pub async fn tick(&self) -> Vec<EventRecord> {
        let now = self.clock.now();
        let mut report = TickReport::default();
        for reporter in self.table.iter() {
            report.append(reporter.tick(&self.registry, now));
        }

        for change in report.changes {
            self.publisher.publish(change).await;
        }

        for record in &report.records {
            if record.is_ack_notification() {
                tracing::info!(
                    object = %record.object,
                    state = %record.to_state,
                    "acknowledgment notification"
                );
            } else {
                tracing::info!(
                    object = %record.object,
                    from = %record.from_state,
                    to = %record.to_state,
                    "event state transition"
                );
            }
            self.publisher.publish(Event::from(record)).await;

            match self.registry.lookup(record.notification_class) {
                Some(class) => {
                    self.dispatcher.report(record, &class).await;
                }
                None => tracing::debug!(
                    object = %record.object,
                    class = record.notification_class,
                    "no notification class, nothing sent"
                ),
            }
        }
        report.records
    }

    /// Refresh bindings of every device recipient. Returns how many devices
    /// are still unresolved after discovery was requested for them.
    pub async fn sweep_addresses(&self) -> usize {
        let resolver = self.dispatcher.resolver();
        let mut unresolved = 0;
        for device in self.registry.device_recipients() {
            if resolver.bind(device).await.is_none() {
                tracing::debug!(%device, "discovering unbound recipient");
                resolver.discover(device).await;
                unresolved += 1;
            }
        }
        unresolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_manager::PointManager;
    use crate::ports::TransportError;
    use crate::reporting::IntrinsicReporting;
    use chrono::{Duration, NaiveDate};
    use minibac_domain::event::EventKind;
    use minibac_domain::event_state::EventState;
    use minibac_domain::id::{DeviceInstance, ObjectId, ObjectType};
    use minibac_domain::monitor::ReportingConfig;
    use minibac_domain::notification::EventNotification;
    use minibac_domain::notification_class::{
        Destination, NetworkAddress, NotificationClass, Recipient,
    };
    use minibac_domain::point::MonitoredPoint;
    use minibac_domain::time::Timestamp;
    use minibac_domain::value::{BinaryPv, PointValue, WriteValue};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct TickClock {
        start: Timestamp,
        ticks: Mutex<i64>,
    }

    impl Clock for TickClock {
        fn now(&self) -> Timestamp {
            let mut ticks = self.ticks.lock().unwrap();
            *ticks += 1;
            self.start + Duration::seconds(*ticks)
        }
    }

    #[derive(Default)]
    struct SpyNetwork {
        bound: Mutex<HashMap<DeviceInstance, NetworkAddress>>,
        discovered: Mutex<Vec<DeviceInstance>>,
        sent: Mutex<Vec<EventNotification>>,
    }

    impl AddressResolver for SpyNetwork {
        async fn bind(&self, device: DeviceInstance) -> Option<NetworkAddress> {
            self.bound.lock().unwrap().get(&device).cloned()
        }

        async fn discover(&self, device: DeviceInstance) {
            self.discovered.lock().unwrap().push(device);
        }

        async fn discover_at(&self, _address: &NetworkAddress) {}

        async fn release(&self, device: DeviceInstance) {
            self.bound.lock().unwrap().remove(&device);
        }
    }

    impl NotificationTransport for SpyNetwork {
        async fn send_confirmed(
            &self,
            address: &NetworkAddress,
            notification: &EventNotification,
        ) -> Result<(), TransportError> {
            self.send_unconfirmed(address, notification).await
        }

        async fn send_unconfirmed(
            &self,
            _address: &NetworkAddress,
            notification: &EventNotification,
        ) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct SpyPublisher {
        events: Mutex<Vec<Event>>,
    }

    impl EventPublisher for SpyPublisher {
        async fn publish(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    type Engine = EventEngine<Arc<SpyNetwork>, Arc<SpyNetwork>, Arc<SpyPublisher>, TickClock>;

    const BO1: ObjectId = ObjectId::new(ObjectType::BinaryOutput, 1);

    fn setup(class: u32) -> (Engine, Arc<PointManager>, Arc<SpyNetwork>, Arc<SpyPublisher>) {
        let mut manager = PointManager::new(ObjectType::BinaryOutput);
        manager
            .insert(
                MonitoredPoint::builder(BO1)
                    .name("Chiller")
                    .notification_class(class)
                    .reporting(ReportingConfig {
                        time_delay: 2,
                        ..ReportingConfig::default()
                    })
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let manager = Arc::new(manager);

        let registry = Arc::new(NotificationClassRegistry::new());
        let mut nc = NotificationClass::new(1).with_priority([10, 20, 30]);
        nc.set_recipients(vec![
            Destination::new(Recipient::Device(DeviceInstance(500))),
            Destination::new(Recipient::Device(DeviceInstance(501))),
        ])
        .unwrap();
        registry.insert(nc);

        let network = Arc::new(SpyNetwork::default());
        network
            .bound
            .lock()
            .unwrap()
            .insert(DeviceInstance(500), NetworkAddress::local([10, 0, 0, 5]));
        let publisher = Arc::new(SpyPublisher::default());
        let clock = TickClock {
            start: NaiveDate::from_ymd_opt(2024, 3, 6)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
            ticks: Mutex::new(0),
        };

        let table = ObjectTable::new(vec![Arc::clone(&manager) as Arc<dyn IntrinsicReporting>]);
        let dispatcher = Dispatcher::new(
            DeviceInstance(260),
            Arc::clone(&network),
            Arc::clone(&network),
        );
        let engine = EventEngine::new(table, registry, dispatcher, Arc::clone(&publisher), clock);
        (engine, manager, network, publisher)
    }

    fn activate(manager: &PointManager) {
        manager
            .with_point(BO1.instance, |point| {
                point
                    .write(8, WriteValue::Value(PointValue::Binary(BinaryPv::Active)))
                    .unwrap()
            })
            .unwrap();
    }

    #[tokio::test]
    async fn should_transition_on_second_tick_and_notify_bound_recipient() {
        let (engine, manager, network, _) = setup(1);
        activate(&manager);

        assert!(engine.tick().await.is_empty());
        assert_eq!(
            manager.snapshot(1).unwrap().monitor().state(),
            EventState::Normal
        );

        let records = engine.tick().await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].from_state, EventState::Normal);
        assert_eq!(records[0].to_state, EventState::Offnormal);
        let sent = network.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].priority, 10);
        assert_eq!(sent[0].initiating_device, DeviceInstance(260));
    }

    #[tokio::test]
    async fn should_publish_value_change_and_transition_on_bus() {
        let (engine, manager, _, publisher) = setup(1);
        activate(&manager);

        engine.tick().await;
        engine.tick().await;

        let events = publisher.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].kind, EventKind::ValueChanged { .. }));
        assert!(matches!(
            events[1].kind,
            EventKind::StateTransition {
                to: EventState::Offnormal,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn should_send_nothing_when_class_is_missing() {
        let (engine, manager, network, publisher) = setup(42);
        activate(&manager);

        engine.tick().await;
        let records = engine.tick().await;

        assert_eq!(records.len(), 1);
        assert!(network.sent.lock().unwrap().is_empty());
        assert_eq!(publisher.events.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_discover_unbound_recipients_on_sweep() {
        let (engine, _, network, _) = setup(1);

        let unresolved = engine.sweep_addresses().await;

        assert_eq!(unresolved, 1);
        assert_eq!(
            *network.discovered.lock().unwrap(),
            vec![DeviceInstance(501)]
        );
    }
}
