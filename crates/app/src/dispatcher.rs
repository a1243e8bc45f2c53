//! Dispatcher — turns an event record into notifications for every admitted
//! recipient of its notification class.

use minibac_domain::id::DeviceInstance;
use minibac_domain::notification::{EventNotification, EventRecord};
use minibac_domain::notification_class::{Destination, NetworkAddress, NotificationClass, Recipient};

use crate::ports::{AddressResolver, NotificationTransport};

/// Sends event notifications on behalf of one device.
pub struct Dispatcher<A, T> {
    device: DeviceInstance,
    resolver: A,
    transport: T,
}

impl<A, T> Dispatcher<A, T>
where
    A: AddressResolver,
    T: NotificationTransport,
{
    pub fn new(device: DeviceInstance, resolver: A, transport: T) -> Self {
        Self {
            device,
            resolver,
            transport,
        }
    }

    #[must_use]
    pub fn device(&self) -> DeviceInstance {
        self.device
    }

    pub fn resolver(&self) -> &A {
        &self.resolver
    }

    /// Send `record` to every recipient of `class` admitted at the record's
    /// timestamp, in list order. Returns the number of notifications handed
    /// to the transport.
    ///
    /// Device recipients without a bound address are skipped for this event;
    /// the address sweep binds them for later ones. Transport failures are
    /// logged and do not stop the remaining recipients.
    pub async fn report(&self, record: &EventRecord, class: &NotificationClass) -> usize {
        let Some(transition) = record.transition() else {
            tracing::debug!(
                object = %record.object,
                state = %record.to_state,
                "no transition kind for state"
            );
            return 0;
        };

        let notification = EventNotification {
            process_id: 0,
            initiating_device: self.device,
            event_object: record.object,
            timestamp: record.timestamp,
            notification_class: class.instance,
            priority: class.priority_for(transition),
            event_type: record.event_type,
            message_text: record.message.clone(),
            notify_type: record.notify_type,
            ack_required: !record.is_ack_notification() && class.ack_required_for(transition),
            from_state: record.from_state,
            to_state: record.to_state,
            new_value: (!record.is_ack_notification()).then_some(record.value),
            status_flags: (!record.is_ack_notification()).then_some(record.status_flags),
        };

        let mut sent = 0;
        for dest in class.recipients() {
            if !dest.admits(transition, record.timestamp) {
                tracing::debug!(
                    object = %record.object,
                    recipient = %dest.recipient,
                    "recipient not active"
                );
                continue;
            }
            let Some(address) = self.resolve(&dest.recipient).await else {
                tracing::debug!(
                    object = %record.object,
                    recipient = %dest.recipient,
                    "address unresolved, skipping"
                );
                continue;
            };
            if self.send(dest, &address, &notification).await {
                sent += 1;
            }
        }
        sent
    }

    async fn resolve(&self, recipient: &Recipient) -> Option<NetworkAddress> {
        match recipient {
            Recipient::Device(device) => self.resolver.bind(*device).await,
            Recipient::Address(address) => Some(address.clone()),
        }
    }

    async fn send(
        &self,
        dest: &Destination,
        address: &NetworkAddress,
        notification: &EventNotification,
    ) -> bool {
        let notification = EventNotification {
            process_id: dest.process_id,
            ..notification.clone()
        };
        let confirmed = dest.confirmed && !address.is_broadcast();
        let result = if confirmed {
            self.transport.send_confirmed(address, &notification).await
        } else {
            self.transport.send_unconfirmed(address, &notification).await
        };
        match result {
            Ok(()) => {
                tracing::debug!(
                    %address,
                    confirmed,
                    to = %notification.to_state,
                    "notification sent"
                );
                true
            }
            Err(err) => {
                tracing::warn!(%address, confirmed, error = %err, "failed to send notification");
                false
            }
        }
    }
}
