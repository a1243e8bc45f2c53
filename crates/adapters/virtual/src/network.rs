//! Virtual network — binding table, peer discovery and recorded transmissions.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use minibac_app::ports::{AddressResolver, NotificationTransport, TransportError};
use minibac_domain::id::DeviceInstance;
use minibac_domain::notification::EventNotification;
use minibac_domain::notification_class::NetworkAddress;

/// One notification handed to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmission {
    pub address: NetworkAddress,
    pub confirmed: bool,
    pub notification: EventNotification,
}

/// Simulated network segment.
///
/// Peers are the devices that answer discovery. A device only gets a
/// binding once it has been discovered, like a real binding table.
#[derive(Debug, Default)]
pub struct VirtualNetwork {
    peers: Mutex<HashMap<DeviceInstance, NetworkAddress>>,
    bindings: Mutex<HashMap<DeviceInstance, NetworkAddress>>,
    offline: Mutex<HashSet<NetworkAddress>>,
    sent: Mutex<Vec<Transmission>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl VirtualNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device that answers discovery at `address`.
    #[must_use]
    pub fn with_peer(self, device: DeviceInstance, address: NetworkAddress) -> Self {
        self.add_peer(device, address);
        self
    }

    pub fn add_peer(&self, device: DeviceInstance, address: NetworkAddress) {
        lock(&self.peers).insert(device, address);
    }

    /// Make sends to `address` fail (or succeed again).
    pub fn set_offline(&self, address: NetworkAddress, offline: bool) {
        let mut set = lock(&self.offline);
        if offline {
            set.insert(address);
        } else {
            set.remove(&address);
        }
    }

    /// Current binding of `device`, without side effects.
    #[must_use]
    pub fn binding(&self, device: DeviceInstance) -> Option<NetworkAddress> {
        lock(&self.bindings).get(&device).cloned()
    }

    #[must_use]
    pub fn transmissions(&self) -> Vec<Transmission> {
        lock(&self.sent).clone()
    }

    /// Return and clear the recorded transmissions.
    pub fn take_transmissions(&self) -> Vec<Transmission> {
        std::mem::take(&mut *lock(&self.sent))
    }

    fn transmit(
        &self,
        address: &NetworkAddress,
        confirmed: bool,
        notification: &EventNotification,
    ) -> Result<(), TransportError> {
        if lock(&self.offline).contains(address) {
            return Err(TransportError::Unreachable(address.clone()));
        }
        tracing::debug!(
            %address,
            confirmed,
            object = %notification.event_object,
            "virtual transmit"
        );
        lock(&self.sent).push(Transmission {
            address: address.clone(),
            confirmed,
            notification: notification.clone(),
        });
        Ok(())
    }
}

impl AddressResolver for VirtualNetwork {
    async fn bind(&self, device: DeviceInstance) -> Option<NetworkAddress> {
        self.binding(device)
    }

    async fn discover(&self, device: DeviceInstance) {
        let found = lock(&self.peers).get(&device).cloned();
        match found {
            Some(address) => {
                tracing::debug!(%device, %address, "peer answered discovery");
                lock(&self.bindings).insert(device, address);
            }
            None => tracing::debug!(%device, "no answer to discovery"),
        }
    }

    async fn discover_at(&self, address: &NetworkAddress) {
        let found: Vec<DeviceInstance> = lock(&self.peers)
            .iter()
            .filter(|(_, peer)| *peer == address)
            .map(|(device, _)| *device)
            .collect();
        let mut bindings = lock(&self.bindings);
        for device in found {
            bindings.insert(device, address.clone());
        }
    }

    async fn release(&self, device: DeviceInstance) {
        lock(&self.bindings).remove(&device);
    }
}

impl NotificationTransport for VirtualNetwork {
    async fn send_confirmed(
        &self,
        address: &NetworkAddress,
        notification: &EventNotification,
    ) -> Result<(), TransportError> {
        self.transmit(address, true, notification)
    }

    async fn send_unconfirmed(
        &self,
        address: &NetworkAddress,
        notification: &EventNotification,
    ) -> Result<(), TransportError> {
        self.transmit(address, false, notification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use minibac_domain::event_state::{EventState, EventType, NotifyType};
    use minibac_domain::id::{ObjectId, ObjectType};

    fn addr() -> NetworkAddress {
        NetworkAddress::local([192, 168, 1, 20, 0xBA, 0xC0])
    }

    fn notification() -> EventNotification {
        EventNotification {
            process_id: 1,
            initiating_device: DeviceInstance(260),
            event_object: ObjectId::new(ObjectType::BinaryValue, 1),
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 6)
                .unwrap()
                .and_hms_opt(14, 0, 0)
                .unwrap(),
            notification_class: 1,
            priority: 100,
            event_type: EventType::ChangeOfState,
            message_text: "normal to offnormal".to_string(),
            notify_type: NotifyType::Alarm,
            ack_required: false,
            from_state: EventState::Normal,
            to_state: EventState::Offnormal,
            new_value: None,
            status_flags: None,
        }
    }

    #[tokio::test]
    async fn should_bind_only_after_discovery() {
        let network = VirtualNetwork::new().with_peer(DeviceInstance(7), addr());

        assert_eq!(network.bind(DeviceInstance(7)).await, None);
        network.discover(DeviceInstance(7)).await;
        assert_eq!(network.bind(DeviceInstance(7)).await, Some(addr()));
    }

    #[tokio::test]
    async fn should_leave_unknown_device_unbound() {
        let network = VirtualNetwork::new();
        network.discover(DeviceInstance(8)).await;
        assert_eq!(network.bind(DeviceInstance(8)).await, None);
    }

    #[tokio::test]
    async fn should_bind_peer_found_by_directed_discovery() {
        let network = VirtualNetwork::new().with_peer(DeviceInstance(7), addr());
        network.discover_at(&addr()).await;
        assert_eq!(network.binding(DeviceInstance(7)), Some(addr()));
    }

    #[tokio::test]
    async fn should_forget_binding_on_release() {
        let network = VirtualNetwork::new().with_peer(DeviceInstance(7), addr());
        network.discover(DeviceInstance(7)).await;
        network.release(DeviceInstance(7)).await;
        assert_eq!(network.binding(DeviceInstance(7)), None);
    }

    #[tokio::test]
    async fn should_record_transmissions_with_delivery_mode() {
        let network = VirtualNetwork::new();
        network.send_confirmed(&addr(), &notification()).await.unwrap();
        network
            .send_unconfirmed(&NetworkAddress::broadcast(), &notification())
            .await
            .unwrap();

        let sent = network.take_transmissions();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].confirmed);
        assert!(!sent[1].confirmed);
        assert!(network.transmissions().is_empty());
    }

    #[tokio::test]
    async fn should_fail_send_to_offline_station() {
        let network = VirtualNetwork::new();
        network.set_offline(addr(), true);

        let err = network
            .send_unconfirmed(&addr(), &notification())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Unreachable(_)));
        assert!(network.transmissions().is_empty());
    }
}
