//! Notification transport port — confirmed and unconfirmed delivery.
//!
//! Retries and timeouts of confirmed delivery belong to the transport;
//! callers treat both paths as fire-and-forget.

use std::future::Future;

use minibac_domain::notification::EventNotification;
use minibac_domain::notification_class::NetworkAddress;

/// Failure to hand a notification to the network.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("no route to {0}")]
    Unreachable(NetworkAddress),
    #[error("no free transaction slot")]
    Busy,
    #[error("transport failure: {0}")]
    Other(String),
}

/// Sends event notifications to network addresses.
pub trait NotificationTransport {
    /// Send through the confirmed-delivery path.
    fn send_confirmed(
        &self,
        address: &NetworkAddress,
        notification: &EventNotification,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Send without requesting an application-level acknowledgment.
    fn send_unconfirmed(
        &self,
        address: &NetworkAddress,
        notification: &EventNotification,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

impl<T: NotificationTransport + Send + Sync> NotificationTransport for std::sync::Arc<T> {
    fn send_confirmed(
        &self,
        address: &NetworkAddress,
        notification: &EventNotification,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).send_confirmed(address, notification)
    }

    fn send_unconfirmed(
        &self,
        address: &NetworkAddress,
        notification: &EventNotification,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        (**self).send_unconfirmed(address, notification)
    }
}
