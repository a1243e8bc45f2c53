//! Address resolution port — the device-to-address binding table.
//!
//! Resolution never blocks delivery: [`bind`](AddressResolver::bind) answers
//! from what is already known, and [`discover`](AddressResolver::discover)
//! only asks the network so a later lookup can succeed.

use std::future::Future;

use minibac_domain::id::DeviceInstance;
use minibac_domain::notification_class::NetworkAddress;

/// Looks up and maintains device address bindings.
pub trait AddressResolver {
    /// Return the bound address of `device`, if any, and remember that
    /// the device is wanted.
    fn bind(
        &self,
        device: DeviceInstance,
    ) -> impl Future<Output = Option<NetworkAddress>> + Send;

    /// Broadcast a discovery request for `device` (fire-and-forget).
    fn discover(&self, device: DeviceInstance) -> impl Future<Output = ()> + Send;

    /// Send a directed discovery request to `address` (fire-and-forget).
    fn discover_at(&self, address: &NetworkAddress) -> impl Future<Output = ()> + Send;

    /// Forget the binding of `device`.
    fn release(&self, device: DeviceInstance) -> impl Future<Output = ()> + Send;
}

impl<T: AddressResolver + Send + Sync> AddressResolver for std::sync::Arc<T> {
    fn bind(
        &self,
        device: DeviceInstance,
    ) -> impl Future<Output = Option<NetworkAddress>> + Send {
        (**self).bind(device)
    }

    fn discover(&self, device: DeviceInstance) -> impl Future<Output = ()> + Send {
        (**self).discover(device)
    }

    fn discover_at(&self, address: &NetworkAddress) -> impl Future<Output = ()> + Send {
        (**self).discover_at(address)
    }

    fn release(&self, device: DeviceInstance) -> impl Future<Output = ()> + Send {
        (**self).release(device)
    }
}
