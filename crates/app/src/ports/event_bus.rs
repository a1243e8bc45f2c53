//! Event bus port — publish/subscribe for local bus events.

use std::future::Future;

use minibac_domain::event::Event;

/// Publishes bus events to interested subscribers.
///
/// Publishing is fire-and-forget: a bus with no subscribers drops the event.
pub trait EventPublisher {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: Event) -> impl Future<Output = ()> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = ()> + Send {
        (**self).publish(event)
    }
}
