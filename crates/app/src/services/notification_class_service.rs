//! Notification class service — recipient list replacement with its
//! address-binding side effects.

use std::sync::Arc;

use minibac_domain::error::ProtocolError;
use minibac_domain::notification_class::{
    Destination, NotificationClass, Recipient, RecipientUpdate,
};

use crate::ports::{AddressResolver, SettingsStore};
use crate::registry::NotificationClassRegistry;

/// Application service for notification class configuration.
pub struct NotificationClassService<A, S> {
    registry: Arc<NotificationClassRegistry>,
    resolver: A,
    store: S,
}

impl<A, S> NotificationClassService<A, S>
where
    A: AddressResolver,
    S: SettingsStore,
{
    pub fn new(registry: Arc<NotificationClassRegistry>, resolver: A, store: S) -> Self {
        Self {
            registry,
            resolver,
            store,
        }
    }

    /// Look up a class.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT` when the class does not exist.
    pub fn get_class(&self, instance: u32) -> Result<NotificationClass, ProtocolError> {
        self.registry
            .lookup(instance)
            .ok_or_else(ProtocolError::unknown_object)
    }

    /// Replace the recipient list of a class.
    ///
    /// Devices no longer listed by any class are released. Every valid
    /// recipient gets a binding request right away: devices without a known
    /// address are discovered, non-broadcast addresses get a directed
    /// discovery so their device identity becomes known.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_OBJECT` for a missing class, `NO_SPACE_TO_WRITE_PROPERTY`
    /// when more than ten entries are given.
    #[tracing::instrument(skip(self, entries), fields(count = entries.len()))]
    pub async fn set_recipients(
        &self,
        instance: u32,
        entries: Vec<Destination>,
    ) -> Result<RecipientUpdate, ProtocolError> {
        let update = self.registry.replace_recipients(instance, entries)?;

        for device in &update.released {
            tracing::debug!(%device, "releasing address binding");
            self.resolver.release(*device).await;
        }
        for recipient in &update.bind {
            match recipient {
                Recipient::Device(device) => {
                    if self.resolver.bind(*device).await.is_none() {
                        tracing::debug!(%device, "address unknown, discovering");
                        self.resolver.discover(*device).await;
                    }
                }
                Recipient::Address(address) if !address.is_broadcast() => {
                    self.resolver.discover_at(address).await;
                }
                Recipient::Address(_) => {}
            }
        }

        if let Some(class) = self.registry.lookup(instance) {
            super::persist(
                &self.store,
                &format!("notification-class:{instance}/recipient-list"),
                class.slots(),
            )
            .await;
        }
        tracing::info!(
            bound = update.bind.len(),
            released = update.released.len(),
            "recipient list replaced"
        );
        Ok(update)
    }
}
