//! Event Broadcaster: fans device events out to foreground clients.
//!
//! This runs in the device's producer context on every hardware event, so it
//! takes no lock that the control path can hold:
//!
//! - the attached clients come from the device's [`SnapshotList`], read
//!   without locking;
//! - the grab owner is an atomically published pointer;
//! - namespace activity comes from the namespace manager's non-blocking
//!   `is_active`;
//! - enqueueing is a `try_send` on the client's bounded queue, which also
//!   wakes a pending reader.
//!
//! No grab state is changed here.
//!
//! [`SnapshotList`]: nsinput_core::SnapshotList

use std::sync::Arc;

use nsinput_core::InputEvent;
use tracing::trace;

use super::namespace_registry::NamespaceRegistry;
use crate::domain::device::Device;

pub struct EventBroadcaster {
    registry: Arc<NamespaceRegistry>,
}

impl EventBroadcaster {
    pub fn new(registry: Arc<NamespaceRegistry>) -> Self {
        Self { registry }
    }

    /// Delivers `event` from `device` and returns the number of clients that
    /// queued it.
    ///
    /// With a real grab owner the event goes to that owner only.  The owner's
    /// namespace is active by construction, so no activity check is needed.
    pub fn deliver(&self, device: &Device, event: InputEvent) -> usize {
        if let Some(owner) = device.grab_owner() {
            let queued = owner.enqueue(event);
            trace!(device = %device.id(), owner = %owner.id(), queued, "event delivered to grab owner");
            return usize::from(queued);
        }

        let mut delivered = 0;
        for client in device.clients().iter() {
            if !self.registry.is_active(client.namespace()) {
                continue;
            }
            if client.enqueue(event) {
                delivered += 1;
            }
        }
        trace!(device = %device.id(), delivered, "event broadcast");
        delivered
    }

    /// Delivers a packet of events in order.  Returns the total number of
    /// queued copies.
    pub fn deliver_all(&self, device: &Device, events: &[InputEvent]) -> usize {
        events.iter().map(|event| self.deliver(device, *event)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{build, FakeManager};
    use crate::domain::client::{Client, EventReceiver};
    use nsinput_core::NamespaceId;

    const NS_A: NamespaceId = NamespaceId(1);
    const NS_B: NamespaceId = NamespaceId(2);

    fn attach(device: &Device, namespace: NamespaceId, capacity: usize) -> (Arc<Client>, EventReceiver) {
        let (client, rx) = Client::new(namespace, device.id(), capacity);
        let client = Arc::new(client);
        device.attach(Arc::clone(&client));
        (client, rx)
    }

    fn setup() -> (Arc<FakeManager>, EventBroadcaster, Arc<Device>) {
        let manager = FakeManager::with_active(NS_A);
        let (registry, devices, _stream) = build(Arc::clone(&manager));
        let device = devices.register("keyboard");
        (manager, EventBroadcaster::new(registry), device)
    }

    #[test]
    fn test_event_reaches_only_active_namespace_clients() {
        // Arrange
        let (_manager, broadcaster, device) = setup();
        let (_a1, mut rx_a1) = attach(&device, NS_A, 8);
        let (_a2, mut rx_a2) = attach(&device, NS_A, 8);
        let (_b1, mut rx_b1) = attach(&device, NS_B, 8);

        // Act
        let delivered = broadcaster.deliver(&device, InputEvent::key(30, true));

        // Assert
        assert_eq!(delivered, 2);
        assert!(rx_a1.try_recv().is_ok());
        assert!(rx_a2.try_recv().is_ok());
        assert!(rx_b1.try_recv().is_err());
    }

    #[test]
    fn test_grab_owner_receives_event_exclusively() {
        // Arrange
        let (_manager, broadcaster, device) = setup();
        let (owner, mut rx_owner) = attach(&device, NS_A, 8);
        let (_other, mut rx_other) = attach(&device, NS_A, 8);
        device.lock_grab().set_owner(Some(Arc::clone(&owner)));

        // Act
        let delivered = broadcaster.deliver(&device, InputEvent::key(30, true));

        // Assert
        assert_eq!(delivered, 1);
        assert!(rx_owner.try_recv().is_ok());
        assert!(rx_other.try_recv().is_err());
    }

    #[test]
    fn test_no_active_namespace_delivers_nothing() {
        let (manager, broadcaster, device) = setup();
        let (_a1, mut rx_a1) = attach(&device, NS_A, 8);
        manager.set_active(None);

        assert_eq!(broadcaster.deliver(&device, InputEvent::syn()), 0);
        assert!(rx_a1.try_recv().is_err());
    }

    #[test]
    fn test_full_queue_does_not_block_other_clients() {
        // Arrange
        let (_manager, broadcaster, device) = setup();
        let (slow, _rx_slow) = attach(&device, NS_A, 1);
        let (_fast, mut rx_fast) = attach(&device, NS_A, 8);

        // Act
        let delivered = broadcaster.deliver_all(
            &device,
            &[InputEvent::key(30, true), InputEvent::key(30, false), InputEvent::syn()],
        );

        // Assert – 1 copy for the slow client, 3 for the fast one
        assert_eq!(delivered, 4);
        assert_eq!(slow.dropped_events(), 2);
        let mut received = 0;
        while rx_fast.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 3);
    }

    #[test]
    fn test_device_without_clients_delivers_nothing() {
        let (_manager, broadcaster, device) = setup();
        assert_eq!(broadcaster.deliver(&device, InputEvent::syn()), 0);
    }
}
