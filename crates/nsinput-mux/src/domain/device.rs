//! An input source and its exclusive grab.
//!
//! Two access paths meet here:
//!
//! - The **delivery path** reads the attached clients and the grab owner
//!   without taking any lock ([`Device::clients`], [`Device::grab_owner`]).
//! - The **control path** changes the grab owner only through a
//!   [`DeviceGrabGuard`], obtained from [`Device::lock_grab`].  Holding the
//!   guard is also what entitles a caller to change a client's grab intent.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use nsinput_core::{ClientId, DeviceId, Snapshot, SnapshotList};
use parking_lot::{Mutex, MutexGuard};

use super::client::Client;

/// One physical or virtual input source.
pub struct Device {
    id: DeviceId,
    name: String,
    clients: SnapshotList<Arc<Client>>,
    grab_lock: Mutex<()>,
    grab: ArcSwapOption<Client>,
}

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DeviceId::new(),
            name: name.into(),
            clients: SnapshotList::new(),
            grab_lock: Mutex::new(()),
            grab: ArcSwapOption::empty(),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attached clients across all namespaces.  Never blocks.
    pub fn clients(&self) -> Snapshot<Arc<Client>> {
        self.clients.snapshot()
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// The client holding the real grab, if any.  Never blocks.
    pub fn grab_owner(&self) -> Option<Arc<Client>> {
        self.grab.load_full()
    }

    pub(crate) fn attach(&self, client: Arc<Client>) {
        self.clients.insert(client);
    }

    pub(crate) fn detach(&self, client: ClientId) -> Option<Arc<Client>> {
        self.clients.remove_first(|c| c.id() == client)
    }

    /// Takes the device lock.
    pub(crate) fn lock_grab(&self) -> DeviceGrabGuard<'_> {
        DeviceGrabGuard {
            device: self,
            _lock: self.grab_lock.lock(),
        }
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("clients", &self.clients.len())
            .field("grab_owner", &self.grab_owner().map(|c| c.id()))
            .finish()
    }
}

/// Exclusive access to a device's grab owner.
pub struct DeviceGrabGuard<'a> {
    device: &'a Device,
    _lock: MutexGuard<'a, ()>,
}

impl DeviceGrabGuard<'_> {
    pub fn device_id(&self) -> DeviceId {
        self.device.id
    }

    pub fn owner(&self) -> Option<Arc<Client>> {
        self.device.grab.load_full()
    }

    pub fn is_owned_by(&self, client: ClientId) -> bool {
        let current = self.device.grab.load();
        matches!(&*current, Some(owner) if owner.id() == client)
    }

    /// Publishes the new owner to the delivery path.
    pub fn set_owner(&self, owner: Option<Arc<Client>>) {
        self.device.grab.store(owner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nsinput_core::NamespaceId;

    fn make_client(device: &Device) -> Arc<Client> {
        let (client, _rx) = Client::new(NamespaceId(1), device.id(), 8);
        Arc::new(client)
    }

    #[test]
    fn test_new_device_has_no_clients_or_owner() {
        let device = Device::new("keyboard");
        assert_eq!(device.name(), "keyboard");
        assert_eq!(device.client_count(), 0);
        assert!(device.grab_owner().is_none());
    }

    #[test]
    fn test_attach_and_detach_client() {
        // Arrange
        let device = Device::new("mouse");
        let client = make_client(&device);

        // Act
        device.attach(Arc::clone(&client));
        let snapshot = device.clients();
        let removed = device.detach(client.id());

        // Assert
        assert_eq!(snapshot.len(), 1);
        assert_eq!(removed.map(|c| c.id()), Some(client.id()));
        assert_eq!(device.client_count(), 0);
    }

    #[test]
    fn test_set_owner_is_visible_without_lock() {
        // Arrange
        let device = Device::new("keyboard");
        let client = make_client(&device);

        // Act
        {
            let grab = device.lock_grab();
            grab.set_owner(Some(Arc::clone(&client)));
            assert!(grab.is_owned_by(client.id()));
        }

        // Assert
        assert_eq!(device.grab_owner().map(|c| c.id()), Some(client.id()));
    }

    #[test]
    fn test_clearing_owner() {
        let device = Device::new("keyboard");
        let client = make_client(&device);
        let grab = device.lock_grab();
        grab.set_owner(Some(Arc::clone(&client)));
        grab.set_owner(None);
        assert!(grab.owner().is_none());
        assert!(!grab.is_owned_by(client.id()));
    }
}
