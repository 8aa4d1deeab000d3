//! Device table: owns every registered [`Device`] and resolves handles.

use std::collections::HashMap;
use std::sync::Arc;

use nsinput_core::DeviceId;
use parking_lot::RwLock;
use tracing::info;

use crate::domain::device::Device;

/// Registered devices keyed by handle.
#[derive(Default)]
pub struct DeviceTable {
    devices: RwLock<HashMap<DeviceId, Arc<Device>>>,
}

impl DeviceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new device and returns it.
    pub fn register(&self, name: impl Into<String>) -> Arc<Device> {
        let device = Arc::new(Device::new(name));
        self.devices
            .write()
            .insert(device.id(), Arc::clone(&device));
        info!(device = %device.id(), name = device.name(), "device registered");
        device
    }

    pub fn get(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.devices.read().get(&id).cloned()
    }

    /// All registered devices, in no particular order.
    pub fn all(&self) -> Vec<Arc<Device>> {
        self.devices.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_starts_empty() {
        let table = DeviceTable::new();
        assert!(table.is_empty());
        assert!(table.all().is_empty());
    }

    #[test]
    fn test_register_makes_device_resolvable() {
        // Arrange
        let table = DeviceTable::new();

        // Act
        let device = table.register("keyboard");

        // Assert
        let found = table.get(device.id()).expect("device must resolve");
        assert_eq!(found.name(), "keyboard");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unknown_handle_resolves_to_none() {
        let table = DeviceTable::new();
        table.register("mouse");
        assert!(table.get(DeviceId::new()).is_none());
    }
}
