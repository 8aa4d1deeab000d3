//! Test doubles shared by the application-layer unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use nsinput_core::NamespaceId;
use parking_lot::Mutex;

use super::device_table::DeviceTable;
use super::namespace_registry::{ManagerError, NamespaceManager, NamespaceRegistry};
use crate::domain::switch::{switch_channel, SubscriptionId, SwitchSink, SwitchStream};

/// Namespace manager whose foreground namespace is set directly by the test.
///
/// Setting the active namespace does not send any notice; tests drive the
/// arbiter's switch handling themselves.
#[derive(Default)]
pub(crate) struct FakeManager {
    active: Mutex<Option<NamespaceId>>,
    current: Mutex<Option<NamespaceId>>,
    fail_create: AtomicBool,
    created: AtomicUsize,
    released: AtomicUsize,
    next_subscription: AtomicU64,
    subscriptions: Mutex<HashMap<NamespaceId, usize>>,
}

impl FakeManager {
    pub(crate) fn with_active(namespace: NamespaceId) -> Arc<Self> {
        let manager = Self::default();
        *manager.active.lock() = Some(namespace);
        *manager.current.lock() = Some(namespace);
        Arc::new(manager)
    }

    pub(crate) fn set_active(&self, namespace: Option<NamespaceId>) {
        *self.active.lock() = namespace;
    }

    pub(crate) fn fail_next_creates(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub(crate) fn subscriptions(&self, namespace: NamespaceId) -> usize {
        self.subscriptions.lock().get(&namespace).copied().unwrap_or(0)
    }
}

impl NamespaceManager for FakeManager {
    fn current_namespace(&self) -> NamespaceId {
        self.current.lock().unwrap_or(NamespaceId(0))
    }

    fn is_active(&self, namespace: NamespaceId) -> bool {
        *self.active.lock() == Some(namespace)
    }

    fn create_context(&self, _namespace: NamespaceId) -> Result<(), ManagerError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ManagerError::Allocation("injected failure".to_string()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release_context(&self, _namespace: NamespaceId) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    fn subscribe(&self, namespace: NamespaceId, _sink: SwitchSink) -> SubscriptionId {
        *self.subscriptions.lock().entry(namespace).or_default() += 1;
        SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst))
    }

    fn unsubscribe(&self, namespace: NamespaceId, _subscription: SubscriptionId) {
        if let Some(count) = self.subscriptions.lock().get_mut(&namespace) {
            *count = count.saturating_sub(1);
        }
    }
}

/// Registry, device table, and the switch stream the registry subscribes.
pub(crate) fn build(
    manager: Arc<FakeManager>,
) -> (Arc<NamespaceRegistry>, Arc<DeviceTable>, SwitchStream) {
    let (sink, stream) = switch_channel();
    let registry = Arc::new(NamespaceRegistry::new(manager, sink));
    (registry, Arc::new(DeviceTable::new()), stream)
}
