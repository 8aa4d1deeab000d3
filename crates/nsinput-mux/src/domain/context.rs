//! Per-namespace client list.
//!
//! A `NamespaceContext` exists for a namespace as long as at least one client
//! of that namespace is open.  Its lock serializes client attach/detach against
//! switch processing: a switch handler iterating the list under the lock can
//! never observe a half-inserted or half-removed client.

use std::sync::Arc;

use nsinput_core::{ClientId, NamespaceId};
use parking_lot::{Mutex, MutexGuard};

use super::client::Client;
use super::switch::SubscriptionId;

/// State guarded by the context lock.
#[derive(Debug, Default)]
pub struct ContextState {
    active: bool,
    clients: Vec<Arc<Client>>,
}

impl ContextState {
    /// Mirror of the namespace manager's foreground flag, as last applied by
    /// the switch handler.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Attached clients in attach order.
    pub fn clients(&self) -> &[Arc<Client>] {
        &self.clients
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.clients.iter().any(|c| c.id() == client)
    }

    pub(crate) fn insert(&mut self, client: Arc<Client>) {
        self.clients.push(client);
    }

    pub(crate) fn remove(&mut self, client: ClientId) -> Option<Arc<Client>> {
        let index = self.clients.iter().position(|c| c.id() == client)?;
        Some(self.clients.remove(index))
    }
}

/// One namespace's view of this multiplexer.
#[derive(Debug)]
pub struct NamespaceContext {
    namespace: NamespaceId,
    subscription: SubscriptionId,
    state: Mutex<ContextState>,
}

impl NamespaceContext {
    pub fn new(namespace: NamespaceId, subscription: SubscriptionId, active: bool) -> Self {
        Self {
            namespace,
            subscription,
            state: Mutex::new(ContextState {
                active,
                clients: Vec::new(),
            }),
        }
    }

    pub fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Takes the context lock.
    pub(crate) fn lock(&self) -> MutexGuard<'_, ContextState> {
        self.state.lock()
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().is_active()
    }

    pub fn client_count(&self) -> usize {
        self.state.lock().clients.len()
    }

    /// A consistent copy of the attached clients.
    pub fn clients(&self) -> Vec<Arc<Client>> {
        self.state.lock().clients.clone()
    }
}
