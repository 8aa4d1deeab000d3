//! Client Tracker: which client belongs to which namespace.
//!
//! Every open client is listed in its namespace's [`NamespaceContext`].  The
//! context is created lazily when the first client of a namespace attaches and
//! released when the last one detaches.
//!
//! Both directions run under the context-table lock and then the context lock,
//! the same context lock the switch handler holds while walking the list.  A
//! switch therefore sees each client either fully attached or not at all.
//!
//! Untracking also drops the client's grab, under the context lock and then
//! the device lock.  Grab requests check membership under the same context
//! lock, so once a client is untracked no request can hand it the device.

use std::sync::Arc;

use nsinput_core::NamespaceId;
use tracing::{debug, info, warn};

use super::device_table::DeviceTable;
use super::error::MuxError;
use super::namespace_registry::{ManagerError, NamespaceRegistry};
use crate::domain::client::Client;
use crate::domain::context::NamespaceContext;

pub struct ClientTracker {
    registry: Arc<NamespaceRegistry>,
    devices: Arc<DeviceTable>,
}

impl ClientTracker {
    pub fn new(registry: Arc<NamespaceRegistry>, devices: Arc<DeviceTable>) -> Self {
        Self { registry, devices }
    }

    /// Attaches `client` to its namespace context, creating the context if
    /// this is the namespace's first client.
    ///
    /// # Errors
    ///
    /// - [`MuxError::UnknownNamespace`] when the namespace manager does not
    ///   know the client's namespace.
    /// - [`MuxError::ResourceExhausted`] when it refuses a new context.
    ///
    /// Nothing is registered in either case.
    pub fn track(&self, client: &Arc<Client>) -> Result<Arc<NamespaceContext>, MuxError> {
        let namespace = client.namespace();
        let mut contexts = self.registry.contexts();

        let context = match contexts.get(&namespace) {
            Some(existing) => Arc::clone(existing),
            None => {
                let created = self
                    .registry
                    .open_context(namespace)
                    .map_err(|source| match source {
                        ManagerError::UnknownNamespace(ns) => MuxError::UnknownNamespace(ns),
                        source => MuxError::ResourceExhausted { namespace, source },
                    })?;
                contexts.insert(namespace, Arc::clone(&created));
                info!(%namespace, active = created.is_active(), "namespace context created");
                created
            }
        };

        context.lock().insert(Arc::clone(client));
        debug!(client = %client.id(), %namespace, "client tracked");
        Ok(context)
    }

    /// Detaches `client` from its namespace context, dropping its real grab and
    /// grab intent, and releases the context if it was the last client.
    ///
    /// Returns `false` if the client was not tracked.
    pub fn untrack(&self, client: &Client) -> bool {
        let namespace = client.namespace();
        let mut contexts = self.registry.contexts();

        let Some(context) = contexts.get(&namespace).cloned() else {
            warn!(client = %client.id(), %namespace, "untrack for namespace without a context");
            return false;
        };

        let (removed, now_empty) = {
            let mut state = context.lock();
            if let Some(device) = self.devices.get(client.device()) {
                let grab = device.lock_grab();
                if grab.is_owned_by(client.id()) {
                    grab.set_owner(None);
                    debug!(client = %client.id(), device = %device.id(), "grab released on close");
                }
                client.set_wants_grab(&grab, false);
            }
            let removed = state.remove(client.id()).is_some();
            (removed, state.clients().is_empty())
        };

        if now_empty {
            contexts.remove(&namespace);
            self.registry.close_context(&context);
            info!(%namespace, "namespace context released");
        }

        debug!(client = %client.id(), %namespace, removed, "client untracked");
        removed
    }

    /// A consistent snapshot of the clients of `namespace`.
    pub fn clients_of(&self, namespace: NamespaceId) -> Vec<Arc<Client>> {
        self.registry
            .find_context(namespace)
            .map(|context| context.clients())
            .unwrap_or_default()
    }
}
