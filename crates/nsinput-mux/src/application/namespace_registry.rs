//! Namespace Registry Adapter.
//!
//! The namespace manager owns namespaces: it creates and destroys them, knows
//! which one is in the foreground, and announces switches.  The multiplexer
//! only consumes that through the [`NamespaceManager`] trait.
//!
//! [`NamespaceRegistry`] wraps the manager and keeps this multiplexer's table
//! of [`NamespaceContext`]s, one per namespace with at least one open client.

use std::collections::HashMap;
use std::sync::Arc;

use nsinput_core::NamespaceId;
use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

use crate::domain::context::NamespaceContext;
use crate::domain::switch::{SubscriptionId, SwitchSink};

/// Errors reported by the namespace manager.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("unknown namespace {0}")]
    UnknownNamespace(NamespaceId),
    #[error("context limit of {limit} reached")]
    ContextLimit { limit: usize },
    #[error("allocation failed: {0}")]
    Allocation(String),
}

/// The external namespace lifecycle manager.
///
/// `is_active` is called on the event delivery path and must not block.
#[cfg_attr(test, mockall::automock)]
pub trait NamespaceManager: Send + Sync {
    /// The namespace of the calling execution context.
    fn current_namespace(&self) -> NamespaceId;

    /// Whether `namespace` is the foreground namespace.
    fn is_active(&self, namespace: NamespaceId) -> bool;

    /// Takes a reference on `namespace` for a new per-namespace context.
    fn create_context(&self, namespace: NamespaceId) -> Result<(), ManagerError>;

    /// Drops the reference taken by [`create_context`](Self::create_context).
    fn release_context(&self, namespace: NamespaceId);

    /// Registers `sink` for ACTIVATE/DEACTIVATE notices on `namespace`.
    fn subscribe(&self, namespace: NamespaceId, sink: SwitchSink) -> SubscriptionId;

    /// Removes a registration made by [`subscribe`](Self::subscribe).
    fn unsubscribe(&self, namespace: NamespaceId, subscription: SubscriptionId);
}

/// Context table plus a handle on the namespace manager.
pub struct NamespaceRegistry {
    manager: Arc<dyn NamespaceManager>,
    sink: SwitchSink,
    contexts: Mutex<HashMap<NamespaceId, Arc<NamespaceContext>>>,
}

impl NamespaceRegistry {
    /// Creates a registry whose contexts subscribe `sink` for switch notices.
    pub fn new(manager: Arc<dyn NamespaceManager>, sink: SwitchSink) -> Self {
        Self {
            manager,
            sink,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    pub fn current_namespace(&self) -> NamespaceId {
        self.manager.current_namespace()
    }

    pub fn is_active(&self, namespace: NamespaceId) -> bool {
        self.manager.is_active(namespace)
    }

    /// The context for `namespace`, if any client of it is open.
    pub fn find_context(&self, namespace: NamespaceId) -> Option<Arc<NamespaceContext>> {
        self.contexts.lock().get(&namespace).cloned()
    }

    /// Number of live contexts.
    pub fn context_count(&self) -> usize {
        self.contexts.lock().len()
    }

    /// Takes the context-table lock.  May be held while taking a context lock,
    /// never the reverse.
    pub(crate) fn contexts(&self) -> MutexGuard<'_, HashMap<NamespaceId, Arc<NamespaceContext>>> {
        self.contexts.lock()
    }

    /// Builds a new context: takes a manager reference, subscribes to
    /// switches, then samples the foreground flag.
    ///
    /// Subscribing before sampling means a concurrent switch is either already
    /// reflected in the sample or still on its way as a notice.
    pub(crate) fn open_context(
        &self,
        namespace: NamespaceId,
    ) -> Result<Arc<NamespaceContext>, ManagerError> {
        self.manager.create_context(namespace)?;
        let subscription = self.manager.subscribe(namespace, self.sink.clone());
        let active = self.manager.is_active(namespace);
        debug!(%namespace, ?subscription, active, "namespace context opened");
        Ok(Arc::new(NamespaceContext::new(namespace, subscription, active)))
    }

    /// Undoes [`open_context`](Self::open_context).
    pub(crate) fn close_context(&self, context: &NamespaceContext) {
        self.manager
            .unsubscribe(context.namespace(), context.subscription());
        self.manager.release_context(context.namespace());
        debug!(namespace = %context.namespace(), "namespace context closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::switch::switch_channel;
    use mockall::predicate::eq;

    #[test]
    fn test_open_context_subscribes_and_samples_activity() {
        // Arrange
        let ns = NamespaceId(4);
        let mut manager = MockNamespaceManager::new();
        manager
            .expect_create_context()
            .with(eq(ns))
            .times(1)
            .returning(|_| Ok(()));
        manager
            .expect_subscribe()
            .times(1)
            .returning(|_, _| SubscriptionId(11));
        manager.expect_is_active().with(eq(ns)).return_const(true);
        let (sink, _stream) = switch_channel();
        let registry = NamespaceRegistry::new(Arc::new(manager), sink);

        // Act
        let ctx = registry.open_context(ns).expect("context must open");

        // Assert
        assert_eq!(ctx.namespace(), ns);
        assert_eq!(ctx.subscription(), SubscriptionId(11));
        assert!(ctx.is_active());
    }

    #[test]
    fn test_open_context_propagates_manager_error_without_subscribing() {
        // Arrange
        let ns = NamespaceId(4);
        let mut manager = MockNamespaceManager::new();
        manager
            .expect_create_context()
            .returning(|_| Err(ManagerError::ContextLimit { limit: 0 }));
        manager.expect_subscribe().never();
        let (sink, _stream) = switch_channel();
        let registry = NamespaceRegistry::new(Arc::new(manager), sink);

        // Act
        let result = registry.open_context(ns);

        // Assert
        assert_eq!(result.unwrap_err(), ManagerError::ContextLimit { limit: 0 });
    }

    #[test]
    fn test_close_context_unsubscribes_and_releases() {
        // Arrange
        let ns = NamespaceId(5);
        let mut manager = MockNamespaceManager::new();
        manager
            .expect_unsubscribe()
            .with(eq(ns), eq(SubscriptionId(2)))
            .times(1)
            .return_const(());
        manager
            .expect_release_context()
            .with(eq(ns))
            .times(1)
            .return_const(());
        let (sink, _stream) = switch_channel();
        let registry = NamespaceRegistry::new(Arc::new(manager), sink);
        let ctx = NamespaceContext::new(ns, SubscriptionId(2), false);

        // Act / Assert – expectations are verified when the mock drops
        registry.close_context(&ctx);
    }

    #[test]
    fn test_find_context_returns_none_for_unknown_namespace() {
        let manager = MockNamespaceManager::new();
        let (sink, _stream) = switch_channel();
        let registry = NamespaceRegistry::new(Arc::new(manager), sink);
        assert!(registry.find_context(NamespaceId(1)).is_none());
        assert_eq!(registry.context_count(), 0);
    }

    #[test]
    fn test_is_active_delegates_to_manager() {
        let mut manager = MockNamespaceManager::new();
        manager.expect_is_active().with(eq(NamespaceId(1))).return_const(true);
        manager.expect_is_active().with(eq(NamespaceId(2))).return_const(false);
        let (sink, _stream) = switch_channel();
        let registry = NamespaceRegistry::new(Arc::new(manager), sink);
        assert!(registry.is_active(NamespaceId(1)));
        assert!(!registry.is_active(NamespaceId(2)));
    }
}
