//! A namespace manager that keeps everything in process memory.
//!
//! Namespaces are registered up front with [`add_namespace`].  Exactly one of
//! them is in the foreground at a time; [`switch_to`] moves the foreground and
//! notifies every subscriber.
//!
//! ```text
//! switch_to(B)                        (A was active)
//!   active := B                       is_active() already answers for B
//!   DEACTIVATE(A) ──► subscribers ──► wait for every completion
//!   ACTIVATE(B)   ──► subscribers ──► wait for every completion
//! ```
//!
//! Switches are serialized, so notices for one namespace never overlap.
//!
//! [`add_namespace`]: InMemoryNamespaceManager::add_namespace
//! [`switch_to`]: InMemoryNamespaceManager::switch_to

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use nsinput_core::NamespaceId;
use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::application::namespace_registry::{ManagerError, NamespaceManager};
use crate::domain::switch::{SubscriptionId, SwitchKind, SwitchNotice, SwitchReport, SwitchSink};

/// Stored in `active` while no namespace is in the foreground.
const NO_NAMESPACE: u64 = u64::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceInfo {
    pub id: NamespaceId,
    pub name: String,
}

pub struct InMemoryNamespaceManager {
    namespaces: RwLock<HashMap<NamespaceId, NamespaceInfo>>,
    /// Read on every delivered event, so kept outside any lock.
    active: AtomicU64,
    current: AtomicU64,
    context_limit: Option<usize>,
    contexts: Mutex<HashMap<NamespaceId, usize>>,
    subscribers: Mutex<HashMap<NamespaceId, Vec<(SubscriptionId, SwitchSink)>>>,
    next_subscription: AtomicU64,
    switching: tokio::sync::Mutex<()>,
}

impl InMemoryNamespaceManager {
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
            active: AtomicU64::new(NO_NAMESPACE),
            current: AtomicU64::new(0),
            context_limit: None,
            contexts: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(HashMap::new()),
            next_subscription: AtomicU64::new(1),
            switching: tokio::sync::Mutex::new(()),
        }
    }

    /// Caps the number of live contexts across all namespaces.
    pub fn with_context_limit(mut self, limit: usize) -> Self {
        self.context_limit = Some(limit);
        self
    }

    /// Registers a namespace.  The first one registered becomes both the
    /// foreground namespace and the caller's current namespace.
    ///
    /// Returns `false` if `id` was already registered.
    pub fn add_namespace(&self, id: NamespaceId, name: impl Into<String>) -> bool {
        let mut namespaces = self.namespaces.write();
        if namespaces.contains_key(&id) {
            return false;
        }
        let name = name.into();
        info!(namespace = %id, %name, "namespace registered");
        namespaces.insert(id, NamespaceInfo { id, name });

        if namespaces.len() == 1 {
            self.active.store(id.as_u64(), Ordering::SeqCst);
            self.current.store(id.as_u64(), Ordering::SeqCst);
        }
        true
    }

    pub fn namespaces(&self) -> Vec<NamespaceInfo> {
        let mut all: Vec<_> = self.namespaces.read().values().cloned().collect();
        all.sort_by_key(|info| info.id);
        all
    }

    fn contains(&self, namespace: NamespaceId) -> bool {
        self.namespaces.read().contains_key(&namespace)
    }

    /// Makes `namespace` the caller's current namespace.
    pub fn enter(&self, namespace: NamespaceId) -> Result<(), ManagerError> {
        if !self.contains(namespace) {
            return Err(ManagerError::UnknownNamespace(namespace));
        }
        self.current.store(namespace.as_u64(), Ordering::SeqCst);
        Ok(())
    }

    /// The foreground namespace, if any.
    pub fn active_namespace(&self) -> Option<NamespaceId> {
        match self.active.load(Ordering::SeqCst) {
            NO_NAMESPACE => None,
            raw => Some(NamespaceId(raw)),
        }
    }

    /// Live context references across all namespaces.
    pub fn live_contexts(&self) -> usize {
        self.contexts.lock().values().sum()
    }

    pub fn subscriber_count(&self, namespace: NamespaceId) -> usize {
        self.subscribers
            .lock()
            .get(&namespace)
            .map_or(0, Vec::len)
    }

    /// Moves the foreground to `namespace` and waits until every subscriber
    /// has processed the resulting notices.
    ///
    /// Switching to the namespace that is already active is a no-op and
    /// returns no reports.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownNamespace`] for an unregistered
    /// namespace.  The foreground is unchanged in that case.
    pub async fn switch_to(&self, namespace: NamespaceId) -> Result<Vec<SwitchReport>, ManagerError> {
        let _serial = self.switching.lock().await;

        if !self.contains(namespace) {
            return Err(ManagerError::UnknownNamespace(namespace));
        }

        let previous = self.active.swap(namespace.as_u64(), Ordering::SeqCst);
        if previous == namespace.as_u64() {
            debug!(%namespace, "switch to already active namespace");
            return Ok(Vec::new());
        }
        info!(from = previous, to = %namespace, "switching foreground namespace");

        let mut reports = Vec::new();
        if previous != NO_NAMESPACE {
            let pending = self.notify(NamespaceId(previous), SwitchKind::Deactivate);
            reports.extend(Self::collect(pending).await);
        }
        let pending = self.notify(namespace, SwitchKind::Activate);
        reports.extend(Self::collect(pending).await);
        Ok(reports)
    }

    /// Sends `kind` to every subscriber of `namespace`.
    fn notify(
        &self,
        namespace: NamespaceId,
        kind: SwitchKind,
    ) -> Vec<oneshot::Receiver<SwitchReport>> {
        let subscribers = self.subscribers.lock();
        let Some(sinks) = subscribers.get(&namespace) else {
            return Vec::new();
        };

        let mut pending = Vec::with_capacity(sinks.len());
        for (subscription, sink) in sinks {
            let (notice, done) = SwitchNotice::with_completion(namespace, kind);
            if sink.send(notice).is_err() {
                warn!(%namespace, ?subscription, %kind, "switch subscriber has gone away");
                continue;
            }
            pending.push(done);
        }
        pending
    }

    async fn collect(pending: Vec<oneshot::Receiver<SwitchReport>>) -> Vec<SwitchReport> {
        let mut reports = Vec::with_capacity(pending.len());
        for done in pending {
            match done.await {
                Ok(report) => reports.push(report),
                Err(_) => warn!("switch notice dropped without a report"),
            }
        }
        reports
    }
}

impl Default for InMemoryNamespaceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceManager for InMemoryNamespaceManager {
    fn current_namespace(&self) -> NamespaceId {
        NamespaceId(self.current.load(Ordering::SeqCst))
    }

    fn is_active(&self, namespace: NamespaceId) -> bool {
        self.active.load(Ordering::SeqCst) == namespace.as_u64()
    }

    fn create_context(&self, namespace: NamespaceId) -> Result<(), ManagerError> {
        if !self.contains(namespace) {
            return Err(ManagerError::UnknownNamespace(namespace));
        }
        let mut contexts = self.contexts.lock();
        if let Some(limit) = self.context_limit {
            if contexts.values().sum::<usize>() >= limit {
                return Err(ManagerError::ContextLimit { limit });
            }
        }
        *contexts.entry(namespace).or_default() += 1;
        Ok(())
    }

    fn release_context(&self, namespace: NamespaceId) {
        let mut contexts = self.contexts.lock();
        match contexts.get_mut(&namespace) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                contexts.remove(&namespace);
            }
            None => warn!(%namespace, "release of a context that was never created"),
        }
    }

    fn subscribe(&self, namespace: NamespaceId, sink: SwitchSink) -> SubscriptionId {
        let subscription = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers
            .lock()
            .entry(namespace)
            .or_default()
            .push((subscription, sink));
        subscription
    }

    fn unsubscribe(&self, namespace: NamespaceId, subscription: SubscriptionId) {
        let mut subscribers = self.subscribers.lock();
        if let Some(sinks) = subscribers.get_mut(&namespace) {
            sinks.retain(|(id, _)| *id != subscription);
            if sinks.is_empty() {
                subscribers.remove(&namespace);
            }
        }
    }
}
