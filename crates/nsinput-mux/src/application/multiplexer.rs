//! The multiplexer facade.
//!
//! This is the interface the device file-operation layer talks to: it opens and
//! closes clients, forwards grab requests, gates writes, and feeds device
//! events in.  It wires the four components together and owns the order in
//! which they are called:
//!
//! ```text
//! open:   track in namespace context ──► attach to device list
//! close:  detach from device list ──► drop grab + untrack from context
//! ```

use std::sync::Arc;

use nsinput_core::{ClientId, DeviceId, GrabState, InputEvent, NamespaceId};
use tracing::{debug, info};

use super::client_tracker::ClientTracker;
use super::device_table::DeviceTable;
use super::error::MuxError;
use super::event_broadcaster::EventBroadcaster;
use super::grab_arbiter::GrabArbiter;
use super::namespace_registry::{NamespaceManager, NamespaceRegistry};
use crate::domain::client::{Client, EventReceiver};
use crate::domain::device::Device;
use crate::domain::switch::{switch_channel, SwitchNotice, SwitchReport, SwitchStream};

/// Default per-client queue length.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Point-in-time view of a device, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    pub id: DeviceId,
    pub name: String,
    pub clients: usize,
    pub grab_owner: Option<ClientId>,
}

pub struct Multiplexer {
    registry: Arc<NamespaceRegistry>,
    devices: Arc<DeviceTable>,
    tracker: ClientTracker,
    arbiter: Arc<GrabArbiter>,
    broadcaster: EventBroadcaster,
    queue_capacity: usize,
}

impl Multiplexer {
    /// Creates a multiplexer backed by `manager`.
    ///
    /// Returns the stream of switch notices the namespace manager will send;
    /// hand it to a switch handler, or feed notices to
    /// [`handle_switch`](Self::handle_switch) directly.
    pub fn new(manager: Arc<dyn NamespaceManager>, queue_capacity: usize) -> (Self, SwitchStream) {
        let (sink, stream) = switch_channel();
        let registry = Arc::new(NamespaceRegistry::new(manager, sink));
        let devices = Arc::new(DeviceTable::new());
        let mux = Self {
            tracker: ClientTracker::new(Arc::clone(&registry), Arc::clone(&devices)),
            arbiter: Arc::new(GrabArbiter::new(Arc::clone(&registry), Arc::clone(&devices))),
            broadcaster: EventBroadcaster::new(Arc::clone(&registry)),
            registry,
            devices,
            queue_capacity: queue_capacity.max(1),
        };
        (mux, stream)
    }

    pub fn registry(&self) -> &Arc<NamespaceRegistry> {
        &self.registry
    }

    /// Shared handle on the arbiter, for the switch handler task.
    pub fn arbiter(&self) -> Arc<GrabArbiter> {
        Arc::clone(&self.arbiter)
    }

    // ── Devices ───────────────────────────────────────────────────────────────

    pub fn register_device(&self, name: impl Into<String>) -> DeviceId {
        self.devices.register(name).id()
    }

    pub fn device(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.devices.get(id)
    }

    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.devices.all()
    }

    pub fn device_status(&self, id: DeviceId) -> Option<DeviceStatus> {
        self.devices.get(id).map(|device| DeviceStatus {
            id: device.id(),
            name: device.name().to_string(),
            clients: device.client_count(),
            grab_owner: device.grab_owner().map(|owner| owner.id()),
        })
    }

    // ── Client lifecycle ──────────────────────────────────────────────────────

    /// Opens a client of `device` in `namespace`.
    ///
    /// # Errors
    ///
    /// - [`MuxError::DeviceNotFound`] for an unregistered device.
    /// - [`MuxError::UnknownNamespace`] when the namespace manager does not
    ///   know `namespace`.
    /// - [`MuxError::ResourceExhausted`] when no namespace context could be
    ///   created.
    ///
    /// Nothing stays registered on error.
    pub fn client_open(
        &self,
        device: DeviceId,
        namespace: NamespaceId,
    ) -> Result<(Arc<Client>, EventReceiver), MuxError> {
        let target = self.devices.get(device).ok_or(MuxError::DeviceNotFound(device))?;
        let (client, events) = Client::new(namespace, device, self.queue_capacity);
        let client = Arc::new(client);

        self.tracker.track(&client)?;
        target.attach(Arc::clone(&client));

        info!(client = %client.id(), %namespace, device = %device, "client opened");
        Ok((client, events))
    }

    /// Opens a client of `device` in the caller's namespace.
    pub fn client_open_current(
        &self,
        device: DeviceId,
    ) -> Result<(Arc<Client>, EventReceiver), MuxError> {
        self.client_open(device, self.registry.current_namespace())
    }

    /// Closes `client`: it stops receiving events, loses any grab, and leaves
    /// its namespace context.
    ///
    /// The grab is dropped in the same critical section that removes the
    /// client from its context, so a concurrent grab request either lands
    /// before and is undone, or finds the client detached.
    pub fn client_close(&self, client: &Arc<Client>) {
        if let Some(device) = self.devices.get(client.device()) {
            device.detach(client.id());
        }
        self.tracker.untrack(client);
        info!(client = %client.id(), namespace = %client.namespace(), "client closed");
    }

    /// A consistent snapshot of the open clients of `namespace`.
    pub fn clients_of(&self, namespace: NamespaceId) -> Vec<Arc<Client>> {
        self.tracker.clients_of(namespace)
    }

    // ── Grab control ──────────────────────────────────────────────────────────

    pub fn client_request_grab(&self, client: &Arc<Client>) -> Result<GrabState, MuxError> {
        self.arbiter.request_grab(client)
    }

    pub fn client_release_grab(&self, client: &Arc<Client>) -> Result<(), MuxError> {
        self.arbiter.release_grab(client)
    }

    pub fn client_grab_state(&self, client: &Client) -> GrabState {
        self.arbiter.grab_state(client)
    }

    /// Whether side effects requested by `client` should reach the device.
    pub fn client_is_deliverable(&self, client: &Client) -> bool {
        self.registry.is_active(client.namespace())
    }

    // ── Event flow ────────────────────────────────────────────────────────────

    /// Delivers a hardware event from `device`.  Never blocks.
    pub fn deliver(&self, device: &Device, event: InputEvent) -> usize {
        self.broadcaster.deliver(device, event)
    }

    /// Injects events written by `client` into its device.
    ///
    /// Writes from a background namespace are accepted but not acted upon.
    /// Returns the number of events accepted, which is always all of them.
    pub fn client_write(&self, client: &Client, events: &[InputEvent]) -> usize {
        if !self.client_is_deliverable(client) {
            debug!(client = %client.id(), count = events.len(), "write from background namespace ignored");
            return events.len();
        }
        if let Some(device) = self.devices.get(client.device()) {
            self.broadcaster.deliver_all(&device, events);
        }
        events.len()
    }

    // ── Switches ──────────────────────────────────────────────────────────────

    /// Processes one switch notice synchronously and answers its sender.
    pub fn handle_switch(&self, notice: SwitchNotice) -> SwitchReport {
        let report = self.arbiter.handle_switch(notice.namespace, notice.kind);
        notice.complete(report.clone());
        report
    }
}
