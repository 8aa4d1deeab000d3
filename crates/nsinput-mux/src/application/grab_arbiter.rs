//! Grab Arbiter: exclusive device ownership across namespaces.
//!
//! A client's grab *intent* (`wants_grab`) is recorded regardless of which
//! namespace is in the foreground.  The *effect*, being the device's real grab
//! owner, is only granted while the client's namespace is active, and is moved
//! on every namespace switch:
//!
//! | Trigger     | Client in active ns                          | Client in inactive ns               |
//! |-------------|----------------------------------------------|-------------------------------------|
//! | request     | real grab if the device is free, else error  | virtual grab, device untouched      |
//! | release     | owner cleared, intent cleared                | intent cleared, device untouched    |
//! | ACTIVATE    | —                                            | real grab restored if device free   |
//! | DEACTIVATE  | real grab released, intent kept              | —                                   |
//!
//! # Locking
//!
//! Every operation here takes the namespace context lock first and the device
//! grab lock second.  That order is fixed system-wide; inverting it anywhere
//! would let a switch and a grab request deadlock.  Requests read the context's
//! mirrored foreground flag under the same lock the switch handler writes it
//! under, so a request can never interleave with a switch of its namespace.

use std::sync::Arc;

use nsinput_core::{GrabError, GrabState, NamespaceId};
use tracing::{debug, info, warn};

use super::device_table::DeviceTable;
use super::error::MuxError;
use super::namespace_registry::NamespaceRegistry;
use crate::domain::client::Client;
use crate::domain::context::NamespaceContext;
use crate::domain::device::Device;
use crate::domain::switch::{SwitchKind, SwitchReport};

pub struct GrabArbiter {
    registry: Arc<NamespaceRegistry>,
    devices: Arc<DeviceTable>,
}

impl GrabArbiter {
    pub fn new(registry: Arc<NamespaceRegistry>, devices: Arc<DeviceTable>) -> Self {
        Self { registry, devices }
    }

    /// Handles a client's grab request.
    ///
    /// Returns the resulting state: [`GrabState::RealGrab`] when the client's
    /// namespace is active, [`GrabState::VirtualGrab`] otherwise.
    ///
    /// # Errors
    ///
    /// - [`GrabError::AlreadyGrabbed`] if the namespace is active and any
    ///   client holds the device.
    /// - [`MuxError::ClientDetached`] / [`MuxError::DeviceNotFound`] if the
    ///   client is closed or its device is gone.
    pub fn request_grab(&self, client: &Arc<Client>) -> Result<GrabState, MuxError> {
        let (context, device) = self.resolve(client)?;
        let state = context.lock();
        if !state.contains(client.id()) {
            return Err(MuxError::ClientDetached(client.id()));
        }
        let grab = device.lock_grab();

        if !state.is_active() {
            client.set_wants_grab(&grab, true);
            debug!(client = %client.id(), namespace = %client.namespace(), "virtual grab recorded");
            return Ok(GrabState::VirtualGrab);
        }

        if let Some(owner) = grab.owner() {
            debug!(
                client = %client.id(),
                owner = %owner.id(),
                device = %device.id(),
                "grab refused; device already grabbed"
            );
            return Err(GrabError::AlreadyGrabbed.into());
        }

        grab.set_owner(Some(Arc::clone(client)));
        client.set_wants_grab(&grab, true);
        debug!(client = %client.id(), device = %device.id(), "real grab granted");
        Ok(GrabState::RealGrab)
    }

    /// Handles a client's ungrab request.
    ///
    /// Releasing clears the intent in every case, and clears the device owner
    /// when the client holds it.
    ///
    /// # Errors
    ///
    /// [`GrabError::NotGrabbedByCaller`] if the namespace is active and the
    /// client holds neither a real nor a pending virtual grab.
    pub fn release_grab(&self, client: &Arc<Client>) -> Result<(), MuxError> {
        let (context, device) = self.resolve(client)?;
        let state = context.lock();
        if !state.contains(client.id()) {
            return Err(MuxError::ClientDetached(client.id()));
        }
        let grab = device.lock_grab();

        if grab.is_owned_by(client.id()) {
            grab.set_owner(None);
            client.set_wants_grab(&grab, false);
            debug!(client = %client.id(), device = %device.id(), "real grab released");
            return Ok(());
        }

        if client.wants_grab() {
            client.set_wants_grab(&grab, false);
            debug!(client = %client.id(), "virtual grab released");
            return Ok(());
        }

        if state.is_active() {
            return Err(GrabError::NotGrabbedByCaller.into());
        }
        Ok(())
    }

    /// The client's current grab state.  Never blocks.
    pub fn grab_state(&self, client: &Client) -> GrabState {
        let owns = self
            .devices
            .get(client.device())
            .and_then(|device| device.grab_owner())
            .is_some_and(|owner| owner.id() == client.id());
        GrabState::from_parts(client.wants_grab(), owns)
    }

    /// Applies a namespace switch to every client of `namespace`.
    ///
    /// Each client is handled independently: a conflict is logged and
    /// counted, and processing continues with the next client.
    pub fn handle_switch(&self, namespace: NamespaceId, kind: SwitchKind) -> SwitchReport {
        let mut report = SwitchReport::new(namespace, kind);

        let Some(context) = self.registry.find_context(namespace) else {
            warn!(%namespace, %kind, "switch notice for namespace without a context; ignored");
            return report;
        };
        report.context_found = true;

        let mut state = context.lock();
        state.set_active(kind == SwitchKind::Activate);

        for client in state.clients() {
            report.clients += 1;
            // Clients are only opened on registered devices, and devices
            // are never removed.
            let Some(device) = self.devices.get(client.device()) else {
                continue;
            };
            match kind {
                SwitchKind::Activate => Self::restore_grab(client, &device, &mut report),
                SwitchKind::Deactivate => Self::suspend_grab(client, &device, &mut report),
            }
        }

        info!(
            %namespace,
            %kind,
            clients = report.clients,
            restored = report.restored,
            suspended = report.suspended,
            conflicts = report.conflicts,
            "namespace switch applied"
        );
        report
    }

    fn restore_grab(client: &Arc<Client>, device: &Device, report: &mut SwitchReport) {
        let grab = device.lock_grab();
        if !client.wants_grab() || grab.is_owned_by(client.id()) {
            return;
        }
        match grab.owner() {
            None => {
                grab.set_owner(Some(Arc::clone(client)));
                report.restored += 1;
                debug!(client = %client.id(), device = %device.id(), "grab restored");
            }
            Some(holder) => {
                report.conflicts += 1;
                warn!(
                    client = %client.id(),
                    device = %device.id(),
                    holder = %holder.id(),
                    holder_namespace = %holder.namespace(),
                    "grab restore dropped; device still held, will retry on next activation"
                );
            }
        }
    }

    fn suspend_grab(client: &Arc<Client>, device: &Device, report: &mut SwitchReport) {
        let grab = device.lock_grab();
        if grab.is_owned_by(client.id()) {
            grab.set_owner(None);
            report.suspended += 1;
            debug!(client = %client.id(), device = %device.id(), "grab suspended");
        }
    }

    fn resolve(&self, client: &Client) -> Result<(Arc<NamespaceContext>, Arc<Device>), MuxError> {
        let context = self
            .registry
            .find_context(client.namespace())
            .ok_or(MuxError::ClientDetached(client.id()))?;
        let device = self
            .devices
            .get(client.device())
            .ok_or(MuxError::DeviceNotFound(client.device()))?;
        Ok((context, device))
    }
}
