//! A single open connection to a device.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use nsinput_core::{ClientId, DeviceId, InputEvent, NamespaceId};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::trace;

use super::device::DeviceGrabGuard;

/// Receiving half of a client's event queue, handed to the reader.
pub type EventReceiver = mpsc::Receiver<InputEvent>;

/// A client belongs to exactly one namespace and one device for its whole
/// lifetime.
///
/// `wants_grab` is the client's logical grab request.  It survives namespace
/// switches and is only written while the client's device grab lock is held,
/// which [`set_wants_grab`](Self::set_wants_grab) enforces by taking the guard.
#[derive(Debug)]
pub struct Client {
    id: ClientId,
    namespace: NamespaceId,
    device: DeviceId,
    wants_grab: AtomicBool,
    queue: mpsc::Sender<InputEvent>,
    dropped: AtomicU64,
}

impl Client {
    /// Creates a client with a bounded event queue of `capacity` entries.
    ///
    /// A zero capacity is raised to one.
    pub fn new(namespace: NamespaceId, device: DeviceId, capacity: usize) -> (Self, EventReceiver) {
        let (queue, receiver) = mpsc::channel(capacity.max(1));
        let client = Self {
            id: ClientId::new(),
            namespace,
            device,
            wants_grab: AtomicBool::new(false),
            queue,
            dropped: AtomicU64::new(0),
        };
        (client, receiver)
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn namespace(&self) -> NamespaceId {
        self.namespace
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    /// The client's recorded grab intent.
    pub fn wants_grab(&self) -> bool {
        self.wants_grab.load(Ordering::Acquire)
    }

    /// Records grab intent.  Callers prove they hold the device lock.
    pub(crate) fn set_wants_grab(&self, grab: &DeviceGrabGuard<'_>, wants: bool) {
        debug_assert_eq!(grab.device_id(), self.device);
        self.wants_grab.store(wants, Ordering::Release);
    }

    /// Queues `event` for the reader without blocking.
    ///
    /// Returns `false` when the event was not queued: either the queue is full
    /// (the event is counted as dropped) or the reader has gone away.
    pub(crate) fn enqueue(&self, event: InputEvent) -> bool {
        match self.queue.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                trace!(client = %self.id, dropped, "event queue full; event dropped");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Number of events discarded because the queue was full.
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
