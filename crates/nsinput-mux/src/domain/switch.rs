//! Namespace switch notifications.
//!
//! The namespace manager tells each subscribed multiplexer when a namespace
//! enters (`Activate`) or leaves (`Deactivate`) the foreground by sending a
//! [`SwitchNotice`] down a channel.  The manager has already updated its own
//! bookkeeping when the notice is sent, so `is_active` reflects the new state
//! by the time the notice is handled.
//!
//! A notice may carry a completion sender.  The handler answers it with the
//! [`SwitchReport`] once every client of the namespace has been processed,
//! which lets the manager deliver notices one at a time per namespace.

use std::fmt;

use nsinput_core::NamespaceId;
use tokio::sync::{mpsc, oneshot};

/// Direction of a switch for one namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchKind {
    /// The namespace became the foreground namespace.
    Activate,
    /// The namespace was moved to the background.
    Deactivate,
}

impl fmt::Display for SwitchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchKind::Activate => f.write_str("activate"),
            SwitchKind::Deactivate => f.write_str("deactivate"),
        }
    }
}

/// Handle returned by the namespace manager for a switch subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Sending half of the switch channel, registered with the namespace manager.
pub type SwitchSink = mpsc::UnboundedSender<SwitchNotice>;
/// Receiving half of the switch channel, drained by the switch handler.
pub type SwitchStream = mpsc::UnboundedReceiver<SwitchNotice>;

/// Creates a switch channel.
pub fn switch_channel() -> (SwitchSink, SwitchStream) {
    mpsc::unbounded_channel()
}

/// One switch event for one namespace.
#[derive(Debug)]
pub struct SwitchNotice {
    pub namespace: NamespaceId,
    pub kind: SwitchKind,
    done: Option<oneshot::Sender<SwitchReport>>,
}

impl SwitchNotice {
    /// A fire-and-forget notice.
    pub fn new(namespace: NamespaceId, kind: SwitchKind) -> Self {
        Self {
            namespace,
            kind,
            done: None,
        }
    }

    /// A notice whose sender waits for the returned receiver to resolve.
    pub fn with_completion(
        namespace: NamespaceId,
        kind: SwitchKind,
    ) -> (Self, oneshot::Receiver<SwitchReport>) {
        let (tx, rx) = oneshot::channel();
        let notice = Self {
            namespace,
            kind,
            done: Some(tx),
        };
        (notice, rx)
    }

    /// Answers the sender, if it is waiting.
    pub fn complete(self, report: SwitchReport) {
        if let Some(done) = self.done {
            // The waiter may have given up; nothing to do then.
            let _ = done.send(report);
        }
    }
}

/// Outcome of processing one [`SwitchNotice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    pub namespace: NamespaceId,
    pub kind: SwitchKind,
    /// `false` when no context existed for the namespace.
    pub context_found: bool,
    /// Clients of the namespace visited.
    pub clients: usize,
    /// Virtual grabs turned into real grabs.
    pub restored: usize,
    /// Real grabs turned into virtual grabs.
    pub suspended: usize,
    /// Grab restores dropped because another client held the device.
    pub conflicts: usize,
}

impl SwitchReport {
    pub fn new(namespace: NamespaceId, kind: SwitchKind) -> Self {
        Self {
            namespace,
            kind,
            context_found: false,
            clients: 0,
            restored: 0,
            suspended: 0,
            conflicts: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_answers_waiting_sender() {
        // Arrange
        let (notice, mut done) = SwitchNotice::with_completion(NamespaceId(3), SwitchKind::Activate);
        let mut report = SwitchReport::new(notice.namespace, notice.kind);
        report.restored = 2;

        // Act
        notice.complete(report.clone());

        // Assert
        assert_eq!(done.try_recv().unwrap(), report);
    }

    #[test]
    fn test_complete_without_waiter_is_noop() {
        let notice = SwitchNotice::new(NamespaceId(3), SwitchKind::Deactivate);
        notice.complete(SwitchReport::new(NamespaceId(3), SwitchKind::Deactivate));
    }

    #[test]
    fn test_switch_kind_display() {
        assert_eq!(SwitchKind::Activate.to_string(), "activate");
        assert_eq!(SwitchKind::Deactivate.to_string(), "deactivate");
    }
}
