//! Grab vocabulary.
//!
//! A client's *intent* to hold a device exclusively is independent of which
//! namespace is in the foreground; only the *effect* on the shared device
//! toggles as namespaces switch.
//!
//! ```text
//!              request (inactive ns)           ACTIVATE (device free)
//!   NoGrab  ───────────────────────►  VirtualGrab  ─────────────────►  RealGrab
//!     ▲                                   ▲  │                            │
//!     │            release                │  └──── release ──► NoGrab     │
//!     └───────────────────────────────────┼───────────────────────────────┘
//!                                         └──────── DEACTIVATE ───────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The grab state of a single client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrabState {
    /// The client has not asked for exclusive access.
    NoGrab,
    /// The client wants exclusive access but its namespace is in the
    /// background, or the device was taken when its namespace came back.
    VirtualGrab,
    /// The client is the device's exclusive owner.
    RealGrab,
}

impl GrabState {
    /// Derives the state from the client's recorded intent and whether it is
    /// the device's current owner.
    pub fn from_parts(wants_grab: bool, owns_device: bool) -> Self {
        match (owns_device, wants_grab) {
            (true, _) => GrabState::RealGrab,
            (false, true) => GrabState::VirtualGrab,
            (false, false) => GrabState::NoGrab,
        }
    }
}

/// Grab conflicts reported to the requesting client.
///
/// Both are local and non-fatal; the multiplexer never retries on the
/// caller's behalf.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum GrabError {
    /// Another client, in any namespace, holds the device's real grab.
    #[error("device is already grabbed by another client")]
    AlreadyGrabbed,
    /// An ungrab was requested by a client that holds no grab.
    #[error("device is not grabbed by the calling client")]
    NotGrabbedByCaller,
}
