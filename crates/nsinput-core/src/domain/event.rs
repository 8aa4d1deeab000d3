//! The input event value.
//!
//! The multiplexer never interprets events; it only decides *who* receives
//! them.  An event is therefore kept as the raw `(type, code, value)` triple a
//! device produces, plus the time it was produced.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Event type for synchronization markers that close a packet of events.
pub const EV_SYN: u16 = 0x00;
/// Event type for key and button state changes.
pub const EV_KEY: u16 = 0x01;
/// Event type for relative axis movement.
pub const EV_REL: u16 = 0x02;

/// One event as produced by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Time since an arbitrary monotonic origin chosen by the producer.
    pub time: Duration,
    /// Event type (`EV_KEY`, `EV_REL`, ...).
    pub event_type: u16,
    /// Type-specific code, e.g. the key code for `EV_KEY`.
    pub code: u16,
    /// Type-specific value, e.g. `1` for press and `0` for release.
    pub value: i32,
}

impl InputEvent {
    /// Creates an event with a zero timestamp.
    pub fn new(event_type: u16, code: u16, value: i32) -> Self {
        Self {
            time: Duration::ZERO,
            event_type,
            code,
            value,
        }
    }

    /// A key press (`pressed = true`) or release.
    pub fn key(code: u16, pressed: bool) -> Self {
        Self::new(EV_KEY, code, i32::from(pressed))
    }

    /// A relative axis motion.
    pub fn relative(axis: u16, delta: i32) -> Self {
        Self::new(EV_REL, axis, delta)
    }

    /// The end-of-packet marker.
    pub fn syn() -> Self {
        Self::new(EV_SYN, 0, 0)
    }

    /// Returns the same event stamped with `time`.
    pub fn at(mut self, time: Duration) -> Self {
        self.time = time;
        self
    }
}
