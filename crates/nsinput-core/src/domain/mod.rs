//! Domain values shared across the multiplexer.
//!
//! Everything here is plain data: copyable handles, the event value that flows
//! from a device to its clients, and the grab vocabulary used by the arbiter.
//! No locks, no I/O, no async.

/// Input event value delivered from devices to clients.
pub mod event;
/// Grab state vocabulary and grab conflict errors.
pub mod grab;
/// Stable handles for namespaces, clients, and devices.
pub mod ids;
