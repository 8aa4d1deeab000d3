//! Entities the multiplexer arbitrates between.
//!
//! - **`client`** – one open connection to a device, with its event queue and
//!   its recorded grab intent.
//! - **`device`** – one input source: the snapshot list of attached clients
//!   read by the delivery path, and the exclusive grab owner.
//! - **`context`** – the per-namespace list of clients and the mirrored
//!   foreground flag, behind the namespace's exclusive lock.
//! - **`switch`** – the messages the namespace manager sends when a namespace
//!   enters or leaves the foreground.
//!
//! Locking rule: a context lock is always taken *before* a device grab lock,
//! never the other way round.

pub mod client;
pub mod context;
pub mod device;
pub mod switch;
