//! # nsinput-core
//!
//! Shared library for the namespace-aware input multiplexer containing the
//! handle types, the input event value, grab states, and the snapshot list
//! used on the event delivery path.
//!
//! This crate is used by `nsinput-mux` and by anything that talks to it.
//! It has zero dependencies on async runtimes, OS APIs, or device nodes.
//!
//! # Architecture overview
//!
//! Several isolated execution contexts ("namespaces") share one set of input
//! devices.  Only the *active* namespace sees device events and may hold a
//! device's exclusive grab; the others keep their grab requests on record as
//! *virtual* grabs that become real again when their namespace is switched
//! back to the foreground.
//!
//! - **`domain`** – Plain value types: [`NamespaceId`], [`ClientId`],
//!   [`DeviceId`], [`InputEvent`], and the grab state machine vocabulary
//!   ([`GrabState`], [`GrabError`]).
//!
//! - **`sync`** – [`SnapshotList`], a copy-on-write collection whose readers
//!   never block.  The multiplexer keeps each device's attached clients in one
//!   so the hardware event path can iterate them while clients come and go.

pub mod domain;
pub mod sync;

pub use domain::event::InputEvent;
pub use domain::grab::{GrabError, GrabState};
pub use domain::ids::{ClientId, DeviceId, NamespaceId};
pub use sync::snapshot::{Snapshot, SnapshotList};
