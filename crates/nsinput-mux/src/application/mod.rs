//! Application layer use cases for the multiplexer.
//!
//! Components in this layer depend on the [`NamespaceManager`] abstraction and
//! on the domain entities only.  They contain no channels to the outside world
//! and no file-system access, so every rule below is unit-testable with a
//! test double for the namespace manager.
//!
//! # Sub-modules
//!
//! - **`namespace_registry`** – Wraps the external namespace manager and owns
//!   the table of per-namespace contexts.
//!
//! - **`client_tracker`** – Attaches and detaches clients to their namespace
//!   context, creating and releasing contexts as needed.
//!
//! - **`grab_arbiter`** – The grab state machine: grab/ungrab requests and the
//!   real/virtual swap performed when a namespace switches.
//!
//! - **`event_broadcaster`** – Fans device events out to clients of the active
//!   namespace.  This runs on every hardware event and never blocks.
//!
//! - **`multiplexer`** – The facade handed to the device file-operation layer.
//!
//! [`NamespaceManager`]: namespace_registry::NamespaceManager

pub mod client_tracker;
pub mod device_table;
pub mod error;
pub mod event_broadcaster;
pub mod grab_arbiter;
pub mod multiplexer;
pub mod namespace_registry;

#[cfg(test)]
pub(crate) mod test_support;
