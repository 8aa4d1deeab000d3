//! nsinput-mux library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::error::MuxError;
pub use application::multiplexer::{DeviceStatus, Multiplexer, DEFAULT_QUEUE_CAPACITY};
pub use application::namespace_registry::{ManagerError, NamespaceManager};
pub use domain::client::{Client, EventReceiver};
pub use domain::switch::{SwitchKind, SwitchNotice, SwitchReport};
