//! Namespace manager implementations.
//!
//! The multiplexer only sees the [`NamespaceManager`] trait.  The in-memory
//! manager here backs the binary and the integration tests; a host that has
//! its own namespace lifecycle implements the trait directly.
//!
//! [`NamespaceManager`]: crate::application::namespace_registry::NamespaceManager

pub mod in_memory;

pub use in_memory::InMemoryNamespaceManager;
