//! Errors surfaced to the device file-operation layer.

use nsinput_core::{ClientId, DeviceId, GrabError, NamespaceId};
use thiserror::Error;

use super::namespace_registry::ManagerError;

/// Error type for multiplexer operations.
#[derive(Debug, Error, PartialEq)]
pub enum MuxError {
    /// The namespace manager could not provide a context for the namespace.
    /// Nothing was registered for the client.
    #[error("cannot allocate context for {namespace}: {source}")]
    ResourceExhausted {
        namespace: NamespaceId,
        #[source]
        source: ManagerError,
    },

    /// The namespace manager does not know the namespace.
    #[error("unknown namespace {0}")]
    UnknownNamespace(NamespaceId),

    /// The device handle is not registered.
    #[error("device not found: {0}")]
    DeviceNotFound(DeviceId),

    /// The client has been closed, or was never attached.
    #[error("{0} is not attached to its namespace")]
    ClientDetached(ClientId),

    /// A grab request conflicted with the device's current owner.
    #[error(transparent)]
    Grab(#[from] GrabError),
}
