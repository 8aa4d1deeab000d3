//! Concurrency primitives for the event delivery path.

pub mod snapshot;
