//! Infrastructure layer for the multiplexer.
//!
//! Contains the pieces that touch the runtime or the file system: the
//! in-memory namespace manager, the switch handler task, and TOML config
//! storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `nsinput_core`, but MUST NOT be imported by the `application` or domain
//! layers.

pub mod namespace_manager;
pub mod storage;
pub mod switch_handler;
