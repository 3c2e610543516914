//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module handles:
//!
//! - Reading the TOML configuration file from the platform-appropriate directory.
//! - Writing it back when settings change.
//! - Providing defaults when the file does not exist yet (first run).
//!
//! The handoff engine itself never touches this module; it only receives the
//! [`DeviceMapping`](crate::application::ports::DeviceMapping) read from it.

pub mod config;
