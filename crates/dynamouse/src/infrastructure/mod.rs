//! Infrastructure layer.
//!
//! Contains the adapters behind the application ports: pointer devices,
//! display registries, cursor control, and file-system storage for the
//! configuration.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `dynamouse_core`, but MUST NOT be imported by the `application` or domain
//! layers (tests excepted).

pub mod cursor;
pub mod display;
pub mod pointer;
pub mod storage;
