//! Display (monitor) infrastructure.
//!
//! The engine looks displays up by label through
//! [`DisplayRegistry`](crate::application::ports::DisplayRegistry).
//!
//! # Platform implementations
//!
//! | Module    | When                                 | Source of displays                  |
//! |-----------|--------------------------------------|-------------------------------------|
//! | `memory`  | always                               | the `[[displays]]` config section, tests |
//! | `linux`   | Linux with the `x11` feature enabled | `XOpenDisplay` + `XScreenCount`     |
//!
//! Platform enumerators only produce a `Vec<Display>`; the binary feeds it
//! into a [`StaticDisplayRegistry`](memory::StaticDisplayRegistry).

use thiserror::Error;

pub mod memory;

#[cfg(all(target_os = "linux", feature = "x11"))]
pub mod linux;

/// Error type for display enumeration.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The platform API call to enumerate monitors failed.
    #[error("platform API error while enumerating displays: {0}")]
    PlatformError(String),
}
