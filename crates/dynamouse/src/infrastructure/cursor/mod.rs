//! Cursor primitive implementations.
//!
//! Everything here implements
//! [`CursorController`](crate::application::ports::CursorController):
//!
//! - **`memory`** – [`InMemoryCursor`](memory::InMemoryCursor), a virtual cursor
//!   that only remembers where it was put.  Used by tests, and by the binary
//!   when no native backend is available.
//! - **`linux`** – [`X11CursorController`](linux::X11CursorController), which
//!   warps the real pointer with `XWarpPointer` (Linux, `x11` feature).

use thiserror::Error;

pub mod memory;

#[cfg(all(target_os = "linux", feature = "x11"))]
pub mod linux;

/// Error type for opening a native cursor backend.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("failed to open cursor backend: {0}")]
    Unavailable(String),
}
