//! # dynamouse-core
//!
//! Shared library for DynaMouse containing the notification primitive and the
//! display geometry used by the cursor-ownership handoff engine.
//!
//! It has zero dependencies on OS APIs, async runtimes, or input devices.
//!
//! # Architecture overview (for beginners)
//!
//! DynaMouse lets several physical mice share one cursor across several
//! monitors.  Each mouse is bound to one monitor.  Whichever mouse moved last
//! "owns" the cursor, and the cursor jumps to that mouse's monitor.
//!
//! This crate (`dynamouse-core`) is the shared foundation.  It defines:
//!
//! - **`observer`** – A tiny publish/subscribe utility.  Devices, displays and
//!   assignments use it to announce "something happened" without knowing who
//!   is listening.
//!
//! - **`domain`** – Pure geometry: points, display rectangles, and the policy
//!   that decides where the cursor reappears when ownership changes hands.

pub mod domain;
pub mod observer;

// Re-export the most-used types at the crate root so callers can write
// `dynamouse_core::Display` instead of `dynamouse_core::domain::geometry::Display`.
pub use domain::geometry::{resolve_activation_point, Display, DisplayBounds, Point};
pub use observer::{Observer, Subscription};
