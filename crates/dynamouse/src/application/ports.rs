//! Contracts for the collaborators the handoff engine drives but does not own.
//!
//! The engine never discovers hardware, enumerates monitors, or warps the
//! cursor itself.  It talks to the outside world only through these traits;
//! the infrastructure layer provides the implementations (in-memory ones for
//! tests and simulation, X11 ones on Linux).
//!
//! ```text
//!  DeviceManager ──► PointerDevice ──(moved)──► Assignment ──► AssignmentTable
//!  DisplayRegistry ──► Display ─────────────────┘                 │
//!                                          CursorController ◄─────┘
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use dynamouse_core::{Display, Subscription};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for pointer device I/O.
///
/// The engine never retries or recovers from these; they propagate to the
/// caller of `apply_mapping` or to the task running a handoff.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeviceError {
    /// The device could not be put into movement-reporting mode.
    #[error("failed to connect to device {product}: {reason}")]
    Connect { product: String, reason: String },

    /// The device could not be released from movement-reporting mode.
    #[error("failed to disconnect device {product}: {reason}")]
    Disconnect { product: String, reason: String },

    /// The device was unplugged or otherwise disappeared.
    #[error("device {0} is no longer available")]
    Unavailable(String),
}

// ── Pointer devices ───────────────────────────────────────────────────────────

/// Receives movement notifications from a [`PointerDevice`].
pub trait MovementListener: Send + Sync {
    /// The device reported relative motion.
    fn moved(&self) {}
}

/// A physical pointing device, owned by the [`DeviceManager`].
///
/// While *connected* the device reports movement to its subscribers.  While
/// *disconnected* it stays silent; the engine disconnects the device that
/// currently owns the cursor so its own motion does not re-trigger a handoff.
#[async_trait]
pub trait PointerDevice: Send + Sync {
    /// Stable product name; the key used in the device mapping.
    fn product(&self) -> &str;

    /// Starts reporting movement.  Idempotent.
    async fn connect(&self) -> Result<(), DeviceError>;

    /// Stops reporting movement and releases any exclusive hold.  Idempotent.
    async fn disconnect(&self) -> Result<(), DeviceError>;

    /// Registers a movement listener.
    fn subscribe_movement(&self, listener: Arc<dyn MovementListener>) -> Subscription;
}

/// Receives device hot-plug notifications.
pub trait DeviceListener: Send + Sync {
    fn devices_changed(&self) {}
}

/// Looks up pointer devices by product name.
pub trait DeviceManager: Send + Sync {
    /// Returns the device with the given product name, if it is present.
    fn device(&self, product: &str) -> Option<Arc<dyn PointerDevice>>;

    /// Returns the product names of every present device.
    fn devices(&self) -> Vec<String>;

    fn subscribe(&self, listener: Arc<dyn DeviceListener>) -> Subscription;
}

// ── Displays ──────────────────────────────────────────────────────────────────

/// Receives monitor hot-plug notifications.
pub trait DisplayListener: Send + Sync {
    fn displays_changed(&self, _displays: &[Display]) {}
}

/// Looks up monitors by label.
#[cfg_attr(test, mockall::automock)]
pub trait DisplayRegistry: Send + Sync {
    /// Returns the display with the given label, if it is connected.
    fn display(&self, label: &str) -> Option<Display>;

    /// Returns every connected display.
    fn displays(&self) -> Vec<Display>;

    fn subscribe(&self, listener: Arc<dyn DisplayListener>) -> Subscription;
}

// ── Cursor ────────────────────────────────────────────────────────────────────

/// The system-wide cursor primitive.
///
/// Only the handoff protocol calls [`teleport_cursor`](Self::teleport_cursor).
#[cfg_attr(test, mockall::automock)]
pub trait CursorController: Send + Sync {
    /// Warps the cursor to (x, y) in global desktop coordinates.
    fn teleport_cursor(&self, x: i32, y: i32);

    /// Returns the current cursor position in global desktop coordinates.
    fn get_cursor_pos(&self) -> (i32, i32);
}

// ── Mapping ───────────────────────────────────────────────────────────────────

/// The display a device is bound to.  `None` leaves the device uncontrolled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl DeviceBinding {
    pub fn to_display(label: impl Into<String>) -> Self {
        Self {
            display: Some(label.into()),
        }
    }

    pub fn uncontrolled() -> Self {
        Self { display: None }
    }
}

/// Device product name → binding.  Iteration order (sorted by product name)
/// is the order assignments are built in.
pub type DeviceMapping = BTreeMap<String, DeviceBinding>;
