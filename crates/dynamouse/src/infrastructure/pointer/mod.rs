//! Pointer device infrastructure.
//!
//! Discovering real HID mice is outside this crate; whatever owns the hardware
//! implements [`DeviceManager`](crate::application::ports::DeviceManager) and
//! [`PointerDevice`](crate::application::ports::PointerDevice).
//!
//! # Sub-modules
//!
//! - **`memory`** – [`InMemoryDeviceManager`](memory::InMemoryDeviceManager) and
//!   [`SimulatedPointerDevice`](memory::SimulatedPointerDevice).  Tests use them
//!   to inject movement, count connect/disconnect calls, inject failures, and
//!   hold a `disconnect` suspended.  The binary uses them in `--simulate` mode.

pub mod memory;
