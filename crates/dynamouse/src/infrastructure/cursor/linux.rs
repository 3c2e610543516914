//! Linux X11 cursor control.
//!
//! # How the pointer is moved (for beginners)
//!
//! X11 keeps one pointer per display.  Two Xlib calls are enough here:
//!
//! - `XWarpPointer(display, None, root, 0, 0, 0, 0, x, y)` moves the pointer
//!   to absolute root-window coordinates (`src_w = None` means "from anywhere").
//! - `XQueryPointer(display, root, ...)` reports where the pointer currently
//!   is, relative to the root window.
//!
//! Requests are buffered by Xlib, so every warp is followed by `XFlush`.
//!
//! # Permissions
//!
//! The process needs access to the X display named by `DISPLAY`.  If the X
//! server is unreachable, [`X11CursorController::open`] fails.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;
use x11::xlib;

use super::CursorError;
use crate::application::ports::CursorController;

/// Owned Xlib connection.
struct XConnection(*mut xlib::Display);

// SAFETY: the pointer is only ever dereferenced by Xlib while the surrounding
// `Mutex` is held, so no two threads use the connection at the same time.
unsafe impl Send for XConnection {}

/// Moves the real X11 pointer.
pub struct X11CursorController {
    connection: Mutex<XConnection>,
}

impl X11CursorController {
    /// Opens a connection to the X display named by `DISPLAY`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Unavailable`] if `XOpenDisplay` returns null.
    pub fn open() -> Result<Self, CursorError> {
        // SAFETY: a null name selects $DISPLAY; the pointer is closed in Drop.
        let display = unsafe { xlib::XOpenDisplay(std::ptr::null()) };
        if display.is_null() {
            let display_env = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
            return Err(CursorError::Unavailable(format!(
                "XOpenDisplay failed; DISPLAY={display_env}"
            )));
        }
        Ok(Self {
            connection: Mutex::new(XConnection(display)),
        })
    }

    fn connection(&self) -> MutexGuard<'_, XConnection> {
        self.connection.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CursorController for X11CursorController {
    fn teleport_cursor(&self, x: i32, y: i32) {
        let conn = self.connection();
        // SAFETY: `conn.0` is a live display opened in `open()`.
        unsafe {
            let root = xlib::XDefaultRootWindow(conn.0);
            xlib::XWarpPointer(conn.0, 0, root, 0, 0, 0, 0, x, y);
            xlib::XFlush(conn.0);
        }
    }

    fn get_cursor_pos(&self) -> (i32, i32) {
        let conn = self.connection();
        let mut root_return: xlib::Window = 0;
        let mut child_return: xlib::Window = 0;
        let (mut root_x, mut root_y, mut win_x, mut win_y) = (0, 0, 0, 0);
        let mut mask: u32 = 0;

        // SAFETY: `conn.0` is a live display; every out-pointer refers to a
        // local that outlives the call.
        let on_screen = unsafe {
            let root = xlib::XDefaultRootWindow(conn.0);
            xlib::XQueryPointer(
                conn.0,
                root,
                &mut root_return,
                &mut child_return,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask,
            )
        };
        if on_screen == xlib::False {
            warn!("pointer is on another X screen; reporting (0, 0)");
            return (0, 0);
        }
        (root_x, root_y)
    }
}

impl Drop for X11CursorController {
    fn drop(&mut self) {
        let conn = self.connection();
        // SAFETY: opened in `open()` and never used after this point.
        unsafe { xlib::XCloseDisplay(conn.0) };
    }
}
