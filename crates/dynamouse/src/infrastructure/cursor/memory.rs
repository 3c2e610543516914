//! Virtual cursor for tests and headless runs.
//!
//! # Usage in tests
//!
//! ```ignore
//! let cursor = Arc::new(InMemoryCursor::at(0, 0));
//! let table = AssignmentTable::new(devices, displays, cursor.clone());
//!
//! // ... drive a handoff ...
//!
//! assert_eq!(cursor.position(), Point::new(960, 540));
//! assert_eq!(cursor.teleport_count(), 1);
//! ```
//!
//! Tests can also move the cursor with [`InMemoryCursor::set_position`] to
//! simulate the user pushing it around between handoffs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use dynamouse_core::Point;
use tracing::debug;

use crate::application::ports::CursorController;

/// A cursor that exists only in memory.
#[derive(Default)]
pub struct InMemoryCursor {
    position: Mutex<Point>,
    teleports: AtomicUsize,
}

impl InMemoryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cursor resting at (x, y).
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            position: Mutex::new(Point::new(x, y)),
            teleports: AtomicUsize::new(0),
        }
    }

    /// Current position.
    pub fn position(&self) -> Point {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves the cursor as the user would, without counting a teleport.
    pub fn set_position(&self, x: i32, y: i32) {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = Point::new(x, y);
    }

    /// Number of `teleport_cursor` calls so far.
    pub fn teleport_count(&self) -> usize {
        self.teleports.load(Ordering::SeqCst)
    }
}

impl CursorController for InMemoryCursor {
    fn teleport_cursor(&self, x: i32, y: i32) {
        self.set_position(x, y);
        self.teleports.fetch_add(1, Ordering::SeqCst);
        debug!(x, y, "virtual cursor moved");
    }

    fn get_cursor_pos(&self) -> (i32, i32) {
        self.position().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teleport_updates_position_and_count() {
        let cursor = InMemoryCursor::new();

        cursor.teleport_cursor(100, 200);
        cursor.teleport_cursor(-5, 7);

        assert_eq!(cursor.get_cursor_pos(), (-5, 7));
        assert_eq!(cursor.teleport_count(), 2);
    }

    #[test]
    fn test_set_position_is_not_a_teleport() {
        let cursor = InMemoryCursor::at(1, 1);

        cursor.set_position(40, 50);

        assert_eq!(cursor.position(), Point::new(40, 50));
        assert_eq!(cursor.teleport_count(), 0);
    }
}
