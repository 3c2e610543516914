//! Assignment: one pointing device bound to one display.
//!
//! An `Assignment` knows three things:
//!
//! - which device and which display it binds together,
//! - whether it currently owns the shared cursor (`active`),
//! - where the cursor was the last time it gave ownership up.
//!
//! # State machine
//!
//! ```text
//!              activate(previous)
//!   Inactive ─────────────────────► Active
//!      ▲                              │
//!      └──────── deactivate() ────────┘
//! ```
//!
//! When the device moves while the assignment is inactive, the assignment
//! fires `will_activate` and does nothing else.  Whether it actually becomes
//! active is decided by the [`AssignmentTable`](super::assignment_table::AssignmentTable),
//! which is the only caller of `activate` and `deactivate`.
//!
//! After [`Assignment::dispose`] the assignment is dead: its movement
//! subscription is cancelled and it must not be used again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use dynamouse_core::{resolve_activation_point, Display, Observer, Point, Subscription};
use tracing::{debug, warn};
use uuid::Uuid;

use super::ports::{CursorController, DeviceError, MovementListener, PointerDevice};

/// Receives lifecycle notifications from an [`Assignment`].
pub trait AssignmentListener: Send + Sync {
    /// The device moved while the assignment was inactive.
    fn will_activate(&self) {}

    /// The assignment was disposed.  Fired exactly once.
    fn disposed(&self) {}
}

#[derive(Debug, Default)]
struct OwnershipState {
    active: bool,
    last_position: Option<Point>,
}

/// Binding of one pointing device to one display plus its ownership state.
pub struct Assignment {
    id: Uuid,
    device: Arc<dyn PointerDevice>,
    display: Display,
    cursor: Arc<dyn CursorController>,
    state: Mutex<OwnershipState>,
    listeners: Observer<dyn AssignmentListener>,
    movement: Subscription,
    disposed: AtomicBool,
}

/// Forwards device movement to the owning assignment without keeping it alive.
struct MovementRelay {
    assignment: Weak<Assignment>,
}

impl MovementListener for MovementRelay {
    fn moved(&self) {
        if let Some(assignment) = self.assignment.upgrade() {
            assignment.on_device_moved();
        }
    }
}

impl Assignment {
    /// Creates an inactive assignment and subscribes to the device's movement.
    ///
    /// The device is not asked to report yet; call [`connect`](Self::connect).
    pub fn new(
        device: Arc<dyn PointerDevice>,
        display: Display,
        cursor: Arc<dyn CursorController>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| {
            let movement = device.subscribe_movement(Arc::new(MovementRelay {
                assignment: weak.clone(),
            }));
            Self {
                id: Uuid::new_v4(),
                device,
                display,
                cursor,
                state: Mutex::new(OwnershipState::default()),
                listeners: Observer::new(),
                movement,
                disposed: AtomicBool::new(false),
            }
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Product name of the bound device.
    pub fn product(&self) -> &str {
        self.device.product()
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Returns `true` while this assignment owns the shared cursor.
    pub fn is_active(&self) -> bool {
        self.state().active
    }

    /// Cursor position recorded at the last deactivation, if any.
    pub fn last_position(&self) -> Option<Point> {
        self.state().last_position
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Registers a lifecycle listener.
    pub fn subscribe(&self, listener: Arc<dyn AssignmentListener>) -> Subscription {
        self.listeners.subscribe(listener)
    }

    /// Asks the device to report movement to this assignment.  Idempotent.
    ///
    /// # Errors
    ///
    /// Propagates the device's [`DeviceError`].
    pub async fn connect(&self) -> Result<(), DeviceError> {
        self.device.connect().await
    }

    /// Returns `true` iff `point` lies strictly inside this assignment's display.
    ///
    /// Points on any edge of the display rectangle are outside.
    pub fn contains(&self, point: Point) -> bool {
        self.display.bounds.contains(point)
    }

    /// Gives up cursor ownership.
    ///
    /// Records the current cursor position and asks the device to resume
    /// reporting movement so it can request ownership again later.
    pub(crate) async fn deactivate(&self) -> Result<(), DeviceError> {
        let position = Point::from(self.cursor.get_cursor_pos());
        {
            let mut state = self.state();
            state.active = false;
            state.last_position = Some(position);
        }
        debug!(
            product = self.product(),
            x = position.x,
            y = position.y,
            "deactivated"
        );
        self.device.connect().await
    }

    /// Takes cursor ownership.  No-op if already active.
    ///
    /// The cursor lands on the first of:
    ///
    /// 1. `previous`'s recorded position, if it lies inside this display;
    /// 2. this assignment's own recorded position, if it lies inside this display;
    /// 3. the center of this display.
    ///
    /// The device is then asked to stop reporting movement while it owns the
    /// cursor.
    pub(crate) async fn activate(&self, previous: Option<&Assignment>) -> Result<(), DeviceError> {
        if self.is_active() {
            return Ok(());
        }

        let previous_position = previous.and_then(Assignment::last_position);
        let target = resolve_activation_point(
            &self.display.bounds,
            self.last_position(),
            previous_position,
        );

        self.cursor.teleport_cursor(target.x, target.y);
        self.state().active = true;
        debug!(
            product = self.product(),
            display = %self.display.label,
            x = target.x,
            y = target.y,
            "activated"
        );
        self.device.disconnect().await
    }

    /// Tears the assignment down: cancels the movement subscription, releases
    /// the device, and fires `disposed`.
    ///
    /// Must be called exactly once per assignment.
    ///
    /// # Errors
    ///
    /// Propagates the device's [`DeviceError`]; `disposed` is not fired in
    /// that case.
    pub async fn dispose(&self) -> Result<(), DeviceError> {
        let already_disposed = self.disposed.swap(true, Ordering::AcqRel);
        debug_assert!(!already_disposed, "Assignment::dispose called twice");
        if already_disposed {
            warn!(product = self.product(), "dispose called twice; ignoring");
            return Ok(());
        }

        self.movement.cancel();
        self.device.disconnect().await?;
        self.listeners.notify(|l| l.disposed());
        debug!(product = self.product(), id = %self.id, "disposed");
        Ok(())
    }

    // ── Private helpers ───────────────────────────────────────────────────────

    fn on_device_moved(&self) {
        if self.is_disposed() || self.is_active() {
            return;
        }
        self.listeners.notify(|l| l.will_activate());
    }

    fn state(&self) -> MutexGuard<'_, OwnershipState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Assignment")
            .field("id", &self.id)
            .field("product", &self.product())
            .field("display", &self.display.label)
            .field("active", &state.active)
            .field("last_position", &state.last_position)
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
