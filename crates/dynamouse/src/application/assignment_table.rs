//! Use case: hand cursor ownership from one mouse to another.
//!
//! The [`AssignmentTable`] owns every live [`Assignment`] and the single
//! `busy` flag that serializes handoffs.  It is the only component that calls
//! `Assignment::activate` / `Assignment::deactivate`, and therefore the only
//! one that moves the shared cursor.
//!
//! # Handoff protocol
//!
//! ```text
//!  device moves ──► Assignment (inactive) ──will_activate──► HandoffTrigger
//!                                                                │
//!                busy already set? ── yes ──► request dropped    │ (synchronously)
//!                      │ no                                      │
//!                      ▼                                         │
//!                  set busy ─► spawn ─► previous.deactivate() ─► requester.activate(previous) ─► clear busy
//! ```
//!
//! `busy` is taken inside the `will_activate` callback itself, before any task
//! is spawned.  When two mice move back to back, the first one gets the cursor
//! and the second one is dropped, not queued.  The device has to move again to
//! ask a second time.
//!
//! # Rebuilding
//!
//! [`AssignmentTable::apply_mapping`] throws the whole table away and builds a
//! new one from a [`DeviceMapping`].  It is not guarded by `busy`; callers run
//! it only while no handoff is in flight (at startup, or when devices or
//! displays change).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use dynamouse_core::Subscription;
use futures_util::future::{join_all, try_join_all};
use tokio::runtime::Handle;
use tracing::{debug, error, info, warn};

use super::assignment::{Assignment, AssignmentListener};
use super::ports::{CursorController, DeviceError, DeviceManager, DeviceMapping, DisplayRegistry};

/// What happened to an activation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffOutcome {
    /// The requester now owns the cursor.
    Completed,
    /// Another handoff was in flight (or the requester is gone); nothing changed.
    Dropped,
}

struct TableInner {
    devices: Arc<dyn DeviceManager>,
    displays: Arc<dyn DisplayRegistry>,
    cursor: Arc<dyn CursorController>,
    assignments: Mutex<Vec<Arc<Assignment>>>,
    busy: AtomicBool,
}

impl TableInner {
    fn assignments(&self) -> MutexGuard<'_, Vec<Arc<Assignment>>> {
        self.assignments.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Coordinator for cursor ownership across all configured mice.
///
/// Cheap to clone; clones share the same table.
#[derive(Clone)]
pub struct AssignmentTable {
    inner: Arc<TableInner>,
}

impl AssignmentTable {
    /// Creates an empty table.  Nothing happens until [`apply_mapping`](Self::apply_mapping).
    pub fn new(
        devices: Arc<dyn DeviceManager>,
        displays: Arc<dyn DisplayRegistry>,
        cursor: Arc<dyn CursorController>,
    ) -> Self {
        Self {
            inner: Arc::new(TableInner {
                devices,
                displays,
                cursor,
                assignments: Mutex::new(Vec::new()),
                busy: AtomicBool::new(false),
            }),
        }
    }

    /// Replaces the table with one assignment per usable mapping entry.
    ///
    /// Every existing assignment is disposed first (all disposals are awaited)
    /// and `busy` is reset.  Entries with no display, an unknown device, or an
    /// unknown display are skipped.  Each new assignment is wired to the
    /// handoff protocol and finally connected.
    ///
    /// # Errors
    ///
    /// Returns the first [`DeviceError`] raised while disposing the old
    /// assignments or connecting the new ones.
    pub async fn apply_mapping(&self, mapping: &DeviceMapping) -> Result<(), DeviceError> {
        let previous = std::mem::take(&mut *self.inner.assignments());
        debug!(count = previous.len(), "disposing previous assignments");
        join_all(previous.iter().map(|a| a.dispose()))
            .await
            .into_iter()
            .collect::<Result<Vec<()>, DeviceError>>()?;
        self.inner.busy.store(false, Ordering::Release);

        let mut built = Vec::with_capacity(mapping.len());
        for (product, binding) in mapping {
            let Some(label) = binding.display.as_deref() else {
                debug!(product = %product, "no display configured; device left uncontrolled");
                continue;
            };
            let Some(device) = self.inner.devices.device(product) else {
                debug!(product = %product, "device not present; skipping");
                continue;
            };
            let Some(display) = self.inner.displays.display(label) else {
                debug!(product = %product, display = label, "display not connected; skipping");
                continue;
            };

            let assignment = Assignment::new(device, display, Arc::clone(&self.inner.cursor));
            HandoffTrigger::wire(&self.inner, &assignment);
            built.push(assignment);
        }

        *self.inner.assignments() = built.clone();
        try_join_all(built.iter().map(|a| a.connect())).await?;

        info!(assignments = built.len(), "device mapping applied");
        Ok(())
    }

    /// Runs the handoff protocol for `requester`.
    ///
    /// Returns [`HandoffOutcome::Dropped`] without side effects if another
    /// handoff is in flight or `requester` has been disposed.
    ///
    /// # Errors
    ///
    /// Propagates a [`DeviceError`] from deactivating the previous owner or
    /// activating the requester.  `busy` is cleared either way.
    pub async fn request_activation(
        &self,
        requester: &Arc<Assignment>,
    ) -> Result<HandoffOutcome, DeviceError> {
        let Some(busy) = self.begin_handoff(requester) else {
            return Ok(HandoffOutcome::Dropped);
        };
        self.run_handoff(busy, requester).await?;
        Ok(HandoffOutcome::Completed)
    }

    /// Takes `busy` for `requester`, or returns `None` if the request must be
    /// dropped.  Never suspends.
    fn begin_handoff(&self, requester: &Assignment) -> Option<BusyGuard> {
        if requester.is_disposed() {
            debug!(product = requester.product(), "activation requested by disposed assignment");
            return None;
        }
        let busy = BusyGuard::acquire(&self.inner);
        if busy.is_none() {
            debug!(product = requester.product(), "handoff in flight; request dropped");
        }
        busy
    }

    /// Deactivates the current owner and activates `requester`.  `busy` is
    /// released when `_busy` drops, on success or error.
    async fn run_handoff(
        &self,
        _busy: BusyGuard,
        requester: &Arc<Assignment>,
    ) -> Result<(), DeviceError> {
        let previous = self.active().filter(|a| !Arc::ptr_eq(a, requester));
        if let Some(previous) = &previous {
            previous.deactivate().await?;
        }
        requester.activate(previous.as_deref()).await?;

        debug!(
            from = previous.as_ref().map(|a| a.product()),
            to = requester.product(),
            "handoff complete"
        );
        Ok(())
    }

    /// Disposes every assignment and empties the table.
    ///
    /// # Errors
    ///
    /// Returns the first [`DeviceError`] raised by a disposal; every
    /// assignment is still asked to dispose.
    pub async fn shutdown(&self) -> Result<(), DeviceError> {
        let assignments = std::mem::take(&mut *self.inner.assignments());
        let count = assignments.len();
        join_all(assignments.iter().map(|a| a.dispose()))
            .await
            .into_iter()
            .collect::<Result<Vec<()>, DeviceError>>()?;
        info!(count, "assignment table shut down");
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// Snapshot of the current assignments, in mapping order.
    pub fn assignments(&self) -> Vec<Arc<Assignment>> {
        self.inner.assignments().clone()
    }

    /// The assignment that currently owns the cursor, if any.
    pub fn active(&self) -> Option<Arc<Assignment>> {
        self.inner.assignments().iter().find(|a| a.is_active()).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.assignments().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` while a handoff is in flight.
    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::Acquire)
    }
}

// ── Busy flag ─────────────────────────────────────────────────────────────────

/// Holds the `busy` flag for the lifetime of one handoff.
///
/// Owns its table handle so it can move into a spawned handoff task.
struct BusyGuard {
    table: Arc<TableInner>,
}

impl BusyGuard {
    fn acquire(table: &Arc<TableInner>) -> Option<Self> {
        table
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                table: Arc::clone(table),
            })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.table.busy.store(false, Ordering::Release);
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

/// Connects one assignment's `will_activate` to the table's handoff protocol.
///
/// Holds only weak references, so neither the table nor the assignment is
/// kept alive by its own listener.
struct HandoffTrigger {
    table: Weak<TableInner>,
    assignment: Weak<Assignment>,
    wiring: OnceLock<Subscription>,
}

impl HandoffTrigger {
    fn wire(table: &Arc<TableInner>, assignment: &Arc<Assignment>) {
        let trigger = Arc::new(Self {
            table: Arc::downgrade(table),
            assignment: Arc::downgrade(assignment),
            wiring: OnceLock::new(),
        });
        let subscription = assignment.subscribe(Arc::clone(&trigger) as Arc<dyn AssignmentListener>);
        let _ = trigger.wiring.set(subscription);
    }
}

impl AssignmentListener for HandoffTrigger {
    fn will_activate(&self) {
        let (Some(inner), Some(requester)) = (self.table.upgrade(), self.assignment.upgrade())
        else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!(
                product = requester.product(),
                "movement outside a Tokio runtime; activation request ignored"
            );
            return;
        };

        let table = AssignmentTable { inner };
        let Some(busy) = table.begin_handoff(&requester) else {
            return;
        };
        runtime.spawn(async move {
            if let Err(e) = table.run_handoff(busy, &requester).await {
                error!(product = requester.product(), error = %e, "handoff failed");
            }
        });
    }

    fn disposed(&self) {
        if let Some(wiring) = self.wiring.get() {
            wiring.cancel();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
