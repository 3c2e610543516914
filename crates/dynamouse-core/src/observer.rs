//! Minimal publish/subscribe primitive.
//!
//! An [`Observer<L>`] keeps a list of listeners of type `Arc<L>`, where `L` is
//! usually a trait object such as `dyn AssignmentListener`.  A source calls
//! [`Observer::notify`] with a closure that invokes one trait method on every
//! listener.
//!
//! # Listener traits (for beginners)
//!
//! Listener traits give every method a default empty body:
//!
//! ```rust
//! trait DoorListener: Send + Sync {
//!     fn opened(&self) {}
//!     fn closed(&self) {}
//! }
//! ```
//!
//! A subscriber that only cares about `opened` overrides just that method and
//! inherits the no-op for `closed`.
//!
//! # Cancellation
//!
//! [`Observer::subscribe`] returns a [`Subscription`].  Calling
//! [`Subscription::cancel`] removes exactly that listener; later calls are
//! no-ops.  Dropping a `Subscription` does **not** cancel it.
//!
//! Notification iterates over a snapshot of the listener list, so a listener
//! may cancel itself (or any other subscription) from inside a callback
//! without another listener being skipped or invoked twice.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::trace;

/// Type-erased handle back to the registry that issued a subscription.
trait Detach: Send + Sync {
    fn detach(&self, id: u64);
}

struct Registry<L: ?Sized> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Arc<L>)>>,
}

impl<L: ?Sized> Registry<L> {
    fn entries(&self) -> MutexGuard<'_, Vec<(u64, Arc<L>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<L: ?Sized + Send + Sync> Detach for Registry<L> {
    fn detach(&self, id: u64) {
        self.entries().retain(|(entry_id, _)| *entry_id != id);
    }
}

/// A set of subscribed listeners of type `L`.
pub struct Observer<L: ?Sized> {
    registry: Arc<Registry<L>>,
}

impl<L: ?Sized + Send + Sync + 'static> Observer<L> {
    /// Creates an observer with no listeners.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(0),
                entries: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Registers `listener` and returns the handle that removes it again.
    pub fn subscribe(&self, listener: Arc<L>) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.entries().push((id, listener));
        trace!(id, "listener subscribed");

        let source: Weak<dyn Detach> = Arc::downgrade(&self.registry) as Weak<dyn Detach>;
        Subscription {
            id,
            source,
            cancelled: AtomicBool::new(false),
        }
    }

    /// Invokes `f` once for every listener subscribed at the time of the call,
    /// in registration order.
    pub fn notify(&self, mut f: impl FnMut(&L)) {
        let snapshot: Vec<Arc<L>> = self
            .registry
            .entries()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            f(&listener);
        }
    }

    /// Returns the number of live subscriptions.
    pub fn len(&self) -> usize {
        self.registry.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L: ?Sized + Send + Sync + 'static> Default for Observer<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`Observer::subscribe`].
///
/// Not tied to the listener type, so a device can hand one out without the
/// caller knowing which observer it came from.
#[must_use = "dropping a Subscription leaves the listener registered; call cancel() to remove it"]
pub struct Subscription {
    id: u64,
    source: Weak<dyn Detach>,
    cancelled: AtomicBool,
}

impl Subscription {
    /// Removes the listener from its observer.  Idempotent.
    ///
    /// If the observer has already been dropped this only marks the handle as
    /// cancelled.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(source) = self.source.upgrade() {
            source.detach(self.id);
            trace!(id = self.id, "listener cancelled");
        }
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
