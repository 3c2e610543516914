//! In-memory pointer devices.
//!
//! A [`SimulatedPointerDevice`] behaves like a real mouse from the engine's
//! point of view:
//!
//! - it reports movement only while *connected*;
//! - `connect` and `disconnect` are async and may fail;
//! - `disconnect` can be held suspended with [`SimulatedPointerDevice::hold_disconnects`],
//!   which is how tests keep a handoff "in flight";
//! - once removed from its [`InMemoryDeviceManager`] it is *unplugged*: it
//!   stops reporting, `connect` fails with [`DeviceError::Unavailable`], and
//!   `disconnect` succeeds without doing anything.
//!
//! # Usage in tests
//!
//! ```ignore
//! let mouse = Arc::new(SimulatedPointerDevice::new("MX Master 3"));
//! let devices = InMemoryDeviceManager::new();
//! devices.insert(Arc::clone(&mouse));
//!
//! // ... apply a mapping that uses "MX Master 3" ...
//!
//! assert!(mouse.emit_movement(), "connected devices deliver movement");
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use dynamouse_core::{Observer, Subscription};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::application::ports::{
    DeviceError, DeviceListener, DeviceManager, MovementListener, PointerDevice,
};

// ── SimulatedPointerDevice ────────────────────────────────────────────────────

/// A pointing device driven by test code or by `--simulate` input.
pub struct SimulatedPointerDevice {
    product: String,
    reporting: AtomicBool,
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    waiting_disconnects: AtomicUsize,
    fail_connect: AtomicBool,
    fail_disconnect: AtomicBool,
    unplugged: AtomicBool,
    gate: Mutex<Option<watch::Receiver<bool>>>,
    movement: Observer<dyn MovementListener>,
}

/// Holds [`SimulatedPointerDevice::disconnect`] calls suspended until
/// [`release`](Self::release) is called or the gate is dropped.
pub struct DisconnectGate {
    tx: watch::Sender<bool>,
}

impl DisconnectGate {
    /// Lets every pending and future `disconnect` proceed.
    pub fn release(&self) {
        self.tx.send_replace(true);
    }
}

impl SimulatedPointerDevice {
    /// Creates a disconnected device.
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            reporting: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
            waiting_disconnects: AtomicUsize::new(0),
            fail_connect: AtomicBool::new(false),
            fail_disconnect: AtomicBool::new(false),
            unplugged: AtomicBool::new(false),
            gate: Mutex::new(None),
            movement: Observer::new(),
        }
    }

    /// Simulates physical motion.
    ///
    /// Returns `true` if the movement was delivered, i.e. the device is
    /// connected.  Disconnected devices drop motion silently.
    pub fn emit_movement(&self) -> bool {
        if !self.is_reporting() {
            trace!(product = %self.product, "movement while disconnected; not reported");
            return false;
        }
        self.movement.notify(|l| l.moved());
        true
    }

    /// Returns `true` while the device is connected and reporting movement.
    pub fn is_reporting(&self) -> bool {
        self.reporting.load(Ordering::Acquire)
    }

    /// Number of successful `connect` calls.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of successful `disconnect` calls.
    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Number of `disconnect` calls currently suspended on a [`DisconnectGate`].
    pub fn waiting_disconnects(&self) -> usize {
        self.waiting_disconnects.load(Ordering::SeqCst)
    }

    /// Number of live movement subscriptions.
    pub fn movement_subscribers(&self) -> usize {
        self.movement.len()
    }

    /// Makes every subsequent `connect` fail until reset.
    pub fn set_fail_connect(&self, fail: bool) {
        self.fail_connect.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `disconnect` fail until reset.
    pub fn set_fail_disconnect(&self, fail: bool) {
        self.fail_disconnect.store(fail, Ordering::SeqCst);
    }

    /// Returns `true` once the device has been removed from its manager.
    pub fn is_unplugged(&self) -> bool {
        self.unplugged.load(Ordering::Acquire)
    }

    fn unplug(&self) {
        self.unplugged.store(true, Ordering::Release);
        self.reporting.store(false, Ordering::Release);
        debug!(product = %self.product, "device unplugged");
    }

    /// Suspends every `disconnect` until the returned gate is released or dropped.
    pub fn hold_disconnects(&self) -> DisconnectGate {
        let (tx, rx) = watch::channel(false);
        *self.gate() = Some(rx);
        DisconnectGate { tx }
    }

    fn gate(&self) -> MutexGuard<'_, Option<watch::Receiver<bool>>> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn wait_for_gate(&self) {
        let gate = self.gate().clone();
        let Some(mut rx) = gate else {
            return;
        };

        self.waiting_disconnects.fetch_add(1, Ordering::SeqCst);
        loop {
            let open = *rx.borrow();
            if open {
                break;
            }
            // A dropped gate counts as released.
            if rx.changed().await.is_err() {
                break;
            }
        }
        self.waiting_disconnects.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PointerDevice for SimulatedPointerDevice {
    fn product(&self) -> &str {
        &self.product
    }

    async fn connect(&self) -> Result<(), DeviceError> {
        if self.is_unplugged() {
            return Err(DeviceError::Unavailable(self.product.clone()));
        }
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(DeviceError::Connect {
                product: self.product.clone(),
                reason: "simulated failure".to_string(),
            });
        }
        self.reporting.store(true, Ordering::Release);
        self.connects.fetch_add(1, Ordering::SeqCst);
        debug!(product = %self.product, "device connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        if self.is_unplugged() {
            trace!(product = %self.product, "disconnect of unplugged device; nothing to release");
            return Ok(());
        }
        self.wait_for_gate().await;
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(DeviceError::Disconnect {
                product: self.product.clone(),
                reason: "simulated failure".to_string(),
            });
        }
        self.reporting.store(false, Ordering::Release);
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        debug!(product = %self.product, "device disconnected");
        Ok(())
    }

    fn subscribe_movement(&self, listener: Arc<dyn MovementListener>) -> Subscription {
        self.movement.subscribe(listener)
    }
}

// ── InMemoryDeviceManager ─────────────────────────────────────────────────────

/// A device manager whose device list is edited directly.
///
/// `insert` and `remove` fire `devices_changed`, like a hot-plug would.
#[derive(Default)]
pub struct InMemoryDeviceManager {
    devices: Mutex<BTreeMap<String, Arc<SimulatedPointerDevice>>>,
    listeners: Observer<dyn DeviceListener>,
}

impl InMemoryDeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager holding one disconnected device per product name.
    pub fn with_products<I, S>(products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let manager = Self::new();
        {
            let mut devices = manager.lock_devices();
            for product in products {
                let device = Arc::new(SimulatedPointerDevice::new(product));
                devices.insert(device.product.clone(), device);
            }
        }
        manager
    }

    /// Adds (or replaces) a device and fires `devices_changed`.
    pub fn insert(&self, device: Arc<SimulatedPointerDevice>) {
        self.lock_devices().insert(device.product.clone(), device);
        self.listeners.notify(|l| l.devices_changed());
    }

    /// Unplugs and removes a device, and fires `devices_changed` if it was
    /// present.
    pub fn remove(&self, product: &str) -> Option<Arc<SimulatedPointerDevice>> {
        let removed = self.lock_devices().remove(product);
        if let Some(device) = &removed {
            device.unplug();
            self.listeners.notify(|l| l.devices_changed());
        }
        removed
    }

    /// Returns the concrete simulated device, for driving it from tests.
    pub fn get(&self, product: &str) -> Option<Arc<SimulatedPointerDevice>> {
        self.lock_devices().get(product).cloned()
    }

    fn lock_devices(&self) -> MutexGuard<'_, BTreeMap<String, Arc<SimulatedPointerDevice>>> {
        self.devices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DeviceManager for InMemoryDeviceManager {
    fn device(&self, product: &str) -> Option<Arc<dyn PointerDevice>> {
        self.get(product).map(|d| d as Arc<dyn PointerDevice>)
    }

    fn devices(&self) -> Vec<String> {
        self.lock_devices().keys().cloned().collect()
    }

    fn subscribe(&self, listener: Arc<dyn DeviceListener>) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    #[derive(Default)]
    struct CountingMovement {
        moves: AtomicUsize,
    }

    impl MovementListener for CountingMovement {
        fn moved(&self) {
            self.moves.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct CountingDevices {
        changes: AtomicUsize,
    }

    impl DeviceListener for CountingDevices {
        fn devices_changed(&self) {
            self.changes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_movement_is_only_reported_while_connected() {
        // Arrange
        let device = SimulatedPointerDevice::new("mouse");
        let listener = Arc::new(CountingMovement::default());
        let _sub = device.subscribe_movement(listener.clone());

        // Act / Assert
        assert!(!device.emit_movement(), "new devices are disconnected");
        assert_ok!(device.connect().await);
        assert!(device.emit_movement());
        assert_ok!(device.disconnect().await);
        assert!(!device.emit_movement());
        assert_eq!(listener.moves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connect_and_disconnect_are_counted() {
        let device = SimulatedPointerDevice::new("mouse");

        assert_ok!(device.connect().await);
        assert_ok!(device.connect().await);
        assert_ok!(device.disconnect().await);

        assert_eq!(device.connect_count(), 2);
        assert_eq!(device.disconnect_count(), 1);
        assert!(!device.is_reporting());
    }

    #[tokio::test]
    async fn test_injected_failures_surface_as_device_errors() {
        let device = SimulatedPointerDevice::new("mouse");
        device.set_fail_connect(true);
        device.set_fail_disconnect(true);

        let connect = device.connect().await;
        let disconnect = device.disconnect().await;

        assert_err!(&connect);
        assert_err!(&disconnect);
        assert!(matches!(connect, Err(DeviceError::Connect { .. })));
        assert!(matches!(disconnect, Err(DeviceError::Disconnect { .. })));
        assert_eq!(device.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_gate_holds_disconnect_until_released() {
        // Arrange
        let device = Arc::new(SimulatedPointerDevice::new("mouse"));
        let gate = device.hold_disconnects();
        let task = {
            let device = Arc::clone(&device);
            tokio::spawn(async move { device.disconnect().await })
        };

        // Act: let the task park on the gate
        while device.waiting_disconnects() == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(device.disconnect_count(), 0);
        gate.release();
        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("disconnect must finish after release")
            .expect("task must not panic");

        // Assert
        assert_ok!(result);
        assert_eq!(device.disconnect_count(), 1);
        assert_eq!(device.waiting_disconnects(), 0);
    }

    #[test]
    fn test_manager_notifies_on_insert_and_remove() {
        // Arrange
        let manager = InMemoryDeviceManager::new();
        let listener = Arc::new(CountingDevices::default());
        let _sub = manager.subscribe(listener.clone());

        // Act
        manager.insert(Arc::new(SimulatedPointerDevice::new("a")));
        manager.insert(Arc::new(SimulatedPointerDevice::new("b")));
        let removed = manager.remove("a");
        let missing = manager.remove("nope");

        // Assert
        assert!(removed.is_some());
        assert!(missing.is_none());
        assert_eq!(listener.changes.load(Ordering::SeqCst), 3);
        assert_eq!(DeviceManager::devices(&manager), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_removed_device_is_unavailable_but_releases_cleanly() {
        // Arrange
        let manager = InMemoryDeviceManager::with_products(["mouse"]);
        let device = manager.get("mouse").expect("device present");
        assert_ok!(device.connect().await);

        // Act
        let removed = manager.remove("mouse").expect("removed");

        // Assert
        assert!(removed.is_unplugged());
        assert!(!removed.emit_movement(), "unplugged devices stop reporting");
        assert_eq!(
            removed.connect().await,
            Err(DeviceError::Unavailable("mouse".to_string()))
        );
        assert_ok!(removed.disconnect().await);
    }

    #[test]
    fn test_with_products_resolves_devices_by_product_name() {
        let manager = InMemoryDeviceManager::with_products(["Trackpad", "MX Master 3"]);

        let device = manager.device("MX Master 3").expect("device present");

        assert_eq!(device.product(), "MX Master 3");
        assert!(manager.device("unknown").is_none());
    }
}
