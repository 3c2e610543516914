//! A display registry backed by a plain list.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dynamouse_core::{Display, Observer, Subscription};

use crate::application::ports::{DisplayListener, DisplayRegistry};

/// Holds a fixed list of displays until [`set_displays`](Self::set_displays)
/// replaces it.
#[derive(Default)]
pub struct StaticDisplayRegistry {
    displays: Mutex<Vec<Display>>,
    listeners: Observer<dyn DisplayListener>,
}

impl StaticDisplayRegistry {
    pub fn new(displays: Vec<Display>) -> Self {
        Self {
            displays: Mutex::new(displays),
            listeners: Observer::new(),
        }
    }

    /// Replaces the display list and fires `displays_changed`.
    pub fn set_displays(&self, displays: Vec<Display>) {
        *self.lock_displays() = displays.clone();
        self.listeners.notify(|l| l.displays_changed(&displays));
    }

    fn lock_displays(&self) -> MutexGuard<'_, Vec<Display>> {
        self.displays.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DisplayRegistry for StaticDisplayRegistry {
    fn display(&self, label: &str) -> Option<Display> {
        self.lock_displays().iter().find(|d| d.label == label).cloned()
    }

    fn displays(&self) -> Vec<Display> {
        self.lock_displays().clone()
    }

    fn subscribe(&self, listener: Arc<dyn DisplayListener>) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynamouse_core::DisplayBounds;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct LastCount {
        seen: AtomicUsize,
    }

    impl DisplayListener for LastCount {
        fn displays_changed(&self, displays: &[Display]) {
            self.seen.store(displays.len(), Ordering::SeqCst);
        }
    }

    fn dual() -> Vec<Display> {
        vec![
            Display::new("Built-in", DisplayBounds::new(0, 0, 1512, 982)),
            Display::new("DELL U2720Q", DisplayBounds::new(1512, -200, 2560, 1440)),
        ]
    }

    #[test]
    fn test_display_lookup_by_label() {
        let registry = StaticDisplayRegistry::new(dual());

        let found = registry.display("DELL U2720Q").expect("present");

        assert_eq!(found.bounds.x, 1512);
        assert!(registry.display("LG UltraFine").is_none());
    }

    #[test]
    fn test_set_displays_replaces_list_and_notifies() {
        // Arrange
        let registry = StaticDisplayRegistry::new(dual());
        let listener = Arc::new(LastCount::default());
        let _sub = registry.subscribe(listener.clone());

        // Act
        registry.set_displays(vec![Display::new("Built-in", DisplayBounds::new(0, 0, 1512, 982))]);

        // Assert
        assert_eq!(listener.seen.load(Ordering::SeqCst), 1);
        assert_eq!(registry.displays().len(), 1);
        assert!(registry.display("DELL U2720Q").is_none());
    }
}
