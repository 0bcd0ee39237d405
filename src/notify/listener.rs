//! Listener registry for snapshot change notifications.

use crate::core::ConfigManager;
use arc_swap::ArcSwap;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A callback invoked after every snapshot replacement.
///
/// Listeners receive the manager itself so they can read the new values
/// through the regular typed accessors.
pub type Listener = Arc<dyn Fn(&ConfigManager) + Send + Sync>;

/// Append-only registry of change listeners.
///
/// Registration swaps in a new list, so notification never holds a lock and
/// a listener may itself register further listeners without deadlocking.
/// Listeners added during a notification are first called on the next one.
pub struct ListenerRegistry {
    listeners: ArcSwap<Vec<Listener>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Register a listener. Listeners are called in registration order.
    pub fn add<F>(&self, callback: F)
    where
        F: Fn(&ConfigManager) + Send + Sync + 'static,
    {
        self.push(Arc::new(callback));
    }

    pub(crate) fn push(&self, listener: Listener) {
        self.listeners.rcu(|current| {
            let mut next = current.to_vec();
            next.push(Arc::clone(&listener));
            next
        });
    }

    /// Call every listener in registration order.
    ///
    /// A panicking listener is logged and skipped; the rest still run.
    /// Returns the number of listeners that panicked.
    pub fn notify_all(&self, manager: &ConfigManager) -> usize {
        let listeners = self.listeners.load_full();
        let mut panicked = 0;
        for (index, listener) in listeners.iter().enumerate() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener(manager))) {
                panicked += 1;
                tracing::error!(
                    listener = index,
                    reason = panic_reason(payload.as_ref()),
                    "Config listener panicked, continuing with remaining listeners"
                );
            }
        }
        panicked
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.load().len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_add_and_notify() {
        let registry = ListenerRegistry::new();
        let manager = ConfigManager::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = Arc::clone(&counter);
        registry.add(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify_all(&manager);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        registry.notify_all(&manager);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_notify_in_registration_order() {
        let registry = ListenerRegistry::new();
        let manager = ConfigManager::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = Arc::clone(&order);
            registry.add(move |_| order.lock().unwrap().push(id));
        }

        registry.notify_all(&manager);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let registry = ListenerRegistry::new();
        let manager = ConfigManager::new();
        let counter = Arc::new(AtomicUsize::new(0));

        registry.add(|_| panic!("listener failure"));
        let counter_clone = Arc::clone(&counter);
        registry.add(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        let panicked = registry.notify_all(&manager);
        assert_eq!(panicked, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_registering_listener() {
        let registry = Arc::new(ListenerRegistry::new());
        let manager = ConfigManager::new();

        let inner = Arc::clone(&registry);
        registry.add(move |_| inner.add(|_| {}));

        registry.notify_all(&manager);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_len() {
        let registry = ListenerRegistry::new();
        assert!(registry.is_empty());

        registry.add(|_| {});
        registry.add(|_| {});
        assert_eq!(registry.len(), 2);
    }
}
