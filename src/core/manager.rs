//! The configuration manager: current snapshot, typed reads, and change fan-out.

use crate::core::{Config, ConfigManagerBuilder, Value, ValueKind};
use crate::error::{ConfigError, Result};
use crate::notify::{Listener, ListenerRegistry, Scheduler};
use arc_swap::ArcSwapOption;
use std::sync::{Arc, OnceLock, Weak};

/// Category used by the accessors that take no category argument.
pub const DEFAULT_CATEGORY: &str = "local";

/// Shared between every handle to one manager, including the ones held by watchers.
struct ManagerState {
    snapshot: ArcSwapOption<Config>,
    listeners: ListenerRegistry,
    default_category: String,
    worker: OnceLock<Weak<Scheduler>>,
}

/// Holds the current configuration snapshot and notifies listeners when it changes.
///
/// Reads are lock-free: the snapshot sits behind `arc-swap` and is replaced
/// wholesale on every [`publish`](Self::publish), so a reader sees either the
/// old or the new config, never a mix. Cloning a manager is cheap and every
/// clone shares the same snapshot, listeners, and polling worker.
///
/// # Examples
///
/// ```rust
/// use polled_config::prelude::*;
///
/// # fn example() -> Result<()> {
/// let manager = ConfigManager::builder()
///     .with_json(r#"{"local": {"foo": "bar", "ports": [80, 443]}, "dev": {"foo": "baz"}}"#)
///     .build()?;
///
/// assert_eq!(manager.get_string("foo")?, "bar");
/// assert_eq!(manager.get_string_in("dev", "foo")?, "baz");
/// assert_eq!(manager.get_int_list("ports")?, vec![80, 443]);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Clone)]
pub struct ConfigManager {
    state: Arc<ManagerState>,
    scheduler: Option<Arc<Scheduler>>,
}

impl ConfigManager {
    /// Create a manager with no snapshot and the default category `local`.
    ///
    /// Every accessor fails with [`ConfigError::NoConfigLoaded`] until the
    /// first [`publish`](Self::publish).
    pub fn new() -> Self {
        Self::with_initial(DEFAULT_CATEGORY.to_string(), None)
    }

    /// Create a new builder for constructing a manager.
    pub fn builder() -> ConfigManagerBuilder {
        ConfigManagerBuilder::new()
    }

    pub(crate) fn with_initial(default_category: String, initial: Option<Config>) -> Self {
        Self {
            state: Arc::new(ManagerState {
                snapshot: ArcSwapOption::new(initial.map(Arc::new)),
                listeners: ListenerRegistry::new(),
                default_category,
                worker: OnceLock::new(),
            }),
            scheduler: None,
        }
    }

    /// Attach the polling worker that feeds this manager.
    pub(crate) fn with_scheduler(mut self, scheduler: Arc<Scheduler>) -> Self {
        let _ = self.state.worker.set(Arc::downgrade(&scheduler));
        self.scheduler = Some(scheduler);
        self
    }

    /// A handle sharing snapshot and listeners that does not own the scheduler.
    ///
    /// Watchers hold this so the worker does not keep itself alive. It still
    /// reaches the worker through a weak link, so listeners handed this
    /// handle can check and stop polling.
    pub(crate) fn publisher(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            scheduler: None,
        }
    }

    pub(crate) fn push_listener(&self, listener: Listener) {
        self.state.listeners.push(listener);
    }

    /// The category used when none is given.
    pub fn default_category(&self) -> &str {
        &self.state.default_category
    }

    /// The current snapshot, or `None` if nothing has been loaded yet.
    pub fn snapshot(&self) -> Option<Arc<Config>> {
        self.state.snapshot.load_full()
    }

    /// Replace the snapshot and notify every listener in registration order.
    ///
    /// The new snapshot is visible to readers before the first listener runs.
    /// A panicking listener is logged and does not stop the others or undo
    /// the replacement.
    pub fn publish(&self, config: Config) {
        self.state.snapshot.store(Some(Arc::new(config)));
        let panicked = self.state.listeners.notify_all(self);
        tracing::debug!(
            listeners = self.state.listeners.len(),
            panicked,
            "Published configuration snapshot"
        );
    }

    /// Register a listener called after every snapshot replacement.
    ///
    /// Listeners cannot be removed. Register them before polling starts (see
    /// [`ConfigManagerBuilder::with_listener`]) to be sure of seeing the first
    /// published snapshot.
    ///
    /// Use the manager passed to the listener rather than capturing a clone.
    /// A captured clone owns the polling worker, so the worker then outlives
    /// every other handle and only stops on an explicit
    /// [`shutdown`](Self::shutdown).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polled_config::prelude::*;
    ///
    /// let manager = ConfigManager::new();
    /// manager.add_listener(|manager| {
    ///     if let Ok(level) = manager.get_string("log_level") {
    ///         println!("log level is now {}", level);
    ///     }
    /// });
    /// ```
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&ConfigManager) + Send + Sync + 'static,
    {
        self.state.listeners.add(listener);
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.state.listeners.len()
    }

    /// Whether a polling worker is attached and running.
    pub fn is_polling(&self) -> bool {
        self.worker().is_some_and(|s| s.is_running())
    }

    /// Stop polling. The poll in progress, if any, is allowed to finish.
    ///
    /// Reads keep returning the last published snapshot afterwards. Safe to
    /// call from a listener: on the worker thread it only signals the stop.
    pub fn shutdown(&self) {
        if let Some(scheduler) = self.worker() {
            scheduler.shutdown();
        }
    }

    fn worker(&self) -> Option<Arc<Scheduler>> {
        match &self.scheduler {
            Some(scheduler) => Some(Arc::clone(scheduler)),
            None => self.state.worker.get().and_then(Weak::upgrade),
        }
    }

    /// Read a string from the default category.
    pub fn get_string(&self, key: &str) -> Result<String> {
        self.get_string_in(self.default_category(), key)
    }

    /// Read a string.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoConfigLoaded`] if nothing was published yet
    /// - [`ConfigError::UnknownCategory`] if the category does not exist
    /// - [`ConfigError::MissingKey`] / [`ConfigError::NullValue`] if the key is absent or null
    /// - [`ConfigError::TypeMismatch`] if the value is not a string
    pub fn get_string_in(&self, category: &str, key: &str) -> Result<String> {
        self.read(category, key, |at, value| match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(at.mismatch(ValueKind::String, other)),
        })
    }

    /// Read an integer from the default category.
    pub fn get_int(&self, key: &str) -> Result<i64> {
        self.get_int_in(self.default_category(), key)
    }

    /// Read an integer.
    ///
    /// Fails with [`ConfigError::NotAnInteger`] if the number has a fractional
    /// part, is not finite, or does not fit in an `i64`.
    pub fn get_int_in(&self, category: &str, key: &str) -> Result<i64> {
        self.read(category, key, |at, value| match value {
            Value::Number(n) => at.integer(*n, None),
            other => Err(at.mismatch(ValueKind::Number, other)),
        })
    }

    /// Read a floating point number from the default category.
    pub fn get_double(&self, key: &str) -> Result<f64> {
        self.get_double_in(self.default_category(), key)
    }

    /// Read a floating point number.
    pub fn get_double_in(&self, category: &str, key: &str) -> Result<f64> {
        self.read(category, key, |at, value| match value {
            Value::Number(n) => Ok(*n),
            other => Err(at.mismatch(ValueKind::Number, other)),
        })
    }

    /// Read a boolean from the default category.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get_bool_in(self.default_category(), key)
    }

    /// Read a boolean.
    pub fn get_bool_in(&self, category: &str, key: &str) -> Result<bool> {
        self.read(category, key, |at, value| match value {
            Value::Bool(b) => Ok(*b),
            other => Err(at.mismatch(ValueKind::Bool, other)),
        })
    }

    /// Read a list of strings from the default category.
    pub fn get_string_list(&self, key: &str) -> Result<Vec<String>> {
        self.get_string_list_in(self.default_category(), key)
    }

    /// Read a list of strings.
    ///
    /// Fails with [`ConfigError::HeterogeneousList`] on the first element
    /// that is not a string.
    pub fn get_string_list_in(&self, category: &str, key: &str) -> Result<Vec<String>> {
        self.read(category, key, |at, value| {
            at.list(value)?
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(at.element_mismatch(index, ValueKind::String, other)),
                })
                .collect()
        })
    }

    /// Read a list of integers from the default category.
    pub fn get_int_list(&self, key: &str) -> Result<Vec<i64>> {
        self.get_int_list_in(self.default_category(), key)
    }

    /// Read a list of integers.
    ///
    /// Elements are checked in order and the first offending one fails the
    /// whole call: a non-number gives [`ConfigError::HeterogeneousList`], a
    /// number with a fractional part gives [`ConfigError::NotAnInteger`].
    pub fn get_int_list_in(&self, category: &str, key: &str) -> Result<Vec<i64>> {
        self.read(category, key, |at, value| {
            at.list(value)?
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Number(n) => at.integer(*n, Some(index)),
                    other => Err(at.element_mismatch(index, ValueKind::Number, other)),
                })
                .collect()
        })
    }

    /// Read a list of floating point numbers from the default category.
    pub fn get_double_list(&self, key: &str) -> Result<Vec<f64>> {
        self.get_double_list_in(self.default_category(), key)
    }

    /// Read a list of floating point numbers.
    pub fn get_double_list_in(&self, category: &str, key: &str) -> Result<Vec<f64>> {
        self.read(category, key, |at, value| {
            at.list(value)?
                .iter()
                .enumerate()
                .map(|(index, item)| match item {
                    Value::Number(n) => Ok(*n),
                    other => Err(at.element_mismatch(index, ValueKind::Number, other)),
                })
                .collect()
        })
    }

    /// Resolve `category`/`key` in the current snapshot and convert the value.
    fn read<T>(
        &self,
        category: &str,
        key: &str,
        convert: impl FnOnce(&Location<'_>, &Value) -> Result<T>,
    ) -> Result<T> {
        let snapshot = self.state.snapshot.load();
        let Some(config) = snapshot.as_deref() else {
            return Err(ConfigError::NoConfigLoaded);
        };

        let values = config
            .category(category)
            .ok_or_else(|| ConfigError::UnknownCategory {
                category: category.to_string(),
            })?;

        let at = Location { category, key };
        match values.get(key) {
            None => Err(ConfigError::MissingKey {
                category: category.to_string(),
                key: key.to_string(),
            }),
            Some(Value::Null) => Err(ConfigError::NullValue {
                category: category.to_string(),
                key: key.to_string(),
            }),
            Some(value) => convert(&at, value),
        }
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("default_category", &self.state.default_category)
            .field("loaded", &self.state.snapshot.load().is_some())
            .field("listeners", &self.state.listeners.len())
            .field("polling", &self.is_polling())
            .finish()
    }
}

/// Where a value was read from, for building accessor errors.
struct Location<'a> {
    category: &'a str,
    key: &'a str,
}

impl Location<'_> {
    fn mismatch(&self, expected: ValueKind, found: &Value) -> ConfigError {
        ConfigError::TypeMismatch {
            category: self.category.to_string(),
            key: self.key.to_string(),
            expected,
            found: found.kind(),
        }
    }

    fn element_mismatch(&self, index: usize, expected: ValueKind, found: &Value) -> ConfigError {
        ConfigError::HeterogeneousList {
            category: self.category.to_string(),
            key: self.key.to_string(),
            index,
            expected,
            found: found.kind(),
        }
    }

    fn list<'v>(&self, value: &'v Value) -> Result<&'v [Value]> {
        match value {
            Value::List(items) => Ok(items),
            other => Err(self.mismatch(ValueKind::List, other)),
        }
    }

    fn integer(&self, n: f64, index: Option<usize>) -> Result<i64> {
        // 2^63 is exactly representable; i64::MAX is not.
        const UPPER: f64 = 9_223_372_036_854_775_808.0;
        if n.is_finite() && n.fract() == 0.0 && n >= -UPPER && n < UPPER {
            Ok(n as i64)
        } else {
            Err(ConfigError::NotAnInteger {
                category: self.category.to_string(),
                key: self.key.to_string(),
                index,
                value: n,
            })
        }
    }
}
