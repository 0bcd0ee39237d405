//! Builder for constructing ConfigManager instances.

use crate::core::{Config, ConfigManager, DEFAULT_CATEGORY, load_resource, parse, parse_str};
use crate::error::Result;
use crate::notify::{Listener, PollTask, Schedule, Scheduler, Watcher};
use crate::sources::{Fetcher, LocalFileFetcher};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "remote")]
use crate::sources::{DEFAULT_HTTP_TIMEOUT, RemoteFetcher};
#[cfg(feature = "remote")]
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::PollMetrics;
#[cfg(feature = "metrics")]
use opentelemetry::metrics::Meter;

/// Turns the built manager into a registered poll task.
type TaskFactory = Box<dyn FnOnce(&ConfigManager) -> Box<dyn PollTask> + Send>;

/// Where the snapshot available right after `build()` comes from.
enum InitialSource {
    Config(Config),
    Json(String),
    Resource(PathBuf),
}

enum WatchTarget {
    File {
        directory: PathBuf,
        file_name: PathBuf,
    },
    #[cfg(feature = "remote")]
    Remote { url: String },
    Custom(TaskFactory),
}

/// Builder for constructing a [`ConfigManager`].
///
/// Provides a fluent interface for the initial snapshot, the sources to poll,
/// and listeners that must see the very first published change.
///
/// # Examples
///
/// ```rust,no_run
/// use polled_config::prelude::*;
/// use std::time::Duration;
///
/// # fn example() -> Result<()> {
/// let manager = ConfigManager::builder()
///     .with_default_category("prod")
///     .with_resource_dir("/opt/myapp")
///     .with_resource("defaults.json")
///     .with_file_watcher("/etc/myapp", "config.json", Schedule::every(Duration::from_secs(5)).immediately())
///     .with_remote_watcher("https://config.example.com/myapp", Schedule::every(Duration::from_secs(60)))
///     .with_listener(|manager| {
///         println!("config changed: {:?}", manager.get_string("log_level"));
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigManagerBuilder {
    default_category: String,
    initial: Option<InitialSource>,
    resource_dir: PathBuf,
    watchers: Vec<(WatchTarget, Schedule)>,
    listeners: Vec<Listener>,
    #[cfg(feature = "remote")]
    http_timeout: Duration,
    #[cfg(feature = "metrics")]
    metrics: Option<PollMetrics>,
}

impl ConfigManagerBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            default_category: DEFAULT_CATEGORY.to_string(),
            initial: None,
            resource_dir: PathBuf::new(),
            watchers: Vec::new(),
            listeners: Vec::new(),
            #[cfg(feature = "remote")]
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Set the category read by accessors that take no category argument.
    ///
    /// Default is `local`.
    pub fn with_default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = category.into();
        self
    }

    /// Start from an already-built config.
    ///
    /// Only one initial source is used; the last `with_config`, `with_json`,
    /// or `with_resource` call wins.
    pub fn with_config(mut self, config: Config) -> Self {
        self.initial = Some(InitialSource::Config(config));
        self
    }

    /// Start from a JSON document, parsed during `build()`.
    pub fn with_json(mut self, json: impl Into<String>) -> Self {
        self.initial = Some(InitialSource::Json(json.into()));
        self
    }

    /// Start from a JSON file resolved against the resource directory.
    pub fn with_resource(mut self, path: impl Into<PathBuf>) -> Self {
        self.initial = Some(InitialSource::Resource(path.into()));
        self
    }

    /// Set the directory `with_resource` paths are resolved against.
    ///
    /// Defaults to the current working directory.
    pub fn with_resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource_dir = dir.into();
        self
    }

    /// Poll `directory/file_name` on `schedule`.
    pub fn with_file_watcher(
        mut self,
        directory: impl Into<PathBuf>,
        file_name: impl Into<PathBuf>,
        schedule: Schedule,
    ) -> Self {
        self.watchers.push((
            WatchTarget::File {
                directory: directory.into(),
                file_name: file_name.into(),
            },
            schedule,
        ));
        self
    }

    /// Poll `url` with HTTP GET on `schedule`.
    ///
    /// For authenticated endpoints build a [`RemoteFetcher`] yourself and
    /// pass it to [`with_watcher`](Self::with_watcher).
    #[cfg(feature = "remote")]
    pub fn with_remote_watcher(mut self, url: impl Into<String>, schedule: Schedule) -> Self {
        self.watchers
            .push((WatchTarget::Remote { url: url.into() }, schedule));
        self
    }

    /// Request timeout for watchers added with `with_remote_watcher`.
    ///
    /// Default is 10 seconds.
    #[cfg(feature = "remote")]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Poll a custom fetcher on `schedule`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use polled_config::prelude::*;
    /// use polled_config::sources::RemoteFetcher;
    /// use std::time::Duration;
    ///
    /// # fn example() -> Result<()> {
    /// let fetcher = RemoteFetcher::builder()
    ///     .with_url("https://config.example.com/myapp")
    ///     .with_auth_token("secret-token")
    ///     .build()?;
    ///
    /// let manager = ConfigManager::builder()
    ///     .with_watcher(fetcher, Schedule::every(Duration::from_secs(30)).immediately())
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_watcher<F>(mut self, fetcher: F, schedule: Schedule) -> Self
    where
        F: Fetcher + 'static,
    {
        let factory: TaskFactory = Box::new(move |manager: &ConfigManager| -> Box<dyn PollTask> {
            Box::new(Watcher::new(fetcher, manager))
        });
        self.watchers.push((WatchTarget::Custom(factory), schedule));
        self
    }

    /// Register a listener before any watcher runs, so it sees the first
    /// published change.
    pub fn with_listener<F>(mut self, listener: F) -> Self
    where
        F: Fn(&ConfigManager) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Record poll counts and latencies with an OpenTelemetry meter.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, meter: Meter) -> Self {
        self.metrics = Some(PollMetrics::new(meter));
        self
    }

    /// Build the manager and start polling.
    ///
    /// The initial source, if any, is loaded synchronously. A polling worker
    /// is started only when at least one watcher was added.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The initial JSON or resource cannot be read or parsed
    /// - A watcher has a zero interval or a malformed URL
    /// - The polling worker cannot be started
    pub fn build(self) -> Result<ConfigManager> {
        let initial = match self.initial {
            None => None,
            Some(InitialSource::Config(config)) => Some(config),
            Some(InitialSource::Json(json)) => Some(parse_str(&json)?),
            Some(InitialSource::Resource(path)) => {
                Some(parse(&load_resource(&self.resource_dir, path)?)?)
            }
        };

        let manager = ConfigManager::with_initial(self.default_category, initial);
        for listener in self.listeners {
            manager.push_listener(listener);
        }

        if self.watchers.is_empty() {
            return Ok(manager);
        }

        let mut tasks: Vec<(Box<dyn PollTask>, Schedule)> = Vec::with_capacity(self.watchers.len());
        for (target, schedule) in self.watchers {
            schedule.validate()?;
            let task: Box<dyn PollTask> = match target {
                WatchTarget::File {
                    directory,
                    file_name,
                } => Box::new(Watcher::new(
                    LocalFileFetcher::new(directory, file_name),
                    &manager,
                )),
                #[cfg(feature = "remote")]
                WatchTarget::Remote { url } => {
                    let fetcher = RemoteFetcher::builder()
                        .with_url(url)
                        .with_timeout(self.http_timeout)
                        .build()?;
                    Box::new(Watcher::new(fetcher, &manager))
                }
                WatchTarget::Custom(factory) => factory(&manager),
            };
            tasks.push((task, schedule));
        }

        #[cfg(feature = "metrics")]
        let scheduler = match self.metrics {
            Some(metrics) => Scheduler::start_with_metrics(metrics)?,
            None => Scheduler::start()?,
        };
        #[cfg(not(feature = "metrics"))]
        let scheduler = Scheduler::start()?;

        info!(watchers = tasks.len(), "Starting config watchers");
        for (task, schedule) in tasks {
            scheduler.register(task, schedule)?;
        }

        Ok(manager.with_scheduler(Arc::new(scheduler)))
    }
}

impl Default for ConfigManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Category;
    use crate::error::ConfigError;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_build_without_sources() {
        let manager = ConfigManagerBuilder::new().build().unwrap();

        assert_eq!(manager.default_category(), DEFAULT_CATEGORY);
        assert!(manager.snapshot().is_none());
        assert!(!manager.is_polling());
    }

    #[test]
    fn test_build_with_json() {
        let manager = ConfigManagerBuilder::new()
            .with_json(r#"{"local": {"foo": "bar"}}"#)
            .build()
            .unwrap();

        assert_eq!(manager.get_string("foo").unwrap(), "bar");
    }

    #[test]
    fn test_build_with_invalid_json() {
        let result = ConfigManagerBuilder::new().with_json("{not json").build();
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_build_with_config_and_category() {
        let config = Config::new().with_category("dev", Category::new().with("port", 8080));
        let manager = ConfigManagerBuilder::new()
            .with_default_category("dev")
            .with_config(config)
            .build()
            .unwrap();

        assert_eq!(manager.default_category(), "dev");
        assert_eq!(manager.get_int("port").unwrap(), 8080);
    }

    #[test]
    fn test_last_initial_source_wins() {
        let manager = ConfigManagerBuilder::new()
            .with_json(r#"{"local": {"foo": "first"}}"#)
            .with_json(r#"{"local": {"foo": "second"}}"#)
            .build()
            .unwrap();

        assert_eq!(manager.get_string("foo").unwrap(), "second");
    }

    #[test]
    fn test_build_with_resource() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("defaults.json"),
            r#"{"local": {"foo": ["one", "two"]}}"#,
        )
        .unwrap();

        let manager = ConfigManagerBuilder::new()
            .with_resource_dir(temp_dir.path())
            .with_resource("defaults.json")
            .build()
            .unwrap();

        assert_eq!(manager.get_string_list("foo").unwrap(), vec!["one", "two"]);
    }

    #[test]
    fn test_build_with_missing_resource() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigManagerBuilder::new()
            .with_resource_dir(temp_dir.path())
            .with_resource("missing.json")
            .build();

        assert!(matches!(result, Err(ConfigError::Resource { .. })));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = ConfigManagerBuilder::new()
            .with_file_watcher("/tmp", "config.json", Schedule::every(Duration::ZERO))
            .build();

        assert!(matches!(result, Err(ConfigError::InvalidSource(_))));
    }

    #[cfg(feature = "remote")]
    #[test]
    fn test_malformed_remote_url_rejected() {
        let result = ConfigManagerBuilder::new()
            .with_remote_watcher("not a url", Schedule::every(Duration::from_secs(1)))
            .build();

        assert!(matches!(result, Err(ConfigError::InvalidSource(_))));
    }

    #[test]
    fn test_listeners_registered_in_order() {
        let manager = ConfigManagerBuilder::new()
            .with_listener(|_| {})
            .with_listener(|_| {})
            .build()
            .unwrap();

        assert_eq!(manager.listener_count(), 2);
    }

    #[test]
    fn test_watcher_starts_polling() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManagerBuilder::new()
            .with_file_watcher(
                temp_dir.path(),
                "config.json",
                Schedule::every(Duration::from_secs(60)),
            )
            .build()
            .unwrap();

        assert!(manager.is_polling());
        manager.shutdown();
        assert!(!manager.is_polling());
    }
}
