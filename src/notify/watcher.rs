//! Poll-and-publish watchers.

use crate::core::{ConfigManager, parse};
use crate::notify::detector::{Change, ChangeDetector, Fingerprint};
use crate::notify::scheduler::PollTask;
use crate::sources::Fetcher;
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// How a single poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// New content was parsed and published to the manager.
    Published,
    /// Content matched the last processed fingerprint; nothing happened.
    Unchanged,
    /// The source could not be read. The fingerprint was left alone.
    FetchFailed,
    /// New content could not be parsed. The fingerprint was still updated so
    /// the same broken bytes are not parsed again.
    ParseFailed,
}

/// Combines a [`Fetcher`], a [`ChangeDetector`], and the parser into one
/// poll step that publishes into a [`ConfigManager`].
///
/// Local and remote watching are the same type with a different fetcher.
///
/// # Examples
///
/// ```rust,no_run
/// use polled_config::core::ConfigManager;
/// use polled_config::notify::Watcher;
/// use polled_config::sources::LocalFileFetcher;
///
/// # async fn example() {
/// let manager = ConfigManager::new();
/// let mut watcher = Watcher::new(LocalFileFetcher::new("/etc/myapp", "config.json"), &manager);
///
/// let outcome = watcher.poll().await;
/// println!("poll finished: {:?}", outcome);
/// # }
/// ```
pub struct Watcher<F> {
    fetcher: F,
    detector: ChangeDetector,
    manager: ConfigManager,
}

impl<F: Fetcher> Watcher<F> {
    /// Create a watcher that publishes into `manager`.
    ///
    /// The watcher keeps a handle to the manager's snapshot and listeners,
    /// but not to its scheduler.
    pub fn new(fetcher: F, manager: &ConfigManager) -> Self {
        Self {
            fetcher,
            detector: ChangeDetector::new(),
            manager: manager.publisher(),
        }
    }

    /// The fetcher this watcher polls.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fingerprint of the last content this watcher processed.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.detector.last()
    }

    /// Run one fetch → detect → parse → publish step.
    ///
    /// Errors are logged and reported through the returned outcome; they
    /// never propagate, so a bad tick does not stop future polling.
    pub async fn poll(&mut self) -> PollOutcome {
        let source = self.fetcher.describe();
        debug!(%source, "Polling configuration source");

        let bytes = match self.fetcher.fetch().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(%source, error = %e, "Unable to fetch config, keeping current snapshot");
                return PollOutcome::FetchFailed;
            }
        };

        let fingerprint = match self.detector.check(&bytes) {
            Change::Unchanged => {
                debug!(%source, "Configuration unchanged");
                return PollOutcome::Unchanged;
            }
            Change::Changed(fingerprint) => fingerprint,
        };

        let outcome = match parse(&bytes) {
            Ok(config) => {
                info!(
                    %source,
                    %fingerprint,
                    categories = config.len(),
                    "Publishing new configuration"
                );
                self.manager.publish(config);
                PollOutcome::Published
            }
            Err(e) => {
                warn!(
                    %source,
                    %fingerprint,
                    error = %e,
                    "Configuration changed but could not be parsed, keeping current snapshot"
                );
                PollOutcome::ParseFailed
            }
        };

        self.detector.commit(fingerprint);
        outcome
    }
}

#[async_trait]
impl<F: Fetcher + 'static> PollTask for Watcher<F> {
    async fn tick(&mut self) -> PollOutcome {
        self.poll().await
    }

    fn name(&self) -> String {
        self.fetcher.describe()
    }
}
