//! Change detection, polling, and listener notification.
//!
//! A [`Watcher`] fetches a source, fingerprints the bytes, and publishes a
//! freshly parsed snapshot when they differ from the last ones it processed.
//! The [`Scheduler`] runs every watcher of a manager on one background worker.

pub mod detector;
pub mod listener;
pub mod scheduler;
pub mod watcher;

pub use detector::{Change, ChangeDetector, Fingerprint};
pub use listener::{Listener, ListenerRegistry};
pub use scheduler::{PollTask, Schedule, Scheduler, WORKER_THREAD_NAME};
pub use watcher::{PollOutcome, Watcher};
