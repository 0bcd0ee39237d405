//! # polled-config
//!
//! Categorized JSON configuration with polling hot-reload and lock-free reads.
//!
//! ## Overview
//!
//! A configuration document is a JSON object of categories (for example
//! `local`, `dev`, `prod`), each mapping keys to strings, numbers, booleans,
//! or homogeneous lists. `polled-config` keeps the current document as an
//! immutable snapshot and:
//! - Serves typed reads from it without locks using `arc-swap`
//! - Polls local files and HTTP endpoints on fixed intervals
//! - Publishes a new snapshot only when the fetched bytes actually change
//! - Keeps the last good snapshot when a source is down or sends garbage
//! - Notifies listeners after every replacement
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use polled_config::prelude::*;
//! use std::time::Duration;
//!
//! # fn example() -> polled_config::error::Result<()> {
//! let manager = ConfigManager::builder()
//!     .with_default_category("prod")
//!     .with_file_watcher("/etc/myapp", "config.json", Schedule::every(Duration::from_secs(10)).immediately())
//!     .with_listener(|manager| {
//!         println!("new timeout: {:?}", manager.get_int("timeout_ms"));
//!     })
//!     .build()?;
//!
//! // Lock-free reads against whatever snapshot is current.
//! let hosts = manager.get_string_list("hosts")?;
//! let retries = manager.get_int_in("shared", "retries")?;
//! println!("{hosts:?} {retries}");
//!
//! manager.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every fallible call returns [`error::Result`]. Getters fail with one of
//! the accessor variants of [`ConfigError`](error::ConfigError) (no config
//! loaded, unknown category, missing key, wrong type, and so on), while
//! `build()` and resource loading fail with parse, resource, or source
//! errors. [`ConfigError::is_access_error`](error::ConfigError::is_access_error)
//! tells the two apart, for example to fall back to a default on a missing
//! key but abort on a broken initial document.
//!
//! Fetch and parse failures during polling never reach the caller. They are
//! logged through `tracing` and the last good snapshot stays in place.
//!
//! ## Feature Flags
//!
//! - `remote` (default): HTTP/HTTPS polling via `reqwest`
//! - `metrics`: OpenTelemetry counters and histograms for every poll

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{Category, Config, ConfigManager, ConfigManagerBuilder, Value};
    pub use crate::error::{ConfigError, Result};
    pub use crate::notify::{PollOutcome, Schedule};
}
