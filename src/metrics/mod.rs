//! Built-in metrics for polling operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Poll attempts
//! - Outcomes (published, unchanged, fetch failed, parse failed)
//! - Poll duration
//!
//! # Examples
//!
//! ```rust,no_run
//! use polled_config::prelude::*;
//! use opentelemetry::global;
//! use std::time::Duration;
//!
//! # fn example() -> Result<()> {
//! let meter = global::meter("my-app");
//!
//! let manager = ConfigManager::builder()
//!     .with_file_watcher("/etc/myapp", "config.json", Schedule::every(Duration::from_secs(5)))
//!     .with_metrics(meter)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod poll_metrics;

pub use poll_metrics::PollMetrics;
