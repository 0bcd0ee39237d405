//! Source fetcher trait.

use crate::error::Result;
use async_trait::async_trait;

/// A place configuration bytes can be pulled from.
///
/// Implement this trait to poll custom sources (object stores, databases,
/// key-value stores). A fetch returns the full document every time; change
/// detection happens in the watcher, not here.
///
/// Fetchers must not retry internally. A failed fetch is retried on the
/// watcher's next scheduled tick.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Read the complete raw contents of the source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Fetch`](crate::error::ConfigError::Fetch) if the
    /// source cannot be read.
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn describe(&self) -> String;
}
