//! Local file fetcher.

use super::Fetcher;
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Reads a fixed `(directory, filename)` pair on every fetch.
///
/// There is no OS-level change notification involved; the file is read in
/// full each time and compared by content.
///
/// # Examples
///
/// ```rust
/// use polled_config::sources::{Fetcher, LocalFileFetcher};
///
/// let fetcher = LocalFileFetcher::new("/etc/myapp", "config.json");
/// assert_eq!(fetcher.describe(), "file:/etc/myapp/config.json");
/// ```
pub struct LocalFileFetcher {
    path: PathBuf,
}

impl LocalFileFetcher {
    /// Create a fetcher for `directory/file_name`.
    pub fn new(directory: impl AsRef<Path>, file_name: impl AsRef<Path>) -> Self {
        Self {
            path: directory.as_ref().join(file_name),
        }
    }

    /// The full path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Fetcher for LocalFileFetcher {
    async fn fetch(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| ConfigError::fetch(self.describe(), e))
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
