//! Error types for polled-config.

use crate::core::ValueKind;
use std::path::PathBuf;

/// Result type alias for polled-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading, polling, or reading configuration.
///
/// Accessor errors (`NoConfigLoaded` through `NotAnInteger`) are returned to
/// the caller of the getter. `Fetch` and `Parse` raised while polling are
/// contained by the watcher and only logged.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid JSON or does not have the category → key → value shape.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// A source could not be read.
    #[error("Failed to fetch configuration from {origin}: {reason}")]
    Fetch {
        /// Description of the source (`file:<path>` or `http:<url>`)
        origin: String,
        /// Why the fetch failed
        reason: String,
    },

    /// No snapshot has been published yet.
    #[error("No config loaded, unable to get value")]
    NoConfigLoaded,

    /// The category is absent from the current snapshot.
    #[error("Category '{category}' does not exist")]
    UnknownCategory {
        /// The requested category
        category: String,
    },

    /// The key is absent from the category.
    #[error("Key '{key}' is missing in category '{category}'")]
    MissingKey {
        /// The category that was searched
        category: String,
        /// The requested key
        key: String,
    },

    /// The key is present but explicitly null.
    #[error("Value for key '{key}' in category '{category}' was null")]
    NullValue {
        /// The category that was searched
        category: String,
        /// The requested key
        key: String,
    },

    /// The stored value has a different tag than the accessor asked for.
    #[error("Value for key '{key}' in category '{category}' is a {found}, expected a {expected}")]
    TypeMismatch {
        /// The category that was searched
        category: String,
        /// The requested key
        key: String,
        /// The tag the accessor needs
        expected: ValueKind,
        /// The tag actually stored
        found: ValueKind,
    },

    /// A list element has a different tag than the list accessor asked for.
    #[error(
        "List for key '{key}' in category '{category}' contains a {found} at index {index}, expected only {expected} items"
    )]
    HeterogeneousList {
        /// The category that was searched
        category: String,
        /// The requested key
        key: String,
        /// Position of the first offending element
        index: usize,
        /// The element tag the accessor needs
        expected: ValueKind,
        /// The tag actually stored at `index`
        found: ValueKind,
    },

    /// A number read as an integer has a fractional part or is out of range.
    #[error("Value {value} for key '{key}' in category '{category}' is not an integer{}", list_position(.index))]
    NotAnInteger {
        /// The category that was searched
        category: String,
        /// The requested key
        key: String,
        /// Position in the list, `None` for scalar reads
        index: Option<usize>,
        /// The offending number
        value: f64,
    },

    /// A named resource could not be read.
    #[error("Unable to read config resource {}: {source}", .path.display())]
    Resource {
        /// The resolved path of the resource
        path: PathBuf,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A watch target or schedule was configured incorrectly.
    #[error("Invalid configuration source: {0}")]
    InvalidSource(String),

    /// The polling worker could not be started or has already stopped.
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

fn list_position(index: &Option<usize>) -> String {
    index.map(|i| format!(" (list index {i})")).unwrap_or_default()
}

impl ConfigError {
    /// Create a fetch error for the named source.
    pub fn fetch(origin: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Fetch {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for the errors a getter can raise.
    ///
    /// Everything else comes from loading or polling: `build()`,
    /// [`load_resource`](crate::core::load_resource), or a fetcher.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use polled_config::prelude::*;
    ///
    /// let manager = ConfigManager::new();
    /// let err = manager.get_string("foo").unwrap_err();
    /// assert!(err.is_access_error());
    ///
    /// let err = ConfigManager::builder().with_json("not json").build().unwrap_err();
    /// assert!(!err.is_access_error());
    /// ```
    pub fn is_access_error(&self) -> bool {
        matches!(
            self,
            Self::NoConfigLoaded
                | Self::UnknownCategory { .. }
                | Self::MissingKey { .. }
                | Self::NullValue { .. }
                | Self::TypeMismatch { .. }
                | Self::HeterogeneousList { .. }
                | Self::NotAnInteger { .. }
        )
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message() {
        let err = ConfigError::fetch("http:http://localhost/config", "status 503");
        assert_eq!(
            err.to_string(),
            "Failed to fetch configuration from http:http://localhost/config: status 503"
        );
        assert!(!err.is_access_error());
    }

    #[test]
    fn test_not_an_integer_message() {
        let err = ConfigError::NotAnInteger {
            category: "local".to_string(),
            key: "foo".to_string(),
            index: Some(1),
            value: 22123.01,
        };
        assert!(err.to_string().contains("(list index 1)"));
        assert!(err.is_access_error());

        let scalar = ConfigError::NotAnInteger {
            category: "local".to_string(),
            key: "foo".to_string(),
            index: None,
            value: 1.5,
        };
        assert!(!scalar.to_string().contains("list index"));
    }
}
