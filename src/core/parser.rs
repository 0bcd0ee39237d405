//! Parsing configuration documents and resolving named resources.

use crate::core::Config;
use crate::error::{ConfigError, Result};
use std::path::Path;

/// Parse a JSON document into a [`Config`].
///
/// The top level must be an object of categories, each category an object
/// mapping keys to strings, numbers, booleans, nulls, or arrays of those.
/// Anything else is a [`ConfigError::Parse`].
///
/// Parsing is pure: the same bytes always yield equal configs.
///
/// # Examples
///
/// ```rust
/// use polled_config::core::parse;
///
/// let config = parse(br#"{"dev": {"foo": "bar"}}"#).unwrap();
/// assert!(config.category("dev").is_some());
///
/// assert!(parse(b"[1, 2, 3]").is_err());
/// ```
pub fn parse(bytes: &[u8]) -> Result<Config> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Parse a JSON string into a [`Config`]. See [`parse`].
pub fn parse_str(json: &str) -> Result<Config> {
    parse(json.as_bytes())
}

/// Read a named resource.
///
/// Relative paths are resolved against `root`; absolute paths are used as-is.
///
/// # Errors
///
/// Returns [`ConfigError::Resource`] if the file cannot be read.
pub fn load_resource(root: &Path, path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let resolved = root.join(path.as_ref());
    std::fs::read(&resolved).map_err(|source| ConfigError::Resource {
        path: resolved,
        source,
    })
}
