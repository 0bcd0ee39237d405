//! Core configuration management types.

mod builder;
mod manager;
mod model;
mod parser;

pub use builder::ConfigManagerBuilder;
pub use manager::{ConfigManager, DEFAULT_CATEGORY};
pub use model::{Category, Config, Value, ValueKind};
pub use parser::{load_resource, parse, parse_str};
