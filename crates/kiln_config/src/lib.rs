//! Parsing and validation of `kiln.toml` elaboration settings.
//!
//! This crate reads the optional configuration file and produces a
//! strongly-typed [`KilnConfig`]. Every section is optional; an empty file
//! yields [`KilnConfig::default`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
