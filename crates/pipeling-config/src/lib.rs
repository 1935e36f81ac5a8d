//! Credential, integration, notifier and connection configuration loaded
//! from an ordered list of directories, with hot reload.

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod parse;
pub mod resource;
pub mod watcher;

pub use catalog::{BuiltinCatalog, Catalog};
pub use config::{load_config, ConfigurationSnapshot, LiveConfig, LoadOptions, LoadOutcome, Loader};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{CatalogError, ConfigError, ConversionError, Result};
pub use watcher::{start_watching, ConfigWatcher, ReloadEvent, Reloader, WatchOptions};
