//! Error types for configuration loading, import resolution and reload.

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostics::Diagnostics;

/// Errors that abort a configuration load.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{summary}\n{diagnostics}")]
    Diagnostics {
        summary: String,
        diagnostics: Diagnostics,
    },

    #[error("Configuration did not settle after {passes} decode passes\n{diagnostics}")]
    NotConverged {
        passes: usize,
        diagnostics: Diagnostics,
    },

    #[error("Failed to read config directory '{path}': {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to create default {what}: {source}")]
    Defaults {
        what: &'static str,
        #[source]
        source: CatalogError,
    },

    #[error("Failed to resolve import source '{locator}': {message}")]
    ImportSource { locator: String, message: String },

    #[error("Credential with name '{0}' already exists")]
    CredentialExists(String),

    #[error("Connection with name '{0}' already exists")]
    ConnectionExists(String),

    #[error("Failed to convert credential '{name}' to a connection: {source}")]
    Conversion {
        name: String,
        #[source]
        source: ConversionError,
    },

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Background load failed: {0}")]
    Background(String),
}

impl ConfigError {
    pub(crate) fn diagnostics(summary: impl Into<String>, diagnostics: Diagnostics) -> Self {
        Self::Diagnostics {
            summary: summary.into(),
            diagnostics,
        }
    }
}

/// Errors raised when turning a credential into its connection counterpart.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Invalid connection type '{0}'")]
    InvalidConnectionType(String),

    #[error("Invalid connection name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// Errors raised by a resource catalog while building defaults.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("default {kind} '{name}' is invalid: {reason}")]
    InvalidDefault {
        kind: &'static str,
        name: String,
        reason: String,
    },

    #[error("missing default integration '{0}'")]
    MissingIntegration(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
