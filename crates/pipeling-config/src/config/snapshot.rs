use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::warn;

use crate::catalog::Catalog;
use crate::error::{ConfigError, Result};
use crate::resource::{
    ConnectionImport, Credential, CredentialImport, Integration, Notifier, PipelingConnection,
};

/// Every resource loaded from a list of configuration directories.
///
/// Snapshots are only built through [`ConfigurationSnapshot::seeded`] or a
/// load, so every snapshot carries the catalog's built-in resources.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationSnapshot {
    /// Directories this snapshot was loaded from, highest precedence first.
    pub config_paths: Vec<PathBuf>,
    /// Credential imports by `credential_import.<name>`.
    pub credential_imports: HashMap<String, CredentialImport>,
    /// Credentials by `<type>.<name>`, declared, imported and built-in.
    pub credentials: HashMap<String, Credential>,
    /// Integrations by `<type>.<name>`.
    pub integrations: HashMap<String, Integration>,
    /// Notifiers by bare name.
    pub notifiers: HashMap<String, Notifier>,
    /// Connection imports by `connection_import.<name>`.
    pub connection_imports: HashMap<String, ConnectionImport>,
    /// Connections by `<type>.<name>`, including those derived from credentials.
    pub pipeling_connections: HashMap<String, PipelingConnection>,
}

impl ConfigurationSnapshot {
    /// A snapshot with no resources at all, for exercising single stages.
    #[cfg(test)]
    pub(crate) fn empty(config_paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths,
            credential_imports: HashMap::new(),
            credentials: HashMap::new(),
            integrations: HashMap::new(),
            notifiers: HashMap::new(),
            connection_imports: HashMap::new(),
            pipeling_connections: HashMap::new(),
        }
    }

    /// A snapshot pre-populated with the catalog's default resources.
    pub fn seeded(config_paths: Vec<PathBuf>, catalog: &dyn Catalog) -> Result<Self> {
        let credentials = catalog
            .default_credentials()
            .map_err(|source| ConfigError::Defaults {
                what: "credentials",
                source,
            })?;
        let integrations = catalog
            .default_integrations()
            .map_err(|source| ConfigError::Defaults {
                what: "integrations",
                source,
            })?;
        let notifiers = catalog
            .default_notifiers(&integrations)
            .map_err(|source| ConfigError::Defaults {
                what: "notifiers",
                source,
            })?;
        let pipeling_connections =
            catalog
                .default_connections()
                .map_err(|source| ConfigError::Defaults {
                    what: "connections",
                    source,
                })?;

        Ok(Self {
            config_paths,
            credential_imports: HashMap::new(),
            credentials,
            integrations,
            notifiers,
            connection_imports: HashMap::new(),
            pipeling_connections,
        })
    }

    /// Deep equality over the six resource collections.
    ///
    /// The directory list and declaration ranges are ignored.
    pub fn equals(&self, other: &ConfigurationSnapshot) -> bool {
        self.credential_imports == other.credential_imports
            && self.credentials == other.credentials
            && self.integrations == other.integrations
            && self.notifiers == other.notifiers
            && self.connection_imports == other.connection_imports
            && self.pipeling_connections == other.pipeling_connections
    }

    /// Replaces every resource collection with those of `other`.
    ///
    /// The directory list is kept.
    pub(crate) fn update_resources(&mut self, other: ConfigurationSnapshot) {
        self.credential_imports = other.credential_imports;
        self.credentials = other.credentials;
        self.integrations = other.integrations;
        self.notifiers = other.notifiers;
        self.connection_imports = other.connection_imports;
        self.pipeling_connections = other.pipeling_connections;
    }

    /// Every notifier rendered as the value pipelines reference.
    ///
    /// Notifiers that fail to render are logged and left out.
    pub fn notifier_value_map(&self) -> HashMap<String, JsonValue> {
        let mut values = HashMap::with_capacity(self.notifiers.len());
        for (name, notifier) in &self.notifiers {
            match notifier.to_value() {
                Ok(value) => {
                    values.insert(name.clone(), value);
                }
                Err(e) => {
                    warn!(notifier = %name, error = %e, "Failed to render notifier value");
                }
            }
        }
        values
    }
}
