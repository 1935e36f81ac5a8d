//! Resource catalog: built-in defaults and the set of connection kinds the
//! runtime understands.

use std::collections::{HashMap, HashSet};

use crate::error::CatalogError;
use crate::resource::{
    ConnectionConfig, ConnectionType, Credential, CredentialConfig, CredentialType,
    HttpIntegration, Integration, IntegrationConfig, Notifier, Notify, PipelingConnection,
};

/// Name given to every built-in default resource.
pub const DEFAULT_NAME: &str = "default";

/// Full name of the integration the default notifier delivers through.
pub const DEFAULT_INTEGRATION: &str = "http.default";

/// Supplies default resources that seed every snapshot.
///
/// Loaded configuration overrides defaults by full name.
pub trait Catalog: Send + Sync {
    fn default_credentials(&self) -> Result<HashMap<String, Credential>, CatalogError>;

    fn default_integrations(&self) -> Result<HashMap<String, Integration>, CatalogError>;

    /// Default notifiers, built against the default integrations.
    fn default_notifiers(
        &self,
        integrations: &HashMap<String, Integration>,
    ) -> Result<HashMap<String, Notifier>, CatalogError>;

    fn default_connections(&self) -> Result<HashMap<String, PipelingConnection>, CatalogError>;

    /// Whether credentials of `kind` can be turned into connections.
    fn connection_type_supported(&self, kind: &str) -> bool;
}

/// The catalog shipped with the crate.
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    supported_connections: HashSet<ConnectionType>,
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self {
            supported_connections: ConnectionType::ALL.into_iter().collect(),
        }
    }
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts which connection kinds credentials are derived into.
    pub fn with_supported_connections(
        mut self,
        kinds: impl IntoIterator<Item = ConnectionType>,
    ) -> Self {
        self.supported_connections = kinds.into_iter().collect();
        self
    }
}

impl Catalog for BuiltinCatalog {
    fn default_credentials(&self) -> Result<HashMap<String, Credential>, CatalogError> {
        let mut credentials = HashMap::new();
        // Basic credentials have no sensible default username.
        for kind in CredentialType::ALL
            .into_iter()
            .filter(|k| *k != CredentialType::Basic)
        {
            let credential = CredentialConfig::empty(kind).into_credential(DEFAULT_NAME);
            if let Some(reason) = credential.validate().into_iter().next() {
                return Err(CatalogError::InvalidDefault {
                    kind: "credential",
                    name: credential.name().to_string(),
                    reason,
                });
            }
            credentials.insert(credential.name().to_string(), credential);
        }
        Ok(credentials)
    }

    fn default_integrations(&self) -> Result<HashMap<String, Integration>, CatalogError> {
        let http = Integration::new(DEFAULT_NAME, IntegrationConfig::Http(HttpIntegration {}));
        Ok(HashMap::from([(http.name().to_string(), http)]))
    }

    fn default_notifiers(
        &self,
        integrations: &HashMap<String, Integration>,
    ) -> Result<HashMap<String, Notifier>, CatalogError> {
        let integration = integrations
            .get(DEFAULT_INTEGRATION)
            .cloned()
            .ok_or_else(|| CatalogError::MissingIntegration(DEFAULT_INTEGRATION.to_string()))?;

        let notifier = Notifier::new(DEFAULT_NAME, vec![Notify::new(integration)]);
        Ok(HashMap::from([(notifier.name().to_string(), notifier)]))
    }

    fn default_connections(&self) -> Result<HashMap<String, PipelingConnection>, CatalogError> {
        let mut kinds: Vec<_> = self.supported_connections.iter().copied().collect();
        kinds.sort();
        Ok(kinds
            .into_iter()
            .map(|kind| PipelingConnection::new(DEFAULT_NAME, ConnectionConfig::empty(kind)))
            .map(|conn| (conn.name().to_string(), conn))
            .collect())
    }

    fn connection_type_supported(&self, kind: &str) -> bool {
        kind.parse::<ConnectionType>()
            .is_ok_and(|k| self.supported_connections.contains(&k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_credentials() {
        let credentials = BuiltinCatalog::new().default_credentials().unwrap();
        assert!(credentials.contains_key("aws.default"));
        assert!(credentials.contains_key("slack.default"));
        assert!(!credentials.contains_key("basic.default"));
        assert_eq!(credentials.len(), CredentialType::ALL.len() - 1);
    }

    #[test]
    fn test_default_notifier_uses_http_integration() {
        let catalog = BuiltinCatalog::new();
        let integrations = catalog.default_integrations().unwrap();
        let notifiers = catalog.default_notifiers(&integrations).unwrap();

        let notifier = &notifiers["default"];
        assert_eq!(notifier.notifies.len(), 1);
        assert_eq!(
            notifier.notifies[0].integration.as_ref().map(Integration::name),
            Some(DEFAULT_INTEGRATION)
        );
    }

    #[test]
    fn test_default_notifier_requires_integration() {
        let err = BuiltinCatalog::new()
            .default_notifiers(&HashMap::new())
            .unwrap_err();
        assert_eq!(
            err,
            CatalogError::MissingIntegration(DEFAULT_INTEGRATION.to_string())
        );
    }

    #[test]
    fn test_supported_connections() {
        let catalog = BuiltinCatalog::new()
            .with_supported_connections([ConnectionType::Aws, ConnectionType::Slack]);

        assert!(catalog.connection_type_supported("aws"));
        assert!(!catalog.connection_type_supported("github"));
        assert!(!catalog.connection_type_supported("basic"));

        let connections = catalog.default_connections().unwrap();
        let mut names: Vec<_> = connections.keys().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["aws.default", "slack.default"]);
    }
}
