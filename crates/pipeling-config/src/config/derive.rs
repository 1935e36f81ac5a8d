//! Derives connections from credentials that have no explicit counterpart.

use tracing::debug;

use super::snapshot::ConfigurationSnapshot;
use crate::catalog::Catalog;
use crate::error::{ConfigError, ConversionError, Result};

/// Adds a connection for every credential whose name is not already taken
/// by a connection.
///
/// Existing connections are never replaced. Credentials of kinds the catalog
/// does not support as connections, or that have no connection counterpart,
/// are skipped. Any other conversion failure is fatal.
pub(crate) fn credentials_to_connections(
    config: &mut ConfigurationSnapshot,
    catalog: &dyn Catalog,
) -> Result<()> {
    let mut names: Vec<&String> = config.credentials.keys().collect();
    names.sort();

    let mut derived = Vec::new();
    for name in names {
        if config.pipeling_connections.contains_key(name) {
            continue;
        }
        let credential = &config.credentials[name];
        if !catalog.connection_type_supported(credential.credential_type().as_str()) {
            continue;
        }

        match credential.to_connection() {
            Ok(connection) => derived.push(connection),
            Err(ConversionError::InvalidConnectionType(kind)) => {
                debug!(credential = %name, kind = %kind, "No connection counterpart");
            }
            Err(source) => {
                return Err(ConfigError::Conversion {
                    name: name.clone(),
                    source,
                })
            }
        }
    }

    for connection in derived {
        debug!(connection = %connection.name(), "Derived connection from credential");
        config
            .pipeling_connections
            .insert(connection.name().to_string(), connection);
    }
    Ok(())
}
