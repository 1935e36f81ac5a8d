//! Decodes the blocks of one configuration directory into a snapshot.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use super::options::LoadOptions;
use super::snapshot::ConfigurationSnapshot;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{ConfigError, Result};
use crate::parse::decode::{
    decode_connection, decode_connection_import, decode_credential, decode_credential_import,
    decode_integration, decode_notifier,
};
use crate::parse::{list_files, load_file_data, parse_files, BlockType, EvalContext};
use crate::resource::{Integration, IntegrationType};

/// Builds the context notifiers are decoded with: every integration,
/// addressable as `integration.<type>.<name>`.
pub(crate) fn integration_eval_context(
    integrations: &HashMap<String, Integration>,
) -> std::result::Result<EvalContext, Diagnostics> {
    let mut by_type: Map<String, JsonValue> = Map::new();
    let mut diags = Diagnostics::new();

    for (key, integration) in integrations {
        let parts: Vec<&str> = key.split('.').collect();
        let [type_name, name] = parts.as_slice() else {
            diags.push(
                Diagnostic::error("Invalid integration name")
                    .with_detail(format!("'{}' is not of the form <type>.<name>", key)),
            );
            continue;
        };
        if type_name.parse::<IntegrationType>().is_err() {
            diags.push(
                Diagnostic::error("Invalid integration type")
                    .with_detail(format!("'{}' has unsupported type '{}'", key, type_name)),
            );
            continue;
        }

        let value = match integration.to_value() {
            Ok(v) => v,
            Err(e) => {
                diags.push(
                    Diagnostic::error(format!("Failed to render integration '{}'", key))
                        .with_detail(e.to_string()),
                );
                continue;
            }
        };

        if let JsonValue::Object(names) = by_type
            .entry(type_name.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()))
        {
            names.insert(name.to_string(), value);
        }
    }

    if diags.has_errors() {
        return Err(diags);
    }
    Ok(EvalContext::empty().with_variable("integration", JsonValue::Object(by_type)))
}

/// Decodes every block under `dir` into `config`.
///
/// Returns the decode diagnostics of rejected blocks; those blocks are
/// skipped while the rest are still applied. Unreadable directories and
/// malformed files abort with an error before anything is decoded.
pub(crate) fn load_directory(
    config: &mut ConfigurationSnapshot,
    dir: &Path,
    options: &LoadOptions,
) -> Result<Diagnostics> {
    let paths = list_files(dir, &options.list_options()).map_err(|source| {
        ConfigError::ReadDirectory {
            path: dir.to_path_buf(),
            source,
        }
    })?;

    let (files, diags) = load_file_data(&paths);
    if diags.has_errors() {
        return Err(ConfigError::diagnostics(
            format!("Failed to load configuration files in '{}'", dir.display()),
            diags,
        ));
    }

    let (body, diags) = parse_files(&files);
    if diags.has_errors() {
        return Err(ConfigError::diagnostics(
            format!("Failed to parse configuration in '{}'", dir.display()),
            diags,
        ));
    }

    let (mut blocks, diags) = body.content(&BlockType::ALL);
    if diags.has_errors() {
        return Err(ConfigError::diagnostics(
            format!("Invalid configuration blocks in '{}'", dir.display()),
            diags,
        ));
    }
    blocks.sort_by_key(|b| b.block_type);

    let mut decode_diags = Diagnostics::new();
    let mut notifier_ctx: Option<EvalContext> = None;
    let mut notifier_ctx_failed = false;

    for block in &blocks {
        match block.block_type {
            BlockType::CredentialImport => match decode_credential_import(block) {
                Ok(import) => {
                    config
                        .credential_imports
                        .insert(import.name().to_string(), import);
                }
                Err(d) => decode_diags.append(d),
            },
            BlockType::Credential => match decode_credential(block) {
                Ok(credential) => {
                    debug!(credential = %credential.name(), "Decoded credential");
                    config
                        .credentials
                        .insert(credential.name().to_string(), credential);
                }
                Err(d) => decode_diags.append(d),
            },
            BlockType::Integration => match decode_integration(block) {
                Ok(integration) => {
                    debug!(integration = %integration.name(), "Decoded integration");
                    config
                        .integrations
                        .insert(integration.name().to_string(), integration);
                }
                Err(d) => decode_diags.append(d),
            },
            BlockType::Notifier => {
                // Integrations sort ahead of notifiers, so the context sees
                // everything decoded so far, this directory included.
                if notifier_ctx.is_none() && !notifier_ctx_failed {
                    match integration_eval_context(&config.integrations) {
                        Ok(ctx) => notifier_ctx = Some(ctx),
                        Err(d) => {
                            warn!(dir = %dir.display(), "Skipping notifiers: integration context is invalid");
                            decode_diags.append(d);
                            notifier_ctx_failed = true;
                        }
                    }
                }
                let Some(ctx) = notifier_ctx.as_ref() else {
                    decode_diags.push(
                        Diagnostic::error(format!("Skipped notifier '{}'", block.name))
                            .with_detail("integrations could not be resolved for this directory")
                            .with_subject(&block.decl_range),
                    );
                    continue;
                };
                match decode_notifier(block, ctx) {
                    Ok(notifier) => {
                        config
                            .notifiers
                            .insert(notifier.name().to_string(), notifier);
                    }
                    Err(d) => decode_diags.append(d),
                }
            }
            BlockType::Connection => match decode_connection(block) {
                Ok(connection) => {
                    config
                        .pipeling_connections
                        .insert(connection.name().to_string(), connection);
                }
                Err(d) => decode_diags.append(d),
            },
            BlockType::ConnectionImport => match decode_connection_import(block) {
                Ok(import) => {
                    config
                        .connection_imports
                        .insert(import.name().to_string(), import);
                }
                Err(d) => decode_diags.append(d),
            },
        }
    }

    Ok(decode_diags)
}
