//! Per-kind block decoders.
//!
//! Each decoder returns either a fully validated resource or the diagnostics
//! explaining why the block was rejected. Callers skip rejected blocks and
//! keep decoding the rest.

use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use serde_yaml::{Mapping, Value};

use super::block::{Block, DeclRange};
use super::eval::EvalContext;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::resource::{
    ConnectionConfig, ConnectionImport, ConnectionType, Credential, CredentialConfig,
    CredentialImport, CredentialType, ImportDirective, Integration, IntegrationConfig,
    IntegrationType, Notifier, Notify, PipelingConnection,
};

static RE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").unwrap());

fn block_error(block: &Block, summary: impl Into<String>, detail: impl Display) -> Diagnostics {
    Diagnostic::error(summary)
        .with_detail(detail.to_string())
        .with_subject(&block.decl_range)
        .into()
}

fn validate_name(block: &Block) -> Result<(), Diagnostics> {
    if RE_NAME.is_match(&block.name) {
        return Ok(());
    }
    Err(block_error(
        block,
        format!("Invalid {} name", block.block_type),
        format!(
            "'{}' must start with a letter or underscore and contain only letters, digits, underscores and dashes",
            block.name
        ),
    ))
}

fn type_label(block: &Block) -> Result<&str, Diagnostics> {
    block.type_label.as_deref().ok_or_else(|| {
        block_error(
            block,
            format!("Missing {} type", block.block_type),
            format!("metadata.type is required for '{}'", block.name),
        )
    })
}

fn evaluated_spec(block: &Block, ctx: &EvalContext) -> Result<Mapping, Diagnostics> {
    match ctx.evaluate(&Value::Mapping(block.spec.clone())) {
        Ok(Value::Mapping(spec)) => Ok(spec),
        Ok(_) => Ok(Mapping::new()),
        Err(e) => Err(block_error(block, "Unresolved reference", e)),
    }
}

fn check_problems(block: &Block, problems: Vec<String>) -> Result<(), Diagnostics> {
    if problems.is_empty() {
        return Ok(());
    }
    Err(problems
        .into_iter()
        .map(|p| {
            Diagnostic::error(format!("Invalid {} '{}'", block.block_type, block.name))
                .with_detail(p)
                .with_subject(&block.decl_range)
        })
        .collect())
}

pub fn decode_credential(block: &Block) -> Result<Credential, Diagnostics> {
    validate_name(block)?;
    let kind: CredentialType = type_label(block)?
        .parse()
        .map_err(|e| block_error(block, "Unsupported credential type", e))?;
    let spec = evaluated_spec(block, &EvalContext::empty())?;
    let config = CredentialConfig::decode(kind, spec).map_err(|e| {
        block_error(block, format!("Failed to decode credential '{}'", block.name), e)
    })?;

    let mut credential = config.into_credential(&block.name);
    credential.meta = credential.meta.described_by(block);
    check_problems(block, credential.validate())?;
    Ok(credential)
}

pub fn decode_connection(block: &Block) -> Result<PipelingConnection, Diagnostics> {
    validate_name(block)?;
    let kind: ConnectionType = type_label(block)?
        .parse()
        .map_err(|e| block_error(block, "Unsupported connection type", e))?;
    let spec = evaluated_spec(block, &EvalContext::empty())?;
    let config = ConnectionConfig::decode(kind, spec).map_err(|e| {
        block_error(block, format!("Failed to decode connection '{}'", block.name), e)
    })?;

    let mut connection = PipelingConnection::new(&block.name, config);
    connection.meta = connection.meta.described_by(block);
    check_problems(block, connection.validate())?;
    Ok(connection)
}

pub fn decode_integration(block: &Block) -> Result<Integration, Diagnostics> {
    validate_name(block)?;
    let kind: IntegrationType = type_label(block)?
        .parse()
        .map_err(|e| block_error(block, "Unsupported integration type", e))?;
    let spec = evaluated_spec(block, &EvalContext::empty())?;
    let config = IntegrationConfig::decode(kind, spec).map_err(|e| {
        block_error(block, format!("Failed to decode integration '{}'", block.name), e)
    })?;

    let mut integration = Integration::new(&block.name, config);
    integration.meta = integration.meta.described_by(block);
    check_problems(block, integration.validate())?;
    Ok(integration)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NotifierSpec {
    #[serde(default)]
    notifies: Vec<NotifySpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NotifySpec {
    #[serde(default)]
    integration: Option<JsonValue>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    to: Option<Vec<String>>,
    #[serde(default)]
    cc: Option<Vec<String>>,
    #[serde(default)]
    bcc: Option<Vec<String>>,
}

/// Decodes a notifier, resolving `${integration.<type>.<name>}` references
/// against `ctx`.
pub fn decode_notifier(block: &Block, ctx: &EvalContext) -> Result<Notifier, Diagnostics> {
    validate_name(block)?;
    let spec = evaluated_spec(block, ctx)?;
    let spec: NotifierSpec = serde_yaml::from_value(Value::Mapping(spec)).map_err(|e| {
        block_error(block, format!("Failed to decode notifier '{}'", block.name), e)
    })?;

    let mut notifies = Vec::with_capacity(spec.notifies.len());
    for (idx, notify) in spec.notifies.into_iter().enumerate() {
        let integration = notify
            .integration
            .as_ref()
            .map(Integration::from_value)
            .transpose()
            .map_err(|e| {
                block_error(
                    block,
                    format!("Invalid integration reference in notify #{}", idx + 1),
                    e,
                )
            })?;
        notifies.push(Notify {
            integration,
            channel: notify.channel,
            subject: notify.subject,
            description: notify.description,
            to: notify.to,
            cc: notify.cc,
            bcc: notify.bcc,
        });
    }

    let mut notifier = Notifier::new(&block.name, notifies);
    notifier.meta = notifier.meta.described_by(block);
    check_problems(block, notifier.validate())?;
    Ok(notifier)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportSpec {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    connections: Vec<String>,
    #[serde(default)]
    prefix: Option<String>,
}

fn decode_import(block: &Block) -> Result<ImportDirective, Diagnostics> {
    validate_name(block)?;
    let spec = evaluated_spec(block, &EvalContext::empty())?;
    let spec: ImportSpec = serde_yaml::from_value(Value::Mapping(spec)).map_err(|e| {
        block_error(
            block,
            format!("Failed to decode {} '{}'", block.block_type, block.name),
            e,
        )
    })?;

    let full_name = format!("{}.{}", block.block_type.resource_prefix(), block.name);
    let mut import = ImportDirective::new(&full_name, &block.name);
    import.meta = import.meta.described_by(block);
    import.source = spec.source;
    import.connections = spec.connections;
    import.prefix = spec.prefix;
    Ok(import)
}

pub fn decode_credential_import(block: &Block) -> Result<CredentialImport, Diagnostics> {
    decode_import(block)
}

pub fn decode_connection_import(block: &Block) -> Result<ConnectionImport, Diagnostics> {
    decode_import(block)
}

/// A connection definition read from an import source.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedConnection {
    /// Connection name as declared in the source, before any prefix.
    pub name: String,
    /// Plugin alias as written, possibly registry-qualified and versioned.
    pub plugin: String,
    /// Remaining attributes as an inline YAML document.
    pub config: String,
    /// Where the connection was declared in the import source.
    pub decl_range: DeclRange,
}

/// Decodes a `Connection` block of an import source: a `plugin` attribute
/// plus free-form provider attributes.
pub fn decode_import_connection(block: &Block) -> Result<ImportedConnection, Diagnostics> {
    validate_name(block)?;
    let mut spec = block.spec.clone();
    let plugin = match spec.remove("plugin") {
        Some(Value::String(plugin)) => plugin,
        Some(_) => return Err(block_error(block, "Invalid plugin", "plugin must be a string")),
        None => {
            return Err(block_error(
                block,
                "Missing plugin",
                format!("connection '{}' does not declare a plugin", block.name),
            ))
        }
    };

    let config = if spec.is_empty() {
        String::new()
    } else {
        serde_yaml::to_string(&spec).map_err(|e| block_error(block, "Invalid connection config", e))?
    };

    Ok(ImportedConnection {
        name: block.name.clone(),
        plugin,
        config,
        decl_range: block.decl_range.clone(),
    })
}

/// Parses an inline config document into attributes, evaluated with no
/// variables in scope.
pub fn decode_inline_config(config: &str, subject: &DeclRange) -> Result<Mapping, Diagnostics> {
    if config.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let error = |detail: String| -> Diagnostics {
        Diagnostic::error("Failed to parse connection config")
            .with_detail(detail)
            .with_subject(subject)
            .into()
    };

    let value: Value = serde_yaml::from_str(config).map_err(|e| error(e.to_string()))?;
    match EvalContext::empty().evaluate(&value) {
        Ok(Value::Mapping(attributes)) => Ok(attributes),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(error("connection config must be a mapping".to_string())),
        Err(e) => Err(error(e.to_string())),
    }
}
