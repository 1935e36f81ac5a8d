//! Credential and connection imports from external connection files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, info_span, warn};

use super::options::LoadOptions;
use super::snapshot::ConfigurationSnapshot;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{ConfigError, Result};
use crate::parse::decode::{decode_import_connection, decode_inline_config};
use crate::parse::{list_files, load_file_data, parse_files, BlockType};
use crate::resource::{Credential, CredentialConfig, CredentialType, ImportDirective, PipelingConnection};

/// Reduces a plugin alias such as `turbot/aws@latest` to its kind, `aws`.
pub fn plugin_kind(alias: &str) -> &str {
    let name = alias.rsplit('/').next().unwrap_or(alias);
    name.split('@').next().unwrap_or(name)
}

/// Rewrites a connection name pattern into `glob` syntax.
///
/// `[^...]` negates a class and a backslash escapes the next character.
/// `[!...]` keeps its `glob` meaning and negates too. A trailing backslash is
/// malformed.
fn glob_pattern(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next()?;
                if !in_class && matches!(escaped, '*' | '?' | '[' | ']') {
                    out.push('[');
                    out.push(escaped);
                    out.push(']');
                } else {
                    out.push(escaped);
                }
            }
            '[' if !in_class => {
                in_class = true;
                out.push('[');
                if chars.next_if_eq(&'^').is_some() {
                    out.push('!');
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    Some(out)
}

/// Whether `name` matches any of the shell-style `patterns`.
///
/// Malformed patterns are reported as warnings and never match.
pub fn is_required_connection(name: &str, patterns: &[String], warnings: &mut Diagnostics) -> bool {
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::new()
    };
    for pattern in patterns {
        let compiled = glob_pattern(pattern)
            .ok_or_else(|| "pattern ends with an unescaped backslash".to_string())
            .and_then(|p| Pattern::new(&p).map_err(|e| e.to_string()));
        match compiled {
            Ok(p) if p.matches_with(name, options) => return true,
            Ok(_) => {}
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Invalid connection name pattern");
                warnings.push(
                    Diagnostic::warning(format!("Invalid connection name pattern '{}'", pattern))
                        .with_detail(e),
                );
            }
        }
    }
    false
}

fn expand_home(locator: &str) -> PathBuf {
    if locator == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = locator.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(locator)
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

/// Resolves an import source to the files it names.
///
/// A source is a file, a directory (every configuration file directly in
/// it) or a glob pattern. `~` expands to the home directory and relative
/// sources resolve against `base_dir`. A glob matching nothing resolves to
/// no files; a concrete path that does not exist is an error.
pub fn resolve_import_source(
    locator: &str,
    base_dir: Option<&Path>,
    options: &LoadOptions,
) -> Result<Vec<PathBuf>> {
    let expanded = expand_home(locator);
    let path = match base_dir {
        Some(base) if expanded.is_relative() => base.join(&expanded),
        _ => expanded,
    };
    let source_error = |message: String| ConfigError::ImportSource {
        locator: locator.to_string(),
        message,
    };

    if path.is_dir() {
        return list_files(&path, &options.list_options()).map_err(|e| source_error(e.to_string()));
    }

    let pattern = path.to_string_lossy();
    if has_glob_meta(&pattern) {
        let entries = glob::glob(&pattern).map_err(|e| source_error(e.to_string()))?;
        let mut files = Vec::new();
        for entry in entries {
            let file = entry.map_err(|e| source_error(e.to_string()))?;
            if file.is_file() {
                files.push(file);
            }
        }
        files.sort();
        return Ok(files);
    }

    if path.is_file() {
        return Ok(vec![path]);
    }

    Err(source_error(format!("'{}' does not exist", path.display())))
}

/// Reads the connections of an import source and turns them into credentials.
///
/// Only connections whose names match `patterns` are kept (all of them when
/// `patterns` is empty), and `prefix` is prepended to their names. Meeting a
/// connection whose plugin kind has no credential counterpart ends the
/// import with no credentials at all, discarding those already collected.
pub fn resolve_import(
    source: &str,
    base_dir: Option<&Path>,
    patterns: &[String],
    prefix: Option<&str>,
    options: &LoadOptions,
    warnings: &mut Diagnostics,
) -> Result<Vec<Credential>> {
    let paths = resolve_import_source(source, base_dir, options)?;
    if paths.is_empty() {
        debug!(source = %source, "Import source matched no files");
        return Ok(Vec::new());
    }

    let (files, diags) = load_file_data(&paths);
    if diags.has_errors() {
        return Err(ConfigError::diagnostics(
            format!("Failed to load import source '{}'", source),
            diags,
        ));
    }
    let (body, diags) = parse_files(&files);
    if diags.has_errors() {
        return Err(ConfigError::diagnostics(
            format!("Failed to parse import source '{}'", source),
            diags,
        ));
    }
    let (blocks, diags) = body.content(&[BlockType::Connection]);
    if diags.has_errors() {
        return Err(ConfigError::diagnostics(
            format!("Invalid connections in import source '{}'", source),
            diags,
        ));
    }

    let mut credentials = Vec::new();
    for block in &blocks {
        let connection = match decode_import_connection(block) {
            Ok(c) => c,
            Err(d) => {
                debug!(connection = %block.name, diagnostics = %d, "Skipping undecodable connection");
                continue;
            }
        };

        let kind = plugin_kind(&connection.plugin);
        if !patterns.is_empty() && !is_required_connection(&connection.name, patterns, warnings) {
            continue;
        }

        let short_name = match prefix {
            Some(p) if !p.is_empty() => format!("{}{}", p, connection.name),
            _ => connection.name.clone(),
        };

        let attributes = decode_inline_config(&connection.config, &connection.decl_range)
            .map_err(|d| {
                ConfigError::diagnostics(
                    format!("Failed to parse config of connection '{}'", connection.name),
                    d,
                )
            })?;

        let Ok(kind) = kind.parse::<CredentialType>() else {
            debug!(
                source = %source,
                connection = %connection.name,
                plugin = %connection.plugin,
                "Unsupported plugin kind, import yields no credentials"
            );
            return Ok(Vec::new());
        };

        let config = CredentialConfig::decode(kind, attributes).map_err(|e| {
            ConfigError::diagnostics(
                format!("Failed to decode connection '{}'", connection.name),
                Diagnostic::error(format!("Invalid {} attributes", kind))
                    .with_detail(e.to_string())
                    .with_subject(&connection.decl_range)
                    .into(),
            )
        })?;

        credentials.push(config.into_credential(&short_name));
    }

    Ok(credentials)
}

fn sorted_imports(imports: &HashMap<String, ImportDirective>) -> Vec<&ImportDirective> {
    let mut sorted: Vec<_> = imports.values().collect();
    sorted.sort_by(|a, b| a.name().cmp(b.name()));
    sorted
}

fn import_directive(
    import: &ImportDirective,
    options: &LoadOptions,
    warnings: &mut Diagnostics,
) -> Result<Vec<Credential>> {
    let Some(source) = import.source.as_deref() else {
        return Ok(Vec::new());
    };
    resolve_import(
        source,
        import.declared_in(),
        &import.connections,
        import.prefix.as_deref(),
        options,
        warnings,
    )
}

/// Adds the credentials named by every credential import.
///
/// A name already taken by a loaded credential or by an earlier import is
/// a fatal collision.
pub(crate) fn import_credentials(
    config: &mut ConfigurationSnapshot,
    options: &LoadOptions,
    warnings: &mut Diagnostics,
) -> Result<()> {
    if config.credential_imports.is_empty() {
        return Ok(());
    }
    let _span = info_span!("config.import", kind = "credential").entered();

    let mut imported: HashMap<String, Credential> = HashMap::new();
    for import in sorted_imports(&config.credential_imports) {
        for credential in import_directive(import, options, warnings)? {
            let name = credential.name().to_string();
            if config.credentials.contains_key(&name) || imported.contains_key(&name) {
                return Err(ConfigError::CredentialExists(name));
            }
            debug!(import = %import.name(), credential = %name, "Imported credential");
            imported.insert(name, credential);
        }
    }

    config.credentials.extend(imported);
    Ok(())
}

/// Adds the connections named by every connection import.
pub(crate) fn import_connections(
    config: &mut ConfigurationSnapshot,
    options: &LoadOptions,
    warnings: &mut Diagnostics,
) -> Result<()> {
    if config.connection_imports.is_empty() {
        return Ok(());
    }
    let _span = info_span!("config.import", kind = "connection").entered();

    let mut imported: HashMap<String, PipelingConnection> = HashMap::new();
    for import in sorted_imports(&config.connection_imports) {
        for credential in import_directive(import, options, warnings)? {
            let name = credential.name().to_string();
            if config.pipeling_connections.contains_key(&name) || imported.contains_key(&name) {
                return Err(ConfigError::ConnectionExists(name));
            }
            let connection = credential
                .to_connection()
                .map_err(|source| ConfigError::Conversion {
                    name: name.clone(),
                    source,
                })?;
            debug!(import = %import.name(), connection = %name, "Imported connection");
            imported.insert(name, connection);
        }
    }

    config.pipeling_connections.extend(imported);
    Ok(())
}
