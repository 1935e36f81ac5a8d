use std::path::Path;

use serde::Serialize;

use super::meta::ResourceMeta;

/// A directive to pull connection definitions from external files.
///
/// The same shape backs both credential imports and connection imports;
/// only the target collection differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDirective {
    #[serde(flatten)]
    pub meta: ResourceMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

pub type CredentialImport = ImportDirective;
pub type ConnectionImport = ImportDirective;

impl ImportDirective {
    pub fn new(full_name: &str, short_name: &str) -> Self {
        Self {
            meta: ResourceMeta::named(full_name, short_name),
            source: None,
            connections: Vec::new(),
            prefix: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta.full_name
    }

    /// Directory of the file that declared this import, used to resolve
    /// relative sources.
    pub fn declared_in(&self) -> Option<&Path> {
        self.meta
            .decl_range
            .as_ref()
            .and_then(|range| range.file.parent())
    }
}
