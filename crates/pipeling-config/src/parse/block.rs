//! Block envelopes shared by every configuration kind.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::diagnostics::{Diagnostic, Diagnostics};

/// API version every configuration document must declare.
pub const API_VERSION: &str = "pipeling.io/v1";

/// Where a block was declared. Never part of resource equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeclRange {
    /// File the block was read from.
    pub file: PathBuf,
    /// First line of the block, 1-based.
    pub start_line: usize,
    /// Last line of the block, inclusive.
    pub end_line: usize,
}

impl fmt::Display for DeclRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}",
            self.file.display(),
            self.start_line,
            self.end_line
        )
    }
}

/// Configuration block kinds, listed in decode order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BlockType {
    CredentialImport,
    Credential,
    Integration,
    Notifier,
    Connection,
    ConnectionImport,
}

impl BlockType {
    pub const ALL: [BlockType; 6] = [
        BlockType::CredentialImport,
        BlockType::Credential,
        BlockType::Integration,
        BlockType::Notifier,
        BlockType::Connection,
        BlockType::ConnectionImport,
    ];

    /// Parses the document `kind` field.
    pub fn from_kind(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.kind() == kind)
    }

    /// The document `kind` field for this block type.
    pub fn kind(&self) -> &'static str {
        match self {
            BlockType::CredentialImport => "CredentialImport",
            BlockType::Credential => "Credential",
            BlockType::Integration => "Integration",
            BlockType::Notifier => "Notifier",
            BlockType::Connection => "Connection",
            BlockType::ConnectionImport => "ConnectionImport",
        }
    }

    /// Prefix used when building full names of label-only kinds.
    pub fn resource_prefix(&self) -> &'static str {
        match self {
            BlockType::CredentialImport => "credential_import",
            BlockType::Credential => "credential",
            BlockType::Integration => "integration",
            BlockType::Notifier => "notifier",
            BlockType::Connection => "connection",
            BlockType::ConnectionImport => "connection_import",
        }
    }

    /// Whether blocks of this kind carry a `metadata.type` label.
    pub fn is_typed(&self) -> bool {
        matches!(
            self,
            BlockType::Credential | BlockType::Integration | BlockType::Connection
        )
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// A parsed YAML document before its kind is interpreted.
#[derive(Debug, Clone)]
pub struct RawBlock {
    /// The document's `kind`, not yet checked against the known kinds.
    pub kind: String,
    /// The `metadata` mapping, null when absent.
    pub metadata: Value,
    /// The `spec` mapping, null when absent.
    pub spec: Value,
    pub decl_range: DeclRange,
}

/// Metadata every known block kind shares.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BlockMetadata {
    name: String,
    #[serde(default, rename = "type")]
    type_label: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// A block of a known kind, ready for decoding.
#[derive(Debug, Clone)]
pub struct Block {
    /// Which kind of resource the block declares.
    pub block_type: BlockType,
    /// `metadata.name`, unvalidated.
    pub name: String,
    /// `metadata.type`, the first label of typed kinds such as credentials.
    pub type_label: Option<String>,
    /// Optional display title.
    pub title: Option<String>,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Kind-specific attributes, empty when the document has no `spec`.
    pub spec: Mapping,
    /// Where the block was declared.
    pub decl_range: DeclRange,
}

impl Block {
    /// Labels as written: `[type, name]` for typed kinds, `[name]` otherwise.
    pub fn labels(&self) -> Vec<&str> {
        match &self.type_label {
            Some(type_label) => vec![type_label.as_str(), self.name.as_str()],
            None => vec![self.name.as_str()],
        }
    }
}

/// Every block parsed from a set of files.
#[derive(Debug, Clone, Default)]
pub struct Body {
    blocks: Vec<RawBlock>,
}

impl Body {
    pub fn new(blocks: Vec<RawBlock>) -> Self {
        Self { blocks }
    }

    pub fn raw_blocks(&self) -> &[RawBlock] {
        &self.blocks
    }

    /// Selects the blocks whose kind is in `schema`, leaving every other
    /// kind untouched.
    ///
    /// Diagnostics returned here describe malformed envelopes and are
    /// structural: the caller should not attempt to decode anything.
    pub fn content(&self, schema: &[BlockType]) -> (Vec<Block>, Diagnostics) {
        let mut blocks = Vec::new();
        let mut diags = Diagnostics::new();

        for raw in &self.blocks {
            let Some(block_type) = BlockType::from_kind(&raw.kind) else {
                continue;
            };
            if !schema.contains(&block_type) {
                continue;
            }

            let metadata: BlockMetadata = match serde_yaml::from_value(raw.metadata.clone()) {
                Ok(m) => m,
                Err(e) => {
                    diags.push(
                        Diagnostic::error(format!("Invalid {} metadata", block_type))
                            .with_detail(e.to_string())
                            .with_subject(&raw.decl_range),
                    );
                    continue;
                }
            };

            let spec = match &raw.spec {
                Value::Null => Mapping::new(),
                Value::Mapping(m) => m.clone(),
                _ => {
                    diags.push(
                        Diagnostic::error(format!("Invalid {} spec", block_type))
                            .with_detail("spec must be a mapping")
                            .with_subject(&raw.decl_range),
                    );
                    continue;
                }
            };

            blocks.push(Block {
                block_type,
                name: metadata.name,
                type_label: metadata.type_label,
                title: metadata.title,
                description: metadata.description,
                spec,
                decl_range: raw.decl_range.clone(),
            });
        }

        (blocks, diags)
    }
}
