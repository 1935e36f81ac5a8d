use serde::{Deserialize, Serialize};

use crate::parse::{Block, DeclRange};

/// Naming and descriptive metadata shared by every resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceMeta {
    /// Map key of the resource, `<type>.<name>` for typed kinds.
    pub full_name: String,
    /// The name as declared, without type.
    pub short_name: String,
    /// The full name without any block-kind prefix.
    pub unqualified_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip)]
    pub decl_range: Option<DeclRange>,
}

impl ResourceMeta {
    /// Metadata for a `<type>.<name>` resource.
    pub fn typed(type_name: &str, short_name: &str) -> Self {
        let full_name = format!("{}.{}", type_name, short_name);
        Self {
            unqualified_name: full_name.clone(),
            full_name,
            short_name: short_name.to_string(),
            ..Default::default()
        }
    }

    /// Metadata for a resource addressed by name alone.
    pub fn named(full_name: &str, short_name: &str) -> Self {
        Self {
            full_name: full_name.to_string(),
            short_name: short_name.to_string(),
            unqualified_name: full_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Copies title, description and declaration range from a block.
    pub(crate) fn described_by(mut self, block: &Block) -> Self {
        self.title = block.title.clone();
        self.description = block.description.clone();
        self.decl_range = Some(block.decl_range.clone());
        self
    }
}

// Declaration ranges move whenever a file is edited; they never make two
// resources different.
impl PartialEq for ResourceMeta {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name
            && self.short_name == other.short_name
            && self.unqualified_name == other.unqualified_name
            && self.title == other.title
            && self.description == other.description
    }
}

impl Eq for ResourceMeta {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_typed_names() {
        let meta = ResourceMeta::typed("aws", "prod");
        assert_eq!(meta.full_name, "aws.prod");
        assert_eq!(meta.short_name, "prod");
        assert_eq!(meta.unqualified_name, "aws.prod");
    }

    #[test]
    fn test_equality_ignores_decl_range() {
        let mut a = ResourceMeta::typed("aws", "prod");
        let mut b = a.clone();
        a.decl_range = Some(DeclRange {
            file: PathBuf::from("a.yaml"),
            start_line: 1,
            end_line: 5,
        });
        b.decl_range = Some(DeclRange {
            file: PathBuf::from("b.yaml"),
            start_line: 20,
            end_line: 30,
        });
        assert_eq!(a, b);

        b.description = Some("changed".to_string());
        assert_ne!(a, b);
    }
}
